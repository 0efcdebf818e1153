pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod tree;

pub use error::{AppError, ErrorKind, Result};
