//! SeaORM entity definitions for the directory tables.

pub mod prelude;

pub mod departments;
pub mod employees;
