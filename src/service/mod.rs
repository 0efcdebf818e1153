//! Business services for the department hierarchy and employee assignment.

pub mod department;
pub mod employee;
pub mod validation;


use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use tokio::time::Instant;

use crate::error::{AppError, Result};

pub use department::{DepartmentQuery, DepartmentService};
pub use employee::EmployeeService;

/// Deadline shared by every store call made while serving one request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Instant);

impl Deadline {
    pub(crate) fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    /// Await `fut`, failing with [`AppError::Timeout`] once the deadline passes.
    pub(crate) async fn wait<T>(self, context: &'static str, fut: impl Future<Output = T>) -> Result<T> {
        tokio::time::timeout_at(self.0, fut)
            .await
            .map_err(|_| AppError::Timeout { context })
    }

    /// Run a store call under the deadline, attaching `context` to its failure.
    pub(crate) async fn run<T>(
        self,
        context: &'static str,
        fut: impl Future<Output = std::result::Result<T, DbErr>>,
    ) -> Result<T> {
        self.wait(context, fut).await?.map_err(|e| AppError::store(context, e))
    }
}
