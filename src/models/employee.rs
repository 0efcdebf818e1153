//! Employee models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An employee assigned to a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i32,
    pub department_id: i32,
    pub full_name: String,
    pub position: String,
    pub hired_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating an employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployee {
    pub department_id: i32,
    pub full_name: String,
    pub position: String,
    pub hired_at: Option<NaiveDate>,
}

/// Sort key for department employee listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeOrder {
    #[default]
    CreatedAt,
    FullName,
}
