//! Employee assignment service.

use std::sync::Arc;

use tracing::info;

use super::Deadline;
use super::validation::{validate_full_name, validate_position};
use crate::config::HierarchyConfig;
use crate::error::{AppError, Result};
use crate::models::{CreateEmployee, Employee, EmployeeOrder};
use crate::store::{DepartmentStore, EmployeeStore};

/// Creates employees under verified-existing departments.
pub struct EmployeeService<S> {
    store: Arc<S>,
    config: HierarchyConfig,
}

impl<S> Clone for EmployeeService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: DepartmentStore + EmployeeStore> EmployeeService<S> {
    /// Create a new employee service.
    pub fn new(store: Arc<S>, config: HierarchyConfig) -> Self {
        Self { store, config }
    }

    async fn ensure_department(&self, deadline: Deadline, department_id: i32) -> Result<()> {
        deadline
            .run("check department existence", self.store.get_department(department_id))
            .await?
            .map(|_| ())
            .ok_or(AppError::DepartmentNotFound(department_id))
    }

    /// Validate and persist a new employee.
    pub async fn create(&self, data: CreateEmployee) -> Result<Employee> {
        let deadline = Deadline::after(self.config.request_timeout());
        self.ensure_department(deadline, data.department_id).await?;

        let full_name = validate_full_name(&data.full_name)?;
        let position = validate_position(&data.position)?;

        let emp = deadline
            .run(
                "create employee",
                self.store.create_employee(CreateEmployee {
                    department_id: data.department_id,
                    full_name,
                    position,
                    hired_at: data.hired_at,
                }),
            )
            .await?;

        info!("Created employee {} '{}' in department {}", emp.id, emp.full_name, emp.department_id);
        Ok(emp)
    }

    /// List the employees of an existing department.
    pub async fn list_by_department(&self, department_id: i32, order: EmployeeOrder) -> Result<Vec<Employee>> {
        let deadline = Deadline::after(self.config.request_timeout());
        self.ensure_department(deadline, department_id).await?;

        deadline
            .run(
                "list department employees",
                self.store.list_employees_by_department(department_id, order),
            )
            .await
    }
}
