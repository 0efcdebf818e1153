//! Persistence boundaries consumed by the services.
//!
//! Implementations live in [`crate::db`]. All methods report backend failures
//! as [`DbErr`]; the services wrap them with operation context.

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::models::{CreateDepartment, CreateEmployee, Department, Employee, EmployeeOrder};

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn create_department(&self, data: CreateDepartment) -> Result<Department, DbErr>;

    async fn get_department(&self, id: i32) -> Result<Option<Department>, DbErr>;

    /// Persist name and parent of an existing department.
    async fn update_department(&self, dept: &Department) -> Result<Department, DbErr>;

    /// Delete a department. Its subtree and their employees go with it.
    async fn delete_department(&self, id: i32) -> Result<(), DbErr>;

    /// Direct children of `parent_id`; `None` lists the roots.
    async fn get_direct_children(&self, parent_id: Option<i32>) -> Result<Vec<Department>, DbErr>;

    /// Descendants of `root_id` up to `max_depth - 1` levels below it, ordered by id.
    ///
    /// Empty when `max_depth < 2`.
    async fn get_descendants(&self, root_id: i32, max_depth: u32) -> Result<Vec<Department>, DbErr>;

    /// Ancestors of `id` up to its root, nearest first. Empty for a root or an unknown id.
    async fn get_ancestors(&self, id: i32) -> Result<Vec<Department>, DbErr>;

    async fn get_by_name_and_parent(&self, name: &str, parent_id: Option<i32>) -> Result<Option<Department>, DbErr>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn create_employee(&self, data: CreateEmployee) -> Result<Employee, DbErr>;

    async fn get_employee(&self, id: i32) -> Result<Option<Employee>, DbErr>;

    async fn update_employee(&self, emp: &Employee) -> Result<Employee, DbErr>;

    /// Returns `false` when no employee had that id.
    async fn delete_employee(&self, id: i32) -> Result<bool, DbErr>;

    async fn list_employees_by_department(
        &self,
        department_id: i32,
        order: EmployeeOrder,
    ) -> Result<Vec<Employee>, DbErr>;

    /// Move every employee of `from` to `to`. Returns the number moved.
    async fn move_employees(&self, from: i32, to: i32) -> Result<u64, DbErr>;
}

/// Full store used by the hierarchy service.
#[async_trait]
pub trait DirectoryStore: DepartmentStore + EmployeeStore {
    /// Move all employees of `from` to `to`, then delete `from`, atomically.
    ///
    /// Either both steps are applied or neither is.
    async fn reassign_and_delete(&self, from: i32, to: i32) -> Result<u64, DbErr>;
}
