//! Database connection pool and store implementations.

pub mod connection;
pub mod department;
pub mod employee;
pub mod memory;
pub mod schema;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QuerySelect, TransactionTrait};

use crate::entities::prelude::Departments;
use crate::models::{CreateDepartment, CreateEmployee, Department, Employee, EmployeeOrder};
use crate::store::{DepartmentStore, DirectoryStore, EmployeeStore};

pub use connection::{DirectoryStatus, connect, directory_status, ping};
pub use memory::MemoryStore;

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DepartmentStore for SeaOrmStore {
    async fn create_department(&self, data: CreateDepartment) -> Result<Department, DbErr> {
        department::create(&self.db, data).await
    }

    async fn get_department(&self, id: i32) -> Result<Option<Department>, DbErr> {
        department::get_by_id(&self.db, id).await
    }

    async fn update_department(&self, dept: &Department) -> Result<Department, DbErr> {
        department::update(&self.db, dept).await
    }

    async fn delete_department(&self, id: i32) -> Result<(), DbErr> {
        department::delete(&self.db, id).await.map(|_| ())
    }

    async fn get_direct_children(&self, parent_id: Option<i32>) -> Result<Vec<Department>, DbErr> {
        department::get_children(&self.db, parent_id).await
    }

    async fn get_descendants(&self, root_id: i32, max_depth: u32) -> Result<Vec<Department>, DbErr> {
        department::get_descendants(&self.db, root_id, max_depth).await
    }

    async fn get_ancestors(&self, id: i32) -> Result<Vec<Department>, DbErr> {
        department::get_ancestors(&self.db, id).await
    }

    async fn get_by_name_and_parent(&self, name: &str, parent_id: Option<i32>) -> Result<Option<Department>, DbErr> {
        department::get_by_name_and_parent(&self.db, name, parent_id).await
    }
}

#[async_trait]
impl EmployeeStore for SeaOrmStore {
    async fn create_employee(&self, data: CreateEmployee) -> Result<Employee, DbErr> {
        employee::create(&self.db, data).await
    }

    async fn get_employee(&self, id: i32) -> Result<Option<Employee>, DbErr> {
        employee::get_by_id(&self.db, id).await
    }

    async fn update_employee(&self, emp: &Employee) -> Result<Employee, DbErr> {
        employee::update(&self.db, emp).await
    }

    async fn delete_employee(&self, id: i32) -> Result<bool, DbErr> {
        employee::delete(&self.db, id).await
    }

    async fn list_employees_by_department(
        &self,
        department_id: i32,
        order: EmployeeOrder,
    ) -> Result<Vec<Employee>, DbErr> {
        employee::list_by_department(&self.db, department_id, order).await
    }

    async fn move_employees(&self, from: i32, to: i32) -> Result<u64, DbErr> {
        employee::move_all(&self.db, from, to).await
    }
}

#[async_trait]
impl DirectoryStore for SeaOrmStore {
    async fn reassign_and_delete(&self, from: i32, to: i32) -> Result<u64, DbErr> {
        // Dropping the transaction without commit rolls it back.
        let txn = self.db.begin().await?;

        // Row lock on `from`: a concurrent employee insert waits on it and then
        // fails its foreign key check instead of being swept by the cascade.
        if Departments::find_by_id(from).lock_exclusive().one(&txn).await?.is_none() {
            return Err(DbErr::RecordNotFound(format!("department {from}")));
        }
        let moved = employee::move_all(&txn, from, to).await?;
        if !department::delete(&txn, from).await? {
            return Err(DbErr::RecordNotFound(format!("department {from}")));
        }
        txn.commit().await?;
        Ok(moved)
    }
}
