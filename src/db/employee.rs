//! Employee repository with CRUD operations.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::entities::{employees, prelude::*};
use crate::models::{CreateEmployee, Employee, EmployeeOrder};

impl From<employees::Model> for Employee {
    fn from(model: employees::Model) -> Self {
        Self {
            id: model.id,
            department_id: model.department_id,
            full_name: model.full_name,
            position: model.position,
            hired_at: model.hired_at,
            created_at: model.created_at,
        }
    }
}

/// List employees of a department.
pub async fn list_by_department<C: ConnectionTrait>(
    db: &C,
    department_id: i32,
    order: EmployeeOrder,
) -> Result<Vec<Employee>, DbErr> {
    let query = Employees::find().filter(employees::Column::DepartmentId.eq(department_id));
    let query = match order {
        EmployeeOrder::CreatedAt => query.order_by_asc(employees::Column::CreatedAt),
        EmployeeOrder::FullName => query.order_by_asc(employees::Column::FullName),
    };
    let models = query.order_by_asc(employees::Column::Id).all(db).await?;
    Ok(models.into_iter().map(Employee::from).collect())
}

/// Get employee by ID.
pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Employee>, DbErr> {
    Ok(Employees::find_by_id(id).one(db).await?.map(Employee::from))
}

/// Create a new employee.
pub async fn create<C: ConnectionTrait>(db: &C, data: CreateEmployee) -> Result<Employee, DbErr> {
    let model = employees::ActiveModel {
        department_id: Set(data.department_id),
        full_name: Set(data.full_name),
        position: Set(data.position),
        hired_at: Set(data.hired_at),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(model.insert(db).await?.into())
}

/// Update an existing employee.
pub async fn update<C: ConnectionTrait>(db: &C, emp: &Employee) -> Result<Employee, DbErr> {
    let active = employees::ActiveModel {
        id: Unchanged(emp.id),
        department_id: Set(emp.department_id),
        full_name: Set(emp.full_name.clone()),
        position: Set(emp.position.clone()),
        hired_at: Set(emp.hired_at),
        created_at: NotSet,
    };
    Ok(active.update(db).await?.into())
}

/// Delete an employee by ID.
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    let result = Employees::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Move every employee of `from` to `to`.
pub async fn move_all<C: ConnectionTrait>(db: &C, from: i32, to: i32) -> Result<u64, DbErr> {
    let result = Employees::update_many()
        .col_expr(employees::Column::DepartmentId, Expr::value(to))
        .filter(employees::Column::DepartmentId.eq(from))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
