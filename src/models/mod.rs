//! Data models for departments and employees.

pub mod department;
pub mod employee;

pub use department::{CreateDepartment, DeleteMode, Department, DepartmentNode, UpdateDepartment};
pub use employee::{CreateEmployee, Employee, EmployeeOrder};
