//! Department models and DTOs for create, update and delete operations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::employee::Employee;
use crate::error::AppError;

/// A node of the organizational tree as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: i32,
    pub name: String,
    /// `None` for root departments.
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Department with its derived views (subtree and employees) attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentNode {
    #[serde(flatten)]
    pub department: Department,
    /// Always present; empty when the read depth does not reach the children.
    pub children: Vec<DepartmentNode>,
    /// Present only when employees were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<Employee>>,
}

impl From<Department> for DepartmentNode {
    fn from(department: Department) -> Self {
        Self {
            department,
            children: Vec::new(),
            employees: None,
        }
    }
}

impl DepartmentNode {
    /// Number of departments in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(DepartmentNode::subtree_len).sum::<usize>()
    }
}

/// DTO for creating a department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepartment {
    pub name: String,
    pub parent_id: Option<i32>,
}

/// DTO for updating a department.
///
/// `parent_id`: `None` leaves the parent untouched, `Some(None)` moves the
/// department to the root, `Some(Some(id))` moves it under `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub parent_id: Option<Option<i32>>,
}

/// How a department is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Remove the department and its entire subtree.
    Cascade,
    /// Move the employees of a leaf department elsewhere, then remove it.
    Reassign,
}

impl FromStr for DeleteMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cascade" => Ok(Self::Cascade),
            "reassign" => Ok(Self::Reassign),
            other => Err(AppError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cascade => f.write_str("cascade"),
            Self::Reassign => f.write_str("reassign"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_mode_parse() {
        assert_eq!("cascade".parse::<DeleteMode>().unwrap(), DeleteMode::Cascade);
        assert_eq!("reassign".parse::<DeleteMode>().unwrap(), DeleteMode::Reassign);
        assert!(matches!("purge".parse::<DeleteMode>(), Err(AppError::InvalidMode(m)) if m == "purge"));
        assert!("Cascade".parse::<DeleteMode>().is_err());
    }

    #[test]
    fn test_node_serializes_flat_with_empty_children() {
        let node = DepartmentNode::from(Department {
            id: 7,
            name: "Ops".to_string(),
            parent_id: None,
            created_at: Utc::now(),
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Ops");
        assert!(json["parent_id"].is_null());
        assert_eq!(json["children"], serde_json::json!([]));
        assert!(json.get("employees").is_none());
    }

    #[test]
    fn test_update_parent_tristate() {
        let keep: UpdateDepartment = serde_json::from_str(r#"{"name":"X"}"#).unwrap();
        assert_eq!(keep.parent_id, None);

        let move_to: UpdateDepartment = serde_json::from_str(r#"{"parent_id":3}"#).unwrap();
        assert_eq!(move_to.parent_id, Some(Some(3)));
    }
}
