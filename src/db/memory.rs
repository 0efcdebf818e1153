//! In-process store with the same constraints as the PostgreSQL schema.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DbErr;

use crate::models::{CreateDepartment, CreateEmployee, Department, Employee, EmployeeOrder};
use crate::store::{DepartmentStore, DirectoryStore, EmployeeStore};

#[derive(Debug, Default)]
struct Tables {
    departments: BTreeMap<i32, Department>,
    employees: BTreeMap<i32, Employee>,
    last_department_id: i32,
    last_employee_id: i32,
}

impl Tables {
    fn check_parent(&self, parent_id: Option<i32>) -> Result<(), DbErr> {
        match parent_id {
            Some(id) if !self.departments.contains_key(&id) => Err(DbErr::Custom(format!(
                "foreign key violation: department {id} does not exist"
            ))),
            _ => Ok(()),
        }
    }

    fn check_department(&self, id: i32) -> Result<(), DbErr> {
        self.check_parent(Some(id))
    }

    fn check_sibling_name(&self, name: &str, parent_id: Option<i32>, id: Option<i32>) -> Result<(), DbErr> {
        let taken = self
            .departments
            .values()
            .any(|d| d.parent_id == parent_id && d.name == name && Some(d.id) != id);
        if taken {
            return Err(DbErr::Custom(format!(
                "unique violation: '{name}' already exists under {parent_id:?}"
            )));
        }
        Ok(())
    }

    /// Ids of the descendants of `root_id`, level by level, at most `levels` deep.
    fn descendant_ids(&self, root_id: i32, levels: u32) -> Vec<i32> {
        let mut found = Vec::new();
        let mut frontier = vec![root_id];
        for _ in 0..levels {
            let next: Vec<i32> = self
                .departments
                .values()
                .filter(|d| d.parent_id.is_some_and(|p| frontier.contains(&p)))
                .map(|d| d.id)
                .collect();
            if next.is_empty() {
                break;
            }
            found.extend(&next);
            frontier = next;
        }
        found
    }

    /// Parent chain of `id`, nearest first.
    fn ancestors(&self, id: i32) -> Vec<Department> {
        let mut chain: Vec<Department> = Vec::new();
        let mut next = self.departments.get(&id).and_then(|d| d.parent_id);
        while let Some(parent) = next.and_then(|p| self.departments.get(&p)) {
            if chain.iter().any(|d| d.id == parent.id) {
                break;
            }
            chain.push(parent.clone());
            next = parent.parent_id;
        }
        chain
    }

    fn remove_subtree(&mut self, id: i32) {
        let mut doomed: HashSet<i32> = self.descendant_ids(id, u32::MAX).into_iter().collect();
        doomed.insert(id);
        self.departments.retain(|dept_id, _| !doomed.contains(dept_id));
        self.employees.retain(|_, emp| !doomed.contains(&emp.department_id));
    }

    fn move_employees(&mut self, from: i32, to: i32) -> u64 {
        let mut moved = 0;
        for emp in self.employees.values_mut().filter(|e| e.department_id == from) {
            emp.department_id = to;
            moved += 1;
        }
        moved
    }
}

/// Store backed by in-memory tables behind a single lock.
///
/// Deleting a department removes its subtree and their employees, mirroring
/// the `ON DELETE CASCADE` foreign keys of the SQL schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, DbErr> {
        self.tables
            .lock()
            .map_err(|_| DbErr::Custom("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DepartmentStore for MemoryStore {
    async fn create_department(&self, data: CreateDepartment) -> Result<Department, DbErr> {
        let mut tables = self.tables()?;
        tables.check_parent(data.parent_id)?;
        tables.check_sibling_name(&data.name, data.parent_id, None)?;

        tables.last_department_id += 1;
        let dept = Department {
            id: tables.last_department_id,
            name: data.name,
            parent_id: data.parent_id,
            created_at: Utc::now(),
        };
        tables.departments.insert(dept.id, dept.clone());
        Ok(dept)
    }

    async fn get_department(&self, id: i32) -> Result<Option<Department>, DbErr> {
        Ok(self.tables()?.departments.get(&id).cloned())
    }

    async fn update_department(&self, dept: &Department) -> Result<Department, DbErr> {
        let mut tables = self.tables()?;
        let Some(created_at) = tables.departments.get(&dept.id).map(|d| d.created_at) else {
            return Err(DbErr::RecordNotFound(format!("department {}", dept.id)));
        };
        tables.check_parent(dept.parent_id)?;
        tables.check_sibling_name(&dept.name, dept.parent_id, Some(dept.id))?;
        if let Some(parent_id) = dept.parent_id {
            if parent_id == dept.id || tables.descendant_ids(dept.id, u32::MAX).contains(&parent_id) {
                return Err(DbErr::Custom(format!(
                    "check violation: department {} cannot be moved under its own descendant",
                    dept.id
                )));
            }
        }

        let updated = Department {
            created_at,
            ..dept.clone()
        };
        tables.departments.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete_department(&self, id: i32) -> Result<(), DbErr> {
        self.tables()?.remove_subtree(id);
        Ok(())
    }

    async fn get_direct_children(&self, parent_id: Option<i32>) -> Result<Vec<Department>, DbErr> {
        Ok(self
            .tables()?
            .departments
            .values()
            .filter(|d| d.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn get_descendants(&self, root_id: i32, max_depth: u32) -> Result<Vec<Department>, DbErr> {
        if max_depth < 2 {
            return Ok(Vec::new());
        }
        let tables = self.tables()?;
        let mut ids = tables.descendant_ids(root_id, max_depth - 1);
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .filter_map(|id| tables.departments.get(&id).cloned())
            .collect())
    }

    async fn get_ancestors(&self, id: i32) -> Result<Vec<Department>, DbErr> {
        Ok(self.tables()?.ancestors(id))
    }

    async fn get_by_name_and_parent(&self, name: &str, parent_id: Option<i32>) -> Result<Option<Department>, DbErr> {
        Ok(self
            .tables()?
            .departments
            .values()
            .find(|d| d.parent_id == parent_id && d.name == name)
            .cloned())
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn create_employee(&self, data: CreateEmployee) -> Result<Employee, DbErr> {
        let mut tables = self.tables()?;
        tables.check_department(data.department_id)?;

        tables.last_employee_id += 1;
        let emp = Employee {
            id: tables.last_employee_id,
            department_id: data.department_id,
            full_name: data.full_name,
            position: data.position,
            hired_at: data.hired_at,
            created_at: Utc::now(),
        };
        tables.employees.insert(emp.id, emp.clone());
        Ok(emp)
    }

    async fn get_employee(&self, id: i32) -> Result<Option<Employee>, DbErr> {
        Ok(self.tables()?.employees.get(&id).cloned())
    }

    async fn update_employee(&self, emp: &Employee) -> Result<Employee, DbErr> {
        let mut tables = self.tables()?;
        let Some(created_at) = tables.employees.get(&emp.id).map(|e| e.created_at) else {
            return Err(DbErr::RecordNotFound(format!("employee {}", emp.id)));
        };
        tables.check_department(emp.department_id)?;

        let updated = Employee {
            created_at,
            ..emp.clone()
        };
        tables.employees.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete_employee(&self, id: i32) -> Result<bool, DbErr> {
        Ok(self.tables()?.employees.remove(&id).is_some())
    }

    async fn list_employees_by_department(
        &self,
        department_id: i32,
        order: EmployeeOrder,
    ) -> Result<Vec<Employee>, DbErr> {
        let mut employees: Vec<Employee> = self
            .tables()?
            .employees
            .values()
            .filter(|e| e.department_id == department_id)
            .cloned()
            .collect();
        match order {
            EmployeeOrder::CreatedAt => employees.sort_by_key(|e| (e.created_at, e.id)),
            EmployeeOrder::FullName => employees.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id))),
        }
        Ok(employees)
    }

    async fn move_employees(&self, from: i32, to: i32) -> Result<u64, DbErr> {
        let mut tables = self.tables()?;
        tables.check_department(to)?;
        Ok(tables.move_employees(from, to))
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn reassign_and_delete(&self, from: i32, to: i32) -> Result<u64, DbErr> {
        // Both steps happen under one guard; nothing is changed on failure.
        let mut tables = self.tables()?;
        tables.check_department(from)?;
        tables.check_department(to)?;
        if from == to {
            return Err(DbErr::Custom(format!("cannot reassign department {from} to itself")));
        }

        let moved = tables.move_employees(from, to);
        tables.remove_subtree(from);
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn dept(store: &MemoryStore, name: &str, parent_id: Option<i32>) -> Department {
        store
            .create_department(CreateDepartment {
                name: name.to_string(),
                parent_id,
            })
            .await
            .unwrap()
    }

    async fn emp(store: &MemoryStore, department_id: i32, full_name: &str) -> Employee {
        store
            .create_employee(CreateEmployee {
                department_id,
                full_name: full_name.to_string(),
                position: "Engineer".to_string(),
                hired_at: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        assert_eq!(dept(&store, "A", None).await.id, 1);
        assert_eq!(dept(&store, "B", None).await.id, 2);
    }

    #[tokio::test]
    async fn test_descendants_respect_depth_and_order() {
        let store = MemoryStore::new();
        let root = dept(&store, "Root", None).await; // 1
        let a = dept(&store, "A", Some(root.id)).await; // 2
        let b = dept(&store, "B", Some(a.id)).await; // 3
        let c = dept(&store, "C", Some(root.id)).await; // 4
        dept(&store, "D", Some(b.id)).await; // 5

        assert!(store.get_descendants(root.id, 1).await.unwrap().is_empty());

        let ids = |v: Vec<Department>| v.into_iter().map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(ids(store.get_descendants(root.id, 2).await.unwrap()), vec![a.id, c.id]);
        assert_eq!(ids(store.get_descendants(root.id, 3).await.unwrap()), vec![2, 3, 4]);
        assert_eq!(ids(store.get_descendants(root.id, 100).await.unwrap()), vec![2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_constraints_enforced() {
        let store = MemoryStore::new();
        let root = dept(&store, "Root", None).await;
        let child = dept(&store, "Child", Some(root.id)).await;

        let dup = store
            .create_department(CreateDepartment {
                name: "Root".to_string(),
                parent_id: None,
            })
            .await;
        assert!(dup.is_err());

        let orphan = store
            .create_department(CreateDepartment {
                name: "X".to_string(),
                parent_id: Some(99),
            })
            .await;
        assert!(orphan.is_err());

        let cyclic = Department {
            parent_id: Some(child.id),
            ..root.clone()
        };
        assert!(store.update_department(&cyclic).await.is_err());
        assert_eq!(store.get_department(root.id).await.unwrap().unwrap().parent_id, None);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_subtree_and_employees() {
        let store = MemoryStore::new();
        let root = dept(&store, "Root", None).await;
        let child = dept(&store, "Child", Some(root.id)).await;
        let other = dept(&store, "Other", None).await;
        emp(&store, child.id, "A").await;
        let kept = emp(&store, other.id, "B").await;

        store.delete_department(root.id).await.unwrap();

        assert!(store.get_department(child.id).await.unwrap().is_none());
        assert!(store.get_employee(1).await.unwrap().is_none());
        assert_eq!(store.get_employee(kept.id).await.unwrap(), Some(kept));
    }

    #[tokio::test]
    async fn test_ancestors_nearest_first() {
        let store = MemoryStore::new();
        let root = dept(&store, "Root", None).await;
        let a = dept(&store, "A", Some(root.id)).await;
        let b = dept(&store, "B", Some(a.id)).await;

        let chain: Vec<i32> = store.get_ancestors(b.id).await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(chain, vec![a.id, root.id]);
        assert!(store.get_ancestors(root.id).await.unwrap().is_empty());
        assert!(store.get_ancestors(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_orders() {
        let store = MemoryStore::new();
        let d = dept(&store, "D", None).await;
        emp(&store, d.id, "Zed").await;
        emp(&store, d.id, "Amy").await;

        let by_time = store
            .list_employees_by_department(d.id, EmployeeOrder::CreatedAt)
            .await
            .unwrap();
        assert_eq!(by_time[0].full_name, "Zed");

        let by_name = store
            .list_employees_by_department(d.id, EmployeeOrder::FullName)
            .await
            .unwrap();
        assert_eq!(by_name[0].full_name, "Amy");
    }

    #[tokio::test]
    async fn test_reassign_and_delete_is_all_or_nothing() {
        let store = MemoryStore::new();
        let from = dept(&store, "From", None).await;
        let to = dept(&store, "To", None).await;
        let a = emp(&store, from.id, "A").await;

        assert!(store.reassign_and_delete(from.id, 999).await.is_err());
        assert!(store.get_department(from.id).await.unwrap().is_some());
        assert_eq!(store.get_employee(a.id).await.unwrap().unwrap().department_id, from.id);

        assert_eq!(store.reassign_and_delete(from.id, to.id).await.unwrap(), 1);
        assert!(store.get_department(from.id).await.unwrap().is_none());
        assert_eq!(store.get_employee(a.id).await.unwrap().unwrap().department_id, to.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reassign_never_drops_concurrent_hires() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let from = dept(&store, "From", None).await;
        let to = dept(&store, "To", None).await;
        let from_id = from.id;

        let hires: Vec<_> = (0..32)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .create_employee(CreateEmployee {
                            department_id: from_id,
                            full_name: format!("E{i}"),
                            position: "Engineer".to_string(),
                            hired_at: None,
                        })
                        .await
                })
            })
            .collect();
        store.reassign_and_delete(from.id, to.id).await.unwrap();

        for hire in hires {
            // A hire either lands before the move and follows it, or finds the department gone.
            if let Ok(emp) = hire.await.unwrap() {
                let stored = store.get_employee(emp.id).await.unwrap().unwrap();
                assert_eq!(stored.department_id, to.id);
            }
        }
        assert!(store.get_department(from.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_employee_update_and_delete() {
        let store = MemoryStore::new();
        let a = dept(&store, "A", None).await;
        let b = dept(&store, "B", None).await;
        let e = emp(&store, a.id, "Eve").await;

        let moved = store
            .update_employee(&Employee {
                department_id: b.id,
                position: "Lead".to_string(),
                ..e.clone()
            })
            .await
            .unwrap();
        assert_eq!(moved.department_id, b.id);
        assert_eq!(moved.created_at, e.created_at);

        assert!(store.delete_employee(e.id).await.unwrap());
        assert!(!store.delete_employee(e.id).await.unwrap());
    }
}
