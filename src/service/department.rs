//! Department hierarchy service.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::Deadline;
use super::validation::validate_name;
use crate::config::HierarchyConfig;
use crate::error::{AppError, Result};
use crate::models::{CreateDepartment, DeleteMode, Department, DepartmentNode, EmployeeOrder, UpdateDepartment};
use crate::store::DirectoryStore;
use crate::tree;

/// Read options for [`DepartmentService::get_by_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepartmentQuery {
    /// Levels to include; 1 is the department alone.
    pub depth: u32,
    pub include_employees: bool,
    pub employee_order: EmployeeOrder,
}

impl Default for DepartmentQuery {
    fn default() -> Self {
        Self {
            depth: 1,
            include_employees: true,
            employee_order: EmployeeOrder::CreatedAt,
        }
    }
}

/// Create, read, update and delete departments while keeping the forest valid.
///
/// Structural mutations are serialized through a lock shared by all clones, so
/// the validate-then-write sequence of one mutation never interleaves with
/// another's.
pub struct DepartmentService<S> {
    store: Arc<S>,
    config: HierarchyConfig,
    write_lock: Arc<Mutex<()>>,
}

impl<S> Clone for DepartmentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<S: DirectoryStore> DepartmentService<S> {
    /// Create a new department service.
    pub fn new(store: Arc<S>, config: HierarchyConfig) -> Self {
        Self {
            store,
            config,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.config.request_timeout())
    }

    async fn require(&self, deadline: Deadline, id: i32) -> Result<Department> {
        deadline
            .run("load department", self.store.get_department(id))
            .await?
            .ok_or(AppError::NotFound(id))
    }

    async fn exists(&self, deadline: Deadline, context: &'static str, id: i32) -> Result<bool> {
        Ok(deadline.run(context, self.store.get_department(id)).await?.is_some())
    }

    /// Create a department under `parent_id`, or as a root when it is `None`.
    pub async fn create(&self, data: CreateDepartment) -> Result<Department> {
        let name = validate_name(&data.name)?;
        let deadline = self.deadline();
        let _guard = deadline.wait("acquire hierarchy lock", self.write_lock.lock()).await?;

        let existing = deadline
            .run(
                "check name uniqueness",
                self.store.get_by_name_and_parent(&name, data.parent_id),
            )
            .await?;
        if existing.is_some() {
            warn!("Rejected department '{}' under {:?}: name taken", name, data.parent_id);
            return Err(AppError::NameConflict(name));
        }

        if let Some(parent_id) = data.parent_id {
            if !self.exists(deadline, "check parent existence", parent_id).await? {
                return Err(AppError::ParentNotFound(parent_id));
            }
        }

        let dept = deadline
            .run(
                "create department",
                self.store.create_department(CreateDepartment {
                    name,
                    parent_id: data.parent_id,
                }),
            )
            .await?;

        info!("Created department {} '{}' (parent {:?})", dept.id, dept.name, dept.parent_id);
        Ok(dept)
    }

    /// Load a department with up to `query.depth - 1` levels of descendants.
    pub async fn get_by_id(&self, id: i32, query: DepartmentQuery) -> Result<DepartmentNode> {
        let max = self.config.max_read_depth;
        if query.depth < 1 || query.depth > max {
            return Err(AppError::InvalidDepth { depth: query.depth, max });
        }

        let deadline = self.deadline();
        let root = self.require(deadline, id).await?;
        let mut node = DepartmentNode::from(root);

        if query.include_employees {
            let employees = deadline
                .run(
                    "list department employees",
                    self.store.list_employees_by_department(id, query.employee_order),
                )
                .await?;
            node.employees = Some(employees);
        }

        if query.depth > 1 {
            let flat = deadline
                .run("load descendants", self.store.get_descendants(id, query.depth))
                .await?;
            node.children = tree::build_children(flat, id);
            debug!("Department {}: {} nodes within depth {}", id, node.subtree_len(), query.depth);
        }

        Ok(node)
    }

    /// Rename and/or reparent a department. Fields left as `None` are untouched.
    pub async fn update(&self, id: i32, data: UpdateDepartment) -> Result<Department> {
        let deadline = self.deadline();
        let _guard = deadline.wait("acquire hierarchy lock", self.write_lock.lock()).await?;

        let mut dept = self.require(deadline, id).await?;
        let effective_parent = data.parent_id.unwrap_or(dept.parent_id);

        if let Some(name) = &data.name {
            let name = validate_name(name)?;
            self.ensure_unique(deadline, &name, effective_parent, id).await?;
            dept.name = name;
        }

        if let Some(new_parent) = data.parent_id {
            if let Some(parent_id) = new_parent {
                if parent_id == id {
                    warn!("Rejected moving department {} under itself", id);
                    return Err(AppError::SelfParent);
                }
                if !self.exists(deadline, "check parent existence", parent_id).await? {
                    return Err(AppError::ParentNotFound(parent_id));
                }

                // The new parent must not sit anywhere below `id`.
                let ancestors = deadline
                    .run("load ancestors for cycle check", self.store.get_ancestors(parent_id))
                    .await?;
                if ancestors.iter().any(|d| d.id == id) {
                    warn!("Rejected moving department {} under its descendant {}", id, parent_id);
                    return Err(AppError::CycleDetected);
                }
            }

            // The current name must also be free among the new siblings.
            if data.name.is_none() && new_parent != dept.parent_id {
                self.ensure_unique(deadline, &dept.name, new_parent, id).await?;
            }
            dept.parent_id = new_parent;
        }

        let dept = deadline
            .run("update department", self.store.update_department(&dept))
            .await?;

        info!("Updated department {} '{}' (parent {:?})", dept.id, dept.name, dept.parent_id);
        Ok(dept)
    }

    async fn ensure_unique(&self, deadline: Deadline, name: &str, parent_id: Option<i32>, id: i32) -> Result<()> {
        let existing = deadline
            .run("check name uniqueness", self.store.get_by_name_and_parent(name, parent_id))
            .await?;
        match existing {
            Some(other) if other.id != id => {
                warn!("Rejected name '{}' for department {}: taken by {}", name, id, other.id);
                Err(AppError::NameConflict(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Delete a department.
    ///
    /// `Cascade` removes the whole subtree. `Reassign` only accepts leaves: the
    /// employees are moved to `reassign_to` and the department is removed in one
    /// atomic store operation.
    pub async fn delete(&self, id: i32, mode: DeleteMode, reassign_to: Option<i32>) -> Result<()> {
        let deadline = self.deadline();
        let _guard = deadline.wait("acquire hierarchy lock", self.write_lock.lock()).await?;

        self.require(deadline, id).await?;
        self.delete_existing(deadline, id, mode, reassign_to).await
    }

    /// Like [`delete`](Self::delete) with the mode given by name, as received
    /// from a caller. An unknown department is reported before an unknown mode.
    pub async fn delete_by_mode_name(&self, id: i32, mode: &str, reassign_to: Option<i32>) -> Result<()> {
        let deadline = self.deadline();
        let _guard = deadline.wait("acquire hierarchy lock", self.write_lock.lock()).await?;

        self.require(deadline, id).await?;
        let mode: DeleteMode = mode.parse()?;
        self.delete_existing(deadline, id, mode, reassign_to).await
    }

    async fn delete_existing(
        &self,
        deadline: Deadline,
        id: i32,
        mode: DeleteMode,
        reassign_to: Option<i32>,
    ) -> Result<()> {
        match mode {
            DeleteMode::Cascade => {
                deadline
                    .run("delete department", self.store.delete_department(id))
                    .await?;
                info!("Deleted department {} with its subtree", id);
            }
            DeleteMode::Reassign => {
                let target = reassign_to.ok_or(AppError::ReassignTargetRequired)?;
                if !self.exists(deadline, "check reassign target", target).await? {
                    return Err(AppError::TargetDepartmentNotFound(target));
                }
                if target == id {
                    return Err(AppError::ReassignToSelf);
                }

                let children = deadline
                    .run("load direct children", self.store.get_direct_children(Some(id)))
                    .await?;
                if !children.is_empty() {
                    warn!("Rejected reassign delete of {}: {} children", id, children.len());
                    return Err(AppError::ReassignWithChildren);
                }

                let moved = deadline
                    .run(
                        "reassign employees and delete department",
                        self.store.reassign_and_delete(id, target),
                    )
                    .await?;
                info!("Deleted department {}, moved {} employees to {}", id, moved, target);
            }
        }

        Ok(())
    }
}
