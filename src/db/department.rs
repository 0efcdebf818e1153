//! Department repository with CRUD and hierarchy queries.

use chrono::Utc;
use sea_orm::*;

use crate::entities::{departments, prelude::*};
use crate::models::{CreateDepartment, Department};

/// Descendants of a department up to `$2` levels below it, ordered by id.
const DESCENDANTS_SQL: &str = r#"
    WITH RECURSIVE dept_tree AS (
        SELECT id, name, parent_id, created_at, 1 AS level
        FROM departments
        WHERE parent_id = $1
        UNION ALL
        SELECT d.id, d.name, d.parent_id, d.created_at, dt.level + 1
        FROM departments d
        INNER JOIN dept_tree dt ON d.parent_id = dt.id
        WHERE dt.level < $2
    )
    SELECT id, name, parent_id, created_at FROM dept_tree ORDER BY id
"#;

/// Ancestors of department `$1` up to its root, nearest first.
const ANCESTORS_SQL: &str = r#"
    WITH RECURSIVE ancestry AS (
        SELECT p.id, p.name, p.parent_id, p.created_at, 1 AS level
        FROM departments c
        INNER JOIN departments p ON p.id = c.parent_id
        WHERE c.id = $1
        UNION ALL
        SELECT p.id, p.name, p.parent_id, p.created_at, a.level + 1
        FROM departments p
        INNER JOIN ancestry a ON p.id = a.parent_id
    )
    SELECT id, name, parent_id, created_at FROM ancestry ORDER BY level
"#;

impl From<departments::Model> for Department {
    fn from(model: departments::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            parent_id: model.parent_id,
            created_at: model.created_at,
        }
    }
}

/// Get department by ID.
pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Department>, DbErr> {
    Ok(Departments::find_by_id(id).one(db).await?.map(Department::from))
}

/// Create a new department.
pub async fn create<C: ConnectionTrait>(db: &C, data: CreateDepartment) -> Result<Department, DbErr> {
    let model = departments::ActiveModel {
        name: Set(data.name),
        parent_id: Set(data.parent_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(model.insert(db).await?.into())
}

/// Persist name and parent of an existing department.
pub async fn update<C: ConnectionTrait>(db: &C, dept: &Department) -> Result<Department, DbErr> {
    let active = departments::ActiveModel {
        id: Unchanged(dept.id),
        name: Set(dept.name.clone()),
        parent_id: Set(dept.parent_id),
        created_at: NotSet,
    };
    Ok(active.update(db).await?.into())
}

/// Delete a department by ID. The foreign keys cascade to its subtree and employees.
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    let result = Departments::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Get child departments; `None` lists the roots.
pub async fn get_children<C: ConnectionTrait>(db: &C, parent_id: Option<i32>) -> Result<Vec<Department>, DbErr> {
    let filter = match parent_id {
        Some(id) => departments::Column::ParentId.eq(id),
        None => departments::Column::ParentId.is_null(),
    };
    let models = Departments::find()
        .filter(filter)
        .order_by_asc(departments::Column::Id)
        .all(db)
        .await?;
    Ok(models.into_iter().map(Department::from).collect())
}

/// Get descendants of `root_id` within `max_depth` levels (the root itself being level 1).
pub async fn get_descendants<C: ConnectionTrait>(
    db: &C,
    root_id: i32,
    max_depth: u32,
) -> Result<Vec<Department>, DbErr> {
    if max_depth < 2 {
        return Ok(Vec::new());
    }
    let max_level = i32::try_from(max_depth - 1).unwrap_or(i32::MAX);

    let models = Departments::find()
        .from_raw_sql(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            DESCENDANTS_SQL,
            [root_id.into(), max_level.into()],
        ))
        .all(db)
        .await?;
    Ok(models.into_iter().map(Department::from).collect())
}

/// Get the ancestor chain of `id`, nearest first.
///
/// Terminates because the `departments_prevent_cycle` trigger keeps the forest free of cycles.
pub async fn get_ancestors<C: ConnectionTrait>(db: &C, id: i32) -> Result<Vec<Department>, DbErr> {
    let models = Departments::find()
        .from_raw_sql(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            ANCESTORS_SQL,
            [id.into()],
        ))
        .all(db)
        .await?;
    Ok(models.into_iter().map(Department::from).collect())
}

/// Find the sibling named `name` under `parent_id`.
pub async fn get_by_name_and_parent<C: ConnectionTrait>(
    db: &C,
    name: &str,
    parent_id: Option<i32>,
) -> Result<Option<Department>, DbErr> {
    let parent_filter = match parent_id {
        Some(id) => departments::Column::ParentId.eq(id),
        None => departments::Column::ParentId.is_null(),
    };
    let model = Departments::find()
        .filter(departments::Column::Name.eq(name))
        .filter(parent_filter)
        .one(db)
        .await?;
    Ok(model.map(Department::from))
}
