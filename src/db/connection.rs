//! Connection pool setup and the server snapshot shown by `status`.

use std::time::Duration;

use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Statement,
};
use serde::Serialize;
use tracing::debug;
use tracing::log::LevelFilter;

use crate::config::DatabaseConfig;
use crate::entities::{departments, prelude::*};

/// Deepest level of the forest, roots being level 1. Zero when there are no departments.
const FOREST_DEPTH_SQL: &str = r#"
    WITH RECURSIVE levels AS (
        SELECT id, 1 AS level FROM departments WHERE parent_id IS NULL
        UNION ALL
        SELECT d.id, l.level + 1
        FROM departments d
        INNER JOIN levels l ON d.parent_id = l.id
    )
    SELECT COALESCE(MAX(level), 0) AS depth FROM levels
"#;

/// Open a pool sized by `config.max_connections`.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.connection_string());
    options
        .max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    debug!(
        "Connecting to {}:{}/{} as {} (pool {})",
        config.host, config.port, config.name, config.username, config.max_connections
    );
    Database::connect(options).await
}

/// Round trip to the server.
pub async fn ping(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.ping().await
}

/// What `status` reports about the directory database.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryStatus {
    pub server_version: String,
    pub departments: u64,
    pub root_departments: u64,
    pub employees: u64,
    /// Levels in the deepest branch.
    pub forest_depth: i32,
}

pub async fn directory_status(db: &DatabaseConnection) -> Result<DirectoryStatus, DbErr> {
    let version = db
        .query_one(Statement::from_string(DatabaseBackend::Postgres, "SHOW server_version"))
        .await?;
    let server_version = match version {
        Some(row) => row.try_get::<String>("", "server_version")?,
        None => "unknown".to_owned(),
    };

    let depth = db
        .query_one(Statement::from_string(DatabaseBackend::Postgres, FOREST_DEPTH_SQL))
        .await?;
    let forest_depth = match depth {
        Some(row) => row.try_get::<i32>("", "depth")?,
        None => 0,
    };

    Ok(DirectoryStatus {
        server_version,
        departments: Departments::find().count(db).await?,
        root_departments: Departments::find()
            .filter(departments::Column::ParentId.is_null())
            .count(db)
            .await?,
        employees: Employees::find().count(db).await?,
        forest_depth,
    })
}
