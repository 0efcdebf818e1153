//! Table, index and trigger definitions for PostgreSQL.

use sea_orm::{ConnectionTrait, DbErr};
use tracing::info;

/// Idempotent DDL, applied in order.
const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS departments (
        id SERIAL PRIMARY KEY,
        name VARCHAR(200) NOT NULL,
        parent_id INTEGER REFERENCES departments(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    // Root departments share the "no parent" group.
    r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_departments_parent_name
        ON departments (COALESCE(parent_id, 0), name)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_departments_parent_id ON departments (parent_id)"#,
    r#"CREATE TABLE IF NOT EXISTS employees (
        id SERIAL PRIMARY KEY,
        department_id INTEGER NOT NULL REFERENCES departments(id) ON DELETE CASCADE,
        full_name VARCHAR(200) NOT NULL,
        position VARCHAR(200) NOT NULL,
        hired_at DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_employees_department_id ON employees (department_id)"#,
    r#"CREATE OR REPLACE FUNCTION departments_prevent_cycle() RETURNS trigger AS $$
    BEGIN
        IF NEW.parent_id IS NOT NULL AND EXISTS (
            WITH RECURSIVE ancestors AS (
                SELECT id, parent_id FROM departments WHERE id = NEW.parent_id
                UNION
                SELECT d.id, d.parent_id FROM departments d
                INNER JOIN ancestors a ON d.id = a.parent_id
            )
            SELECT 1 FROM ancestors WHERE id = NEW.id
        ) THEN
            RAISE EXCEPTION 'department % cannot be moved under its own descendant', NEW.id
                USING ERRCODE = 'check_violation';
        END IF;
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql"#,
    r#"DROP TRIGGER IF EXISTS departments_prevent_cycle ON departments"#,
    r#"CREATE TRIGGER departments_prevent_cycle
        BEFORE UPDATE OF parent_id ON departments
        FOR EACH ROW EXECUTE FUNCTION departments_prevent_cycle()"#,
];

/// Create tables, indexes and the acyclicity trigger if they do not exist yet.
pub async fn install<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    for statement in STATEMENTS {
        db.execute_unprepared(statement).await?;
    }
    info!("Schema installed ({} statements)", STATEMENTS.len());
    Ok(())
}
