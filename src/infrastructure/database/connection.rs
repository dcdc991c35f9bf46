use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use tracing::info;

use crate::domain::entities::RoleRecord;
use crate::shared::config::DatabaseConfig;
use crate::shared::error::Result;

pub type DbPool = Pool<Sqlite>;

pub struct Database;

impl Database {
    /// Open the pool, create the schema if absent and seed the default
    /// roles. Idempotent; runs once per process at startup.
    pub async fn initialize(config: &DatabaseConfig) -> Result<DbPool> {
        if let Some(path) = config.url.strip_prefix("sqlite:") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                if let Some(parent) = Path::new(path).parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| crate::shared::error::AppError::Storage(e.to_string()))?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        info!("Database connected: {}", config.url);

        Self::create_schema(&pool).await?;
        Self::seed_default_roles(&pool).await?;

        Ok(pool)
    }

    pub async fn create_schema(pool: &DbPool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS roles (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                lastname TEXT NOT NULL,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                firebase_uid TEXT,
                role_id INTEGER NOT NULL REFERENCES roles(id),
                needs_sync INTEGER NOT NULL DEFAULT 1,
                pending_password_change INTEGER NOT NULL DEFAULT 0,
                old_password_hash TEXT,
                registration_date TEXT NOT NULL,
                last_modified TEXT NOT NULL,
                password_changed_date TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Seed User/Admin/Guest exactly once: only when the role table is
    /// empty.
    pub async fn seed_default_roles(pool: &DbPool) -> Result<()> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles")
            .fetch_one(pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        for role in RoleRecord::defaults() {
            sqlx::query(
                "INSERT INTO roles (id, name, description) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO NOTHING",
            )
            .bind(role.id)
            .bind(&role.name)
            .bind(&role.description)
            .execute(pool)
            .await?;
        }

        info!("Seeded default roles");
        Ok(())
    }
}
