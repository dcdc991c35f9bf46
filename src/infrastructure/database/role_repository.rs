use async_trait::async_trait;

use super::connection::DbPool;
use super::rows::RoleRow;
use crate::application::ports::RoleLocalStore;
use crate::domain::entities::RoleRecord;
use crate::shared::error::{AppError, Result};

pub struct SqliteRoleRepository {
    pool: DbPool,
}

impl SqliteRoleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleLocalStore for SqliteRoleRepository {
    async fn insert(&self, role: &RoleRecord) -> Result<()> {
        sqlx::query("INSERT INTO roles (id, name, description) VALUES (?1, ?2, ?3)")
            .bind(role.id)
            .bind(&role.name)
            .bind(&role.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, role: &RoleRecord) -> Result<()> {
        let result = sqlx::query("UPDATE roles SET name = ?1, description = ?2 WHERE id = ?3")
            .bind(&role.name)
            .bind(&role.description)
            .bind(role.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role {}", role.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role {}", id)));
        }
        Ok(())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>("SELECT * FROM roles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RoleRecord::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<RoleRecord>> {
        let row = sqlx::query_as::<_, RoleRow>("SELECT * FROM roles WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RoleRecord::from))
    }

    async fn fetch_all(&self) -> Result<Vec<RoleRecord>> {
        let rows = sqlx::query_as::<_, RoleRow>("SELECT * FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RoleRecord::from).collect())
    }
}
