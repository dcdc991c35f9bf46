use async_trait::async_trait;
use chrono::Utc;

use super::connection::DbPool;
use super::rows::{format_timestamp, UserRow};
use crate::application::ports::UserLocalStore;
use crate::domain::entities::{NewUser, UserRecord};
use crate::shared::error::{AppError, Result};

const SELECT_USER: &str = "SELECT * FROM users";

pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_required(&self, id: i64) -> Result<UserRecord> {
        self.fetch_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }
}

#[async_trait]
impl UserLocalStore for SqliteUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<UserRecord> {
        let now = format_timestamp(&Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                name, lastname, username, email, password, firebase_uid,
                role_id, needs_sync, pending_password_change, old_password_hash,
                registration_date, last_modified, password_changed_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, ?9, ?9, NULL)
            "#,
        )
        .bind(&user.name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.remote_id)
        .bind(user.role.id())
        .bind(user.needs_sync)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.fetch_required(result.last_insert_rowid()).await
    }

    async fn update(&self, user: &UserRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = ?1, lastname = ?2, username = ?3, email = ?4,
                password = ?5, firebase_uid = ?6, role_id = ?7,
                needs_sync = ?8, pending_password_change = ?9,
                old_password_hash = ?10, last_modified = ?11,
                password_changed_date = ?12
            WHERE id = ?13
            "#,
        )
        .bind(&user.name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.remote_id)
        .bind(user.role.id())
        .bind(user.needs_sync)
        .bind(user.pending_password_change)
        .bind(&user.old_password_hash)
        .bind(format_timestamp(&user.last_modified))
        .bind(user.password_changed_at.as_ref().map(format_timestamp))
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = ?1", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::into_record).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE email = ?1", SELECT_USER))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::into_record).transpose()
    }

    async fn fetch_all(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{} ORDER BY id", SELECT_USER))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(UserRow::into_record).collect()
    }

    async fn mark_synced(&self, id: i64, remote_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET firebase_uid = ?1, needs_sync = 0, last_modified = ?2 WHERE id = ?3",
        )
        .bind(remote_id)
        .bind(format_timestamp(&Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn clear_needs_sync(&self, id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE users SET needs_sync = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn records_needing_sync(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE needs_sync = 1 ORDER BY last_modified ASC",
            SELECT_USER
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_record).collect()
    }

    async fn pending_sync_count(&self) -> Result<u32> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE needs_sync = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u32)
    }

    async fn records_with_pending_password_change(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE pending_password_change = 1 ORDER BY last_modified ASC",
            SELECT_USER
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_record).collect()
    }

    async fn clear_pending_password_change(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET pending_password_change = 0, old_password_hash = NULL WHERE id = ?1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }
}
