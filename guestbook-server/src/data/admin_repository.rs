use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::admin::Admin;
use crate::domain::error::DomainError;

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, admin: Admin) -> Result<Admin, DomainError>;
    async fn update(&self, admin: &Admin) -> Result<Option<Admin>, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, DomainError>;
    /// Uniqueness check that ignores the record under edit.
    async fn email_taken_by_other(&self, email: &str, id: Option<Uuid>)
        -> Result<bool, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    async fn list(&self) -> Result<Vec<Admin>, DomainError>;
    async fn count(&self) -> Result<i64, DomainError>;
}

#[derive(Clone)]
pub struct PostgresAdminRepository {
    pool: PgPool,
}

impl PostgresAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRepository for PostgresAdminRepository {
    async fn create(&self, admin: Admin) -> Result<Admin, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(admin.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create admin: {}", e);
            if e.as_database_error()
                .and_then(|db| db.constraint())
                .map(|c| c.contains("admins_email"))
                == Some(true)
            {
                DomainError::EmailTaken(admin.email.clone())
            } else {
                super::db_error(e)
            }
        })?;

        info!(admin_id = %admin.id, email = %admin.email, "admin created");
        Ok(admin)
    }

    async fn update(&self, admin: &Admin) -> Result<Option<Admin>, DomainError> {
        let updated = sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admins
            SET name = $1, email = $2, password_hash = $3, updated_at = $4
            WHERE id = $5
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.updated_at)
        .bind(admin.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update admin {}: {}", admin.id, e);
            if e.as_database_error()
                .and_then(|db| db.constraint())
                .map(|c| c.contains("admins_email"))
                == Some(true)
            {
                DomainError::EmailTaken(admin.email.clone())
            } else {
                super::db_error(e)
            }
        })?;

        if updated.is_some() {
            info!(admin_id = %admin.id, "admin updated");
        }
        Ok(updated)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, DomainError> {
        sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find admin by id {}: {}", id, e);
            super::db_error(e)
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, DomainError> {
        sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find admin by email {}: {}", email, e);
            super::db_error(e)
        })
    }

    async fn email_taken_by_other(
        &self,
        email: &str,
        id: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM admins WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("db error checking admin email {}: {}", email, e);
            super::db_error(e)
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(super::db_error)?;

        if deleted.rows_affected() > 0 {
            info!(admin_id = %id, "admin deleted");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(&self) -> Result<Vec<Admin>, DomainError> {
        sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM admins
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching admins: {}", e);
            super::db_error(e)
        })
    }

    async fn count(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("db error counting admins: {}", e);
                super::db_error(e)
            })
    }
}
