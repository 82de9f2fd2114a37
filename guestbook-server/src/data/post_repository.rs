use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::Post;

/// Sortable columns for the public listing. Anything outside this enum never
/// reaches the query string; unknown input falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumn {
    CreatedAt,
    UpdatedAt,
    Name,
}

impl OrderColumn {
    pub fn parse(input: Option<&str>) -> Self {
        match input {
            Some("created_at") => OrderColumn::CreatedAt,
            Some("updated_at") => OrderColumn::UpdatedAt,
            Some("name") => OrderColumn::Name,
            _ => OrderColumn::CreatedAt,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderColumn::CreatedAt => "created_at",
            OrderColumn::UpdatedAt => "updated_at",
            OrderColumn::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(input: Option<&str>) -> Self {
        match input {
            Some("asc") => OrderDirection::Asc,
            _ => OrderDirection::Desc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError>;
    /// Lookup scoped by id AND origin AND recency, so an out-of-window or
    /// wrong-origin request cannot even locate the row it does not own.
    async fn find_owned(
        &self,
        id: Uuid,
        ip_address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError>;
    async fn update(&self, post: &Post) -> Result<Option<Post>, DomainError>;
    /// Update with the same scoped predicate as [`find_owned`], closing the
    /// race between eligibility check and mutation.
    async fn update_owned(
        &self,
        post: &Post,
        ip_address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    async fn delete_owned(
        &self,
        id: Uuid,
        ip_address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, DomainError>;
    async fn list(
        &self,
        column: OrderColumn,
        direction: OrderDirection,
        page: u32,
        page_size: u32,
    ) -> Result<PostPage, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, name, email, text, ip_address, image, created_at, updated_at";

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, name, email, text, ip_address, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(post.id)
        .bind(&post.name)
        .bind(&post.email)
        .bind(&post.text)
        .bind(&post.ip_address)
        .bind(&post.image)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            super::db_error(e)
        })?;

        info!(post_id = %post.id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            super::db_error(e)
        })
    }

    async fn find_owned(
        &self,
        id: Uuid,
        ip_address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1 AND ip_address = $2 AND created_at >= $3",
            POST_COLUMNS
        ))
        .bind(id)
        .bind(ip_address)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_owned {}: {}", id, e);
            super::db_error(e)
        })
    }

    async fn update(&self, post: &Post) -> Result<Option<Post>, DomainError> {
        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET name = $1, email = $2, text = $3, image = $4, updated_at = $5
            WHERE id = $6
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&post.name)
        .bind(&post.email)
        .bind(&post.text)
        .bind(&post.image)
        .bind(post.updated_at)
        .bind(post.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", post.id, e);
            super::db_error(e)
        })?;

        if updated.is_some() {
            info!(post_id = %post.id, "post updated");
        }
        Ok(updated)
    }

    async fn update_owned(
        &self,
        post: &Post,
        ip_address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError> {
        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET name = $1, email = $2, text = $3, image = $4, updated_at = $5
            WHERE id = $6 AND ip_address = $7 AND created_at >= $8
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&post.name)
        .bind(&post.email)
        .bind(&post.text)
        .bind(&post.image)
        .bind(post.updated_at)
        .bind(post.id)
        .bind(ip_address)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", post.id, e);
            super::db_error(e)
        })?;

        if updated.is_some() {
            info!(post_id = %post.id, "post updated");
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(super::db_error)?;

        if deleted.rows_affected() > 0 {
            info!(post_id = %id, "post deleted");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_owned(
        &self,
        id: Uuid,
        ip_address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let deleted =
            sqlx::query("DELETE FROM posts WHERE id = $1 AND ip_address = $2 AND created_at >= $3")
                .bind(id)
                .bind(ip_address)
                .bind(cutoff)
                .execute(&self.pool)
                .await
                .map_err(super::db_error)?;

        if deleted.rows_affected() > 0 {
            info!(post_id = %id, "post deleted");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(
        &self,
        column: OrderColumn,
        direction: OrderDirection,
        page: u32,
        page_size: u32,
    ) -> Result<PostPage, DomainError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100) as i64;
        let offset = (page as i64 - 1) * page_size;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("db error counting posts: {}", e);
                super::db_error(e)
            })?;

        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts ORDER BY {} {} LIMIT $1 OFFSET $2",
            POST_COLUMNS,
            column.as_str(),
            direction.as_str()
        ))
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching posts: {}", e);
            super::db_error(e)
        })?;

        Ok(PostPage { posts, total })
    }
}
