use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::admin::Admin;
use crate::domain::policy;
use crate::domain::post::Post;
use crate::infrastructure::assets::AssetStore;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(rename = "token_type")]
    pub token_type: String, // "Bearer"
}

// ======================= POSTS =======================

/// Fields of the post submission form. `id` turns the submission into an
/// update (in-window for the anonymous path, unrestricted for admins).
#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DestroyRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub order_column: Option<String>,
    pub order_direction: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(10)
    }
}

/// Client-facing projection of a post. `email` and `ip_address` never leave
/// the server; `editable` and `image_url` are derived here, at the boundary,
/// not stored on the entity.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub name: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub editable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    pub fn render(
        post: &Post,
        requester_ip: &str,
        now: DateTime<Utc>,
        assets: &dyn AssetStore,
    ) -> Self {
        Self {
            id: post.id,
            name: post.name.clone(),
            text: post.text.clone(),
            image_url: post.image.as_deref().map(|r| assets.url_for(r)),
            editable: policy::is_mutable(post, requester_ip, now),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostPageView {
    pub posts: Vec<PostView>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub order_column: &'static str,
    pub order_direction: &'static str,
}

// ======================= ADMINS =======================

#[derive(Debug, Clone, Deserialize)]
pub struct AdminForm {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// The password hash is never serialized outward.
#[derive(Debug, Serialize)]
pub struct AdminView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Admin> for AdminView {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}
