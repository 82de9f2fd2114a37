use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A guestbook entry. `ip_address` is the submitter's network origin recorded
/// at creation time and is never serialized to clients; `image` is an opaque
/// asset-store reference, not a URL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub text: String,
    pub ip_address: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(name: String, email: String, text: String, ip_address: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            text,
            ip_address: Some(ip_address),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }
}
