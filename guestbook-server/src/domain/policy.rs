use chrono::{DateTime, Duration, Utc};

use crate::domain::post::Post;

/// How long after creation the original-origin submitter may edit or delete a
/// post. The client-visible `editable` flag and the server-side mutation check
/// both go through [`is_mutable`], so they can never disagree on this window.
pub fn edit_window() -> Duration {
    Duration::minutes(5)
}

/// True iff the requester's origin matches the post's recorded origin and the
/// post is at most `edit_window()` old. Boundary inclusive: a post exactly five
/// minutes old is still mutable. A post with no recorded origin is never
/// mutable by the anonymous path.
pub fn is_mutable(post: &Post, requester_ip: &str, now: DateTime<Utc>) -> bool {
    match post.ip_address.as_deref() {
        Some(origin) => origin == requester_ip && now - post.created_at <= edit_window(),
        None => false,
    }
}
