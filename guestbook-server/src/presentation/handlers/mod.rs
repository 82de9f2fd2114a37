pub mod admin;
pub mod auth;
pub mod post;

use actix_web::{HttpMessage, HttpRequest};

use crate::presentation::middleware::RequestId;

pub(crate) fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}
