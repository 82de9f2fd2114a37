pub mod admin_service;
pub mod post_service;
pub mod validation;
