pub mod admin;
pub mod error;
pub mod policy;
pub mod post;
