pub mod admin_repository;
pub mod post_repository;

use crate::domain::error::DomainError;

/// Backing-store I/O failures surface as retryable storage errors, not
/// internal ones; each request fails independently.
pub(crate) fn db_error(e: sqlx::Error) -> DomainError {
    DomainError::Storage(format!("database error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{ResponseError, http::StatusCode};

    #[test]
    fn database_failures_are_retryable_storage_errors() {
        let err = db_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DomainError::Storage(_)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
