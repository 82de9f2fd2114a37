use actix_web::{HttpResponse, Responder, post, web};
use tracing::info;

use crate::application::admin_service::AdminService;
use crate::data::admin_repository::PostgresAdminRepository;
use crate::domain::error::DomainError;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::dto::{AuthResponse, LoginRequest};

#[post("/login")]
pub async fn login(
    service: web::Data<AdminService<PostgresAdminRepository>>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, DomainError> {
    let jwt = service.login(&payload.email, &payload.password).await?;

    info!(email = %payload.email, "admin logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: jwt,
        expires_in: JwtKeys::TOKEN_TTL_SECS,
        token_type: "Bearer".to_string(),
    }))
}
