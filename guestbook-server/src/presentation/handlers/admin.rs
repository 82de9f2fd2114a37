use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;

use crate::application::admin_service::AdminService;
use crate::data::admin_repository::PostgresAdminRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{AdminForm, AdminView, DestroyRequest};
use crate::presentation::handlers::request_id;
use crate::presentation::utils::AuthenticatedAdmin;

type Service = AdminService<PostgresAdminRepository>;

#[get("/admins")]
pub async fn index(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    let admins: Vec<AdminView> = service
        .list()
        .await?
        .into_iter()
        .map(AdminView::from)
        .collect();

    info!(
        request_id = %request_id(&req),
        admin = %admin.name,
        "admins retrieved"
    );

    Ok(HttpResponse::Ok().json(admins))
}

#[post("/admin/store")]
pub async fn store(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    payload: web::Json<AdminForm>,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    let stored = service.store(payload.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        admin = %admin.name,
        stored_id = %stored.id,
        "admin stored"
    );

    Ok(HttpResponse::Ok().json(AdminView::from(stored)))
}

#[post("/admin/destroy")]
pub async fn destroy(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    payload: web::Json<DestroyRequest>,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    service.destroy(payload.id).await?;

    info!(
        request_id = %request_id(&req),
        admin = %admin.name,
        destroyed_id = %payload.id,
        "admin destroyed"
    );

    Ok(HttpResponse::NoContent().finish())
}
