mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::admin_service::AdminService;
use crate::application::post_service::PostService;
use crate::data::admin_repository::PostgresAdminRepository;
use crate::data::post_repository::PostgresPostRepository;
use crate::infrastructure::assets::FsAssetStore;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database::{create_pool, run_migrations};
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::{JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    let config = AppConfig::from_env().expect("invalid configuration");
    let pool = create_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));
    let admin_repo = Arc::new(PostgresAdminRepository::new(pool.clone()));
    let assets = Arc::new(FsAssetStore::new(
        config.assets_root.clone(),
        config.public_assets_url.clone(),
    ));

    let post_service = PostService::new(Arc::clone(&post_repo), Arc::clone(&assets));
    let admin_service = AdminService::new(
        Arc::clone(&admin_repo),
        JwtKeys::new(config.jwt_secret.clone()),
    );

    admin_service
        .seed(&config.seed_admin_email, &config.seed_admin_password)
        .await
        .expect("failed to seed admin");

    let config_data = config.clone();

    HttpServer::new(move || {
        let cors = build_cors(&config_data);
        App::new()
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .wrap(TimingMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(post_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .route("/health", web::get().to(health))
            .service(handlers::post::index)
            .service(handlers::post::store)
            .service(handlers::post::destroy)
            .service(handlers::auth::login)
            .service(
                web::scope("")
                    .wrap(JwtAuthMiddleware::new(admin_service.keys().clone()))
                    .service(handlers::post::dashboard)
                    .service(handlers::post::store_as_admin)
                    .service(handlers::post::destroy_as_admin)
                    .service(handlers::admin::index)
                    .service(handlers::admin::store)
                    .service(handlers::admin::destroy),
            )
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
