use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, error::ErrorUnauthorized};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::application::admin_service::AdminService;
use crate::data::admin_repository::PostgresAdminRepository;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::JwtKeys;

#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub id: Uuid,
    pub name: String,
}

impl FromRequest for AuthenticatedAdmin {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedAdmin>() {
            Some(admin) => ready(Ok(admin.clone())),
            None => ready(Err(ErrorUnauthorized("missing authenticated admin"))),
        }
    }
}

pub async fn extract_admin_from_token(
    token: &str,
    keys: &JwtKeys,
    admin_service: &AdminService<PostgresAdminRepository>,
) -> Result<AuthenticatedAdmin, Error> {
    let claims = keys
        .verify_token(token)
        .map_err(|_| ErrorUnauthorized("invalid token"))?;
    let admin_id = Uuid::parse_str(&claims.sub).map_err(|_| ErrorUnauthorized("invalid token"))?;

    let admin = admin_service
        .get_admin(admin_id)
        .await
        .map_err(|_| ErrorUnauthorized("admin not found"))?;

    Ok(AuthenticatedAdmin {
        id: admin.id,
        name: admin.name,
    })
}

/// The requester's network origin, threaded explicitly into the ownership
/// policy and the post service rather than read from ambient request state.
///
/// The origin is the sole identity proxy for anonymous submitters, so it
/// must not be forgeable: the transport peer address is authoritative, and
/// `Forwarded`/`X-Forwarded-For` are honored only when the deployment sits
/// behind a trusted proxy (`AppConfig::trust_forwarded`).
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl FromRequest for ClientIp {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let trust_forwarded = req
            .app_data::<actix_web::web::Data<AppConfig>>()
            .map(|config| config.trust_forwarded)
            .unwrap_or(false);

        let ip = if trust_forwarded {
            req.connection_info()
                .realip_remote_addr()
                .map(normalize_origin)
                .unwrap_or_default()
        } else {
            req.peer_addr()
                .map(|sock| sock.ip().to_string())
                .unwrap_or_default()
        };

        if ip.is_empty() {
            ready(Err(actix_web::error::ErrorBadRequest(
                "could not determine request origin",
            )))
        } else {
            ready(Ok(ClientIp(ip)))
        }
    }
}

/// Forwarded headers and peer addresses sometimes carry a port; the recorded
/// origin is the bare address.
fn normalize_origin(addr: &str) -> String {
    if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
        return sock.ip().to_string();
    }
    addr.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test::TestRequest, web};

    fn config(trust_forwarded: bool) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            database_url: "postgres://localhost/guestbook".into(),
            jwt_secret: "test-secret".into(),
            cors_origins: Vec::new(),
            assets_root: "storage/public".into(),
            public_assets_url: "/storage".into(),
            seed_admin_email: "admin@example.com".into(),
            seed_admin_password: "root-password".into(),
            trust_forwarded,
        }
    }

    #[test]
    fn origin_is_stripped_of_port() {
        assert_eq!(normalize_origin("1.2.3.4:51234"), "1.2.3.4");
        assert_eq!(normalize_origin("1.2.3.4"), "1.2.3.4");
        assert_eq!(normalize_origin("[::1]:8080"), "::1");
    }

    #[actix_web::test]
    async fn forwarded_header_cannot_override_peer_address() {
        let req = TestRequest::default()
            .peer_addr("9.9.9.9:40000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "1.2.3.4"))
            .app_data(web::Data::new(config(false)))
            .to_http_request();

        let ip = ClientIp::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(ip.0, "9.9.9.9");
    }

    #[actix_web::test]
    async fn origin_defaults_to_peer_without_config() {
        let req = TestRequest::default()
            .peer_addr("9.9.9.9:40000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "1.2.3.4"))
            .to_http_request();

        let ip = ClientIp::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(ip.0, "9.9.9.9");
    }

    #[actix_web::test]
    async fn trusted_proxy_deployment_honors_forwarded_header() {
        let req = TestRequest::default()
            .peer_addr("10.0.0.1:40000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "1.2.3.4"))
            .app_data(web::Data::new(config(true)))
            .to_http_request();

        let ip = ClientIp::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(ip.0, "1.2.3.4");
    }
}
