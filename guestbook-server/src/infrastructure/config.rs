use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Directory the filesystem asset store writes image blobs under.
    pub assets_root: String,
    /// Public prefix image URLs are built from, e.g. a CDN or nginx location.
    pub public_assets_url: String,
    pub seed_admin_email: String,
    pub seed_admin_password: String,
    /// Honor `Forwarded`/`X-Forwarded-For` when resolving the requester
    /// origin. Only for deployments behind a proxy that rewrites them; a
    /// directly reachable server must leave this off or anonymous ownership
    /// can be impersonated with a forged header.
    #[serde(default)]
    pub trust_forwarded: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let assets_root = std::env::var("ASSETS_ROOT").unwrap_or_else(|_| "storage/public".into());
        let public_assets_url =
            std::env::var("PUBLIC_ASSETS_URL").unwrap_or_else(|_| "/storage".into());
        let seed_admin_email =
            std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@gmail.com".into());
        let seed_admin_password = std::env::var("SEED_ADMIN_PASSWORD")
            .map_err(|_| anyhow::anyhow!("SEED_ADMIN_PASSWORD must be set"))?;
        let trust_forwarded = std::env::var("TRUST_FORWARDED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            cors_origins,
            assets_root,
            public_assets_url,
            seed_admin_email,
            seed_admin_password,
            trust_forwarded,
        })
    }
}
