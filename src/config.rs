use std::env;

pub const IN_MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` runs the service against an in-memory SQLite database.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    pub payment_api_url: String,
    pub payment_api_key: String,
    pub pg_key: String,
    pub school_id: String,
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    /// Orders at or below this amount may be approved without admin review.
    pub auto_approve_limit: f64,
    pub gateway_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3002);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let jwt_expires_hours = env::var("JWT_EXPIRES_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .unwrap_or(24);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let cors_origins = env::var("CORS_ORIGINS")
            .map(|origins| parse_origins(&origins))
            .unwrap_or_else(|_| vec![frontend_url.clone()]);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_expires_hours,
            payment_api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://dev-vanilla.edviron.com/erp".to_string()),
            payment_api_key: env::var("PAYMENT_API_KEY").unwrap_or_default(),
            pg_key: env::var("PG_KEY").unwrap_or_default(),
            school_id: env::var("SCHOOL_ID").unwrap_or_else(|_| "EDV DEMO SCHOOL".to_string()),
            frontend_url,
            cors_origins,
            auto_approve_limit: env::var("AUTO_APPROVE_LIMIT")
                .ok()
                .and_then(|l| l.parse::<f64>().ok())
                .unwrap_or(10_000.0),
            gateway_timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(15),
        })
    }

    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(IN_MEMORY_DATABASE_URL)
    }

    pub fn callback_url(&self) -> String {
        format!("{}/payment-success", self.frontend_url.trim_end_matches('/'))
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
