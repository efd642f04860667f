/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    /// Permitted mail domains, in login-resolution order. Env var:
    /// `MAIL_DOMAINS`, comma-separated (e.g. "example.com,mail.example.com").
    pub mail_domains: Vec<String>,
    /// TCP port to listen on (default 3111). Env var: `AUTH_PORT`.
    pub auth_port: u16,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL").expect("REDIS_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            mail_domains: parse_domains(&std::env::var("MAIL_DOMAINS").expect("MAIL_DOMAINS")),
            auth_port: std::env::var("AUTH_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3111),
        }
    }
}

/// Split and normalize the domain list: trimmed, lowercased, without a
/// leading `@`, empty entries dropped. Order is preserved — login tries
/// domains in this order.
pub fn parse_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().trim_start_matches('@').to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}
