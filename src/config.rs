use serde::Deserialize;

const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:5174,https://epicemporium-e6ce4.web.app";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    /// `Secure; SameSite=None` on the token cookie when true.
    pub production: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "emporium".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "emporium-users".into()),
            ttl_days: parse_ttl_days(std::env::var("JWT_TTL_DAYS").ok().as_deref())?,
        };
        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
        );
        Ok(Self {
            database_url,
            max_connections,
            jwt,
            production,
            cors_origins,
        })
    }
}

/// Token lifetime in days; unset means 365, anything outside 1..=36500 is fatal.
fn parse_ttl_days(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(365);
    };
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("JWT_TTL_DAYS={raw:?} is not a number: {e}"))?;
    anyhow::ensure!(
        (1..=36500).contains(&days),
        "JWT_TTL_DAYS={days} out of range 1..=36500"
    );
    Ok(days)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
