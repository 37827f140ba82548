use anyhow::Context;

/// Upper bound for `TOKEN_EXPIRE_MINUTES`: one year.
const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_host: String,
    pub app_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    /// `None` unless both client id and secret are set.
    pub google: Option<GoogleConfig>,
    /// `["*"]` means any origin.
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: non_empty("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: non_empty("JWT_ISSUER").unwrap_or_else(|| "rest-boilerplate".into()),
            ttl_minutes: parse_or("TOKEN_EXPIRE_MINUTES", non_empty("TOKEN_EXPIRE_MINUTES"), 60)?,
        };
        anyhow::ensure!(
            (1..=MAX_TOKEN_TTL_MINUTES).contains(&jwt.ttl_minutes),
            "TOKEN_EXPIRE_MINUTES: {} is outside 1..={MAX_TOKEN_TTL_MINUTES}",
            jwt.ttl_minutes
        );

        let google = match (non_empty("GOOGLE_CLIENT_ID"), non_empty("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_url: non_empty("GOOGLE_REDIRECT_URL").unwrap_or_else(|| {
                    "http://localhost:8080/api/v1/auth/google/callback".into()
                }),
            }),
            _ => None,
        };

        let allowed_origins = non_empty("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            app_host: non_empty("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            app_port: parse_or("APP_PORT", non_empty("APP_PORT"), 8080)?,
            database_url,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", non_empty("DB_MAX_CONNECTIONS"), 10)?,
            jwt,
            google,
            allowed_origins,
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key}: invalid value {v:?}: {e}")),
    }
}
