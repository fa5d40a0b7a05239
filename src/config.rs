use anyhow::Context;
use std::str::FromStr;

const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug)]
pub struct Config {
    database_url: String,
    server_port: u16,
    jwt_secret: String,
    api_username: String,
    api_password_hash: String,
    token_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = load_env("DATABASE_URL")?;
        let server_port = load_env("SERVER_PORT")?;
        let jwt_secret = load_env("JWT_SECRET")?;
        let api_username = load_env("API_USERNAME")?;
        let api_password_hash = load_env("API_PASSWORD_HASH")?;
        let token_ttl_secs = load_env_or("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        Ok(Self {
            database_url,
            server_port,
            jwt_secret,
            api_username,
            api_password_hash,
            token_ttl_secs,
        })
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    #[must_use]
    pub const fn server_port(&self) -> u16 {
        self.server_port
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    #[must_use]
    pub fn api_username(&self) -> &str {
        &self.api_username
    }

    #[must_use]
    pub fn api_password_hash(&self) -> &str {
        &self.api_password_hash
    }

    #[must_use]
    pub const fn token_ttl_secs(&self) -> u64 {
        self.token_ttl_secs
    }
}

fn load_env<T>(key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let val =
        std::env::var(key).with_context(|| format!("Failed to load environment variable {key}"))?;
    val.parse::<T>()
        .with_context(|| format!("Failed to parse environment variable {key}"))
}

fn load_env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .with_context(|| format!("Failed to parse environment variable {key}")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("Failed to load environment variable {key}")),
    }
}
