//! Application configuration loaded from environment variables.
//!
//! Token secrets and lifetimes are read once at startup; nothing re-reads
//! the environment after boot.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Directory where uploaded media files are stored
    pub media_dir: String,
    /// Whether token cookies carry the `Secure` attribute
    pub cookie_secure: bool,

    // --- Secrets ---
    /// Access-token signing secret (raw bytes)
    pub access_token_secret: Vec<u8>,
    /// Access-token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh-token signing secret (raw bytes)
    pub refresh_token_secret: Vec<u8>,
    /// Refresh-token lifetime in seconds
    pub refresh_token_ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "media".to_string()),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),

            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?
                .into_bytes(),
            access_token_ttl_secs: parse_ttl("ACCESS_TOKEN_TTL_SECS", 15 * 60)?,
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?
                .into_bytes(),
            refresh_token_ttl_secs: parse_ttl("REFRESH_TOKEN_TTL_SECS", 10 * 24 * 60 * 60)?,
        })
    }

    /// Default config for tests. Insecure cookies so assertions work over
    /// plain HTTP, and a relative media dir the test harness overrides.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            media_dir: "media".to_string(),
            cookie_secure: false,
            access_token_secret: b"test_access_secret_32_bytes_min!".to_vec(),
            access_token_ttl_secs: 15 * 60,
            refresh_token_secret: b"test_refresh_secret_32_bytes_ok!".to_vec(),
            refresh_token_ttl_secs: 10 * 24 * 60 * 60,
        }
    }
}

fn parse_ttl(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(var)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Malformed value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("ACCESS_TOKEN_SECRET", "env_access_secret");
        env::set_var("REFRESH_TOKEN_SECRET", "env_refresh_secret");
        env::remove_var("ACCESS_TOKEN_TTL_SECS");
        env::remove_var("REFRESH_TOKEN_TTL_SECS");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.access_token_secret, b"env_access_secret");
        assert_eq!(config.refresh_token_secret, b"env_refresh_secret");
        assert_eq!(config.access_token_ttl_secs, 15 * 60);
        assert_eq!(config.refresh_token_ttl_secs, 10 * 24 * 60 * 60);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_refresh_ttl_exceeds_access_ttl() {
        let config = Config::test_default();
        assert!(config.refresh_token_ttl_secs > config.access_token_ttl_secs);
    }
}
