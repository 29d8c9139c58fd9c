//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials for the hosted document and blob store.
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub db_path: PathBuf,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub recipe_model: String,
    pub gemini_api_key: Option<String>,
    pub image_model: String,
    pub image_max_attempts: u32,
    pub image_retry_base_delay: Duration,
    pub supabase: Option<SupabaseConfig>,
    pub image_bucket: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &var("BIND_ADDRESS", "0.0.0.0:4000"))?;
        let db_path = PathBuf::from(var("DB_PATH", "./recipes.db"));
        let db_max_connections: u32 = parse_var("DB_MAX_CONNECTIONS", &var("DB_MAX_CONNECTIONS", "4"))?;
        if db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let log_level_str = var("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Provider Keys (as optional) ---
        let openai_api_key = non_blank(lookup("OPENAI_API_KEY"));
        let gemini_api_key = non_blank(lookup("GEMINI_API_KEY"));
        let supabase = match (
            non_blank(lookup("SUPABASE_URL")),
            non_blank(lookup("SUPABASE_SERVICE_ROLE_KEY")),
        ) {
            (Some(url), Some(service_role_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                service_role_key,
            }),
            (Some(_), None) => return Err(ConfigError::MissingVar("SUPABASE_SERVICE_ROLE_KEY".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingVar("SUPABASE_URL".to_string())),
            (None, None) => None,
        };

        // --- Adapter-specific Settings ---
        let recipe_model = var("RECIPE_MODEL", "gpt-4.1");
        let image_model = var("IMAGE_MODEL", "gemini-2.5-flash-image");
        let image_max_attempts: u32 = parse_var("IMAGE_MAX_ATTEMPTS", &var("IMAGE_MAX_ATTEMPTS", "3"))?;
        if image_max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "IMAGE_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let base_delay_ms: u64 =
            parse_var("IMAGE_RETRY_BASE_DELAY_MS", &var("IMAGE_RETRY_BASE_DELAY_MS", "1000"))?;
        let image_bucket = var("IMAGE_BUCKET", "recipe-images");

        Ok(Self {
            bind_address,
            db_path,
            db_max_connections,
            log_level,
            openai_api_key,
            recipe_model,
            gemini_api_key,
            image_model,
            image_max_attempts,
            image_retry_base_delay: Duration::from_millis(base_delay_ms),
            supabase,
            image_bucket,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
