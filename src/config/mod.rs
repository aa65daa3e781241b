//! Configuration module for Food Buddy.
//!
//! Loads configuration from environment variables (and `.env`).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::generation::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Gemini
    /// Empty disables generation; every generation call then fails as not configured.
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,

    // Goong maps
    pub goong_api_key: Option<String>,
    pub goong_base_url: String,
    /// Place matches farther than this from the user are ignored.
    pub search_radius_km: f64,

    // Unsplash
    pub unsplash_access_key: Option<String>,
    pub unsplash_base_url: String,

    // MongoDB (shared remote tier, optional)
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub remote_timeout: Duration,

    // Local tier
    pub local_db_path: String,

    // Generation retries
    pub generation_max_retries: u32,
    pub generation_backoff: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let search_radius_km: f64 = parse(&var, "SEARCH_RADIUS_KM", 5.0)?;
        if !search_radius_km.is_finite() || search_radius_km <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "SEARCH_RADIUS_KM",
                value: search_radius_km.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }

        Ok(Self {
            gemini_api_key: or("GEMINI_API_KEY", ""),
            gemini_model: or("GEMINI_MODEL", "gemini-2.5-flash-lite"),
            gemini_base_url: or("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com"),
            goong_api_key: var("GOONG_API_KEY"),
            goong_base_url: or("GOONG_BASE_URL", "https://rsapi.goong.io"),
            search_radius_km,
            unsplash_access_key: var("UNSPLASH_ACCESS_KEY"),
            unsplash_base_url: or("UNSPLASH_BASE_URL", "https://api.unsplash.com"),
            mongodb_uri: var("MONGODB_URI"),
            mongodb_database: or("MONGODB_DATABASE", "food_buddy"),
            remote_timeout: Duration::from_millis(parse(&var, "REMOTE_TIMEOUT_MS", 800)?),
            local_db_path: or("LOCAL_DB_PATH", "food_buddy.db"),
            generation_max_retries: parse(&var, "GENERATION_MAX_RETRIES", 2)?,
            generation_backoff: Duration::from_millis(parse(&var, "GENERATION_BACKOFF_MS", 1000)?),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.generation_max_retries,
            base_delay: self.generation_backoff,
        }
    }
}

fn parse<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
