//! Application configuration loaded from environment variables.
//!
//! Feeds are read once at startup; each feed setting is either a local
//! path or an `http(s)://` URL.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Feeds ---
    /// Region boundaries (GeoJSON, name in `NOM_REG`)
    pub regions_feed: String,
    /// Province boundaries (GeoJSON, name in `Nom`)
    pub provinces_feed: String,
    /// Transport station records (JSON array)
    pub stations_feed: String,
    /// Timeout for URL feeds
    pub feed_timeout_secs: u64,

    // --- Sessions ---
    /// Maximum number of live query sessions
    pub max_sessions: usize,
    /// Sessions untouched this long may be reclaimed
    pub session_idle_timeout_secs: u64,
}

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_SESSIONS: usize = 1024;
const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 30 * 60;

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            port: DEFAULT_PORT,
            regions_feed: "data/regions.geojson".to_string(),
            provinces_feed: "data/provinces.geojson".to_string(),
            stations_feed: "data/transport_stations.json".to_string(),
            feed_timeout_secs: DEFAULT_FEED_TIMEOUT_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every setting has a default suitable for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let max_sessions = parse_or("MAX_SESSIONS", DEFAULT_MAX_SESSIONS);
        if max_sessions == 0 {
            return Err(ConfigError::Invalid("MAX_SESSIONS must be at least 1"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            port: parse_or("PORT", DEFAULT_PORT),
            regions_feed: env::var("REGIONS_FEED").unwrap_or(defaults.regions_feed),
            provinces_feed: env::var("PROVINCES_FEED").unwrap_or(defaults.provinces_feed),
            stations_feed: env::var("STATIONS_FEED").unwrap_or(defaults.stations_feed),
            feed_timeout_secs: parse_or("FEED_TIMEOUT_SECS", DEFAULT_FEED_TIMEOUT_SECS),
            max_sessions,
            session_idle_timeout_secs: parse_or(
                "SESSION_IDLE_TIMEOUT_SECS",
                DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            ),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
