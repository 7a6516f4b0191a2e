//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for sessions
//!   (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BACKEND_API_URL` - Base URL of the shop REST backend
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_TIMEOUT_SECONDS` - Per-request timeout towards the backend (default: 10)
//! - `CATALOG_CACHE_TTL_SECONDS` - How long catalog reads are cached (default: 300)
//! - `SHOP_NAME` - Shop name used in titles and structured data (default: Yakimoto Dojo)
//! - `POSTNORD_DELIVERY_COST` - Postnord shipping fee in SEK (default: 82)
//! - `PICKUP_LOCATION` - Where pickup orders are collected (default: Alingsås Judoklubb)
//! - `FEATURED_CATEGORY` - Category shown as grouped hero panels on the home page
//! - `GA4_MEASUREMENT_ID` - Google Analytics 4 measurement ID
//! - `GOOGLE_ADS_ID` - Google Ads conversion ID
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use yakimoto_core::Price;
use yakimoto_core::checkout::DEFAULT_POSTNORD_COST;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// REST backend configuration
    pub backend: BackendConfig,
    /// Shop details shown to customers
    pub shop: ShopConfig,
    /// Analytics tracking configuration
    pub analytics: AnalyticsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Where and how to reach the shop REST backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL without trailing slash, e.g. `https://api.yakimoto.se`
    pub api_url: String,
    /// Timeout applied to every backend request
    pub timeout: Duration,
    /// Time-to-live of cached catalog reads
    pub cache_ttl: Duration,
}

/// Shop details that vary per deployment.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    pub name: String,
    pub postnord_cost: Price,
    pub pickup_location: String,
    pub featured_category: Option<String>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: "Yakimoto Dojo".to_string(),
            postnord_cost: Price::from_kronor(DEFAULT_POSTNORD_COST),
            pickup_location: "Alingsås Judoklubb".to_string(),
            featured_category: None,
        }
    }
}

/// Analytics tag configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsConfig {
    /// Google Analytics 4 measurement ID
    pub ga4_measurement_id: Option<String>,
    /// Google Ads conversion ID
    pub google_ads_id: Option<String>,
}

impl AnalyticsConfig {
    /// Whether any gtag-based tag should be rendered.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.ga4_measurement_id.is_some() || self.google_ads_id.is_some()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = trim_url(&get_required_env("STOREFRONT_BASE_URL")?);

        let backend = BackendConfig::from_env()?;
        let shop = ShopConfig::from_env()?;
        let analytics = AnalyticsConfig::from_env();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            backend,
            shop,
            analytics,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = trim_url(&get_required_env("BACKEND_API_URL")?);
        url::Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(parse_env("BACKEND_TIMEOUT_SECONDS", "10")?),
            cache_ttl: Duration::from_secs(parse_env("CATALOG_CACHE_TTL_SECONDS", "300")?),
        })
    }
}

impl ShopConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let postnord_cost = match get_optional_env("POSTNORD_DELIVERY_COST") {
            Some(raw) => Price::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("POSTNORD_DELIVERY_COST".to_string(), e.to_string())
            })?,
            None => defaults.postnord_cost,
        };

        Ok(Self {
            name: get_optional_env("SHOP_NAME").unwrap_or(defaults.name),
            postnord_cost,
            pickup_location: get_optional_env("PICKUP_LOCATION")
                .unwrap_or(defaults.pickup_location),
            featured_category: get_optional_env("FEATURED_CATEGORY"),
        })
    }
}

impl AnalyticsConfig {
    fn from_env() -> Self {
        Self {
            ga4_measurement_id: get_optional_env("GA4_MEASUREMENT_ID"),
            google_ads_id: get_optional_env("GOOGLE_ADS_ID"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://yakimoto.se".to_string(),
            backend: BackendConfig {
                api_url: "http://localhost:8000".to_string(),
                timeout: Duration::from_secs(10),
                cache_ttl: Duration::from_secs(300),
            },
            shop: ShopConfig::default(),
            analytics: AnalyticsConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure_follows_base_url() {
        let mut config = test_config();
        assert!(config.is_secure());
        config.base_url = "http://localhost:3000".to_string();
        assert!(!config.is_secure());
    }

    #[test]
    fn test_trim_url() {
        assert_eq!(trim_url(" http://api.local/ "), "http://api.local");
        assert_eq!(trim_url("http://api.local//"), "http://api.local");
    }

    #[test]
    fn test_shop_defaults() {
        let shop = ShopConfig::default();
        assert_eq!(shop.postnord_cost, Price::from_kronor(82));
        assert_eq!(shop.pickup_location, "Alingsås Judoklubb");
    }

    #[test]
    fn test_analytics_enabled() {
        assert!(!AnalyticsConfig::default().is_enabled());
        let analytics = AnalyticsConfig {
            ga4_measurement_id: Some("G-TEST".to_string()),
            google_ads_id: None,
        };
        assert!(analytics.is_enabled());
    }

    #[test]
    fn test_config_debug_redacts_database_url() {
        let debug_output = format!("{:?}", test_config());
        assert!(!debug_output.contains("postgres://localhost/test"));
    }
}
