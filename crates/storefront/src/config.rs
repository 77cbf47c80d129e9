//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VERDANT_BASE_URL` - Public URL for the storefront (https enables secure cookies)
//!
//! ## Optional
//! - `VERDANT_HOST` - Bind address (default: 127.0.0.1)
//! - `VERDANT_PORT` - Listen port (default: 3000)
//! - `VERDANT_CONTENT_DIR` - Catalog and markdown content (default: crates/storefront/content)
//! - `VERDANT_CART_IDLE_DAYS` - Days before an untouched cart is evicted (default: 7)
//! - `CART_TAX_RATE` - Sales tax rate as a fraction (default: 0.07)
//! - `CART_FREE_SHIPPING_THRESHOLD` - Subtotal that ships free (default: 50.00)
//! - `CART_FLAT_SHIPPING_FEE` - Shipping fee below the threshold (default: 5.99)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: development)
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;
use verdant_core::{CurrencyCode, PricingPolicy, PricingPolicyError};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid pricing configuration: {0}")]
    InvalidPricing(#[from] PricingPolicyError),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Directory holding `catalog.json`, `blog/` and `pages/`
    pub content_dir: PathBuf,
    /// How long a cart survives without being touched
    pub cart_idle_timeout: Duration,
    /// Tax and shipping rules
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: String,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.parsed_or("VERDANT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parsed_or("VERDANT_PORT", 3000_u16)?;
        let base_url = env.required("VERDANT_BASE_URL").and_then(|raw| {
            Url::parse(&raw)
                .map_err(|e| ConfigError::InvalidEnvVar("VERDANT_BASE_URL".to_string(), e.to_string()))
        })?;
        let content_dir = env
            .optional("VERDANT_CONTENT_DIR")
            .map_or_else(|| PathBuf::from("crates/storefront/content"), PathBuf::from);

        let idle_days = env.parsed_or("VERDANT_CART_IDLE_DAYS", 7_u64)?;
        if idle_days == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "VERDANT_CART_IDLE_DAYS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let cart_idle_timeout = Duration::from_secs(idle_days.saturating_mul(SECONDS_PER_DAY));

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy::new(
            env.parsed_or("CART_TAX_RATE", defaults.tax_rate())?,
            env.parsed_or("CART_FREE_SHIPPING_THRESHOLD", defaults.free_shipping_threshold())?,
            env.parsed_or("CART_FLAT_SHIPPING_FEE", defaults.flat_shipping_fee())?,
            CurrencyCode::USD,
        )?;

        Ok(Self {
            host,
            port,
            base_url,
            content_dir,
            cart_idle_timeout,
            pricing,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env
                .optional("SENTRY_ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
            sentry_sample_rate: env.parsed_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parsed_or("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Origin allowed to call the API cross-site, e.g. `https://shop.example.com`.
    #[must_use]
    pub fn allowed_origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}
