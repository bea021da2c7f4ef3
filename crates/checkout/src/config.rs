//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HEARTHSIDE_BACKEND_URL` - Base URL of the commerce backend API
//! - `HEARTHSIDE_BACKEND_TOKEN` - Backend API bearer token
//!
//! ## Optional
//! - `HEARTHSIDE_STORE_NAME` - Store display name (default: Hearthside Foods)
//! - `HEARTHSIDE_FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping is
//!   free (default: 500)
//! - `HEARTHSIDE_DEFAULT_COUNTRY` - Country used when a profile address has
//!   none (default: India)
//! - `HEARTHSIDE_CURRENCY` - ISO 4217 currency code (default: INR)
//! - `HEARTHSIDE_TRACKING_URL` - Funnel tracking endpoint; tracking is
//!   disabled when unset

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use hearthside_core::CurrencyCode;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
    /// An environment variable could not be parsed.
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout orchestrator configuration.
///
/// Implements `Debug` manually to redact the backend token.
#[derive(Clone)]
pub struct CheckoutConfig {
    /// Base URL of the commerce backend API.
    pub backend_base_url: Url,
    /// Backend API bearer token.
    pub backend_api_token: SecretString,
    /// Store display name, carried on order payloads.
    pub store_name: String,
    /// Subtotal at or above which shipping is forced to zero.
    pub free_shipping_threshold: Decimal,
    /// Country used when a profile address carries none.
    pub default_country: String,
    /// Storefront currency.
    pub currency: CurrencyCode,
    /// Funnel tracking endpoint; tracking is disabled when unset.
    pub tracking_url: Option<Url>,
}

impl std::fmt::Debug for CheckoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutConfig")
            .field("backend_base_url", &self.backend_base_url.as_str())
            .field("backend_api_token", &"[REDACTED]")
            .field("store_name", &self.store_name)
            .field("free_shipping_threshold", &self.free_shipping_threshold)
            .field("default_country", &self.default_country)
            .field("currency", &self.currency)
            .field("tracking_url", &self.tracking_url)
            .finish()
    }
}

impl CheckoutConfig {
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

        let backend_base_url = get_required_env("HEARTHSIDE_BACKEND_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("HEARTHSIDE_BACKEND_URL".to_owned(), e.to_string())
            })?;
        let backend_api_token =
            SecretString::from(get_required_env("HEARTHSIDE_BACKEND_TOKEN")?);

        let store_name = get_env_or_default("HEARTHSIDE_STORE_NAME", "Hearthside Foods");
        let free_shipping_threshold =
            get_env_or_default("HEARTHSIDE_FREE_SHIPPING_THRESHOLD", "500")
                .parse::<Decimal>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "HEARTHSIDE_FREE_SHIPPING_THRESHOLD".to_owned(),
                        e.to_string(),
                    )
                })?;
        let default_country = get_env_or_default("HEARTHSIDE_DEFAULT_COUNTRY", "India");
        let currency = get_env_or_default("HEARTHSIDE_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("HEARTHSIDE_CURRENCY".to_owned(), e.to_string())
            })?;
        let tracking_url = get_optional_env("HEARTHSIDE_TRACKING_URL")
            .map(|raw| {
                raw.parse::<Url>().map_err(|e| {
                    ConfigError::InvalidEnvVar("HEARTHSIDE_TRACKING_URL".to_owned(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            backend_base_url,
            backend_api_token,
            store_name,
            free_shipping_threshold,
            default_country,
            currency,
            tracking_url,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
