//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKEND_BASE_URL` - Base URL of the document backend (profiles, orders)
//! - `BACKEND_API_KEY` - Backend API key (high entropy, not a placeholder)
//! - `MERCHANT_WHATSAPP_NUMBER` - Merchant number orders are sent to, digits only
//!
//! ## Optional
//! - `FRESHBASKET_HOST` - Bind address (default: 127.0.0.1)
//! - `FRESHBASKET_PORT` - Listen port (default: 3000)
//! - `GEOCODER_BASE_URL` - Reverse geocoder (default: <https://nominatim.openstreetmap.org>)
//! - `GEOCODER_USER_AGENT` - User agent sent to the geocoder (default: FreshBasket/0.1)
//! - `GEOCODER_COOLDOWN_MS` - Minimum gap between geocoder calls (default: 1200)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_GEOCODER_USER_AGENT: &str = "FreshBasket/0.1";
const DEFAULT_GEOCODER_COOLDOWN_MS: u64 = 1200;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "api-key",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Document backend holding profiles and orders
    pub backend: BackendConfig,
    /// Order hand-off settings
    pub checkout: CheckoutConfig,
    /// Reverse geocoder settings
    pub geocoder: GeocoderConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Document backend configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://api.freshbasket.example/v1/`
    pub base_url: Url,
    /// API key sent as a bearer token
    pub api_key: SecretString,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Order hand-off configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Merchant WhatsApp number in international format without `+`
    pub merchant_whatsapp: String,
}

/// Reverse geocoder configuration.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible service
    pub base_url: Url,
    /// User agent required by the service's usage policy
    pub user_agent: String,
    /// Calls closer together than this are skipped
    pub cooldown: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            // constant, known to parse
            base_url: Url::parse(DEFAULT_GEOCODER_URL).unwrap_or_else(|_| unreachable!()),
            user_agent: DEFAULT_GEOCODER_USER_AGENT.to_string(),
            cooldown: Duration::from_millis(DEFAULT_GEOCODER_COOLDOWN_MS),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the backend API key fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("FRESHBASKET_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FRESHBASKET_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("FRESHBASKET_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FRESHBASKET_PORT".to_string(), e.to_string())
            })?;

        let backend = BackendConfig::from_env()?;
        let checkout = CheckoutConfig::from_env()?;
        let geocoder = GeocoderConfig::from_env()?;

        Ok(Self {
            host,
            port,
            backend,
            checkout,
            geocoder,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("BACKEND_BASE_URL", &get_required_env("BACKEND_BASE_URL")?)?,
            api_key: get_validated_secret("BACKEND_API_KEY")?,
        })
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("MERCHANT_WHATSAPP_NUMBER")?;
        Ok(Self {
            merchant_whatsapp: validate_whatsapp_number(&raw, "MERCHANT_WHATSAPP_NUMBER")?,
        })
    }
}

impl GeocoderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = match get_optional_env("GEOCODER_BASE_URL") {
            Some(raw) => parse_base_url("GEOCODER_BASE_URL", &raw)?,
            None => defaults.base_url,
        };
        let cooldown_ms = get_env_or_default(
            "GEOCODER_COOLDOWN_MS",
            &DEFAULT_GEOCODER_COOLDOWN_MS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("GEOCODER_COOLDOWN_MS".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            user_agent: get_optional_env("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent),
            cooldown: Duration::from_millis(cooldown_ms),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a sample rate in `0.0..=1.0`.
fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Parse a base URL, making sure it ends with `/` so joins append instead of
/// replacing the last path segment.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be a hierarchical http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Validate a WhatsApp number: optional leading `+`, then 8-15 digits.
fn validate_whatsapp_number(raw: &str, var_name: &str) -> Result<String, ConfigError> {
    let digits = raw.trim().trim_start_matches('+');
    if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be 8-15 digits in international format".to_string(),
        ));
    }
    Ok(digits.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
