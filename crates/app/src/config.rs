//! App configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `APP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `APP_BASE_URL` - Public URL the Shopify admin embeds
//! - `SHOPIFY_API_KEY` - App client ID (the `aud` of session tokens)
//! - `SHOPIFY_API_SECRET` - App client secret (signs session tokens)
//! - `UPLOAD_ENDPOINT` - Object storage base URL that accepts `PUT` uploads
//! - `UPLOAD_PUBLIC_URL` - Public base URL for uploaded objects
//!
//! ## Optional
//! - `APP_HOST` - Bind address (default: 127.0.0.1)
//! - `APP_PORT` - Listen port (default: 3000)
//! - `UPLOAD_TOKEN` - Bearer token for the object storage endpoint
//! - `UPLOAD_MAX_BYTES` - Maximum decoded image size (default: 10 MiB)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - 0.0 to 1.0 (default 1.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Hard ceiling for `UPLOAD_MAX_BYTES`; the upload route's body limit is sized from it.
pub const UPLOAD_MAX_BYTES_CEILING: usize = 12 * 1024 * 1024;

/// Lowercase fragments that mark a client secret as a placeholder.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "placeholder",
    "example",
    "secret",
    "shpss_xxx",
    "xxxx",
    "todo",
    "replace",
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

/// App configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the app
    pub base_url: String,
    /// Shopify app credentials
    pub shopify: ShopifyAppConfig,
    /// Object storage for uploaded images
    pub upload: UploadConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app credentials.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client ID (`aud` claim of session tokens)
    pub api_key: String,
    /// App client secret (HMAC key for session tokens)
    pub api_secret: SecretString,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Object storage configuration for image uploads.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct UploadConfig {
    /// Base URL objects are `PUT` to
    pub endpoint: Url,
    /// Base URL objects are served from
    pub public_url: Url,
    /// Optional bearer token for the endpoint
    pub token: Option<SecretString>,
    /// Maximum decoded image size in bytes
    pub max_bytes: usize,
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("public_url", &self.public_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("APP_DATABASE_URL")?;
        let host = get_env_or_default("APP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("APP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("APP_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("APP_BASE_URL")?;

        let shopify = ShopifyAppConfig::from_env()?;
        let upload = UploadConfig::from_env()?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f == "json");
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            shopify,
            upload,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
        })
    }
}

impl UploadConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_url("UPLOAD_ENDPOINT")?;
        let public_url = get_url("UPLOAD_PUBLIC_URL")?;
        let token = get_optional_env("UPLOAD_TOKEN").map(SecretString::from);
        let max_bytes = match get_optional_env("UPLOAD_MAX_BYTES") {
            Some(raw) => parse_max_bytes(&raw)?,
            None => DEFAULT_UPLOAD_MAX_BYTES,
        };

        Ok(Self {
            endpoint,
            public_url,
            token,
            max_bytes,
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

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    // Try primary key first (e.g., APP_DATABASE_URL)
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to generic DATABASE_URL (set by Fly.io postgres attach)
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required http(s) URL.
fn get_url(key: &str) -> Result<Url, ConfigError> {
    parse_http_url(key, &get_required_env(key)?)
}

fn parse_http_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

fn parse_max_bytes(raw: &str) -> Result<usize, ConfigError> {
    let value = raw
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidEnvVar("UPLOAD_MAX_BYTES".to_string(), e.to_string()))?;
    if value == 0 || value > UPLOAD_MAX_BYTES_CEILING {
        return Err(ConfigError::InvalidEnvVar(
            "UPLOAD_MAX_BYTES".to_string(),
            format!("must be between 1 and {UPLOAD_MAX_BYTES_CEILING}"),
        ));
    }
    Ok(value)
}

/// Shannon entropy of `s`, in bits per byte.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts = [0_usize; 256];
    for byte in s.bytes() {
        if let Some(count) = counts.get_mut(usize::from(byte)) {
            *count += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.len() as f64;
    counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject client secrets copied from docs or `.env.example` files.
fn check_secret(var_name: &str, secret: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| ConfigError::InsecureSecret(var_name.to_string(), reason);

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(insecure(format!(
            "appears to be a placeholder (contains '{pattern}')"
        )));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(insecure(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}); copy the client secret from the Partner Dashboard"
        )));
    }

    Ok(())
}

/// Load a secret and run [`check_secret`] on it.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    check_secret(key, &value)?;
    Ok(SecretString::from(value))
}
