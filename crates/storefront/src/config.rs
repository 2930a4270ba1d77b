//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SHOPFLOW_BACKEND` - `local` or `remote` (default: local)
//! - `SHOPFLOW_DATA_DIR` - Directory of the local cart store (default: .shopflow)
//! - `SHOPFLOW_CATALOG_SEED` - JSON product seed (default: built-in demo catalog)
//! - `SHOPFLOW_TAX_RATE` - Checkout tax rate (default: 0.08)
//! - `SHOPFLOW_PAYMENT_DELAY_MS` - Simulated payment time (default: 2000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! ## Required when `SHOPFLOW_BACKEND=remote`
//! - `SHOPFLOW_RECORDS_URL` - Record API base URL
//! - `SHOPFLOW_RECORDS_PROJECT_ID` - Record API project ID
//! - `SHOPFLOW_RECORDS_PUBLIC_KEY` - Record API public key (high entropy)

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
    "enter-",
    "put-your",
    "add-your",
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

/// Where the catalog and cart live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Seed catalog plus a cart file in the data directory.
    #[default]
    Local,
    /// Record API for both catalog and cart.
    Remote,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "mock" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(format!("expected 'local' or 'remote', got '{other}'")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Catalog and cart backend
    pub backend: Backend,
    /// Directory of the local key-value store
    pub data_dir: PathBuf,
    /// Product seed file; `None` uses the built-in demo catalog
    pub catalog_seed: Option<PathBuf>,
    /// Record API settings, present when the backend is remote
    pub records: Option<RecordApiConfig>,
    /// Checkout tax rate, e.g. 0.08
    pub tax_rate: Decimal,
    /// How long simulated payment takes
    pub payment_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Record API configuration.
///
/// Implements `Debug` manually to redact the public key.
#[derive(Clone)]
pub struct RecordApiConfig {
    /// Base URL, e.g. `https://api.example.net/v1`
    pub base_url: String,
    /// Project identifier
    pub project_id: String,
    /// Public API key
    pub public_key: SecretString,
}

impl fmt::Debug for RecordApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordApiConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("public_key", &"[REDACTED]")
            .finish()
    }
}

/// Source of configuration values by name.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, or if the remote
    /// backend is selected and its settings are missing or insecure.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::load(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary lookup.
    fn load(env: Lookup<'_>) -> Result<Self, ConfigError> {
        let host = parse_env(env, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env(env, "STOREFRONT_PORT", "3000")?;
        let backend: Backend = parse_env(env, "SHOPFLOW_BACKEND", "local")?;
        let data_dir = PathBuf::from(get_env_or_default(env, "SHOPFLOW_DATA_DIR", ".shopflow"));
        let catalog_seed = get_optional_env(env, "SHOPFLOW_CATALOG_SEED").map(PathBuf::from);

        let records = match backend {
            Backend::Remote => Some(RecordApiConfig::load(env)?),
            Backend::Local => None,
        };

        let tax_rate: Decimal = parse_env(env, "SHOPFLOW_TAX_RATE", "0.08")?;
        if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFLOW_TAX_RATE".to_string(),
                format!("must be between 0 and 1 (got {tax_rate})"),
            ));
        }
        let payment_delay =
            Duration::from_millis(parse_env(env, "SHOPFLOW_PAYMENT_DELAY_MS", "2000")?);

        Ok(Self {
            host,
            port,
            backend,
            data_dir,
            catalog_seed,
            records,
            tax_rate,
            payment_delay,
            sentry_dsn: get_optional_env(env, "SENTRY_DSN"),
            sentry_environment: get_optional_env(env, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RecordApiConfig {
    fn load(env: Lookup<'_>) -> Result<Self, ConfigError> {
        let base_url = get_required_env(env, "SHOPFLOW_RECORDS_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPFLOW_RECORDS_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            project_id: get_required_env(env, "SHOPFLOW_RECORDS_PROJECT_ID")?,
            public_key: get_validated_secret(env, "SHOPFLOW_RECORDS_PUBLIC_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable, treating blank values as missing.
fn get_required_env(env: Lookup<'_>, key: &str) -> Result<String, ConfigError> {
    get_optional_env(env, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional variable, treating blank values as absent.
fn get_optional_env(env: Lookup<'_>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.trim().is_empty())
}

/// Get a variable with a default value.
fn get_env_or_default(env: Lookup<'_>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when unset.
fn parse_env<T>(env: Lookup<'_>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    get_env_or_default(env, key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
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
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued for the project."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret.
fn get_validated_secret(env: Lookup<'_>, key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(env, key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
