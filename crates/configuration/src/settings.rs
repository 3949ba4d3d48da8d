use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The largest receive window the exchange accepts, in milliseconds.
const MAX_RECV_WINDOW_MS: u64 = 60_000;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub logging: LoggingConfig,
    pub twap: TwapDefaults,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let exchange = &self.exchange;
        if exchange.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "exchange.base_url must not be empty".to_string(),
            ));
        }
        if !(1..=MAX_RECV_WINDOW_MS).contains(&exchange.recv_window_ms) {
            return Err(ConfigError::ValidationError(format!(
                "exchange.recv_window_ms must be between 1 and {}, got {}",
                MAX_RECV_WINDOW_MS, exchange.recv_window_ms
            )));
        }
        if exchange.get_timeout_secs == 0 || exchange.post_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "exchange timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection parameters for the exchange REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    /// How stale a signed request may be before the exchange rejects it.
    pub recv_window_ms: u64,
    pub get_timeout_secs: u64,
    /// Order placement may take marginally longer server-side than a GET.
    pub post_timeout_secs: u64,
}

impl ExchangeConfig {
    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.get_timeout_secs)
    }

    pub fn post_timeout(&self) -> Duration {
        Duration::from_secs(self.post_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as "info" or "api_client=debug". `RUST_LOG` wins.
    pub level: String,
    /// Log file written alongside stdout.
    pub file: PathBuf,
}

/// Defaults used by the `twap` command when flags are omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct TwapDefaults {
    pub parts: i64,
    pub duration_secs: i64,
}

/// API credentials for the exchange.
///
/// The key travels as the `X-MBX-APIKEY` header; the secret is only ever used
/// as the signing key and never leaves the process.
#[derive(Clone, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct Credentials {
    /// Your Testnet API key
    #[cfg_attr(
        feature = "clap",
        arg(long = "api-key", env = "BINANCE_API_KEY", hide_env_values = true)
    )]
    pub key: String,

    /// Your Testnet API secret
    #[cfg_attr(
        feature = "clap",
        arg(long = "api-secret", env = "BINANCE_API_SECRET", hide_env_values = true)
    )]
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secret() {
        let credentials = Credentials::new("my-key", "super-secret");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("my-key"));
        assert!(!rendered.contains("super-secret"));
    }
}
