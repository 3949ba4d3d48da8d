use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, Credentials, ExchangeConfig, LoggingConfig, TwapDefaults};

/// The legacy environment override for the exchange base URL.
pub const BASE_URL_ENV: &str = "BINANCE_TESTNET_BASE";

/// The default exchange endpoint: Binance USDT-M futures testnet.
pub const DEFAULT_BASE_URL: &str = "https://testnet.binancefuture.com";

/// Loads the application configuration.
///
/// Sources are layered in increasing priority: built-in defaults, an optional
/// `config.toml`, `BOT__`-prefixed environment variables (e.g.
/// `BOT__EXCHANGE__RECV_WINDOW_MS`) and finally `BINANCE_TESTNET_BASE`.
pub fn load_config() -> Result<Config, ConfigError> {
    build_config(
        config::File::with_name("config.toml").required(false),
        std::env::var(BASE_URL_ENV).ok(),
    )
}

/// Assembles and validates a `Config` from one file-like source plus an optional
/// base URL override.
pub fn build_config<S>(source: S, base_url_override: Option<String>) -> Result<Config, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .set_default("exchange.base_url", DEFAULT_BASE_URL)?
        .set_default("exchange.recv_window_ms", 5000_i64)?
        .set_default("exchange.get_timeout_secs", 10_i64)?
        .set_default("exchange.post_timeout_secs", 15_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.file", "bot.log")?
        .set_default("twap.parts", 5_i64)?
        .set_default("twap.duration_secs", 60_i64)?
        .add_source(source)
        .add_source(
            config::Environment::with_prefix("BOT")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("exchange.base_url", base_url_override)?
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let mut config = builder.try_deserialize::<Config>()?;
    config.exchange.base_url = config.exchange.base_url.trim_end_matches('/').to_string();
    config.validate()?;

    Ok(config)
}
