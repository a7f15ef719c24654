//! Run configuration, assembled once at startup and passed by reference.
//!
//! Layering (lowest to highest precedence):
//! 1. built-in defaults (the `Default` impls below)
//! 2. an optional `scanner.{toml,yaml,json}` file
//! 3. `SCANNER_*` environment variables, `__` separating nested keys
//!    (e.g. `SCANNER_OVERNIGHT__REQUEST_DELAY_MS=250`)
//! 4. the plain `BOT_TOKEN`, `CMC_API_KEY` and `CHAT_ID_VIP` variables

use std::env;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::delivery::RenderMode;
use crate::engine::classify::Thresholds;
use crate::error::{ScanError, ScanResult};
use crate::render::format::NumberFormat;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bot_token: Option<String>,
    pub cmc_api_key: Option<String>,
    pub chat_id_vip: Option<String>,
    pub request_timeout_secs: u64,
    pub metrics_port: u16,
    pub render_mode: RenderMode,
    pub number_format: NumberFormat,
    pub endpoints: Endpoints,
    pub scanner: ScannerSettings,
    pub pulse: PulseSettings,
    pub overnight: OvernightSettings,
    pub thresholds: Thresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: None,
            cmc_api_key: None,
            chat_id_vip: None,
            request_timeout_secs: 15,
            metrics_port: 9000,
            render_mode: RenderMode::Html,
            number_format: NumberFormat::Swapped,
            endpoints: Endpoints::default(),
            scanner: ScannerSettings::default(),
            pulse: PulseSettings::default(),
            overnight: OvernightSettings::default(),
            thresholds: Thresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub cmc_base_url: String,
    pub binance_base_url: String,
    pub telegram_api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            cmc_base_url: "https://pro-api.coinmarketcap.com".into(),
            binance_base_url: "https://api.binance.com".into(),
            telegram_api_base: "https://api.telegram.org".into(),
        }
    }
}

/// CoinMarketCap scanner: fixed table plus top movers from the listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    pub fixed_symbols: Vec<String>,
    pub anchors: Vec<String>,
    pub top_k: usize,
    pub listing_limit: u32,
    pub convert: String,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            fixed_symbols: symbols(&["BTC", "ETH", "BNB", "SOL", "XRP", "ADA"]),
            anchors: symbols(&["BTC", "ETH"]),
            top_k: 5,
            listing_limit: 100,
            convert: "USD".into(),
        }
    }
}

/// Short CoinMarketCap pulse over a handful of majors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PulseSettings {
    pub symbols: Vec<String>,
    pub anchors: Vec<String>,
    pub convert: String,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            symbols: symbols(&["BTC", "ETH", "BNB", "SOL", "XRP"]),
            anchors: symbols(&["BTC", "ETH"]),
            convert: "USD".into(),
        }
    }
}

/// Binance candle-window report.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OvernightSettings {
    pub symbols: Vec<String>,
    pub quote_asset: String,
    pub interval: String,
    pub window_len: usize,
    pub request_delay_ms: u64,
    pub max_in_flight: usize,
    pub validate_symbols: bool,
}

impl Default for OvernightSettings {
    fn default() -> Self {
        Self {
            symbols: symbols(&[
                "BTC", "ETH", "SOL", "XRP", "DOGE", "ZEC", "SUI", "BNB", "SEI", "UNI", "ONDO",
                "ORDI", "NEAR", "LDO", "JUP", "TIA", "TRON", "AVAX", "PEPE",
            ]),
            quote_asset: "USDT".into(),
            interval: "1h".into(),
            window_len: 7,
            request_delay_ms: 500,
            max_in_flight: 1,
            validate_symbols: true,
        }
    }
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Settings {
    /// Build settings from defaults, `file_stem` (optional) and the environment.
    pub fn load(file_stem: &str) -> ScanResult<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(file_stem).required(false))
            .add_source(
                Environment::with_prefix("SCANNER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scanner.fixed_symbols")
                    .with_list_parse_key("scanner.anchors")
                    .with_list_parse_key("pulse.symbols")
                    .with_list_parse_key("pulse.anchors")
                    .with_list_parse_key("overnight.symbols")
                    .try_parsing(true),
            )
            .set_override_option("bot_token", env::var("BOT_TOKEN").ok())?
            .set_override_option("cmc_api_key", env::var("CMC_API_KEY").ok())?
            .set_override_option("chat_id_vip", env::var("CHAT_ID_VIP").ok())?
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> ScanResult<()> {
        if self.scanner.top_k == 0 {
            return Err(invalid("scanner.top_k must be at least 1"));
        }
        if self.overnight.window_len == 0 {
            return Err(invalid("overnight.window_len must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs must be at least 1"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cmc_api_key(&self) -> ScanResult<&str> {
        non_empty(&self.cmc_api_key).ok_or(ScanError::MissingCredential("CMC_API_KEY"))
    }

    pub fn bot_token(&self) -> ScanResult<&str> {
        non_empty(&self.bot_token).ok_or(ScanError::MissingCredential("BOT_TOKEN"))
    }

    pub fn chat_id(&self) -> ScanResult<&str> {
        non_empty(&self.chat_id_vip).ok_or(ScanError::MissingCredential("CHAT_ID_VIP"))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn invalid(message: &str) -> ScanError {
    ScanError::Config(config::ConfigError::Message(message.to_string()))
}
