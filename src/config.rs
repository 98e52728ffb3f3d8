use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_EVENT_BUFFER: usize = 1024;
const DEFAULT_HOUSE_ACCOUNT: &str = "ADM001";
const CONFIG_DIR: &str = "config";

/// Application configuration with validation.
///
/// Values are layered: `config/default.toml`, then an optional per-environment
/// file (`config/<environment>.toml`), then `APP_*` environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment name (development, production, test)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON (structured) instead of human-readable text
    #[serde(default)]
    pub log_json: bool,

    /// Percent of each gross piece-rate payout withheld to fund the referral
    /// cascade. 0 disables the referral program.
    #[validate(custom = "validate_percent")]
    #[serde(default = "default_referral_deduction")]
    pub referral_deduction_percent: Decimal,

    /// House account credited with collected cash and settled payments.
    #[validate(length(min = 1))]
    #[serde(default = "default_house_account")]
    pub house_account_id: String,

    /// Showroom name stamped on orders booked without an explicit one.
    #[serde(default = "default_showroom_name")]
    pub default_showroom_name: String,

    /// Domain event channel capacity
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_referral_deduction() -> Decimal {
    Decimal::new(10, 0)
}
fn default_house_account() -> String {
    DEFAULT_HOUSE_ACCOUNT.to_string()
}
fn default_showroom_name() -> String {
    "Main Showroom".to_string()
}
fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

fn validate_percent(value: &Decimal) -> Result<(), validator::ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::new(100, 0) {
        return Err(validator::ValidationError::new("percent_out_of_range"));
    }
    Ok(())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            referral_deduction_percent: default_referral_deduction(),
            house_account_id: default_house_account(),
            default_showroom_name: default_showroom_name(),
            event_buffer_size: default_event_buffer(),
        }
    }
}

impl AppConfig {
    /// Referral deduction as a fraction of the gross payout.
    pub fn referral_deduction_fraction(&self) -> Decimal {
        self.referral_deduction_percent / Decimal::new(100, 0)
    }
}

/// Load configuration from the config directory and environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder();
    let default_path = Path::new(CONFIG_DIR).join("default.toml");
    if default_path.exists() {
        builder = builder.add_source(File::from(default_path));
    }
    let env_path = Path::new(CONFIG_DIR).join(format!("{environment}.toml"));
    if env_path.exists() {
        builder = builder.add_source(File::from(env_path));
    }
    builder = builder.add_source(Environment::with_prefix("APP").separator("__"));

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    cfg.validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;
    Ok(cfg)
}

/// Initialise the global tracing subscriber from config.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.referral_deduction_fraction(), dec!(0.10));
    }

    #[test]
    fn deduction_percent_is_bounded() {
        let mut cfg = AppConfig::default();
        cfg.referral_deduction_percent = dec!(101);
        assert!(cfg.validate().is_err());
        cfg.referral_deduction_percent = dec!(-1);
        assert!(cfg.validate().is_err());
        cfg.referral_deduction_percent = Decimal::ZERO;
        assert!(cfg.validate().is_ok());
    }
}
