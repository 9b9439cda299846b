use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use crate::core::CenturyPivot;
use crate::services::mrz_client::{MrzClientConfig, DEFAULT_SERVICE_URL, SERVICE_URL_ENV};
use crate::services::notifications::TELEGRAM_API_BASE;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub mrz: MrzSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct MrzSettings {
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_century_pivot")]
    pub century_pivot: u8,
}

impl Default for MrzSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            century_pivot: default_century_pivot(),
        }
    }
}

fn default_timeout_secs() -> u64 { 30 }
fn default_century_pivot() -> u8 { crate::core::DEFAULT_CENTURY_PIVOT }

impl MrzSettings {
    pub fn client_config(&self) -> MrzClientConfig {
        let base_url = self
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        MrzClientConfig::new(base_url, Duration::from_secs(self.timeout_secs))
    }

    pub fn pivot(&self) -> Result<CenturyPivot, ConfigError> {
        CenturyPivot::new(self.century_pivot).ok_or_else(|| {
            ConfigError::Message(format!(
                "mrz.century_pivot must be between 0 and 99, got {}",
                self.century_pivot
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_base: default_telegram_api_base(),
        }
    }
}

fn default_telegram_api_base() -> String { TELEGRAM_API_BASE.to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    /// Unknown names fall back to JSON
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

impl LoggingSettings {
    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.format)
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with KIOSK__)
    /// 4. MRZ_SERVICE_URL for the scanner location
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., KIOSK__MRZ__TIMEOUT_SECS -> mrz.timeout_secs
            .add_source(
                Environment::with_prefix("KIOSK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("KIOSK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

/// Apply the well-known environment variables shared with the rest of the kiosk
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    let service_url = std::env::var(SERVICE_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty());

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = service_url {
        builder = builder.set_override("mrz.base_url", url)?;
    }

    builder.build()
}
