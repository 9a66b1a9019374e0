use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_STATE_FILE: &str = "sent_urls.json";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub const DEFAULT_CARD_SELECTOR: &str = "div.SmallCard-module_card__3hfzu";
pub const DEFAULT_TITLE_SELECTOR: &str = "h2.ItemTitle-module_item-title__VuKDo";
pub const DEFAULT_LINK_SELECTOR: &str = "a.SmallCard-module_link__hOkzY";
pub const DEFAULT_PRICE_SELECTOR: &str = "p.index-module_price__N7M2x";

/// Flat settings as they arrive from files and the environment. Keys are the
/// lowercased environment variable names (`TELEGRAM_TOKEN` -> `telegram_token`).
#[derive(Debug, Deserialize)]
struct RawSettings {
    telegram_token: Option<String>,
    telegram_chat_id: Option<String>,
    monitor_urls: Option<String>,
    #[serde(default = "default_check_interval")]
    check_interval: u64,
    #[serde(default = "default_state_file")]
    sent_urls_file: String,
    #[serde(default = "default_delivery_spacing")]
    delivery_spacing: u64,
    #[serde(default = "default_delivery_retries")]
    delivery_retries: usize,
    #[serde(default = "default_request_timeout")]
    request_timeout: u64,
    #[serde(default = "default_user_agent")]
    user_agent: String,
    #[serde(default = "default_api_base")]
    telegram_api_base: String,
    #[serde(default = "default_card_selector")]
    card_selector: String,
    #[serde(default = "default_title_selector")]
    title_selector: String,
    #[serde(default = "default_link_selector")]
    link_selector: String,
    #[serde(default = "default_price_selector")]
    price_selector: String,
    #[serde(default)]
    max_backoff_cycles: u32,
    log_dir: Option<PathBuf>,
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_state_file() -> String {
    DEFAULT_STATE_FILE.to_string()
}

fn default_delivery_spacing() -> u64 {
    6
}

fn default_delivery_retries() -> usize {
    2
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

fn default_card_selector() -> String {
    DEFAULT_CARD_SELECTOR.to_string()
}

fn default_title_selector() -> String {
    DEFAULT_TITLE_SELECTOR.to_string()
}

fn default_link_selector() -> String {
    DEFAULT_LINK_SELECTOR.to_string()
}

fn default_price_selector() -> String {
    DEFAULT_PRICE_SELECTOR.to_string()
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub monitor: MonitorConfig,
    pub scraper: ScraperConfig,
    pub log_dir: Option<PathBuf>,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    pub api_base: String,
    pub request_timeout: Duration,
    pub retry_attempts: usize,
    pub retry_base_delay: Duration,
}

// Keeps the bot token out of logs.
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_base_delay", &self.retry_base_delay)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub urls: Vec<String>,
    pub check_interval: Duration,
    pub state_file: PathBuf,
    pub delivery_spacing: Duration,
    pub max_backoff_cycles: u32,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub card_selector: String,
    pub title_selector: String,
    pub link_selector: String,
    pub price_selector: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Optional file-based defaults
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Plain environment variables win
            .add_source(Environment::default())
            .build()?;

        Self::from_config(s)
    }

    /// Build from an already assembled set of sources.
    pub fn from_config(source: Config) -> Result<Self, ConfigError> {
        let raw: RawSettings = source.try_deserialize()?;
        let config = Self::from_raw(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let token = non_empty(raw.telegram_token);
        let chat_id = non_empty(raw.telegram_chat_id);
        let urls = raw.monitor_urls.as_deref().map(split_urls).unwrap_or_default();

        let (Some(token), Some(chat_id), false) = (token, chat_id, urls.is_empty()) else {
            return Err(ConfigError::Message(
                "Environment variables TELEGRAM_TOKEN, TELEGRAM_CHAT_ID, and MONITOR_URLS must be set".into(),
            ));
        };

        let request_timeout = Duration::from_secs(raw.request_timeout);

        Ok(AppConfig {
            telegram: TelegramConfig {
                token,
                chat_id,
                api_base: raw.telegram_api_base,
                request_timeout,
                retry_attempts: raw.delivery_retries,
                retry_base_delay: Duration::from_secs(1),
            },
            monitor: MonitorConfig {
                urls,
                check_interval: Duration::from_secs(raw.check_interval),
                state_file: PathBuf::from(raw.sent_urls_file),
                delivery_spacing: Duration::from_secs(raw.delivery_spacing),
                max_backoff_cycles: raw.max_backoff_cycles,
            },
            scraper: ScraperConfig {
                user_agent: raw.user_agent,
                request_timeout,
                card_selector: raw.card_selector,
                title_selector: raw.title_selector,
                link_selector: raw.link_selector,
                price_selector: raw.price_selector,
            },
            log_dir: raw.log_dir,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.check_interval.is_zero() {
            return Err(ConfigError::Message("CHECK_INTERVAL must be greater than 0".into()));
        }

        if self.scraper.request_timeout.is_zero() {
            return Err(ConfigError::Message("REQUEST_TIMEOUT must be greater than 0".into()));
        }

        for url in &self.monitor.urls {
            if Url::parse(url).is_err() {
                return Err(ConfigError::Message(format!("Invalid monitor URL: {}", url)));
            }
        }

        if Url::parse(&self.telegram.api_base).is_err() {
            return Err(ConfigError::Message("Invalid TELEGRAM_API_BASE URL".into()));
        }

        if self.monitor.state_file.as_os_str().is_empty() {
            return Err(ConfigError::Message("SENT_URLS_FILE must not be empty".into()));
        }

        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn split_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(String::from)
        .collect()
}
