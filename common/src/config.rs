// Configuration management with layered configuration (defaults, file, env)

use crate::schedule::{parse_cron_expression, parse_timezone};
use crate::scheduler::SchedulerConfig as EngineConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "BIRTHDAY_CONFIG_DIR";

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub contacts: ContactsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_cron_expression")]
    pub cron_expression: String,
    #[serde(default = "default_timezone_name")]
    pub timezone: String,
    #[serde(default)]
    pub run_on_startup: bool,
    #[serde(default)]
    pub handle_leap_years: bool,
}

fn default_cron_expression() -> String {
    "0 0 9 * * *".to_string()
}

fn default_timezone_name() -> String {
    "UTC".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: default_cron_expression(),
            timezone: default_timezone_name(),
            run_on_startup: false,
            handle_leap_years: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactsConfig {
    #[serde(default = "default_contacts_path")]
    pub path: PathBuf,
}

fn default_contacts_path() -> PathBuf {
    PathBuf::from("contacts.csv")
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            path: default_contacts_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Per-backend call timeout; unbounded when absent
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub log: LogBackendConfig,
    #[serde(default)]
    pub webhooks: Vec<WebhookBackendConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogBackendConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for LogBackendConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookBackendConfig {
    #[serde(default = "default_webhook_vendor")]
    pub vendor: String,
    pub url: String,
}

fn default_webhook_vendor() -> String {
    "generic".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub json: bool,
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: true,
            metrics_port: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        let dir = std::env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| "config".to_string());
        Self::load_from_path(dir)
    }

    /// Load configuration from a specific directory
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Local overrides (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("BIRTHDAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        parse_cron_expression(&self.scheduler.cron_expression).map_err(|e| e.to_string())?;
        parse_timezone(&self.scheduler.timezone).map_err(|e| e.to_string())?;

        if self.contacts.path.as_os_str().is_empty() {
            return Err("Contacts path cannot be empty".to_string());
        }

        if self.notifications.timeout_seconds == Some(0) {
            return Err("Notification timeout_seconds must be greater than 0".to_string());
        }

        for (index, webhook) in self.notifications.webhooks.iter().enumerate() {
            if webhook.url.trim().is_empty() {
                return Err(format!("Webhook #{} URL cannot be empty", index + 1));
            }
        }

        Ok(())
    }

    /// Scheduler engine configuration derived from these settings
    pub fn engine_config(&self) -> Result<EngineConfig, String> {
        Ok(EngineConfig {
            cron_expression: self.scheduler.cron_expression.clone(),
            timezone: parse_timezone(&self.scheduler.timezone).map_err(|e| e.to_string())?,
            run_on_startup: self.scheduler.run_on_startup,
        })
    }
}
