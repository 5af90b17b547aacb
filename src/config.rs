use crate::error::{Error, Result};
use crate::scanner::ScanCriteria;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_DIR: &str = "dormant";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub clean: CleanConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    #[serde(default = "default_accounts_dir")]
    pub accounts_dir: PathBuf,
    #[serde(default = "default_activity_file")]
    pub activity_file: PathBuf,
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
}

fn default_data_root() -> PathBuf {
    Config::data_dir().join("data")
}

fn default_accounts_dir() -> PathBuf {
    Config::data_dir().join("accounts")
}

fn default_activity_file() -> PathBuf {
    Config::data_dir().join("activity.json")
}

fn default_template_dir() -> PathBuf {
    Config::data_dir().join("default")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            accounts_dir: default_accounts_dir(),
            activity_file: default_activity_file(),
            template_dir: default_template_dir(),
            history_file: None,
        }
    }
}

impl StorageConfig {
    pub fn history_path(&self) -> PathBuf {
        self.history_file
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("history.log"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default = "default_handle")]
    pub default_handle: String,
    #[serde(default = "default_handle")]
    pub template_handle: String,
}

fn default_handle() -> String {
    "default-user".to_string()
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            default_handle: default_handle(),
            template_handle: default_handle(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_inactive_days")]
    pub inactive_days: u32,
    #[serde(default = "default_true")]
    pub require_unused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_storage_bytes: Option<u64>,
    #[serde(default = "default_true")]
    pub exclude_active_subscriptions: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_inactive_days() -> u32 {
    90
}

fn default_workers() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            inactive_days: default_inactive_days(),
            require_unused: true,
            max_storage_bytes: None,
            exclude_active_subscriptions: true,
            workers: default_workers(),
        }
    }
}

impl ScanConfig {
    pub fn criteria(&self) -> ScanCriteria {
        ScanCriteria {
            inactive_days: self.inactive_days,
            require_unused: self.require_unused,
            max_storage_bytes: self.max_storage_bytes,
            exclude_active_subscriptions: self.exclude_active_subscriptions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanConfig {
    #[serde(default = "default_true")]
    pub log_history: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self { log_history: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbox_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Config {
    /// Loads the config file, writing the defaults first if it is missing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve_path(path);

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(Some(&config_path))?;
            Ok(config)
        }
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = Self::resolve_path(path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn resolve_path(path: Option<&Path>) -> PathBuf {
        match path {
            Some(path) => path.to_path_buf(),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("config.toml"),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub const KEYS: &'static [&'static str] = &[
        "storage.data_root",
        "storage.accounts_dir",
        "storage.activity_file",
        "storage.template_dir",
        "storage.history_file",
        "accounts.default_handle",
        "accounts.template_handle",
        "scan.inactive_days",
        "scan.require_unused",
        "scan.max_storage_bytes",
        "scan.exclude_active_subscriptions",
        "scan.workers",
        "clean.log_history",
        "notify.outbox_dir",
        "logging.level",
    ];

    /// Sets a dotted key. `none` clears optional values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "storage.data_root" => self.storage.data_root = PathBuf::from(value),
            "storage.accounts_dir" => self.storage.accounts_dir = PathBuf::from(value),
            "storage.activity_file" => self.storage.activity_file = PathBuf::from(value),
            "storage.template_dir" => self.storage.template_dir = PathBuf::from(value),
            "storage.history_file" => self.storage.history_file = optional(value).map(PathBuf::from),
            "accounts.default_handle" => self.accounts.default_handle = value.to_string(),
            "accounts.template_handle" => self.accounts.template_handle = value.to_string(),
            "scan.inactive_days" => {
                let days = parse(key, value)?;
                let mut criteria = self.scan.criteria();
                criteria.inactive_days = days;
                criteria.validate()?;
                self.scan.inactive_days = days;
            }
            "scan.require_unused" => self.scan.require_unused = parse(key, value)?,
            "scan.max_storage_bytes" => {
                self.scan.max_storage_bytes = optional(value).map(|v| parse(key, v)).transpose()?
            }
            "scan.exclude_active_subscriptions" => {
                self.scan.exclude_active_subscriptions = parse(key, value)?
            }
            "scan.workers" => self.scan.workers = parse::<usize>(key, value)?.max(1),
            "clean.log_history" => self.clean.log_history = parse(key, value)?,
            "notify.outbox_dir" => self.notify.outbox_dir = optional(value).map(PathBuf::from),
            "logging.level" => self.logging.level = value.to_string(),
            _ => {
                return Err(Error::Config {
                    key: key.to_string(),
                    message: format!("unknown key, expected one of: {}", Self::KEYS.join(", ")),
                })
            }
        }
        Ok(())
    }
}

fn optional(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && !value.eq_ignore_ascii_case("none")).then_some(value)
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::Config {
        key: key.to_string(),
        message: e.to_string(),
    })
}
