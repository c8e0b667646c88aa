use crate::error::AppError;
use crate::storage::rest_store::{DEFAULT_TABLE, RestConfig};
use reqwest::Url;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "FORMDESK_CONFIG_PATH";
const TASKS_FILE_NAME: &str = "tasks.json";
pub const TASKS_PATH_ENV_VAR: &str = "FORMDESK_TASKS_PATH";
pub const API_KEY_ENV_VAR: &str = "FORMDESK_REST_API_KEY";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBackend {
    /// Messages live in process memory and vanish on restart.
    #[default]
    Memory,
    /// Messages go to the hosted table.
    Rest,
}

impl MessageBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "rest" | "supabase" | "hosted" => Some(Self::Rest),
            _ => None,
        }
    }

    /// Whether stored messages survive a restart.
    pub fn is_durable(self) -> bool {
        matches!(self, Self::Rest)
    }
}

#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
}

impl fmt::Debug for RestSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestSettings")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("table", &self.table)
            .finish()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub tasks_path: Option<PathBuf>,
    #[serde(default)]
    pub message_backend: Option<MessageBackend>,
    #[serde(default)]
    pub rest: RestSettings,
    #[serde(default)]
    pub write_delay_ms: Option<u64>,
    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub tasks_path: Option<PathBuf>,
    pub message_backend: Option<MessageBackend>,
    pub rest_url: Option<String>,
    pub rest_table: Option<String>,
    pub write_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved runtime settings.
#[derive(Debug)]
pub struct Settings {
    pub bind: SocketAddr,
    pub tasks_path: PathBuf,
    pub message_backend: MessageBackend,
    pub rest: Option<RestConfig>,
    pub write_delay: Duration,
    pub log_level: String,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("formdesk")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("formdesk")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(bind) = overrides.bind.as_ref() {
        merged.bind = Some(bind.clone());
    }
    if let Some(path) = overrides.tasks_path.as_ref() {
        merged.tasks_path = Some(path.clone());
    }
    if let Some(backend) = overrides.message_backend {
        merged.message_backend = Some(backend);
    }
    if let Some(url) = overrides.rest_url.as_ref() {
        merged.rest.url = Some(url.clone());
    }
    if let Some(table) = overrides.rest_table.as_ref() {
        merged.rest.table = Some(table.clone());
    }
    if let Some(delay) = overrides.write_delay_ms {
        merged.write_delay_ms = Some(delay);
    }
    if let Some(level) = overrides.log_level.as_ref() {
        merged.log_level = Some(level.clone());
    }
    merged
}

impl Settings {
    /// Precedence: command-line overrides, then environment, then the file.
    /// Without any of those, tasks are kept in `tasks.json` beside the config file.
    pub fn resolve(file: &Config, overrides: &ConfigOverrides) -> Result<Self, AppError> {
        let config_file = config_path()?;
        let env_tasks_path = std::env::var(TASKS_PATH_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let env_api_key = std::env::var(API_KEY_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::resolve_with_env(file, overrides, &config_file, env_tasks_path, env_api_key)
    }

    fn resolve_with_env(
        file: &Config,
        overrides: &ConfigOverrides,
        config_file: &Path,
        env_tasks_path: Option<PathBuf>,
        env_api_key: Option<String>,
    ) -> Result<Self, AppError> {
        let config = merge_overrides(file, overrides);

        let bind_raw = config.bind.as_deref().unwrap_or(DEFAULT_BIND);
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|err| AppError::invalid_input(format!("bind '{bind_raw}': {err}")))?;

        let tasks_path = match (overrides.tasks_path.clone(), env_tasks_path, file.tasks_path.clone()) {
            (Some(path), _, _) | (None, Some(path), _) | (None, None, Some(path)) => path,
            (None, None, None) => config_file.with_file_name(TASKS_FILE_NAME),
        };

        let message_backend = config.message_backend.unwrap_or_default();
        let rest = match message_backend {
            MessageBackend::Memory => None,
            MessageBackend::Rest => Some(rest_config(&config.rest, env_api_key)?),
        };

        Ok(Self {
            bind,
            tasks_path,
            message_backend,
            rest,
            write_delay: Duration::from_millis(config.write_delay_ms.unwrap_or(0)),
            log_level: config
                .log_level
                .filter(|level| !level.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

fn rest_config(settings: &RestSettings, env_api_key: Option<String>) -> Result<RestConfig, AppError> {
    let raw_url = settings
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::invalid_input("rest.url is required for the rest backend"))?;
    let base_url = Url::parse(raw_url.trim())
        .map_err(|err| AppError::invalid_input(format!("rest.url '{raw_url}': {err}")))?;

    let api_key = env_api_key
        .or_else(|| settings.api_key.clone())
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            AppError::invalid_input(format!(
                "rest.api_key or {API_KEY_ENV_VAR} is required for the rest backend"
            ))
        })?;

    let table = settings
        .table
        .clone()
        .filter(|table| !table.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TABLE.to_string());

    Ok(RestConfig::new(base_url, SecretString::new(api_key.into_boxed_str())).with_table(table))
}
