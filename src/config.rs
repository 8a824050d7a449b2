use crate::error::AppError;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub log_file: PathBuf,
}

// Shape of config.toml; every key is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    log_file: Option<PathBuf>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("todo-tui").join("config.toml"))
}

fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join("todo-tui")
        .join("todo-tui.log")
}

impl Config {
    /// Reads the config file if present, then applies `TODO_*` environment overrides.
    pub fn load() -> Result<Config, AppError> {
        let file = match config_path() {
            Some(path) if path.exists() => {
                let text = fs::read_to_string(&path).map_err(|source| AppError::ConfigRead {
                    path: path.clone(),
                    source,
                })?;
                toml::from_str(&text)?
            }
            _ => FileConfig::default(),
        };
        Config::resolve(file, |name| env::var(name).ok())
    }

    fn resolve<F>(file: FileConfig, lookup: F) -> Result<Config, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("TODO_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = match lookup("TODO_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| AppError::InvalidSetting {
                name: "TODO_TIMEOUT_SECS",
                value: raw.clone(),
            })?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(AppError::InvalidSetting {
                name: "timeout_secs",
                value: "0".to_string(),
            });
        }

        let log_file = lookup("TODO_LOG_FILE")
            .map(PathBuf::from)
            .or(file.log_file)
            .unwrap_or_else(default_log_file);

        Ok(Config {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            log_file,
        })
    }
}
