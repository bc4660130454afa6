use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::api::{ClientSettings, DEFAULT_BASE_URL};
use crate::monitor::DEFAULT_HEALTH_INTERVAL;

pub const BASE_URL_ENV: &str = "SAFETY_BOT_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub health_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: None,
            health_interval_secs: None,
            request_timeout_secs: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Overwrite the fields that are set in `update`. Returns whether
    /// anything changed.
    pub fn merge(&mut self, update: Config) -> bool {
        let before = self.clone();
        if update.base_url.is_some() {
            self.base_url = update.base_url;
        }
        if update.health_interval_secs.is_some() {
            self.health_interval_secs = update.health_interval_secs;
        }
        if update.request_timeout_secs.is_some() {
            self.request_timeout_secs = update.request_timeout_secs;
        }
        *self != before
    }

    /// Base URL precedence: explicit flag, then `SAFETY_BOT_URL`, then the
    /// config file, then the built-in default.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> String {
        let env = std::env::var(BASE_URL_ENV).ok();
        pick_base_url(flag, env.as_deref(), self.base_url.as_deref())
    }

    pub fn health_interval(&self) -> Duration {
        self.health_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HEALTH_INTERVAL)
    }

    pub fn client_settings(&self) -> ClientSettings {
        let mut settings = ClientSettings::default();
        if let Some(secs) = self.request_timeout_secs.filter(|secs| *secs > 0) {
            settings.request_timeout = Duration::from_secs(secs);
        }
        settings
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("safety-bot").join("config.json"))
    }
}

fn pick_base_url(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [flag, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}
