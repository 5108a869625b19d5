use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kodi: KodiConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Connection and polling settings for the remote Kodi host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KodiConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_kodi_port")]
    pub port: u16,
    /// Seconds between polls. Values below 1 are treated as 1.
    #[serde(default = "default_wait")]
    pub wait: u64,
    /// Comma-separated substrings; matching titles are never logged.
    #[serde(default)]
    pub skip_titles: String,
    #[serde(default)]
    pub autostart: bool,
    /// Notification timeout in seconds. 0 disables notifications.
    #[serde(default = "default_show_notification")]
    pub show_notification: u64,
    /// Optional cap for JSON-RPC calls in seconds. 0 leaves them uncapped.
    #[serde(default)]
    pub rpc_timeout: u64,
}

/// Local control API standing in for the tray menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Tab-delimited playback log, truncated on every start.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Where the current thumbnail is downloaded for notifications.
    #[serde(default = "default_thumbnail")]
    pub thumbnail: PathBuf,
}

impl Default for KodiConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_kodi_port(),
            wait: default_wait(),
            skip_titles: String::new(),
            autostart: false,
            show_notification: default_show_notification(),
            rpc_timeout: 0,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_http_port(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            thumbnail: default_thumbnail(),
        }
    }
}

fn default_address() -> String {
    "localhost".to_string()
}

fn default_kodi_port() -> u16 {
    8080
}

fn default_wait() -> u64 {
    10
}

fn default_show_notification() -> u64 {
    10
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8990
}

fn default_log_file() -> PathBuf {
    platform::data_dir().join("kodi-playing.csv")
}

fn default_thumbnail() -> PathBuf {
    platform::temp_dir().join("kodi-playing.png")
}

impl KodiConfig {
    pub fn wait_interval(&self) -> Duration {
        Duration::from_secs(self.wait.max(1))
    }

    pub fn skip_patterns(&self) -> Vec<String> {
        parse_skip_patterns(&self.skip_titles)
    }

    pub fn rpc_timeout(&self) -> Option<Duration> {
        (self.rpc_timeout > 0).then(|| Duration::from_secs(self.rpc_timeout))
    }

    pub fn notifications_enabled(&self) -> bool {
        self.show_notification > 0
    }
}

/// Split the comma-separated skip list. Empty entries would match every
/// title, so they are dropped.
pub fn parse_skip_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kodi: KodiConfig::default(),
            http: HttpConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}
