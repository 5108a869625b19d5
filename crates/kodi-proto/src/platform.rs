//! Per-user locations for the config file, playback log and scratch files.
use std::path::PathBuf;

pub const APP_DIR: &str = "kodi-playing";

/// `~/.local/share/kodi-playing` on unix, the local app-data dir on Windows.
pub fn data_dir() -> PathBuf {
    #[cfg(unix)]
    let base = dirs::home_dir().map(|home| home.join(".local").join("share"));
    #[cfg(windows)]
    let base = dirs::data_local_dir();

    base.unwrap_or_else(std::env::temp_dir).join(APP_DIR)
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    let base = dirs::home_dir().map(|home| home.join(".config"));
    #[cfg(windows)]
    let base = dirs::config_dir();

    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Tracing output of the daemon binary.
pub fn daemon_log_path() -> PathBuf {
    data_dir().join("daemon.log")
}
