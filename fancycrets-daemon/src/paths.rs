use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

pub fn fancycrets_root(home: &Path) -> PathBuf {
    home.join(".fancycrets")
}

pub fn config_path(home: &Path) -> PathBuf {
    fancycrets_root(home).join(CONFIG_FILE)
}
