//! Controller settings, loaded from `~/.fancycrets/config.yaml`.
//!
//! ```yaml
//! api_url: http://127.0.0.1:8001
//! token_file: /var/run/secrets/kubernetes.io/serviceaccount/token
//! namespaces: [default, payments]
//! poll_interval_secs: 10
//! ```
//!
//! Every field is optional; a missing file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, DaemonError};
use crate::paths::{config_path, DEFAULT_API_URL, DEFAULT_NAMESPACE, DEFAULT_POLL_INTERVAL_SECS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base URL of the Kubernetes API (e.g. a `kubectl proxy` endpoint).
    pub api_url: String,
    /// File holding a bearer token; read once at startup.
    pub token_file: Option<PathBuf>,
    /// Namespaces to watch.
    pub namespaces: Vec<String>,
    pub poll_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_file: None,
            namespaces: vec![DEFAULT_NAMESPACE.to_string()],
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Settings {
    /// Load `<home>/.fancycrets/config.yaml`.
    pub fn load_at(home: &Path) -> Result<Self, DaemonError> {
        Self::load_from(&config_path(home))
    }

    /// Load settings from `path`; a missing file yields [`Settings::default`].
    pub fn load_from(path: &Path) -> Result<Self, DaemonError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(io_err(path, err)),
        };
        let settings: Settings = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|source| DaemonError::Settings {
                path: path.to_path_buf(),
                source,
            })?
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        if self.api_url.trim().is_empty() {
            return Err(DaemonError::Config("api_url must not be empty".to_string()));
        }
        if self.namespaces.is_empty() {
            return Err(DaemonError::Config(
                "at least one namespace must be configured".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(DaemonError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Bearer token from `token_file`, trimmed; `None` when unset.
    pub fn read_token(&self) -> Result<Option<String>, DaemonError> {
        let Some(path) = &self.token_file else {
            return Ok(None);
        };
        let token = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(Some(token.trim().to_string()))
    }
}
