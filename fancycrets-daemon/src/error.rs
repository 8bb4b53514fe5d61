use std::path::PathBuf;

use thiserror::Error;

/// Error surface for settings, the API client and the controller runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings at {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("reconcile error: {0}")]
    Reconcile(#[from] fancycrets_reconcile::ReconcileError),

    #[error("api error: {0}")]
    Api(#[from] fancycrets_core::ApiError),

    #[error("signal handling failed: {0}")]
    Signal(String),

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
