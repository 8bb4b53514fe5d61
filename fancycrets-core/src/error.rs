//! Error types for fancycrets-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a [`crate::SecretApi`] backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The named secret does not exist.
    #[error("secret {namespace}/{name} not found")]
    NotFound { name: String, namespace: String },

    /// The API server refused access (401/403).
    #[error("access to secret {namespace}/{name} denied: {message}")]
    Forbidden {
        name: String,
        namespace: String,
        message: String,
    },

    /// Write rejected because the object changed since it was read.
    #[error("conflict patching secret {namespace}/{name}: {message}")]
    Conflict {
        name: String,
        namespace: String,
        message: String,
    },

    /// Anything else: connection failures, unexpected statuses, bad bodies.
    #[error("API transport error: {0}")]
    Transport(String),
}

/// Errors loading secrets from a local manifest file.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, including serde_yaml's line context.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
