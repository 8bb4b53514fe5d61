//! Error types for fancycrets-renderer.

use thiserror::Error;

/// All errors that can arise while decoding sources or rendering templates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A template referenced a key no source secret provides.
    #[error(
        "template for '{target}' references missing key '{key}'{}",
        format_spec_hint(.key)
    )]
    MissingKey { target: String, key: String },

    /// The template itself could not be parsed.
    #[error("invalid template for '{target}' at byte {position}: {reason}")]
    Syntax {
        target: String,
        position: usize,
        reason: &'static str,
    },

    /// A source value was not valid base64-encoded UTF-8.
    #[error("cannot decode key '{key}' of secret '{secret}': {reason}")]
    Decode {
        secret: String,
        key: String,
        reason: String,
    },
}

/// `{key:spec}` and `{key!conv}` are read as plain key names.
fn format_spec_hint(key: &str) -> &'static str {
    if key.contains(':') || key.contains('!') {
        " (format specs and conversions such as ':05d' or '!r' are not supported)"
    } else {
        ""
    }
}
