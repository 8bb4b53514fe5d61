//! Secret value codec: standard padded base64 over UTF-8 text.

use base64::Engine;

use fancycrets_core::{DecodedData, SecretData};

use crate::error::RenderError;

/// Encode plain text for storage in a secret's `data`.
pub fn encode(plain: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(plain.as_bytes())
}

/// Decode one stored value of `secret`'s `key`.
pub fn decode(secret: &str, key: &str, encoded: &str) -> Result<String, RenderError> {
    let decode_err = |reason: String| RenderError::Decode {
        secret: secret.to_owned(),
        key: key.to_owned(),
        reason,
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| decode_err(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| decode_err(e.to_string()))
}

/// Decode every entry of a secret's `data`.
pub fn decode_data(secret: &str, data: &SecretData) -> Result<DecodedData, RenderError> {
    data.iter()
        .map(|(key, value)| Ok((key.clone(), decode(secret, key, value)?)))
        .collect()
}
