//! Composition: render every format template against decoded source data.

use fancycrets_core::{DecodedData, FormatSpec, Patch, SecretData};

use crate::codec;
use crate::error::RenderError;
use crate::template::{Template, TemplateError};

/// Render a single target's template to plain text.
pub fn render_value(target: &str, template: &str, data: &DecodedData) -> Result<String, RenderError> {
    let with_target = |err: TemplateError| match err {
        TemplateError::Syntax { position, reason } => RenderError::Syntax {
            target: target.to_owned(),
            position,
            reason,
        },
        TemplateError::MissingKey(key) => RenderError::MissingKey {
            target: target.to_owned(),
            key,
        },
    };
    Template::parse(template)
        .map_err(with_target)?
        .render(|key| data.get(key).map(String::as_str))
        .map_err(with_target)
}

/// Render all `formats` and encode the results.
///
/// All-or-nothing: the first failing template aborts and nothing is returned.
pub fn compose(formats: &FormatSpec, data: &DecodedData) -> Result<Patch, RenderError> {
    let mut patch = Patch::new();
    for (target, template) in formats {
        let rendered = render_value(target, template, data)?;
        patch.insert(target.clone(), codec::encode(&rendered));
    }
    tracing::debug!(
        keys = ?patch.keys().collect::<Vec<_>>(),
        "composed patch"
    );
    Ok(patch)
}

/// Existing data with every patch key laid over it; untouched keys are kept.
pub fn overlay(existing: &SecretData, patch: &Patch) -> SecretData {
    let mut merged = existing.clone();
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
