//! Patch application: write composed entries back onto the triggering secret.

use fancycrets_core::{Patch, Secret, SecretApi, SecretPatch};
use fancycrets_renderer::overlay;

use crate::error::ReconcileError;

/// Outcome of applying a composed patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The secret was patched; `keys` are the entries that were added or changed.
    Patched { keys: Vec<String> },
    /// Every composed entry already matched the stored data; no call was made.
    Unchanged,
}

/// Overlay `patch` on `target`'s current data and issue the partial update.
///
/// The target's resource version is sent along, so a stale body fails with a
/// conflict instead of overwriting a newer object. Errors are not retried.
pub fn apply(
    api: &dyn SecretApi,
    target: &Secret,
    patch: &Patch,
) -> Result<ApplyOutcome, ReconcileError> {
    let keys: Vec<String> = patch
        .iter()
        .filter(|(key, value)| target.data.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    if keys.is_empty() {
        tracing::debug!(secret = target.name(), namespace = target.namespace(), "patch is a no-op");
        return Ok(ApplyOutcome::Unchanged);
    }

    let request = SecretPatch {
        data: overlay(&target.data, patch),
        resource_version: target.metadata.resource_version.clone(),
    };
    api.patch_secret(target.name(), target.namespace(), &request)?;
    tracing::info!(
        secret = target.name(),
        namespace = target.namespace(),
        keys = ?keys,
        "patched secret"
    );
    Ok(ApplyOutcome::Patched { keys })
}
