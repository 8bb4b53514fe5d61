//! Dry-run previews of what a composition would change.
//!
//! Values never leave this module in plain text; each one is reported as the
//! first 12 hex characters of the SHA-256 of its stored form.

use sha2::{Digest, Sha256};
use similar::TextDiff;

use fancycrets_core::{Secret, SecretApi};

use crate::error::ReconcileError;
use crate::pipeline;

const DIGEST_LEN: usize = 12;

/// How a composed entry compares with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Unchanged,
}

/// One target key of a preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChange {
    pub key: String,
    pub kind: ChangeKind,
    pub before: Option<String>,
    pub after: String,
}

/// Result of previewing a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub secret: String,
    pub namespace: String,
    pub changes: Vec<KeyChange>,
}

impl Preview {
    /// Whether applying would write anything.
    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.kind != ChangeKind::Unchanged)
    }

    /// Unified diff of the redacted `key = sha256:…` listing.
    pub fn unified_diff(&self) -> String {
        if !self.has_changes() {
            return String::new();
        }
        let mut before = String::new();
        let mut after = String::new();
        for change in &self.changes {
            if let Some(digest) = &change.before {
                before.push_str(&format!("{} = sha256:{digest}\n", change.key));
            }
            after.push_str(&format!("{} = sha256:{}\n", change.key, change.after));
        }
        let old_header = format!("a/{}/{}", self.namespace, self.secret);
        let new_header = format!("b/{}/{}", self.namespace, self.secret);
        TextDiff::from_lines(&before, &after)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string()
    }
}

/// Compose `body` without patching and compare against its stored data.
pub fn preview(api: &dyn SecretApi, body: &Secret) -> Result<Preview, ReconcileError> {
    let patch = pipeline::plan(api, body)?;
    let changes = patch
        .iter()
        .map(|(key, value)| {
            let before = body.data.get(key).map(|v| digest(v));
            let after = digest(value);
            let kind = match &before {
                None => ChangeKind::Added,
                Some(b) if *b == after => ChangeKind::Unchanged,
                Some(_) => ChangeKind::Changed,
            };
            KeyChange {
                key: key.clone(),
                kind,
                before,
                after,
            }
        })
        .collect();
    Ok(Preview {
        secret: body.name().to_owned(),
        namespace: body.namespace().to_owned(),
        changes,
    })
}

fn digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(DIGEST_LEN);
    hex
}
