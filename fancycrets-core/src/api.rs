//! The seam between composition logic and the cluster.
//!
//! [`SecretApi`] is constructed once at startup and injected everywhere as
//! `Arc<dyn SecretApi>`. [`MemorySecretApi`] backs offline rendering and tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use crate::error::{ApiError, ManifestError};
use crate::types::{Secret, SecretPatch};

/// Blocking read/patch access to secrets.
pub trait SecretApi: Send + Sync {
    /// Read the named secret.
    fn read_secret(&self, name: &str, namespace: &str) -> Result<Secret, ApiError>;

    /// Replace the named secret's `data` with `patch.data`.
    fn patch_secret(&self, name: &str, namespace: &str, patch: &SecretPatch)
        -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// MemorySecretApi
// ---------------------------------------------------------------------------

type ObjectKey = (String, String);

/// A patch call as received by [`MemorySecretApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchCall {
    pub name: String,
    pub namespace: String,
    pub patch: SecretPatch,
}

#[derive(Debug, Default)]
struct MemoryState {
    secrets: BTreeMap<ObjectKey, Secret>,
    forbidden: Vec<ObjectKey>,
    patches: Vec<PatchCall>,
    revision: u64,
}

/// In-memory secret store with API-server-like semantics.
///
/// Every write bumps `resourceVersion`; patches carrying a stale version are
/// rejected with [`ApiError::Conflict`].
#[derive(Debug, Default)]
pub struct MemorySecretApi {
    state: Mutex<MemoryState>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestDoc {
    List { items: Vec<Secret> },
    Seq(Vec<Secret>),
    One(Secret),
}

impl MemorySecretApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a secret, stamping a fresh resource version.
    pub fn insert(&self, mut secret: Secret) {
        let mut state = self.state();
        state.revision += 1;
        secret.metadata.resource_version = Some(state.revision.to_string());
        let key = (secret.metadata.namespace.clone(), secret.metadata.name.clone());
        state.secrets.insert(key, secret);
    }

    /// Make reads and patches of `namespace/name` fail with [`ApiError::Forbidden`].
    pub fn forbid(&self, name: &str, namespace: &str) {
        self.state()
            .forbidden
            .push((namespace.to_owned(), name.to_owned()));
    }

    /// Current stored copy of a secret.
    pub fn get(&self, name: &str, namespace: &str) -> Option<Secret> {
        self.state()
            .secrets
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
    }

    /// All secrets in `namespace`, ordered by name.
    pub fn list(&self, namespace: &str) -> Vec<Secret> {
        self.state()
            .secrets
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, secret)| secret.clone())
            .collect()
    }

    /// Every patch call received so far, in order, including rejected ones.
    pub fn patches(&self) -> Vec<PatchCall> {
        self.state().patches.clone()
    }

    /// Load secrets from YAML text.
    ///
    /// Accepts multi-document YAML where each document is a single Secret, a
    /// sequence of Secrets, or a `List` with `items`. Secrets without a
    /// namespace are placed in `default_namespace`.
    pub fn from_yaml_str(
        text: &str,
        default_namespace: &str,
        origin: &Path,
    ) -> Result<Self, ManifestError> {
        let parse_err = |source| ManifestError::Parse {
            path: origin.to_path_buf(),
            source,
        };
        let api = Self::new();
        for document in serde_yaml::Deserializer::from_str(text) {
            let value = serde_yaml::Value::deserialize(document).map_err(parse_err)?;
            if value.is_null() {
                continue;
            }
            let secrets = match serde_yaml::from_value::<ManifestDoc>(value).map_err(parse_err)? {
                ManifestDoc::List { items } => items,
                ManifestDoc::Seq(items) => items,
                ManifestDoc::One(secret) => vec![secret],
            };
            for mut secret in secrets {
                if secret.metadata.namespace.is_empty() {
                    secret.metadata.namespace = default_namespace.to_owned();
                }
                api.insert(secret);
            }
        }
        Ok(api)
    }

    /// Load secrets from a YAML manifest file. See [`Self::from_yaml_str`].
    pub fn from_manifest(path: &Path, default_namespace: &str) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, default_namespace, path)
    }
}

impl SecretApi for MemorySecretApi {
    fn read_secret(&self, name: &str, namespace: &str) -> Result<Secret, ApiError> {
        let state = self.state();
        let key = (namespace.to_owned(), name.to_owned());
        if state.forbidden.contains(&key) {
            return Err(ApiError::Forbidden {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
                message: "forbidden".to_string(),
            });
        }
        state
            .secrets
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
            })
    }

    fn patch_secret(
        &self,
        name: &str,
        namespace: &str,
        patch: &SecretPatch,
    ) -> Result<(), ApiError> {
        let mut state = self.state();
        state.patches.push(PatchCall {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            patch: patch.clone(),
        });

        let key = (namespace.to_owned(), name.to_owned());
        if state.forbidden.contains(&key) {
            return Err(ApiError::Forbidden {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
                message: "forbidden".to_string(),
            });
        }
        state.revision += 1;
        let revision = state.revision.to_string();
        let Some(stored) = state.secrets.get_mut(&key) else {
            return Err(ApiError::NotFound {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
            });
        };
        if let Some(expected) = &patch.resource_version {
            if stored.metadata.resource_version.as_ref() != Some(expected) {
                return Err(ApiError::Conflict {
                    name: name.to_owned(),
                    namespace: namespace.to_owned(),
                    message: format!(
                        "resourceVersion {expected} is stale (current {})",
                        stored.metadata.resource_version.as_deref().unwrap_or("none")
                    ),
                });
            }
        }
        // JSON merge-patch semantics on `data`: listed keys are set, others kept.
        for (key, value) in &patch.data {
            stored.data.insert(key.clone(), value.clone());
        }
        stored.metadata.resource_version = Some(revision);
        Ok(())
    }
}
