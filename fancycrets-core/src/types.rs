//! Domain types for secret composition.
//!
//! Every map is a `BTreeMap` so iteration order is lexicographic and stable;
//! annotation scan order, patch contents and logs are all deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Newtypes and aliases
// ---------------------------------------------------------------------------

/// Name of a secret in the same namespace that supplies raw data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRef(pub String);

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SourceRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceRef {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Target key → template string with `{sourceKey}` placeholders.
pub type FormatSpec = BTreeMap<String, String>;

/// Plain-text union of every source secret's entries.
pub type DecodedData = BTreeMap<String, String>;

/// Target key → base64-encoded composed value.
pub type Patch = BTreeMap<String, String>;

/// Secret `data` as stored on the wire: key → base64 value.
pub type SecretData = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Composition spec
// ---------------------------------------------------------------------------

/// What a secret's annotations ask for. Derived per event, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionSpec {
    /// Source secrets in declaration order; later entries win on key collision.
    pub sources: Vec<SourceRef>,
    pub formats: FormatSpec,
}

impl CompositionSpec {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.formats.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Secret objects
// ---------------------------------------------------------------------------

/// The subset of Kubernetes object metadata the controller reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// A `v1/Secret` as the controller sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: SecretData,
}

impl Secret {
    /// Build a secret from already-encoded data.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, data: SecretData) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..ObjectMeta::default()
            },
            data,
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }
}

/// Partial update sent for a secret: its full replacement `data` map.
///
/// `resource_version`, when set, makes the API server reject the write with a
/// conflict if the object moved on since it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPatch {
    pub data: SecretData,
    pub resource_version: Option<String>,
}

impl SecretPatch {
    /// JSON merge-patch body for the Kubernetes API.
    pub fn to_merge_patch(&self) -> Value {
        let mut body = serde_json::json!({ "data": self.data });
        if let Some(rv) = &self.resource_version {
            body["metadata"] = serde_json::json!({ "resourceVersion": rv });
        }
        body
    }
}

// ---------------------------------------------------------------------------
// Update diffs
// ---------------------------------------------------------------------------

/// Kind of field-level change in an update diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Add,
    Change,
    Remove,
}

/// One change between the old and new state of an object.
///
/// Deserializes from either a map or the positional
/// `[op, path, removed, added]` form event frameworks emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub op: DiffOp,
    pub path: Vec<String>,
    #[serde(default)]
    pub removed: Option<Value>,
    #[serde(default)]
    pub added: Option<Value>,
}

impl DiffRecord {
    pub fn new(
        op: DiffOp,
        path: &[&str],
        removed: Option<Value>,
        added: Option<Value>,
    ) -> Self {
        Self {
            op,
            path: path.iter().map(|s| (*s).to_owned()).collect(),
            removed,
            added,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
