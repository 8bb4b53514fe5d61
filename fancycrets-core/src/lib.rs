//! fancycrets core library: domain types, annotation parsing, the secret API seam.
//!
//! - [`types`]: secrets, composition specs, diff records
//! - [`annotations`]: annotation map → [`CompositionSpec`]
//! - [`api`]: [`SecretApi`] trait and the in-memory [`MemorySecretApi`]
//! - [`error`]: [`ApiError`], [`ManifestError`]

pub mod annotations;
pub mod api;
pub mod error;
pub mod types;

pub use api::{MemorySecretApi, SecretApi};
pub use error::{ApiError, ManifestError};
pub use types::{
    CompositionSpec, DecodedData, DiffOp, DiffRecord, FormatSpec, ObjectMeta, Patch, Secret,
    SecretData, SecretPatch, SourceRef,
};
