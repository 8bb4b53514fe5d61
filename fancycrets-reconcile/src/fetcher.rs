//! Source fetching: read each source secret in order and merge its decoded data.

use fancycrets_core::{CompositionSpec, DecodedData, SecretApi};
use fancycrets_renderer::codec;

use crate::error::ReconcileError;

/// Read and decode every source of `spec` from `namespace`.
///
/// Sources are merged in declaration order, so a later source overwrites
/// same-named keys of an earlier one. The first failure aborts the fetch.
pub fn fetch_sources(
    api: &dyn SecretApi,
    spec: &CompositionSpec,
    namespace: &str,
) -> Result<DecodedData, ReconcileError> {
    let mut merged = DecodedData::new();
    for source in &spec.sources {
        let secret = api.read_secret(&source.0, namespace)?;
        let decoded = codec::decode_data(&source.0, &secret.data)?;
        tracing::debug!(
            source = %source,
            namespace,
            keys = ?decoded.keys().collect::<Vec<_>>(),
            "fetched source secret"
        );
        merged.extend(decoded);
    }
    Ok(merged)
}
