//! Shared compose pipeline used by event handling, the CLI and previews.

use fancycrets_core::{annotations, Patch, Secret, SecretApi};
use fancycrets_renderer::compose;

use crate::applier::{self, ApplyOutcome};
use crate::error::ReconcileError;
use crate::fetcher::fetch_sources;

/// Parse `body`'s annotations, fetch its sources and render its formats.
///
/// Nothing is written. An empty spec yields an empty patch without any reads.
pub fn plan(api: &dyn SecretApi, body: &Secret) -> Result<Patch, ReconcileError> {
    let spec = annotations::parse(&body.metadata.annotations);
    if spec.is_empty() {
        return Ok(Patch::new());
    }
    tracing::debug!(
        secret = body.name(),
        sources = spec.sources.len(),
        formats = spec.formats.len(),
        "parsed composition spec"
    );
    let decoded = fetch_sources(api, &spec, body.namespace())?;
    Ok(compose(&spec.formats, &decoded)?)
}

/// Run [`plan`] and apply the result to `body` in place.
///
/// A failing fetch or render returns before any patch call is made.
pub fn reconcile(api: &dyn SecretApi, body: &Secret) -> Result<ApplyOutcome, ReconcileError> {
    let patch = plan(api, body)?;
    applier::apply(api, body, &patch)
}
