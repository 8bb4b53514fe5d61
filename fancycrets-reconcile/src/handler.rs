//! Event handling.
//!
//! Each object is either WATCHING (idle) or COMPOSING. [`Reconciler::handle`]
//! is the WATCHING side: it decides whether an event warrants composition and,
//! if so, runs exactly one compose → patch pass before returning. Events for
//! one object must be delivered serially; the reconciler holds no locks.

use std::sync::Arc;

use serde_json::Value;

use fancycrets_core::{annotations, DiffRecord, Secret, SecretApi};

use crate::applier::ApplyOutcome;
use crate::error::ReconcileError;
use crate::gate::{self, GateDecision};
use crate::pipeline;

/// A watch event for a secret.
#[derive(Debug, Clone)]
pub enum Event {
    Create {
        spec: Value,
        name: String,
        namespace: String,
        body: Secret,
    },
    Update {
        spec: Value,
        old: Secret,
        new: Secret,
        diff: Vec<DiffRecord>,
        body: Secret,
    },
    Delete {
        spec: Value,
        body: Secret,
    },
}

impl Event {
    /// `namespace/name` of the object the event is about.
    pub fn object_ref(&self) -> String {
        let body = match self {
            Event::Create { body, .. } | Event::Update { body, .. } | Event::Delete { body, .. } => {
                body
            }
        };
        format!("{}/{}", body.namespace(), body.name())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Create { .. } => "create",
            Event::Update { .. } => "update",
            Event::Delete { .. } => "delete",
        }
    }
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do for this kind of event or object.
    Ignored,
    /// The update gate found no `fancycrets` annotation change.
    Skipped,
    /// Composition ran to completion.
    Composed(ApplyOutcome),
}

/// Dispatches events to the compose pipeline through an injected API client.
#[derive(Clone)]
pub struct Reconciler {
    api: Arc<dyn SecretApi>,
}

impl Reconciler {
    pub fn new(api: Arc<dyn SecretApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &dyn SecretApi {
        self.api.as_ref()
    }

    /// Handle one event. Errors propagate unchanged; nothing is partially written.
    pub fn handle(&self, event: &Event) -> Result<Outcome, ReconcileError> {
        match event {
            Event::Create {
                name,
                namespace,
                body,
                ..
            } => {
                tracing::info!(secret = %name, namespace = %namespace, "secret created");
                if !annotations::has_directives(&body.metadata.annotations) {
                    return Ok(Outcome::Ignored);
                }
                self.compose(body)
            }
            Event::Update { diff, body, .. } => match gate::evaluate(diff) {
                GateDecision::Skip => {
                    tracing::debug!(
                        secret = body.name(),
                        namespace = body.namespace(),
                        "no fancycrets annotation change, skipping"
                    );
                    Ok(Outcome::Skipped)
                }
                GateDecision::Trigger => self.compose(body),
            },
            Event::Delete { body, .. } => {
                tracing::info!(secret = body.name(), namespace = body.namespace(), "secret deleted");
                Ok(Outcome::Ignored)
            }
        }
    }

    fn compose(&self, body: &Secret) -> Result<Outcome, ReconcileError> {
        let span = tracing::info_span!("composing", secret = body.name(), namespace = body.namespace());
        let _entered = span.enter();
        let outcome = pipeline::reconcile(self.api(), body)?;
        Ok(Outcome::Composed(outcome))
    }
}
