//! # fancycrets-reconcile
//!
//! Event handling and the compose → patch pipeline.
//!
//! [`Reconciler::handle`] takes one [`Event`]. Update events pass through the
//! diff [`gate`] first; triggered events run [`pipeline::reconcile`], which
//! fetches sources, renders formats and patches the secret in place.

pub mod applier;
pub mod error;
pub mod fetcher;
pub mod gate;
pub mod handler;
pub mod pipeline;
pub mod preview;

pub use applier::ApplyOutcome;
pub use error::ReconcileError;
pub use gate::GateDecision;
pub use handler::{Event, Outcome, Reconciler};
pub use preview::{preview, ChangeKind, KeyChange, Preview};
