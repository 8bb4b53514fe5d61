//! Error types for fancycrets-reconcile.

use thiserror::Error;

use fancycrets_core::ApiError;
use fancycrets_renderer::RenderError;

/// All errors that can abort a reconcile. None are retried locally.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Reading a source or patching the target failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Decoding a source or rendering a template failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

impl ReconcileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::Api(ApiError::NotFound { .. }))
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, ReconcileError::Api(ApiError::Forbidden { .. }))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ReconcileError::Api(ApiError::Conflict { .. }))
    }

    pub fn is_missing_key(&self) -> bool {
        matches!(self, ReconcileError::Render(RenderError::MissingKey { .. }))
    }
}
