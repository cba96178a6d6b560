//! Error types for the run harness.

use lbtlgv_core::EventError;
use thiserror::Error;

/// Errors from run cards, history stores, or the transport itself.
#[derive(Debug, Error)]
pub enum SimError {
    /// Run card missing, unreadable, or inconsistent
    #[error("Run card error: {0}")]
    RunCardError(String),

    /// History store failure
    #[error("Store error: {0}")]
    StoreError(String),

    #[error(transparent)]
    Event(#[from] EventError),
}

impl SimError {
    pub fn run_card(msg: impl Into<String>) -> Self {
        Self::RunCardError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }
}
