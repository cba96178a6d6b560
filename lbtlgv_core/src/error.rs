//! Error types for the transport core.

use thiserror::Error;

/// Errors surfaced by the event driver and its collaborators.
///
/// Normal end of a run is not an error: an exhausted medium turns into a
/// `false` continuation flag from `EventDriver::step`.
#[derive(Debug, Error)]
pub enum EventError {
    /// Malformed or incomplete configuration, detected before the step loop
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation invoked out of order (e.g. stepping before initialization)
    #[error("State error: {0}")]
    StateError(String),

    /// Scattering kernel produced an unusable result
    #[error("Kernel error: {0}")]
    KernelError(String),

    /// Medium failure other than normal exhaustion
    #[error("Medium error: {0}")]
    MediumError(#[from] lbtlgv_env::MediumError),
}

impl EventError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Creates a state error.
    pub fn state(msg: impl Into<String>) -> Self {
        Self::StateError(msg.into())
    }

    /// Creates a kernel error.
    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::KernelError(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Self::StateError(_))
    }
}
