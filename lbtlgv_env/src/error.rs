//! Error types for the medium abstraction.

use thiserror::Error;

/// Errors that can occur when querying or loading a medium.
#[derive(Debug, Error)]
pub enum MediumError {
    /// Lookup requested past the last available time sample
    #[error("Medium exhausted at t = {time} fm/c (last sample at {last} fm/c)")]
    Exhausted { time: f64, last: f64 },

    /// Position lies outside the spatial domain of the medium
    #[error("Outside medium domain: {0}")]
    OutsideDomain(String),

    /// Static properties are unphysical (negative temperature, superluminal flow, ...)
    #[error("Invalid medium properties: {0}")]
    InvalidProperties(String),

    /// Hydro history is structurally inconsistent
    #[error("Invalid hydro history: {0}")]
    InvalidHistory(String),

    /// Hydro history could not be read
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Hydro history could not be decoded
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl MediumError {
    /// Creates an outside-domain error.
    pub fn outside(msg: impl Into<String>) -> Self {
        Self::OutsideDomain(msg.into())
    }

    /// Creates an invalid-properties error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidProperties(msg.into())
    }

    /// Returns true for the normal end-of-run condition.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
