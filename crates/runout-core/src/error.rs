//! Error taxonomy for the analysis pipeline.
//!
//! Only fatal conditions live here. Recoverable ones (threshold not met,
//! release-mass mismatch, out-of-bounds samples) are reported as values:
//! see [`crate::analysis::AnalysisWarning`] and [`crate::resample::InterpStats`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input counts or shapes violate the required cardinality.
    #[error("invalid input shape for {what}: {message}")]
    InputShape { what: &'static str, message: String },

    /// Degenerate geometry, e.g. a zero-length path segment.
    #[error("geometry error: {message}")]
    Geometry { message: String },

    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// No persistent sub-threshold run downstream of the split point.
    #[error("no slope run below {beta_deg}° found downstream of profile index {split_index}")]
    RunoutNotFound { beta_deg: f64, split_index: usize },

    #[error("mass series: {message}")]
    MassSeries { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub(crate) fn shape(what: &'static str, message: impl Into<String>) -> Self {
        Self::InputShape { what, message: message.into() }
    }

    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry { message: message.into() }
    }
}
