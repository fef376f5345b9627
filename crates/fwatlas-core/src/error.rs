//! Engine error type.
//!
//! Collector failures cross the crate seam through a `From` impl, so
//! engine code stays on `?` throughout.

use fwatlas_collect::CollectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    /// Caller input rejected before any host state was touched.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The collector read feeding a rebuild failed.
    #[error(transparent)]
    Collector(#[from] CollectorError),

    /// Serializing a graph for export failed.
    #[error("export failed: {0}")]
    Export(String),

    /// Engine invariant broken (a build task vanished mid-flight).
    #[error("internal engine error: {0}")]
    Internal(String),
}

impl TopologyError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), reason: reason.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_errors_convert_at_the_seam() {
        let err: TopologyError = CollectorError::Timeout { timeout_secs: 5 }.into();
        assert!(matches!(err, TopologyError::Collector(_)));
    }

    #[test]
    fn validation_formats_field_and_reason() {
        let err = TopologyError::validation("page", "must be positive");
        assert_eq!(err.to_string(), "invalid page: must be positive");
        assert!(err.is_validation());
    }
}
