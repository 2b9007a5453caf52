//! Error types for trace analysis
//!
//! Every error is terminal for a single `analyze` call: no partial results are
//! returned. Malformed individual events are tolerated by defaulting and never
//! surface here.

use thiserror::Error;

/// Errors produced by the analytics pipeline
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Payload is neither an event array nor an object with `traceEvents`
    #[error("Invalid trace format: expected array or object with traceEvents property")]
    Format,

    /// Nothing left to analyze
    #[error("Empty trace: {0}")]
    EmptyTrace(String),

    /// Payload is not valid JSON
    #[error("Failed to parse trace payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub(crate) fn no_events() -> Self {
        AnalysisError::EmptyTrace("no events found in trace file".to_string())
    }

    pub(crate) fn no_complete_events() -> Self {
        AnalysisError::EmptyTrace("no complete events found in trace".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_message() {
        let err = AnalysisError::Format;
        assert!(err.to_string().contains("traceEvents"));
    }

    #[test]
    fn test_parse_error_wraps_decoder() {
        let decoder_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AnalysisError = decoder_err.into();
        assert!(matches!(err, AnalysisError::Parse(_)));
        assert!(err.to_string().starts_with("Failed to parse trace payload"));
    }

    #[test]
    fn test_empty_trace_messages() {
        assert!(AnalysisError::no_events().to_string().contains("no events"));
        assert!(AnalysisError::no_complete_events()
            .to_string()
            .contains("no complete events"));
    }
}
