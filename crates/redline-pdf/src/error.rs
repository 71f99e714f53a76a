//! Error types for the lopdf engine layer.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Everything here is
//! fatal from the pipeline's point of view: per-page recoverable conditions
//! (unaligned pages, words that cannot be located) are modeled as data, not
//! as errors.

use thiserror::Error;

/// Fatal engine failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be parsed as a PDF.
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// A page object graph violates the structure this engine relies on.
    #[error("malformed PDF structure: {0}")]
    Malformed(String),

    /// The output document could not be written.
    #[error("failed to save PDF: {0}")]
    Save(String),
}

impl From<lopdf::Error> for EngineError {
    fn from(err: lopdf::Error) -> Self {
        EngineError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn display_formats() {
        let err = EngineError::Malformed("page 3 has no dictionary".to_string());
        assert_eq!(
            err.to_string(),
            "malformed PDF structure: page 3 has no dictionary"
        );
    }

    #[test]
    fn implements_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(EngineError::Save("disk full".into()));
        assert!(err.to_string().contains("disk full"));
    }
}
