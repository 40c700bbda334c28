//! Error types for the document-to-LaTeX conversion pipeline.
//!
//! Mirrors the fatal/non-fatal split from the design: `ContainerError`,
//! `XmlError`, `TemplateError`, and `IoError` are surfaced to the caller;
//! `MathDegraded` and `ImageDegraded` are recovered locally by the walker
//! and never escape a public API boundary, but they share this enum so
//! internal helpers speak the same vocabulary as the fatal kinds.

use thiserror::Error;

/// Error conditions that can occur while converting a document to LaTeX.
#[derive(Error, Debug)]
pub enum DoctexError {
    /// The input is not a well-formed ZIP, is missing the main document
    /// part, or macro-stripping failed.
    #[error("container error: {0}")]
    ContainerError(String),

    /// The main document XML is malformed at a level that prevents walking.
    #[error("XML error: {0}")]
    XmlError(String),

    /// The template matches neither the structured nor the unstructured
    /// contract (§6).
    #[error("template error: {0}")]
    TemplateError(String),

    /// One math subtree could not be translated; best-effort plain text
    /// was substituted. Non-fatal — never returned from a public entry
    /// point, only used to carry the reason through internal fallback
    /// chains before being logged and discarded.
    #[error("math degraded: {0}")]
    MathDegraded(String),

    /// One image could not be decoded; the image was dropped and its
    /// counter decremented. Non-fatal, same discipline as `MathDegraded`.
    #[error("image degraded: {0}")]
    ImageDegraded(String),

    /// The asset directory or output file could not be written.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DoctexError {
    /// True for the kinds that must be surfaced to the caller.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::MathDegraded(_) | Self::ImageDegraded(_))
    }
}

/// Convenience alias for functions that return a [`DoctexError`].
pub type Result<T> = std::result::Result<T, DoctexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_error_display() {
        let err = DoctexError::ContainerError("missing word/document.xml".to_string());
        assert_eq!(
            err.to_string(),
            "container error: missing word/document.xml"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn math_degraded_is_not_fatal() {
        let err = DoctexError::MathDegraded("unrecognized m:eqArr".to_string());
        assert!(!err.is_fatal());
    }

    #[test]
    fn image_degraded_is_not_fatal() {
        let err = DoctexError::ImageDegraded("truncated PNG stream".to_string());
        assert!(!err.is_fatal());
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: DoctexError = io_err.into();
        assert!(matches!(err, DoctexError::IoError(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn result_alias_propagates_with_question_mark() {
        fn inner() -> Result<()> {
            Err(DoctexError::XmlError("unterminated tag".to_string()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        match outer() {
            Err(DoctexError::XmlError(msg)) => assert_eq!(msg, "unterminated tag"),
            _ => panic!("expected XmlError to propagate"),
        }
    }
}
