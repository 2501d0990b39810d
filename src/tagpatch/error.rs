//! Errors shared across the patch pipeline.
//!
//! Every error aborts the whole patch for its file pair. The write step
//! only runs after tokenization and execution both succeed, so a failed
//! patch never leaves a partially written target.

use std::fmt;

/// Errors that can occur while patching a file pair
#[derive(Debug, Clone, PartialEq)]
pub enum PatchError {
    /// Malformed marker, mismatched close tag, or unclosed tag
    Syntax(String),
    /// An operation names an unknown verb or is missing a required attribute
    Config(String),
    /// A coordinate references a row outside the target buffer
    Position(String),
    /// File read/write failure
    Io(String),
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::Syntax(msg) => write!(f, "syntax error: {}", msg),
            PatchError::Config(msg) => write!(f, "config error: {}", msg),
            PatchError::Position(msg) => write!(f, "position error: {}", msg),
            PatchError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for PatchError {}

impl From<std::io::Error> for PatchError {
    fn from(err: std::io::Error) -> Self {
        PatchError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_error_class() {
        let err = PatchError::Syntax("unclosed tag: insert".to_string());
        assert_eq!(err.to_string(), "syntax error: unclosed tag: insert");

        let err = PatchError::Position("startRow 100 outside the target".to_string());
        assert_eq!(
            err.to_string(),
            "position error: startRow 100 outside the target"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.hbs");
        let err: PatchError = io.into();
        assert!(matches!(err, PatchError::Io(_)));
    }
}
