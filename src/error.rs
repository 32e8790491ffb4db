//! Error types for the doclayout library.
//!
//! Layout detection itself never fails; errors only arise when loading
//! fragment dumps, selecting pages, or serializing results.

use std::io;
use thiserror::Error;

/// Result type alias for doclayout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur at the edges of the layout pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fragment input could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input decoded but is unusable (e.g. non-finite page size).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );

        let err = Error::InvalidInput("page width is NaN".to_string());
        assert_eq!(err.to_string(), "Invalid input: page width is NaN");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u32>>("[1, 2").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
