//! Error types for core geometry handling.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Errors raised while parsing SVG path data into a [`crate::VectorPath`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    /// The path data used a command outside the supported subset.
    #[error("Unsupported path command '{0}'")]
    UnsupportedCommand(char),

    /// A coordinate token could not be parsed as a number.
    #[error("Malformed number in path data: '{0}'")]
    MalformedNumber(String),

    /// The path data ended mid-way through a command's arguments.
    #[error("Truncated arguments for command '{0}'")]
    Truncated(char),
}

/// Result type alias for path parsing.
pub type PathResult<T> = Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_display() {
        let err = PathError::UnsupportedCommand('A');
        assert_eq!(err.to_string(), "Unsupported path command 'A'");

        let err = PathError::MalformedNumber("1..5".to_string());
        assert_eq!(err.to_string(), "Malformed number in path data: '1..5'");

        let err = PathError::Truncated('Q');
        assert_eq!(err.to_string(), "Truncated arguments for command 'Q'");
    }
}
