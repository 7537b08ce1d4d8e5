//! Error types for operation compilation.
//!
//! All failures are local to one operation's compile; a failing operation
//! never prevents compiling its siblings.

use kerfkit_core::PathError;
use thiserror::Error;

/// Errors that can occur while compiling an operation into CutCode.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A Raster-kind operation was compiled with no step size set.
    #[error("Raster operation has no step size set")]
    MissingRasterStep,

    /// Invalid parameters were provided to the compiler.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Raster rendering failed.
    #[error("Raster rendering error: {0}")]
    RenderError(String),

    /// A path could not be parsed.
    #[error("Path error: {0}")]
    Path(#[from] PathError),
}

/// Result type alias for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::MissingRasterStep;
        assert_eq!(err.to_string(), "Raster operation has no step size set");

        let err = CompileError::InvalidParameters("canvas is 0x0".to_string());
        assert_eq!(err.to_string(), "Invalid parameters: canvas is 0x0");

        let err = CompileError::RenderError("pixmap allocation failed".to_string());
        assert_eq!(
            err.to_string(),
            "Raster rendering error: pixmap allocation failed"
        );
    }

    #[test]
    fn test_path_error_conversion() {
        let err: CompileError = PathError::UnsupportedCommand('C').into();
        assert!(matches!(err, CompileError::Path(_)));
        assert_eq!(err.to_string(), "Path error: Unsupported path command 'C'");
    }
}
