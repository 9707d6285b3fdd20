//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the imgdedupe binary.
///
/// - 0: Success (completed normally)
/// - 1: General error (unexpected failure, including cache init failure)
/// - 2: No images found in the input directory
/// - 3: Partial success (completed with some per-file failures)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: run completed and all files were processed.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// No images: the input directory held no supported image files.
    NoImages = 2,
    /// Partial success: run completed but some files failed.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "ID000",
            Self::GeneralError => "ID001",
            Self::NoImages => "ID002",
            Self::PartialSuccess => "ID003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "ID001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
        }
    }
}
