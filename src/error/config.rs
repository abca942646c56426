//! Configuration errors

use super::CapgainsError;
use std::path::Path;

/// Creates a config read failed error
pub fn read_failed(path: &Path, reason: impl Into<String>) -> CapgainsError {
    CapgainsError::ConfigReadFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Creates a config parse failed error
pub fn parse_failed(path: &Path, reason: impl Into<String>) -> CapgainsError {
    CapgainsError::ConfigParseFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Creates a config write failed error
pub fn write_failed(path: &Path, reason: impl Into<String>) -> CapgainsError {
    CapgainsError::ConfigWriteFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}
