//! CSV import/export errors

use super::CapgainsError;
use std::path::Path;

pub fn read_failed(path: &Path, reason: impl Into<String>) -> CapgainsError {
    CapgainsError::CsvReadFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

pub fn write_failed(path: &Path, reason: impl Into<String>) -> CapgainsError {
    CapgainsError::CsvWriteFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

pub fn unsupported_format(path: &Path) -> CapgainsError {
    CapgainsError::UnsupportedImportFormat {
        path: path.display().to_string(),
    }
}

pub fn field_invalid(
    path: &Path,
    line: u64,
    column: impl Into<String>,
    reason: impl Into<String>,
) -> CapgainsError {
    CapgainsError::CsvFieldInvalid {
        path: path.display().to_string(),
        line,
        column: column.into(),
        reason: reason.into(),
    }
}
