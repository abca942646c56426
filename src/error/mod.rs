//! Error types and handling for capgains
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`config`]: Configuration errors
//! - [`ledger`]: Ledger persistence and lookup errors
//! - [`imports`]: CSV import/export errors
//! - [`inventory`]: Booking errors
//! - [`workflow`]: Dev workflow errors

pub mod config;
pub mod imports;
pub mod inventory;
pub mod ledger;
pub mod workflow;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for capgains operations
#[derive(Error, Diagnostic, Debug)]
pub enum CapgainsError {
    // Config errors
    #[error("Failed to read config file {path}: {reason}")]
    #[diagnostic(code(capgains::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    #[diagnostic(
        code(capgains::config::parse_failed),
        help("Delete the file to regenerate defaults, or fix the YAML by hand")
    )]
    ConfigParseFailed { path: String, reason: String },

    #[error("Failed to write config file {path}: {reason}")]
    #[diagnostic(code(capgains::config::write_failed))]
    ConfigWriteFailed { path: String, reason: String },

    // Ledger errors
    #[error("Failed to read ledger {path}: {reason}")]
    #[diagnostic(code(capgains::ledger::read_failed))]
    LedgerReadFailed { path: String, reason: String },

    #[error("Failed to parse ledger {path}: {reason}")]
    #[diagnostic(
        code(capgains::ledger::parse_failed),
        help("The ledger is a JSON file written by 'capgains import'; it cannot be edited freely")
    )]
    LedgerParseFailed { path: String, reason: String },

    #[error("Failed to write ledger {path}: {reason}")]
    #[diagnostic(code(capgains::ledger::write_failed))]
    LedgerWriteFailed { path: String, reason: String },

    #[error("No financial institution with id {id} in ledger")]
    #[diagnostic(code(capgains::ledger::unknown_fi))]
    UnknownFi { id: i64 },

    #[error("No account with id {id} in ledger")]
    #[diagnostic(code(capgains::ledger::unknown_account))]
    UnknownAccount { id: i64 },

    #[error("No security with id {id} in ledger")]
    #[diagnostic(code(capgains::ledger::unknown_security))]
    UnknownSecurity { id: i64 },

    #[error("Security {security} has multiple ids of type '{uniqueidtype}'")]
    #[diagnostic(code(capgains::ledger::duplicate_security_id))]
    DuplicateSecurityId { security: i64, uniqueidtype: String },

    #[error("No exchange rate for {fromcurrency}/{tocurrency} on {date}")]
    #[diagnostic(
        code(capgains::ledger::no_currency_rate),
        help("Import a rate for the settlement date (either direction of the pair works)")
    )]
    NoCurrencyRate {
        fromcurrency: String,
        tocurrency: String,
        date: String,
    },

    // Transaction record errors
    #[error("Invalid transaction '{uniqueid}': {message}")]
    #[diagnostic(
        code(capgains::models::invalid_transaction),
        help("Each transaction kind requires its own set of fields; fields for other kinds must be empty")
    )]
    InvalidTransaction { uniqueid: String, message: String },

    // Inventory errors
    #[error("Transaction '{uniqueid}' inconsistent: {message}")]
    #[diagnostic(code(capgains::inventory::inconsistent))]
    Inconsistent { uniqueid: String, message: String },

    #[error("Cannot book transaction '{uniqueid}': {message}")]
    #[diagnostic(code(capgains::inventory::booking_invalid))]
    BookingInvalid { uniqueid: String, message: String },

    #[error("Basis fraction must be between 0 and 1 (inclusive), not '{fraction}'")]
    #[diagnostic(code(capgains::inventory::invalid_basis_fraction))]
    InvalidBasisFraction { fraction: String },

    // Report errors
    #[error("Cannot consolidate report rows: {message}")]
    #[diagnostic(code(capgains::report::inconsistent_rows))]
    ReportInvalid { message: String },

    // CSV import/export errors
    #[error("Failed to read CSV file {path}: {reason}")]
    #[diagnostic(code(capgains::imports::read_failed))]
    CsvReadFailed { path: String, reason: String },

    #[error("Failed to write CSV file {path}: {reason}")]
    #[diagnostic(code(capgains::imports::write_failed))]
    CsvWriteFailed { path: String, reason: String },

    #[error("{path}:{line}: bad value in column '{column}': {reason}")]
    #[diagnostic(code(capgains::imports::field_invalid))]
    CsvFieldInvalid {
        path: String,
        line: u64,
        column: String,
        reason: String,
    },

    #[error("Cannot import '{path}': unrecognized format")]
    #[diagnostic(
        code(capgains::imports::unsupported_format),
        help("Transaction data files must be CSV with a header row")
    )]
    UnsupportedImportFormat { path: String },

    // Workflow errors
    #[error("dev {task}: '{command}' exited with {status}")]
    #[diagnostic(code(capgains::workflow::step_failed))]
    WorkflowStepFailed {
        task: String,
        command: String,
        status: String,
    },

    #[error("dev {task}: failed to launch '{command}': {reason}")]
    #[diagnostic(
        code(capgains::workflow::spawn_failed),
        help("Check that the tool is installed and on PATH")
    )]
    WorkflowSpawnFailed {
        task: String,
        command: String,
        reason: String,
    },

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(capgains::fs::io_error))]
    IoError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias using CapgainsError
pub type Result<T> = std::result::Result<T, CapgainsError>;

impl From<std::io::Error> for CapgainsError {
    fn from(err: std::io::Error) -> Self {
        CapgainsError::IoError {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
