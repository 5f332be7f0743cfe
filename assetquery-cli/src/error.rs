//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and distinct exit codes: 2 for invalid user input (bad region, unknown
//! schema or query mode), 1 for data-integrity and export failures.

use std::fmt;
use std::process;

use assetquery::roi::RegionError;
use assetquery::service::{ErrorClass, QueryError};

/// Exit code for user-input errors (matches clap's usage-error code).
const EXIT_USER_INPUT: i32 = 2;

/// Exit code for data-integrity and export failures.
const EXIT_DATA_INTEGRITY: i32 = 1;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Query pipeline failed
    Query(QueryError),
}

impl CliError {
    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::LoggingInit(_) => EXIT_DATA_INTEGRITY,
            CliError::Query(e) => match e.class() {
                ErrorClass::UserInput => EXIT_USER_INPUT,
                ErrorClass::DataIntegrity => EXIT_DATA_INTEGRITY,
            },
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        if let CliError::Query(QueryError::Config(_)) = self {
            eprintln!();
            eprintln!("Run with --help for the accepted arguments.");
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Query(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Query(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        CliError::Query(e)
    }
}

impl From<RegionError> for CliError {
    fn from(e: RegionError) -> Self {
        CliError::Query(QueryError::Region(e))
    }
}
