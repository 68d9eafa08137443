//! CLI error types and exit codes

use roster_core::RosterError;
use thiserror::Error;

use crate::config::ConfigError;

const CONFIG_SUGGESTION: &str = "Set ROSTER_DOMAIN (and optionally ROSTER_LDAP_HOST, \
     ROSTER_BIND_DN, ROSTER_BIND_PASSWORD) in the environment or a .env file.";

const CONNECTIVITY_SUGGESTION: &str =
    "Check that the domain controller is reachable and the bind credentials are valid.";

/// Exit codes for the CLI
/// - 0: Success
/// - 1: Directory fault
/// - 2: Configuration error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory error: {0}")]
    Directory(RosterError),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<RosterError> for CliError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::InvalidConfiguration { message } => CliError::Config(message),
            other => CliError::Directory(other),
        }
    }
}

impl CliError {
    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Directory(_) => 1,
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Config(_) => Some(CONFIG_SUGGESTION),
            CliError::Directory(e) if e.is_connectivity() => Some(CONNECTIVITY_SUGGESTION),
            CliError::Directory(_) => None,
        }
    }

    /// Print the error to stderr.
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }
}
