//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::io;
use std::process;

use mtwlink::config::ConfigFileError;
use mtwlink::controller::ControllerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// Failed to build the async runtime
    Runtime(io::Error),
    /// Failed to take over the terminal for keyboard input
    Terminal(io::Error),
    /// The controller aborted the run (already reported)
    Aborted(ControllerError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        // The run command prints its own diagnostic before returning
        if !matches!(self, CliError::Aborted(_)) {
            eprintln!("Error: {}", self);
        }

        match self {
            CliError::ConfigFile(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Fix the value with 'mtwlink config set <key> <value>'");
                eprintln!("or inspect the file shown by 'mtwlink config path'.");
            }
            CliError::Terminal(_) => {
                eprintln!();
                eprintln!("Keyboard control needs an interactive terminal.");
                eprintln!("Pass --expect N to start automatically instead.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Terminal(e) => write!(f, "Failed to set up terminal: {}", e),
            CliError::Aborted(e) => write!(f, "{}: {}", e.step(), e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Terminal(e) => Some(e),
            CliError::Aborted(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}
