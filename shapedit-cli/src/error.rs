//! CLI error handling with user-friendly messages.
//!
//! Every command returns `Result<(), CliError>`; `main` prints the message
//! and exits with status 1.

use std::fmt;
use std::path::PathBuf;
use std::process;

use shapedit::config::ConfigFileError;
use shapedit::error::{ExportError, FileFormatError, NetworkError, ValidationError};
use shapedit::ShapeditError;

#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime or HTTP client
    Runtime(String),
    /// A library operation failed
    Shapedit(ShapeditError),
    /// Bad combination of command-line arguments
    InvalidArgument(String),
    /// Terminal setup or drawing failed
    Terminal(std::io::Error),
    /// Failed to write an output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!(
                    "Check {} or recreate it with: shapedit config init --force",
                    shapedit::config::config_file_path().display()
                );
            }
            CliError::Shapedit(ShapeditError::Network(_)) => {
                eprintln!();
                eprintln!("Basemap tiles could not be downloaded. Try:");
                eprintln!("  1. Checking your network connection");
                eprintln!("  2. Another provider: [basemap] provider = osm");
                eprintln!("  3. Rendering without imagery: --no-basemap");
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
            CliError::Runtime(msg) => write!(f, "Failed to start: {}", msg),
            CliError::Shapedit(e) => write!(f, "{}: {}", e.title(), e),
            CliError::InvalidArgument(msg) => write!(f, "{}", msg),
            CliError::Terminal(e) => write!(f, "Terminal error: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Shapedit(e) => Some(e),
            CliError::Terminal(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ShapeditError> for CliError {
    fn from(e: ShapeditError) -> Self {
        CliError::Shapedit(e)
    }
}

impl From<FileFormatError> for CliError {
    fn from(e: FileFormatError) -> Self {
        CliError::Shapedit(e.into())
    }
}

impl From<ValidationError> for CliError {
    fn from(e: ValidationError) -> Self {
        CliError::Shapedit(e.into())
    }
}

impl From<NetworkError> for CliError {
    fn from(e: NetworkError) -> Self {
        CliError::Shapedit(e.into())
    }
}

impl From<ExportError> for CliError {
    fn from(e: ExportError) -> Self {
        CliError::Shapedit(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_dialog_title() {
        let err: CliError = ValidationError::DivideByZero.into();
        assert_eq!(err.to_string(), "Invalid edit: Cannot divide by zero");

        let err = CliError::Config("bad".into());
        assert_eq!(err.to_string(), "Configuration error: bad");
    }
}
