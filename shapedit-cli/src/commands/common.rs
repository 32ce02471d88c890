//! Argument types and helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use shapedit::logging::LogTarget;
use shapedit::store::{
    AttributeType, DEFAULT_INTEGER_LENGTH, DEFAULT_NUMBER_DECIMALS, DEFAULT_NUMBER_LENGTH,
    DEFAULT_TEXT_LENGTH,
};

use crate::error::CliError;
use crate::runner::{CliRunner, EditorSession};

/// Input shapefile and where to write the edited result.
#[derive(Debug, Clone, Args)]
pub struct EditTarget {
    /// Shapefile to edit
    pub file: PathBuf,

    /// Write the result here instead of overwriting FILE
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl EditTarget {
    pub fn destination(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.file)
    }
}

/// Column type for `add-column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColumnType {
    /// Character column (80 wide)
    Text,
    /// Decimal number
    Number,
    /// Floating point number
    Float,
    /// 8-byte binary double
    Double,
    /// Whole number
    Integer,
    /// true / false
    Logical,
    /// YYYY-MM-DD
    Date,
}

impl From<ColumnType> for AttributeType {
    fn from(kind: ColumnType) -> Self {
        match kind {
            ColumnType::Text => AttributeType::Text {
                length: DEFAULT_TEXT_LENGTH,
            },
            ColumnType::Number => AttributeType::Number {
                length: DEFAULT_NUMBER_LENGTH,
                decimals: DEFAULT_NUMBER_DECIMALS,
            },
            ColumnType::Float => AttributeType::Float {
                length: DEFAULT_NUMBER_LENGTH,
                decimals: DEFAULT_NUMBER_DECIMALS,
            },
            ColumnType::Double => AttributeType::Double,
            ColumnType::Integer => AttributeType::Integer {
                length: DEFAULT_INTEGER_LENGTH,
            },
            ColumnType::Logical => AttributeType::Logical,
            ColumnType::Date => AttributeType::Date,
        }
    }
}

pub fn log_target(verbose: bool) -> LogTarget {
    if verbose {
        LogTarget::FileAndStderr
    } else {
        LogTarget::File
    }
}

/// Runner plus a session (without basemap) with `file` open.
pub fn open_batch(
    file: &Path,
    command: &str,
    verbose: bool,
) -> Result<(CliRunner, EditorSession), CliError> {
    let runner = CliRunner::new(log_target(verbose))?;
    runner.log_startup(command);
    let mut session = runner.session(None, false)?;
    runner.open(&mut session, file)?;
    Ok((runner, session))
}
