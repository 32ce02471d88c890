//! Error taxonomy shared by every component.
//!
//! Each failure class maps to one user-facing category:
//!
//! - [`FileFormatError`] - a shapefile could not be opened or understood
//! - [`ValidationError`] - an edit was rejected; the data is unchanged
//! - [`NetworkError`] - basemap imagery is unavailable; vectors still draw
//! - [`ExportError`] - writing a shapefile or image failed; data stays in memory
//!
//! [`ShapeditError`] unifies them for the session dispatcher.

use std::path::PathBuf;
use thiserror::Error;

/// A shapefile could not be read.
#[derive(Debug, Error)]
pub enum FileFormatError {
    #[error("Failed to open shapefile '{path}': {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Record {index} uses unsupported shape type {shape_type}")]
    UnsupportedShape { index: usize, shape_type: String },

    #[error("Record {index} has no geometry")]
    NullGeometry { index: usize },

    #[error("Mixed geometry types: expected {expected}, found {found} at record {index}")]
    MixedGeometry {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Shape count ({shapes}) does not match record count ({records})")]
    RecordMismatch { shapes: usize, records: usize },

    #[error("Shapefile '{path}' contains no features")]
    Empty { path: PathBuf },
}

/// An attribute or schema edit was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Feature {0} does not exist")]
    UnknownFeature(u64),

    #[error("Column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("Column '{column}' expects {expected}, got '{value}'")]
    TypeMismatch {
        column: String,
        expected: String,
        value: String,
    },

    #[error("Value '{value}' does not fit column '{column}' (max {max} bytes)")]
    TooLong {
        column: String,
        value: String,
        max: usize,
    },

    #[error("Invalid column name '{name}': {reason}")]
    InvalidColumnName { name: String, reason: String },

    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("Geometry type {found} does not match collection type {expected}")]
    GeometryMismatch { expected: String, found: String },

    #[error("Cannot divide by zero")]
    DivideByZero,

    #[error("No shapefile loaded")]
    NoData,

    #[error("{0}")]
    Invalid(String),
}

/// Basemap imagery could not be fetched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("All {attempted} basemap tiles failed; last error: {last_error}")]
    AllTilesFailed { attempted: usize, last_error: String },

    #[error("Basemap provider error: {0}")]
    Provider(String),

    #[error("Basemap is not available for coordinate system {0}")]
    UnsupportedCrs(String),

    #[error("Basemap request was cancelled")]
    Cancelled,
}

/// Writing data out failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write '{path}': {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Any error a session action can produce.
#[derive(Debug, Error)]
pub enum ShapeditError {
    #[error(transparent)]
    FileFormat(#[from] FileFormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ShapeditError {
    /// Title for the message box shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            ShapeditError::FileFormat(_) => "Open failed",
            ShapeditError::Validation(_) => "Invalid edit",
            ShapeditError::Network(_) => "Basemap unavailable",
            ShapeditError::Export(_) => "Save failed",
        }
    }
}
