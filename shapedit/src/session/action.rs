//! Messages into and out of a [`Session`](super::Session).

use std::fmt;
use std::path::PathBuf;

use crate::store::{AttributeType, FeatureId, MassOperation, Statistics};
use crate::style::{Colormap, ZoneStyle};

/// A user request. Every menu item, key binding and CLI subcommand maps to
/// one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Open(PathBuf),
    Export(PathBuf),
    ExportImage(PathBuf),
    EditCell {
        id: FeatureId,
        column: String,
        text: String,
    },
    /// Appends a row copying the geometry of `template` (first row if unset).
    AddRow { template: Option<FeatureId> },
    DeleteRow(FeatureId),
    AddColumn {
        name: String,
        kind: AttributeType,
        default: String,
    },
    DeleteColumn(String),
    MassUpdate {
        columns: Vec<String>,
        operation: MassOperation,
        operand: f64,
    },
    SetFilter(String),
    ClearFilter,
    SetColorColumn(Option<String>),
    SetColormap(Colormap),
    SetTransparency(u8),
    SetZoneStyle {
        zone: String,
        style: Option<ZoneStyle>,
    },
    /// Fractions of the view width/height.
    Pan { dx: f64, dy: f64 },
    Zoom(f64),
    SetZoomPercent(u16),
    ResetView,
    RefreshBasemap,
    ShowStatistics,
    About,
}

/// What a successful action did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Loaded { path: PathBuf, features: usize },
    Saved(PathBuf),
    ImageSaved(PathBuf),
    CellEdited { id: FeatureId, column: String },
    RowAdded(FeatureId),
    RowDeleted(FeatureId),
    ColumnAdded(String),
    ColumnDeleted(String),
    MassUpdated { cells: usize },
    FilterChanged { visible: usize },
    StyleChanged,
    ViewChanged,
    BasemapRequested,
    Statistics(Statistics),
    About(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Loaded { path, features } => {
                write!(f, "Opened {} ({} features)", path.display(), features)
            }
            Outcome::Saved(path) => write!(f, "Saved {}", path.display()),
            Outcome::ImageSaved(path) => write!(f, "Map image written to {}", path.display()),
            Outcome::CellEdited { id, column } => write!(f, "Updated {} of row {}", column, id),
            Outcome::RowAdded(id) => write!(f, "Added row {}", id),
            Outcome::RowDeleted(id) => write!(f, "Deleted row {}", id),
            Outcome::ColumnAdded(name) => write!(f, "Added column {}", name),
            Outcome::ColumnDeleted(name) => write!(f, "Deleted column {}", name),
            Outcome::MassUpdated { cells } => write!(f, "Mass update changed {} cells", cells),
            Outcome::FilterChanged { visible } => write!(f, "{} rows match", visible),
            Outcome::StyleChanged => f.write_str("Style updated"),
            Outcome::ViewChanged => f.write_str("View updated"),
            Outcome::BasemapRequested => f.write_str("Loading basemap"),
            Outcome::Statistics(stats) => write!(f, "{}", stats),
            Outcome::About(text) => f.write_str(text),
        }
    }
}

/// User-facing result of handling an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error { title: &'static str, message: String },
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Info(message) => f.write_str(message),
            Notice::Error { title, message } => write!(f, "{}: {}", title, message),
        }
    }
}
