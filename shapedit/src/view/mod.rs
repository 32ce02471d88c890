//! Map view state: the visible extent and how gestures change it.
//!
//! Extents are in display coordinates (Web Mercator metres for geographic
//! layers, native units otherwise). The controller keeps three boxes:
//!
//! - *home*: the whole layer with a margin, restored by [`MapViewController::reset`]
//! - *base*: what the zoom slider is relative to; panning moves it
//! - *current*: what is drawn

use tracing::debug;

use crate::coord::{zoom_for_extent, Bounds};
use crate::error::ValidationError;

/// Margin added around the data when fitting, as a fraction of its size.
pub const FIT_MARGIN: f64 = 0.05;

/// Fraction of the view moved by one arrow press.
pub const PAN_STEP: f64 = 0.2;

/// Zoom slider range, percent of the base view.
pub const MIN_ZOOM_PERCENT: u16 = 10;
pub const MAX_ZOOM_PERCENT: u16 = 300;

/// Visible extent plus the slider position that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewExtent {
    pub bounds: Bounds,
    pub zoom_percent: u16,
}

#[derive(Debug, Clone, Default)]
pub struct MapViewController {
    home: Option<Bounds>,
    base: Option<Bounds>,
    current: Option<Bounds>,
    zoom_percent: u16,
    revision: u64,
}

impl MapViewController {
    pub fn new() -> Self {
        Self {
            zoom_percent: 100,
            ..Self::default()
        }
    }

    /// Frames `bounds` with a margin and makes that the home view.
    pub fn fit(&mut self, bounds: Bounds) {
        if bounds.is_empty() {
            self.home = None;
            self.base = None;
            self.current = None;
        } else {
            let framed = bounds.padded(FIT_MARGIN);
            self.home = Some(framed);
            self.base = Some(framed);
            self.current = Some(framed);
        }
        self.zoom_percent = 100;
        self.changed("fit");
    }

    pub fn extent(&self) -> Option<ViewExtent> {
        self.current.map(|bounds| ViewExtent {
            bounds,
            zoom_percent: self.zoom_percent,
        })
    }

    pub fn zoom_percent(&self) -> u16 {
        self.zoom_percent
    }

    /// Increases on every change of the visible extent.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn current(&self) -> Result<Bounds, ValidationError> {
        self.current.ok_or(ValidationError::NoData)
    }

    /// Moves the view by fractions of its width (`dx`, east positive) and
    /// height (`dy`, north positive). The panned view becomes the zoom base
    /// and the slider returns to 100%.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<(), ValidationError> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(ValidationError::Invalid("Pan offsets must be finite".into()));
        }
        let current = self.current()?;
        let moved = current.translated(dx * current.width(), dy * current.height());
        self.current = Some(moved);
        self.base = Some(moved);
        self.zoom_percent = 100;
        self.changed("pan");
        Ok(())
    }

    /// Zooms the current view by `factor` (2.0 shows half the width).
    pub fn zoom(&mut self, factor: f64) -> Result<(), ValidationError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ValidationError::Invalid(format!(
                "Zoom factor must be positive, got {}",
                factor
            )));
        }
        let current = self.current()?;
        let zoomed = current.scaled_about_center(factor);
        self.current = Some(zoomed);
        if let Some(base) = self.base {
            let percent = (base.width() / zoomed.width() * 100.0).round();
            self.zoom_percent = percent.clamp(0.0, u16::MAX as f64) as u16;
        }
        self.changed("zoom");
        Ok(())
    }

    /// Slider zoom: `percent` of the base view, centred on the base view.
    pub fn set_zoom_percent(&mut self, percent: u16) -> Result<(), ValidationError> {
        if !(MIN_ZOOM_PERCENT..=MAX_ZOOM_PERCENT).contains(&percent) {
            return Err(ValidationError::Invalid(format!(
                "Zoom must be between {}% and {}%, got {}%",
                MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT, percent
            )));
        }
        let base = self.base.ok_or(ValidationError::NoData)?;
        self.current = Some(base.scaled_about_center(percent as f64 / 100.0));
        self.zoom_percent = percent;
        self.changed("zoom slider");
        Ok(())
    }

    /// Returns to the home view.
    pub fn reset(&mut self) -> Result<(), ValidationError> {
        let home = self.home.ok_or(ValidationError::NoData)?;
        self.base = Some(home);
        self.current = Some(home);
        self.zoom_percent = 100;
        self.changed("reset");
        Ok(())
    }

    /// Web Mercator tile zoom matching the current view at `canvas_width`.
    pub fn tile_zoom(&self, canvas_width: u32) -> Option<u8> {
        self.current
            .map(|bounds| zoom_for_extent(bounds.width(), canvas_width))
    }

    fn changed(&mut self, what: &str) {
        self.revision += 1;
        debug!(
            revision = self.revision,
            zoom_percent = self.zoom_percent,
            change = what,
            "View changed"
        );
    }
}
