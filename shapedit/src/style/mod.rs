//! Map styling: which column drives colour, through which ramp, how opaque,
//! and per-zone overrides.

mod colormap;

pub use colormap::{Colormap, Rgb};

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::store::{AttributeValue, Feature, FeatureCollection};

/// Column coloured by default when the layer has it.
pub const DEFAULT_COLOR_COLUMN: &str = "zone";

/// Fill used when no colour column is selected.
pub const DEFAULT_FILL: Rgb = Rgb::new(0x1f, 0x77, 0xb4);

/// Fill for features whose colour value is missing.
pub const NULL_FILL: Rgb = Rgb::new(0xbd, 0xbd, 0xbd);

/// Default opacity percentage.
pub const DEFAULT_OPACITY: u8 = 70;

/// Explicit colour for one category of the colour column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneStyle {
    pub color: Rgb,
    /// Opacity percentage, 0..=100.
    pub opacity: u8,
}

/// Styling state read by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleConfig {
    pub color_column: Option<String>,
    pub colormap: Colormap,
    /// Layer opacity percentage, 0 (invisible) to 100 (solid).
    pub transparency: u8,
    /// Overrides keyed by the colour column's displayed value.
    pub zones: BTreeMap<String, ZoneStyle>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            color_column: None,
            colormap: Colormap::default(),
            transparency: DEFAULT_OPACITY,
            zones: BTreeMap::new(),
        }
    }
}

fn check_percent(value: u8, what: &str) -> Result<u8, ValidationError> {
    if value > 100 {
        return Err(ValidationError::Invalid(format!(
            "{} must be between 0 and 100, got {}",
            what, value
        )));
    }
    Ok(value)
}

impl StyleConfig {
    /// Default style for a freshly opened layer: colour by `zone` if present.
    pub fn for_collection(collection: &FeatureCollection) -> Self {
        let color_column = collection
            .schema()
            .field(DEFAULT_COLOR_COLUMN)
            .map(|f| f.name.clone());
        Self {
            color_column,
            ..Self::default()
        }
    }

    /// Selects the colour column; `None` draws every feature in one colour.
    pub fn set_color_column(
        &mut self,
        collection: &FeatureCollection,
        column: Option<&str>,
    ) -> Result<(), ValidationError> {
        match column {
            Some(name) => {
                let field = collection
                    .schema()
                    .field(name)
                    .ok_or_else(|| ValidationError::UnknownColumn(name.to_string()))?;
                if self.color_column.as_deref() != Some(field.name.as_str()) {
                    self.zones.clear();
                }
                self.color_column = Some(field.name.clone());
            }
            None => {
                self.color_column = None;
                self.zones.clear();
            }
        }
        Ok(())
    }

    pub fn set_transparency(&mut self, percent: u8) -> Result<(), ValidationError> {
        self.transparency = check_percent(percent, "Transparency")?;
        Ok(())
    }

    /// Sets or clears (`style == None`) the override for one category.
    pub fn set_zone_style(
        &mut self,
        zone: &str,
        style: Option<ZoneStyle>,
    ) -> Result<(), ValidationError> {
        match style {
            Some(style) => {
                check_percent(style.opacity, "Zone opacity")?;
                self.zones.insert(zone.to_string(), style);
            }
            None => {
                self.zones.remove(zone);
            }
        }
        Ok(())
    }

    /// Drops the colour column if it no longer exists.
    pub fn reconcile(&mut self, collection: &FeatureCollection) {
        if let Some(column) = &self.color_column {
            if collection.schema().field(column).is_none() {
                self.color_column = None;
                self.zones.clear();
            }
        }
    }
}

/// How colour-column values map to colours for one render.
#[derive(Debug, Clone, PartialEq)]
enum Scale {
    Uniform,
    Numeric { index: usize, min: f64, max: f64 },
    Categorical { index: usize, categories: Vec<String> },
}

/// Per-render colour lookup built from a collection and a style.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale<'a> {
    style: &'a StyleConfig,
    scale: Scale,
}

impl<'a> ColorScale<'a> {
    pub fn new(collection: &FeatureCollection, style: &'a StyleConfig) -> Self {
        let column = style
            .color_column
            .as_deref()
            .and_then(|name| collection.schema().index_of(name).map(|i| (i, name)));

        let scale = match column {
            None => Scale::Uniform,
            Some((index, name)) => {
                let numeric = collection
                    .schema()
                    .field(name)
                    .is_some_and(|f| f.kind.is_numeric());
                if numeric {
                    let mut min = f64::INFINITY;
                    let mut max = f64::NEG_INFINITY;
                    for value in collection
                        .features()
                        .iter()
                        .filter_map(|f| f.values()[index].as_f64())
                    {
                        min = min.min(value);
                        max = max.max(value);
                    }
                    Scale::Numeric { index, min, max }
                } else {
                    let mut categories: Vec<String> = collection
                        .features()
                        .iter()
                        .map(|f| &f.values()[index])
                        .filter(|v| !v.is_null())
                        .map(|v| v.to_string())
                        .collect();
                    categories.sort();
                    categories.dedup();
                    Scale::Categorical { index, categories }
                }
            }
        };

        Self { style, scale }
    }

    fn ramp(&self, value: &AttributeValue) -> Rgb {
        match &self.scale {
            Scale::Uniform => DEFAULT_FILL,
            Scale::Numeric { min, max, .. } => match value.as_f64() {
                Some(v) if max > min => self.style.colormap.sample((v - min) / (max - min)),
                Some(_) => self.style.colormap.sample(0.5),
                None => NULL_FILL,
            },
            Scale::Categorical { categories, .. } => {
                if value.is_null() {
                    return NULL_FILL;
                }
                let key = value.to_string();
                match categories.binary_search(&key) {
                    Ok(i) => self.style.colormap.category(i, categories.len()),
                    Err(_) => NULL_FILL,
                }
            }
        }
    }

    /// Fill colour and opacity percentage for one feature.
    pub fn color_for(&self, feature: &Feature) -> (Rgb, u8) {
        let value = match &self.scale {
            Scale::Uniform => None,
            Scale::Numeric { index, .. } | Scale::Categorical { index, .. } => {
                feature.values().get(*index)
            }
        };

        if let Some(value) = value {
            if let Some(zone) = self.style.zones.get(&value.to_string()) {
                return (zone.color, zone.opacity);
            }
            return (self.ramp(value), self.style.transparency);
        }
        (DEFAULT_FILL, self.style.transparency)
    }

    /// Up to `limit` legend entries describing the current scale.
    pub fn legend(&self, limit: usize) -> Vec<(String, Rgb)> {
        match &self.scale {
            Scale::Uniform => Vec::new(),
            Scale::Numeric { min, max, .. } if min.is_finite() && max.is_finite() => vec![
                (format!("{}", min), self.style.colormap.sample(0.0)),
                (format!("{}", max), self.style.colormap.sample(1.0)),
            ],
            Scale::Numeric { .. } => Vec::new(),
            Scale::Categorical { categories, .. } => categories
                .iter()
                .enumerate()
                .take(limit)
                .map(|(i, c)| {
                    let color = self
                        .style
                        .zones
                        .get(c)
                        .map(|z| z.color)
                        .unwrap_or_else(|| self.style.colormap.category(i, categories.len()));
                    (c.clone(), color)
                })
                .collect(),
        }
    }
}
