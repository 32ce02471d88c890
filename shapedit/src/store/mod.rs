//! Geospatial data store.
//!
//! A [`FeatureCollection`] is the in-memory form of one shapefile: a schema,
//! a geometry kind shared by every feature, an optional CRS and the features
//! themselves. [`load`] and [`save`] convert to and from disk.

mod collection;
mod crs;
mod geometry;
mod io;
mod stats;
mod types;

pub use collection::{Feature, FeatureCollection, MassOperation};
pub use crs::Crs;
pub use geometry::{Geometry, GeometryKind, Ring, RingKind};
pub use io::{load, save, shp_path};
pub use stats::{AreaSummary, Statistics};
pub use types::{
    validate_field_name, AttributeType, AttributeValue, FeatureId, Field, Schema,
    DEFAULT_INTEGER_LENGTH, DEFAULT_NUMBER_DECIMALS, DEFAULT_NUMBER_LENGTH, DEFAULT_TEXT_LENGTH,
    MAX_FIELD_NAME_LEN, MAX_INTEGER_LENGTH,
};

#[cfg(test)]
pub(crate) use collection::tests::sample_collection;

impl FeatureCollection {
    /// Summary statistics for display.
    pub fn statistics(&self) -> Statistics {
        Statistics::of(self)
    }
}
