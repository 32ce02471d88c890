//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use geo::coord;
use image::{ImageFormat, Rgb, RgbImage};

use shapedit::provider::{AsyncProvider, ProviderError};
use shapedit::store::{
    self, AttributeType, AttributeValue, Crs, FeatureCollection, Field, Geometry, GeometryKind,
    Ring, Schema,
};

pub const WGS84_WKT: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

pub const UTM_WKT: &str = r#"PROJCS["WGS_1984_UTM_Zone_33N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],UNIT["Meter",1.0]]"#;

/// Tile provider that never touches the network.
pub struct StaticTileProvider {
    tile: Option<Vec<u8>>,
    pub calls: Arc<AtomicUsize>,
}

impl StaticTileProvider {
    /// Serves one solid-colour PNG for every tile.
    pub fn solid(color: [u8; 3]) -> Self {
        let img = RgbImage::from_fn(256, 256, |_, _| Rgb(color));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        Self {
            tile: Some(buffer.into_inner()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fails every request, like a machine without network access.
    pub fn offline() -> Self {
        Self {
            tile: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl AsyncProvider for StaticTileProvider {
    async fn download_tile(&self, _row: u32, _col: u32, _zoom: u8) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tile
            .clone()
            .ok_or_else(|| ProviderError::HttpError("network unreachable".into()))
    }

    fn name(&self) -> &str {
        "static"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        19
    }
}

fn square(x: f64, y: f64, size: f64) -> Geometry {
    Geometry::Polygon(vec![Ring::outer(vec![
        coord! { x: x, y: y },
        coord! { x: x, y: y + size },
        coord! { x: x + size, y: y + size },
        coord! { x: x + size, y: y },
        coord! { x: x, y: y },
    ])])
}

/// Three square parcels with a name, yield and zone column.
///
/// `origin` and `size` are in the CRS's units.
pub fn parcels(crs: Crs, origin: (f64, f64), size: f64) -> FeatureCollection {
    let schema = Schema::new(vec![
        Field::new("name", AttributeType::Text { length: 20 }),
        Field::new(
            "yield",
            AttributeType::Number {
                length: 18,
                decimals: 6,
            },
        ),
        Field::new("zone", AttributeType::Integer { length: 4 }),
    ]);
    let mut collection = FeatureCollection::new(schema, GeometryKind::Polygon, crs);
    let rows = [("North field", 4.5, 1), ("South field", 6.0, 2), ("East strip", 5.25, 3)];
    for (i, (name, yield_, zone)) in rows.into_iter().enumerate() {
        let attributes = BTreeMap::from([
            ("name".to_string(), AttributeValue::Text(name.to_string())),
            ("yield".to_string(), AttributeValue::Number(yield_)),
            ("zone".to_string(), AttributeValue::Integer(zone)),
        ]);
        let geometry = square(origin.0 + i as f64 * size * 1.5, origin.1, size);
        collection.add_feature(geometry, attributes).unwrap();
    }
    collection
}

/// Writes `collection` as `<dir>/<name>.shp` and returns the path.
pub fn write_shapefile(dir: &Path, name: &str, collection: &FeatureCollection) -> PathBuf {
    let path = dir.join(format!("{}.shp", name));
    store::save(&path, collection).unwrap();
    path
}
