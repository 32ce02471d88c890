//! Summary statistics shown by the Tools → Statistics action and `info`.

use std::fmt;

use super::collection::FeatureCollection;
use super::geometry::GeometryKind;
use crate::coord::Bounds;

/// Area totals, only computed for projected polygon layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaSummary {
    pub total: f64,
    pub mean: f64,
}

/// Snapshot of a collection's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub feature_count: usize,
    pub bounds: Option<Bounds>,
    pub crs: String,
    pub geometry_types: Vec<GeometryKind>,
    pub column_count: usize,
    pub area: Option<AreaSummary>,
}

impl Statistics {
    pub fn of(collection: &FeatureCollection) -> Self {
        let mut geometry_types: Vec<GeometryKind> = Vec::new();
        for feature in collection.features() {
            let kind = feature.geometry.kind();
            if !geometry_types.contains(&kind) {
                geometry_types.push(kind);
            }
        }

        let area = (collection.crs().is_projected()
            && collection.kind() == GeometryKind::Polygon
            && !collection.is_empty())
        .then(|| {
            let total: f64 = collection.features().iter().map(|f| f.geometry.area()).sum();
            AreaSummary {
                total,
                mean: total / collection.len() as f64,
            }
        });

        Self {
            feature_count: collection.len(),
            bounds: collection.bounds(),
            crs: collection.crs().to_string(),
            geometry_types,
            column_count: collection.schema().len(),
            area,
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of features: {}", self.feature_count)?;
        match &self.bounds {
            Some(bounds) => writeln!(f, "Bounds: {}", bounds)?,
            None => writeln!(f, "Bounds: (empty)")?,
        }
        writeln!(f, "CRS: {}", self.crs)?;
        let types: Vec<String> = self.geometry_types.iter().map(|k| k.to_string()).collect();
        writeln!(f, "Geometry types: {}", types.join(", "))?;
        writeln!(f, "Attribute columns: {}", self.column_count)?;
        match &self.area {
            Some(area) => {
                writeln!(f, "Total area: {:.2} square units", area.total)?;
                write!(f, "Average area: {:.2} square units", area.mean)
            }
            None => write!(
                f,
                "Area statistics unavailable: coordinates are not in a projected system"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::collection::tests::sample_collection;
    use crate::store::crs::Crs;
    use crate::store::geometry::{Geometry, Ring};
    use crate::store::types::Schema;
    use geo::coord;

    fn square(x: f64, y: f64, side: f64) -> Geometry {
        Geometry::Polygon(vec![Ring::outer(vec![
            coord! { x: x, y: y },
            coord! { x: x, y: y + side },
            coord! { x: x + side, y: y + side },
            coord! { x: x + side, y: y },
            coord! { x: x, y: y },
        ])])
    }

    #[test]
    fn test_point_statistics() {
        let stats = Statistics::of(&sample_collection());
        assert_eq!(stats.feature_count, 3);
        assert_eq!(stats.column_count, 3);
        assert_eq!(stats.crs, "None");
        assert_eq!(stats.geometry_types, vec![GeometryKind::Point]);
        assert!(stats.area.is_none());

        let text = stats.to_string();
        assert!(text.contains("MinX: 10.00"));
        assert!(text.contains("not in a projected system"));
    }

    #[test]
    fn test_projected_polygon_area() {
        let crs = Crs::from_wkt(r#"PROJCS["NAD83 / UTM zone 15N",GEOGCS["NAD83"]]"#);
        let mut c = FeatureCollection::new(Schema::default(), GeometryKind::Polygon, crs);
        c.push_unchecked(square(0.0, 0.0, 10.0), Vec::new());
        c.push_unchecked(square(100.0, 0.0, 20.0), Vec::new());

        let area = Statistics::of(&c).area.unwrap();
        assert!((area.total - 500.0).abs() < 1e-9);
        assert!((area.mean - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_collection() {
        let c = FeatureCollection::new(Schema::default(), GeometryKind::Polygon, Crs::Unknown);
        let stats = Statistics::of(&c);
        assert_eq!(stats.feature_count, 0);
        assert!(stats.bounds.is_none());
        assert!(stats.to_string().contains("Bounds: (empty)"));
    }
}
