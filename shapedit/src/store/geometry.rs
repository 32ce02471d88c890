//! Feature geometries.
//!
//! Only the planar X/Y ordinates are kept; M and Z values are dropped when a
//! shapefile is loaded.

use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
use std::fmt;

use crate::coord::Bounds;

/// Geometry family shared by all features of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    Polyline,
    Polygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::Polyline => "LineString",
            GeometryKind::Polygon => "Polygon",
        })
    }
}

/// Whether a polygon ring bounds the shape or cuts a hole in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingKind {
    Outer,
    Inner,
}

/// A closed polygon ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub kind: RingKind,
    pub points: Vec<Coord<f64>>,
}

impl Ring {
    pub fn outer(points: Vec<Coord<f64>>) -> Self {
        Self {
            kind: RingKind::Outer,
            points,
        }
    }

    pub fn inner(points: Vec<Coord<f64>>) -> Self {
        Self {
            kind: RingKind::Inner,
            points,
        }
    }
}

/// The shape of one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord<f64>),
    MultiPoint(Vec<Coord<f64>>),
    /// One or more connected parts.
    Polyline(Vec<Vec<Coord<f64>>>),
    /// Outer rings each followed by their holes.
    Polygon(Vec<Ring>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::Polyline(_) => GeometryKind::Polyline,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// Visits every vertex.
    pub fn coords(&self) -> Box<dyn Iterator<Item = &Coord<f64>> + '_> {
        match self {
            Geometry::Point(c) => Box::new(std::iter::once(c)),
            Geometry::MultiPoint(points) => Box::new(points.iter()),
            Geometry::Polyline(parts) => Box::new(parts.iter().flatten()),
            Geometry::Polygon(rings) => Box::new(rings.iter().flat_map(|r| r.points.iter())),
        }
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for c in self.coords() {
            bounds.extend(c.x, c.y);
        }
        bounds
    }

    /// Planar area in the geometry's own units; zero for non-polygons.
    pub fn area(&self) -> f64 {
        match self {
            Geometry::Polygon(rings) => to_multi_polygon(rings).unsigned_area(),
            _ => 0.0,
        }
    }

    /// Returns a copy with every vertex passed through `f`.
    pub fn map_coords(&self, f: impl Fn(Coord<f64>) -> Coord<f64>) -> Geometry {
        match self {
            Geometry::Point(c) => Geometry::Point(f(*c)),
            Geometry::MultiPoint(points) => {
                Geometry::MultiPoint(points.iter().map(|c| f(*c)).collect())
            }
            Geometry::Polyline(parts) => Geometry::Polyline(
                parts
                    .iter()
                    .map(|part| part.iter().map(|c| f(*c)).collect())
                    .collect(),
            ),
            Geometry::Polygon(rings) => Geometry::Polygon(
                rings
                    .iter()
                    .map(|r| Ring {
                        kind: r.kind,
                        points: r.points.iter().map(|c| f(*c)).collect(),
                    })
                    .collect(),
            ),
        }
    }
}

/// Groups rings into polygons: every outer ring starts a polygon and the
/// inner rings that follow it are its holes.
fn to_multi_polygon(rings: &[Ring]) -> MultiPolygon<f64> {
    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    for ring in rings {
        let line = LineString::from(ring.points.clone());
        match ring.kind {
            RingKind::Outer => polygons.push(Polygon::new(line, vec![])),
            RingKind::Inner => match polygons.last_mut() {
                Some(polygon) => polygon.interiors_push(line),
                // A hole with no shell counts as a shell.
                None => polygons.push(Polygon::new(line, vec![])),
            },
        }
    }
    MultiPolygon::new(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Coord<f64>> {
        vec![
            coord! { x: x0, y: y0 },
            coord! { x: x0, y: y0 + size },
            coord! { x: x0 + size, y: y0 + size },
            coord! { x: x0 + size, y: y0 },
            coord! { x: x0, y: y0 },
        ]
    }

    #[test]
    fn test_polygon_area_subtracts_holes() {
        let geom = Geometry::Polygon(vec![
            Ring::outer(square(0.0, 0.0, 10.0)),
            Ring::inner(square(2.0, 2.0, 2.0)),
        ]);
        assert!((geom.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_has_no_area() {
        assert_eq!(Geometry::Point(coord! { x: 1.0, y: 2.0 }).area(), 0.0);
    }

    #[test]
    fn test_bounds_of_polyline() {
        let geom = Geometry::Polyline(vec![
            vec![coord! { x: 0.0, y: 5.0 }, coord! { x: 3.0, y: 1.0 }],
            vec![coord! { x: -2.0, y: 2.0 }],
        ]);
        assert_eq!(geom.bounds(), Bounds::new(-2.0, 1.0, 3.0, 5.0));
    }

    #[test]
    fn test_map_coords_keeps_ring_kinds() {
        let geom = Geometry::Polygon(vec![
            Ring::outer(square(0.0, 0.0, 1.0)),
            Ring::inner(square(0.2, 0.2, 0.1)),
        ]);
        let moved = geom.map_coords(|c| coord! { x: c.x + 1.0, y: c.y });
        match moved {
            Geometry::Polygon(rings) => {
                assert_eq!(rings[1].kind, RingKind::Inner);
                assert_eq!(rings[0].points[0].x, 1.0);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }
}
