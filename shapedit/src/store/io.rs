//! Shapefile reading and writing.
//!
//! Binary layout is handled entirely by the `shapefile` crate (and the
//! `dbase` crate it re-exports); this module only maps between its types and
//! the in-memory [`FeatureCollection`].
//!
//! Columns keep their declared dBase storage: width and decimal count of
//! numeric and float fields, binary double and currency fields. Integer
//! columns are written as numeric fields without decimals so that Null cells
//! stay blank; binary doubles have no blank, so Null is written as NaN.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use geo::{coord, Coord};
use shapefile::dbase::{self, FieldName, FieldType, FieldValue, Record, TableWriterBuilder};
use shapefile::{Multipoint, Point, PointM, PointZ, Polygon, PolygonRing, Polyline, Shape, ShapeType};
use tracing::{debug, info, warn};

use super::collection::FeatureCollection;
use super::crs::Crs;
use super::geometry::{Geometry, GeometryKind, Ring, RingKind};
use super::types::{
    AttributeType, AttributeValue, Field, Schema, DEFAULT_INTEGER_LENGTH, MAX_INTEGER_LENGTH,
};
use crate::error::{ExportError, FileFormatError};

/// Text width used when a memo or date-time column is loaded as text.
const WIDE_TEXT_LENGTH: u8 = 254;

/// Size of the `.dbf` file header and of each field descriptor.
const DBF_BLOCK: usize = 32;

/// Marks the end of the field descriptors.
const DBF_HEADER_END: u8 = 0x0D;

/// Offset of the decimal count within a field descriptor.
const DBF_DECIMALS_OFFSET: usize = 17;

/// Normalises a user-supplied path to the `.shp` member of the file set.
pub fn shp_path(path: &Path) -> PathBuf {
    path.with_extension("shp")
}

/// Loads a shapefile and its `.dbf`/`.prj` companions.
pub fn load(path: &Path) -> Result<FeatureCollection, FileFormatError> {
    let shp = shp_path(path);
    let unreadable = |reason: String| FileFormatError::Unreadable {
        path: shp.clone(),
        reason,
    };

    let shape_reader =
        shapefile::ShapeReader::from_path(&shp).map_err(|e| unreadable(e.to_string()))?;
    let header_type = shape_reader.header().shape_type;
    let shapes = shape_reader.read().map_err(|e| unreadable(e.to_string()))?;

    let dbf = shp.with_extension("dbf");
    let mut table =
        dbase::Reader::from_path(&dbf).map_err(|e| unreadable(format!("{}: {}", dbf.display(), e)))?;
    let columns: Vec<(String, FieldType, u8)> = table
        .fields()
        .iter()
        .filter(|f| f.name() != "DeletionFlag")
        .map(|f| (f.name().to_string(), f.field_type(), f.length()))
        .collect();
    let records = table
        .read()
        .map_err(|e| unreadable(format!("{}: {}", dbf.display(), e)))?;

    if shapes.len() != records.len() {
        return Err(FileFormatError::RecordMismatch {
            shapes: shapes.len(),
            records: records.len(),
        });
    }

    let decimal_counts =
        field_decimals(&dbf).map_err(|e| unreadable(format!("{}: {}", dbf.display(), e)))?;
    if decimal_counts.len() != columns.len() {
        return Err(unreadable(format!(
            "{}: header lists {} fields, table has {}",
            dbf.display(),
            decimal_counts.len(),
            columns.len()
        )));
    }

    let mut fields = Vec::with_capacity(columns.len());
    for ((name, field_type, length), decimals) in columns.iter().zip(&decimal_counts) {
        let kind = attribute_type(*field_type, *length, *decimals).ok_or_else(|| {
            unreadable(format!(
                "column '{}' has unsupported dBase type {:?}",
                name, field_type
            ))
        })?;
        fields.push(Field::new(name.clone(), kind));
    }

    let kind = match kind_of_shape_type(header_type) {
        Some(kind) => kind,
        None => match shapes.first() {
            Some(first) => shape_kind(0, first)?,
            None => return Err(FileFormatError::Empty { path: shp.clone() }),
        },
    };

    let crs = read_crs(&shp);
    let mut collection = FeatureCollection::new(Schema::new(fields), kind, crs);

    for (index, (shape, record)) in shapes.into_iter().zip(records).enumerate() {
        let geometry = to_geometry(index, shape)?;
        if geometry.kind() != kind {
            return Err(FileFormatError::MixedGeometry {
                index,
                expected: kind.to_string(),
                found: geometry.kind().to_string(),
            });
        }
        let values = columns
            .iter()
            .zip(collection.schema().fields())
            .map(|((name, _, _), field)| {
                record
                    .get(name)
                    .map(|value| to_value(field.kind, value))
                    .unwrap_or(AttributeValue::Null)
            })
            .collect();
        collection.push_unchecked(geometry, values);
    }

    info!(
        path = %shp.display(),
        features = collection.len(),
        columns = collection.schema().len(),
        kind = %collection.kind(),
        "Shapefile loaded"
    );
    Ok(collection)
}

/// Writes the collection as `.shp/.shx/.dbf` (plus `.prj` when the CRS is
/// known) at `path`.
pub fn save(path: &Path, collection: &FeatureCollection) -> Result<(), ExportError> {
    let shp = shp_path(path);
    let write_error = |reason: String| ExportError::Write {
        path: shp.clone(),
        reason,
    };

    if let Some(parent) = shp.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut builder = TableWriterBuilder::new();
    for field in collection.schema().fields() {
        let name = FieldName::try_from(field.name.as_str())
            .map_err(|e| write_error(format!("column '{}': {:?}", field.name, e)))?;
        builder = match field.kind {
            AttributeType::Text { length } => builder.add_character_field(name, length),
            AttributeType::Number { length, decimals } => {
                builder.add_numeric_field(name, length, decimals)
            }
            AttributeType::Float { length, decimals } => {
                builder.add_float_field(name, length, decimals)
            }
            AttributeType::Double => builder.add_double_field(name),
            AttributeType::Currency => builder.add_currency_field(name),
            AttributeType::Integer { length } => builder.add_numeric_field(name, length, 0),
            AttributeType::Logical => builder.add_logical_field(name),
            AttributeType::Date => builder.add_date_field(name),
        };
    }

    let mut writer =
        shapefile::Writer::from_path(&shp, builder).map_err(|e| write_error(e.to_string()))?;

    for feature in collection.features() {
        let mut record = Record::default();
        for (field, value) in collection.schema().fields().iter().zip(feature.values()) {
            record.insert(field.name.clone(), to_field_value(field.kind, value));
        }

        let written = match &feature.geometry {
            Geometry::Point(c) => writer.write_shape_and_record(&to_point(c), &record),
            Geometry::MultiPoint(points) => {
                let shape = Multipoint::new(points.iter().map(to_point).collect());
                writer.write_shape_and_record(&shape, &record)
            }
            Geometry::Polyline(parts) => {
                let shape = Polyline::with_parts(
                    parts
                        .iter()
                        .map(|part| part.iter().map(to_point).collect())
                        .collect(),
                );
                writer.write_shape_and_record(&shape, &record)
            }
            Geometry::Polygon(rings) => {
                let shape = Polygon::with_rings(
                    rings
                        .iter()
                        .map(|ring| {
                            let points = ring.points.iter().map(to_point).collect();
                            match ring.kind {
                                RingKind::Outer => PolygonRing::Outer(points),
                                RingKind::Inner => PolygonRing::Inner(points),
                            }
                        })
                        .collect(),
                );
                writer.write_shape_and_record(&shape, &record)
            }
        };
        written.map_err(|e| write_error(format!("feature {}: {}", feature.id, e)))?;
    }
    drop(writer);

    let prj = shp.with_extension("prj");
    match collection.crs().wkt() {
        Some(wkt) => fs::write(&prj, wkt)?,
        None if prj.exists() => {
            warn!(path = %prj.display(), "Removing stale .prj for collection without CRS");
            fs::remove_file(&prj)?;
        }
        None => {}
    }

    info!(path = %shp.display(), features = collection.len(), "Shapefile saved");
    Ok(())
}

fn read_crs(shp: &Path) -> Crs {
    let prj = shp.with_extension("prj");
    match fs::read_to_string(&prj) {
        Ok(wkt) => Crs::from_wkt(&wkt),
        Err(e) => {
            debug!(path = %prj.display(), error = %e, "No projection file");
            Crs::Unknown
        }
    }
}

/// Decimal counts of the `.dbf` field descriptors, in column order.
///
/// The `dbase` reader does not expose them.
fn field_decimals(dbf: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(dbf)?;
    let mut header = [0u8; DBF_BLOCK];
    file.read_exact(&mut header)?;
    let header_len = u16::from_le_bytes([header[8], header[9]]) as usize;

    let mut descriptors = vec![0u8; header_len.saturating_sub(DBF_BLOCK)];
    file.read_exact(&mut descriptors)?;
    Ok(descriptors
        .chunks_exact(DBF_BLOCK)
        .take_while(|d| d[0] != DBF_HEADER_END)
        .map(|d| d[DBF_DECIMALS_OFFSET])
        .collect())
}

fn attribute_type(field_type: FieldType, length: u8, decimals: u8) -> Option<AttributeType> {
    match field_type {
        FieldType::Character => Some(AttributeType::Text { length }),
        FieldType::Numeric if decimals == 0 && length <= MAX_INTEGER_LENGTH => {
            Some(AttributeType::Integer { length })
        }
        FieldType::Numeric => Some(AttributeType::Number { length, decimals }),
        FieldType::Float => Some(AttributeType::Float { length, decimals }),
        FieldType::Double => Some(AttributeType::Double),
        FieldType::Currency => Some(AttributeType::Currency),
        // Binary integers cannot hold a blank; they are rewritten as numeric.
        FieldType::Integer => Some(AttributeType::Integer {
            length: DEFAULT_INTEGER_LENGTH,
        }),
        FieldType::Logical => Some(AttributeType::Logical),
        FieldType::Date => Some(AttributeType::Date),
        FieldType::Memo => Some(AttributeType::Text {
            length: WIDE_TEXT_LENGTH,
        }),
        _ => None,
    }
}

fn to_value(kind: AttributeType, value: &FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => {
            let s = s.trim_end();
            if s.is_empty() {
                AttributeValue::Null
            } else {
                AttributeValue::Text(s.to_string())
            }
        }
        FieldValue::Numeric(Some(n)) => match kind {
            AttributeType::Integer { .. } => AttributeValue::Integer(*n as i64),
            _ => AttributeValue::Number(*n),
        },
        FieldValue::Float(Some(n)) => match kind {
            // Undo the f32 widening so the value matches the text in the file.
            AttributeType::Float { decimals, .. } => {
                let written = format!("{:.*}", decimals as usize, n);
                AttributeValue::Number(written.parse().unwrap_or(*n as f64))
            }
            _ => AttributeValue::Number(*n as f64),
        },
        FieldValue::Double(n) | FieldValue::Currency(n) if n.is_nan() => AttributeValue::Null,
        FieldValue::Double(n) | FieldValue::Currency(n) => AttributeValue::Number(*n),
        FieldValue::Integer(i) => AttributeValue::Integer(*i as i64),
        FieldValue::Logical(Some(b)) => AttributeValue::Logical(*b),
        FieldValue::Date(Some(d)) => NaiveDate::from_ymd_opt(d.year() as i32, d.month(), d.day())
            .map(AttributeValue::Date)
            .unwrap_or(AttributeValue::Null),
        _ => AttributeValue::Null,
    }
}

fn to_field_value(kind: AttributeType, value: &AttributeValue) -> FieldValue {
    match kind {
        AttributeType::Text { .. } => FieldValue::Character(match value {
            AttributeValue::Null => None,
            other => Some(other.to_string()),
        }),
        AttributeType::Number { .. } | AttributeType::Integer { .. } => {
            FieldValue::Numeric(value.as_f64())
        }
        AttributeType::Float { .. } => FieldValue::Float(value.as_f64().map(|n| n as f32)),
        AttributeType::Double => FieldValue::Double(value.as_f64().unwrap_or(f64::NAN)),
        AttributeType::Currency => FieldValue::Currency(value.as_f64().unwrap_or(f64::NAN)),
        AttributeType::Logical => FieldValue::Logical(match value {
            AttributeValue::Logical(b) => Some(*b),
            _ => None,
        }),
        AttributeType::Date => FieldValue::Date(match value {
            AttributeValue::Date(d) => Some(dbase::Date::new(d.day(), d.month(), d.year() as u32)),
            _ => None,
        }),
    }
}

fn kind_of_shape_type(shape_type: ShapeType) -> Option<GeometryKind> {
    match shape_type {
        ShapeType::Point | ShapeType::PointM | ShapeType::PointZ => Some(GeometryKind::Point),
        ShapeType::Multipoint | ShapeType::MultipointM | ShapeType::MultipointZ => {
            Some(GeometryKind::MultiPoint)
        }
        ShapeType::Polyline | ShapeType::PolylineM | ShapeType::PolylineZ => {
            Some(GeometryKind::Polyline)
        }
        ShapeType::Polygon | ShapeType::PolygonM | ShapeType::PolygonZ => {
            Some(GeometryKind::Polygon)
        }
        _ => None,
    }
}

fn shape_kind(index: usize, shape: &Shape) -> Result<GeometryKind, FileFormatError> {
    kind_of_shape_type(shape.shapetype()).ok_or_else(|| unsupported(index, shape))
}

fn unsupported(index: usize, shape: &Shape) -> FileFormatError {
    match shape {
        Shape::NullShape => FileFormatError::NullGeometry { index },
        other => FileFormatError::UnsupportedShape {
            index,
            shape_type: format!("{:?}", other.shapetype()),
        },
    }
}

/// Planar view of the three shapefile point flavours.
trait PlanarPoint {
    fn xy(&self) -> Coord<f64>;
}

impl PlanarPoint for Point {
    fn xy(&self) -> Coord<f64> {
        coord! { x: self.x, y: self.y }
    }
}

impl PlanarPoint for PointM {
    fn xy(&self) -> Coord<f64> {
        coord! { x: self.x, y: self.y }
    }
}

impl PlanarPoint for PointZ {
    fn xy(&self) -> Coord<f64> {
        coord! { x: self.x, y: self.y }
    }
}

fn points<P: PlanarPoint>(points: &[P]) -> Vec<Coord<f64>> {
    points.iter().map(PlanarPoint::xy).collect()
}

fn parts<P: PlanarPoint>(parts: &[Vec<P>]) -> Geometry {
    Geometry::Polyline(parts.iter().map(|part| points(part)).collect())
}

fn rings<P: PlanarPoint>(rings: &[PolygonRing<P>]) -> Geometry {
    Geometry::Polygon(
        rings
            .iter()
            .map(|ring| match ring {
                PolygonRing::Outer(pts) => Ring::outer(points(pts)),
                PolygonRing::Inner(pts) => Ring::inner(points(pts)),
            })
            .collect(),
    )
}

fn to_geometry(index: usize, shape: Shape) -> Result<Geometry, FileFormatError> {
    let geometry = match &shape {
        Shape::Point(p) => Geometry::Point(p.xy()),
        Shape::PointM(p) => Geometry::Point(p.xy()),
        Shape::PointZ(p) => Geometry::Point(p.xy()),
        Shape::Multipoint(m) => Geometry::MultiPoint(points(m.points())),
        Shape::MultipointM(m) => Geometry::MultiPoint(points(m.points())),
        Shape::MultipointZ(m) => Geometry::MultiPoint(points(m.points())),
        Shape::Polyline(l) => parts(l.parts()),
        Shape::PolylineM(l) => parts(l.parts()),
        Shape::PolylineZ(l) => parts(l.parts()),
        Shape::Polygon(p) => rings(p.rings()),
        Shape::PolygonM(p) => rings(p.rings()),
        Shape::PolygonZ(p) => rings(p.rings()),
        other => return Err(unsupported(index, other)),
    };
    Ok(geometry)
}

fn to_point(c: &Coord<f64>) -> Point {
    Point::new(c.x, c.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::collection::tests::sample_collection;
    use crate::store::types::FeatureId;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// Writes a one-point shapefile whose table is built by dBase directly.
    fn write_foreign_table(path: &Path) {
        let builder = TableWriterBuilder::new()
            .add_double_field(FieldName::try_from("precise").unwrap())
            .add_numeric_field(FieldName::try_from("ratio").unwrap(), 20, 10)
            .add_integer_field(FieldName::try_from("count").unwrap());
        let mut writer = shapefile::Writer::from_path(path, builder).unwrap();
        let mut record = Record::default();
        record.insert("precise".to_string(), FieldValue::Double(3.141592653589793));
        record.insert("ratio".to_string(), FieldValue::Numeric(Some(0.1234567891)));
        record.insert("count".to_string(), FieldValue::Integer(42));
        writer
            .write_shape_and_record(&Point::new(1.0, 2.0), &record)
            .unwrap();
    }

    fn reload(dir: &TempDir, name: &str, collection: &FeatureCollection) -> FeatureCollection {
        let path = dir.path().join(name);
        save(&path, collection).unwrap();
        load(&path).unwrap()
    }

    #[test]
    fn test_shp_path_normalises_extension() {
        assert_eq!(shp_path(Path::new("a/field")), PathBuf::from("a/field.shp"));
        assert_eq!(shp_path(Path::new("a/field.dbf")), PathBuf::from("a/field.shp"));
    }

    #[test]
    fn test_load_missing_file_is_format_error() {
        let dir = TempDir::new().unwrap();
        let result = load(&dir.path().join("nope.shp"));
        assert!(matches!(result, Err(FileFormatError::Unreadable { .. })));
    }

    #[test]
    fn test_load_garbage_is_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.shp");
        fs::write(&path, b"definitely not a shapefile").unwrap();
        fs::write(dir.path().join("bad.dbf"), b"nor a dbf").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("points.shp");
        let original = sample_collection();

        save(&path, &original).unwrap();
        assert!(dir.path().join("points.dbf").exists());
        assert!(dir.path().join("points.shx").exists());

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_round_trip_preserves_null_and_deleted_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edited.shp");
        let mut collection = sample_collection();
        collection
            .set_attribute(FeatureId(0), "name", AttributeValue::Null)
            .unwrap();
        collection.delete_feature(FeatureId(1)).unwrap();

        save(&path, &collection).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert!(loaded.features()[0].values()[0].is_null());
        assert_eq!(
            loaded.features()[1].values()[0],
            AttributeValue::Text("East strip".into())
        );
    }

    #[test]
    fn test_declared_storage_survives_resave() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foreign.shp");
        write_foreign_table(&path);

        let first = load(&path).unwrap();
        let kinds: Vec<AttributeType> = first.schema().fields().iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AttributeType::Double,
                AttributeType::Number {
                    length: 20,
                    decimals: 10
                },
                AttributeType::Integer {
                    length: DEFAULT_INTEGER_LENGTH
                },
            ]
        );

        let second = reload(&dir, "resaved.shp", &first);
        assert_eq!(second, first);
        assert_eq!(
            second.features()[0].values(),
            &[
                AttributeValue::Number(3.141592653589793),
                AttributeValue::Number(0.1234567891),
                AttributeValue::Integer(42),
            ]
        );
    }

    #[test]
    fn test_field_decimals_read_from_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foreign.shp");
        write_foreign_table(&path);
        assert_eq!(field_decimals(&path.with_extension("dbf")).unwrap(), vec![0, 10, 0]);
    }

    #[test]
    fn test_null_integer_from_new_row_stays_null() {
        let dir = TempDir::new().unwrap();
        let mut collection = sample_collection();
        let geometry = collection.features()[0].geometry.clone();
        let attrs = BTreeMap::from([("name".to_string(), AttributeValue::Text("New".into()))]);
        let id = collection.add_feature(geometry, attrs).unwrap();
        let position = collection.len() - 1;
        assert!(collection.get_attribute(id, "zone").unwrap().is_null());

        let loaded = reload(&dir, "added.shp", &collection);
        let row = loaded.id_at(position).unwrap();
        assert!(loaded.get_attribute(row, "zone").unwrap().is_null());
        assert_eq!(loaded, collection);
    }

    #[test]
    fn test_blank_integer_edit_stays_null() {
        let dir = TempDir::new().unwrap();
        let mut collection = sample_collection();
        collection
            .set_attribute_text(FeatureId(1), "zone", "  ")
            .unwrap();

        let loaded = reload(&dir, "blanked.shp", &collection);
        let row = loaded.id_at(1).unwrap();
        assert!(loaded.get_attribute(row, "zone").unwrap().is_null());
        assert_eq!(
            loaded.get_attribute(loaded.id_at(0).unwrap(), "zone").unwrap(),
            &AttributeValue::Integer(1)
        );
    }

    #[test]
    fn test_integer_column_without_default_stays_null() {
        let dir = TempDir::new().unwrap();
        let mut collection = sample_collection();
        collection
            .add_field(
                "rank",
                AttributeType::Integer {
                    length: DEFAULT_INTEGER_LENGTH,
                },
                "",
            )
            .unwrap();

        let loaded = reload(&dir, "ranked.shp", &collection);
        assert_eq!(loaded.schema(), collection.schema());
        assert!(loaded
            .features()
            .iter()
            .all(|f| f.values().last().map_or(false, AttributeValue::is_null)));
    }

    #[test]
    fn test_multibyte_text_rejected_before_save() {
        let dir = TempDir::new().unwrap();
        let mut collection = FeatureCollection::new(
            Schema::new(vec![Field::new("label", AttributeType::Text { length: 7 })]),
            GeometryKind::Point,
            Crs::Unknown,
        );
        let id = collection
            .add_feature(
                Geometry::Point(coord! { x: 0.0, y: 0.0 }),
                BTreeMap::from([("label".to_string(), AttributeValue::Text("Straße".into()))]),
            )
            .unwrap();
        assert!(collection
            .set_attribute_text(id, "label", "Größe!")
            .is_err());

        let loaded = reload(&dir, "labels.shp", &collection);
        assert_eq!(
            loaded.get_attribute(loaded.id_at(0).unwrap(), "label").unwrap(),
            &AttributeValue::Text("Straße".into())
        );
    }

    #[test]
    fn test_prj_written_for_known_crs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geo.shp");
        let wkt = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        let original = sample_collection();
        let mut collection = FeatureCollection::new(
            original.schema().clone(),
            original.kind(),
            Crs::from_wkt(wkt),
        );
        for feature in original.features() {
            collection.push_unchecked(feature.geometry.clone(), feature.values().to_vec());
        }

        save(&path, &collection).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("geo.prj")).unwrap(), wkt);
        assert!(load(&path).unwrap().crs().supports_basemap());
    }
}
