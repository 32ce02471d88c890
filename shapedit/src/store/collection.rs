//! In-memory feature table.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use super::crs::Crs;
use super::geometry::{Geometry, GeometryKind};
use super::types::{validate_field_name, AttributeType, AttributeValue, FeatureId, Field, Schema};
use crate::coord::Bounds;
use crate::error::ValidationError;

/// One record: a geometry plus one value per schema column.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    values: Vec<AttributeValue>,
}

impl Feature {
    /// Values in schema order.
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }
}

/// Arithmetic applied by [`FeatureCollection::mass_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassOperation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl MassOperation {
    fn apply(&self, value: f64, operand: f64) -> f64 {
        match self {
            MassOperation::Add => value + operand,
            MassOperation::Subtract => value - operand,
            MassOperation::Multiply => value * operand,
            MassOperation::Divide => value / operand,
        }
    }
}

impl FromStr for MassOperation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" | "+" => Ok(MassOperation::Add),
            "subtract" | "sub" | "-" => Ok(MassOperation::Subtract),
            "multiply" | "mul" | "*" => Ok(MassOperation::Multiply),
            "divide" | "div" | "/" => Ok(MassOperation::Divide),
            other => Err(ValidationError::Invalid(format!(
                "Unknown operation '{}' (expected add, subtract, multiply or divide)",
                other
            ))),
        }
    }
}

impl fmt::Display for MassOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MassOperation::Add => "add",
            MassOperation::Subtract => "subtract",
            MassOperation::Multiply => "multiply",
            MassOperation::Divide => "divide",
        })
    }
}

/// Geometries and attributes loaded from one shapefile.
///
/// Every feature shares the schema and the geometry kind. Mutations are
/// applied immediately and bump [`revision`](Self::revision).
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    schema: Schema,
    kind: GeometryKind,
    crs: Crs,
    features: Vec<Feature>,
    next_id: u64,
    revision: u64,
}

impl PartialEq for FeatureCollection {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.kind == other.kind
            && self.crs == other.crs
            && self.features == other.features
    }
}

impl FeatureCollection {
    /// Creates an empty collection.
    pub fn new(schema: Schema, kind: GeometryKind, crs: Crs) -> Self {
        Self {
            schema,
            kind,
            crs,
            features: Vec::new(),
            next_id: 0,
            revision: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Monotonic counter of successful mutations.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Features in their original order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, id: FeatureId) -> Result<&Feature, ValidationError> {
        self.features
            .iter()
            .find(|f| f.id == id)
            .ok_or(ValidationError::UnknownFeature(id.0))
    }

    /// Id of the feature at a table row position.
    pub fn id_at(&self, row: usize) -> Option<FeatureId> {
        self.features.get(row).map(|f| f.id)
    }

    fn position(&self, id: FeatureId) -> Result<usize, ValidationError> {
        self.features
            .iter()
            .position(|f| f.id == id)
            .ok_or(ValidationError::UnknownFeature(id.0))
    }

    fn column(&self, name: &str) -> Result<usize, ValidationError> {
        self.schema
            .index_of(name)
            .ok_or_else(|| ValidationError::UnknownColumn(name.to_string()))
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn get_attribute(&self, id: FeatureId, name: &str) -> Result<&AttributeValue, ValidationError> {
        let column = self.column(name)?;
        Ok(&self.feature(id)?.values[column])
    }

    /// Sets a typed value; the old value is kept if validation fails.
    pub fn set_attribute(
        &mut self,
        id: FeatureId,
        name: &str,
        value: AttributeValue,
    ) -> Result<(), ValidationError> {
        let column = self.column(name)?;
        let position = self.position(id)?;
        let value = self.schema.fields()[column].kind.check(name, value)?;
        self.features[position].values[column] = value;
        self.touch();
        debug!(feature = id.0, column = name, "Attribute updated");
        Ok(())
    }

    /// Parses cell text according to the column type, then sets it.
    pub fn set_attribute_text(
        &mut self,
        id: FeatureId,
        name: &str,
        text: &str,
    ) -> Result<(), ValidationError> {
        let column = self.column(name)?;
        let value = self.schema.fields()[column].kind.parse(name, text)?;
        self.set_attribute(id, name, value)
    }

    /// Appends a feature; columns not named in `attributes` start as Null.
    pub fn add_feature(
        &mut self,
        geometry: Geometry,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> Result<FeatureId, ValidationError> {
        if geometry.kind() != self.kind {
            return Err(ValidationError::GeometryMismatch {
                expected: self.kind.to_string(),
                found: geometry.kind().to_string(),
            });
        }

        let mut values = vec![AttributeValue::Null; self.schema.len()];
        for (name, value) in attributes {
            let column = self.column(&name)?;
            values[column] = self.schema.fields()[column].kind.check(&name, value)?;
        }

        let id = self.push_unchecked(geometry, values);
        self.touch();
        debug!(feature = id.0, "Feature added");
        Ok(id)
    }

    /// Appends without validation; used by the loader.
    pub(crate) fn push_unchecked(&mut self, geometry: Geometry, values: Vec<AttributeValue>) -> FeatureId {
        let id = FeatureId(self.next_id);
        self.next_id += 1;
        self.features.push(Feature {
            id,
            geometry,
            values,
        });
        id
    }

    pub fn delete_feature(&mut self, id: FeatureId) -> Result<Feature, ValidationError> {
        let position = self.position(id)?;
        let removed = self.features.remove(position);
        self.touch();
        debug!(feature = id.0, "Feature deleted");
        Ok(removed)
    }

    /// Adds a column, filling every row with `default_text` parsed as `kind`.
    pub fn add_field(
        &mut self,
        name: &str,
        kind: AttributeType,
        default_text: &str,
    ) -> Result<(), ValidationError> {
        validate_field_name(&self.schema, name)?;
        let default = kind.parse(name, default_text)?;
        self.schema.push(Field::new(name, kind));
        for feature in &mut self.features {
            feature.values.push(default.clone());
        }
        self.touch();
        info!(column = name, kind = %kind, "Column added");
        Ok(())
    }

    pub fn remove_field(&mut self, name: &str) -> Result<Field, ValidationError> {
        let column = self.column(name)?;
        let field = self.schema.remove(column);
        for feature in &mut self.features {
            feature.values.remove(column);
        }
        self.touch();
        info!(column = name, "Column removed");
        Ok(field)
    }

    /// Applies arithmetic to every non-null cell of the numeric `columns`.
    ///
    /// Non-numeric columns are skipped. Integer columns keep integer values
    /// (results are rounded) so the schema stays valid. Returns the number of
    /// cells changed; nothing changes if any result does not fit its column.
    pub fn mass_update(
        &mut self,
        columns: &[String],
        operation: MassOperation,
        operand: f64,
    ) -> Result<usize, ValidationError> {
        if !operand.is_finite() {
            return Err(ValidationError::Invalid(format!(
                "Operand must be a finite number, got {}",
                operand
            )));
        }
        if operation == MassOperation::Divide && operand == 0.0 {
            return Err(ValidationError::DivideByZero);
        }

        let mut targets = Vec::with_capacity(columns.len());
        for name in columns {
            let column = self.column(name)?;
            let kind = self.schema.fields()[column].kind;
            if kind.is_numeric() {
                targets.push((column, kind));
            } else {
                debug!(column = %name, "Skipping non-numeric column in mass update");
            }
        }

        // Validate every result before touching any cell.
        let mut updates = Vec::new();
        for (position, feature) in self.features.iter().enumerate() {
            for &(column, kind) in &targets {
                let Some(current) = feature.values[column].as_f64() else {
                    continue;
                };
                let result = operation.apply(current, operand);
                let value = match kind {
                    AttributeType::Integer { .. } => AttributeValue::Integer(result.round() as i64),
                    _ => AttributeValue::Number(result),
                };
                let name = &self.schema.fields()[column].name;
                updates.push((position, column, kind.check(name, value)?));
            }
        }

        let changed = updates.len();
        for (position, column, value) in updates {
            self.features[position].values[column] = value;
        }

        if changed > 0 {
            self.touch();
        }
        info!(op = %operation, operand, cells = changed, "Mass update applied");
        Ok(changed)
    }

    /// Total bounds of every geometry, or `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds = Bounds::empty();
        for feature in &self.features {
            bounds.union(&feature.geometry.bounds());
        }
        (!bounds.is_empty()).then_some(bounds)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use geo::coord;

    /// Three point features with a text, number and integer column.
    pub(crate) fn sample_collection() -> FeatureCollection {
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
        let mut collection = FeatureCollection::new(schema, GeometryKind::Point, Crs::Unknown);
        let rows = [
            ("North field", 4.5, 1, (10.0, 20.0)),
            ("South field", 6.0, 2, (11.0, 18.0)),
            ("East strip", 5.25, 1, (13.0, 19.0)),
        ];
        for (name, yield_t, zone, (x, y)) in rows {
            collection.push_unchecked(
                Geometry::Point(coord! { x: x, y: y }),
                vec![
                    AttributeValue::Text(name.to_string()),
                    AttributeValue::Number(yield_t),
                    AttributeValue::Integer(zone),
                ],
            );
        }
        collection
    }

    #[test]
    fn test_set_attribute_visible_immediately() {
        let mut c = sample_collection();
        c.set_attribute(FeatureId(1), "yield", AttributeValue::Number(7.5))
            .unwrap();
        assert_eq!(
            c.get_attribute(FeatureId(1), "yield").unwrap(),
            &AttributeValue::Number(7.5)
        );
    }

    #[test]
    fn test_set_attribute_mismatch_keeps_prior_value() {
        let mut c = sample_collection();
        let before = c.revision();
        let err = c
            .set_attribute(FeatureId(0), "yield", AttributeValue::Text("lots".into()))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));
        assert_eq!(
            c.get_attribute(FeatureId(0), "yield").unwrap(),
            &AttributeValue::Number(4.5)
        );
        assert_eq!(c.revision(), before);
    }

    #[test]
    fn test_set_attribute_text_parses_by_column_type() {
        let mut c = sample_collection();
        c.set_attribute_text(FeatureId(2), "zone", "3").unwrap();
        assert_eq!(
            c.get_attribute(FeatureId(2), "zone").unwrap(),
            &AttributeValue::Integer(3)
        );
        assert!(c.set_attribute_text(FeatureId(2), "zone", "three").is_err());
    }

    #[test]
    fn test_unknown_column() {
        let c = sample_collection();
        assert!(matches!(
            c.get_attribute(FeatureId(0), "missing"),
            Err(ValidationError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_deleted_feature_is_gone() {
        let mut c = sample_collection();
        c.delete_feature(FeatureId(1)).unwrap();
        assert_eq!(c.len(), 2);
        assert!(matches!(
            c.get_attribute(FeatureId(1), "name"),
            Err(ValidationError::UnknownFeature(1))
        ));
        assert!(c.delete_feature(FeatureId(1)).is_err());
    }

    #[test]
    fn test_add_feature_assigns_fresh_id_and_nulls() {
        let mut c = sample_collection();
        c.delete_feature(FeatureId(2)).unwrap();
        let mut attrs = BTreeMap::new();
        attrs.insert("zone".to_string(), AttributeValue::Integer(4));
        let id = c
            .add_feature(Geometry::Point(coord! { x: 0.0, y: 0.0 }), attrs)
            .unwrap();
        assert_eq!(id, FeatureId(3));
        assert_eq!(c.get_attribute(id, "name").unwrap(), &AttributeValue::Null);
        assert_eq!(c.get_attribute(id, "zone").unwrap(), &AttributeValue::Integer(4));
    }

    #[test]
    fn test_add_feature_rejects_other_geometry_kind() {
        let mut c = sample_collection();
        let line = Geometry::Polyline(vec![vec![coord! { x: 0.0, y: 0.0 }]]);
        assert!(matches!(
            c.add_feature(line, BTreeMap::new()),
            Err(ValidationError::GeometryMismatch { .. })
        ));
    }

    #[test]
    fn test_add_and_remove_field() {
        let mut c = sample_collection();
        c.add_field("crop", AttributeType::Text { length: 10 }, "corn")
            .unwrap();
        assert_eq!(
            c.get_attribute(FeatureId(0), "crop").unwrap(),
            &AttributeValue::Text("corn".into())
        );
        c.remove_field("yield").unwrap();
        assert_eq!(c.schema().names().collect::<Vec<_>>(), ["name", "zone", "crop"]);
        assert_eq!(c.features()[0].values().len(), 3);
    }

    #[test]
    fn test_add_field_bad_default_changes_nothing() {
        let mut c = sample_collection();
        assert!(c.add_field("n", AttributeType::Integer { length: 4 }, "abc").is_err());
        assert_eq!(c.schema().len(), 3);
    }

    #[test]
    fn test_mass_update_numeric_only() {
        let mut c = sample_collection();
        let cols = vec!["yield".to_string(), "name".to_string()];
        let changed = c.mass_update(&cols, MassOperation::Multiply, 2.0).unwrap();
        assert_eq!(changed, 3);
        assert_eq!(
            c.get_attribute(FeatureId(0), "yield").unwrap(),
            &AttributeValue::Number(9.0)
        );
        assert_eq!(
            c.get_attribute(FeatureId(0), "name").unwrap(),
            &AttributeValue::Text("North field".into())
        );
    }

    #[test]
    fn test_mass_update_integer_column_stays_integer() {
        let mut c = sample_collection();
        c.mass_update(&["zone".to_string()], MassOperation::Divide, 2.0)
            .unwrap();
        assert_eq!(
            c.get_attribute(FeatureId(1), "zone").unwrap(),
            &AttributeValue::Integer(1)
        );
    }

    #[test]
    fn test_mass_update_divide_by_zero_rejected() {
        let mut c = sample_collection();
        let before = c.clone();
        let result = c.mass_update(&["yield".to_string()], MassOperation::Divide, 0.0);
        assert_eq!(result, Err(ValidationError::DivideByZero));
        assert_eq!(c, before);
    }

    #[test]
    fn test_mass_update_overflow_changes_nothing() {
        let mut c = sample_collection();
        let before = c.clone();
        let result = c.mass_update(
            &["yield".to_string(), "zone".to_string()],
            MassOperation::Multiply,
            10_000.0,
        );
        assert!(matches!(result, Err(ValidationError::TooLong { max: 4, .. })));
        assert_eq!(c, before);
    }

    #[test]
    fn test_mass_update_skips_nulls() {
        let mut c = sample_collection();
        c.set_attribute(FeatureId(0), "yield", AttributeValue::Null)
            .unwrap();
        let changed = c
            .mass_update(&["yield".to_string()], MassOperation::Add, 1.0)
            .unwrap();
        assert_eq!(changed, 2);
        assert!(c.get_attribute(FeatureId(0), "yield").unwrap().is_null());
    }

    #[test]
    fn test_mass_operation_parse() {
        assert_eq!("Add".parse::<MassOperation>().unwrap(), MassOperation::Add);
        assert_eq!("/".parse::<MassOperation>().unwrap(), MassOperation::Divide);
        assert!("pow".parse::<MassOperation>().is_err());
    }

    #[test]
    fn test_bounds() {
        let c = sample_collection();
        assert_eq!(c.bounds(), Some(Bounds::new(10.0, 18.0, 13.0, 20.0)));
    }

    #[test]
    fn test_revision_advances_on_mutation() {
        let mut c = sample_collection();
        let r0 = c.revision();
        c.set_attribute_text(FeatureId(0), "name", "Renamed").unwrap();
        assert!(c.revision() > r0);
    }
}
