//! Tabular view over a feature collection.
//!
//! The view owns only its filter. Rows are produced on demand from the
//! collection, so every [`AttributeTableView::rows`] call reflects the latest
//! edits, and the returned iterator can be cloned to restart a scan.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::ValidationError;
use crate::store::{
    AttributeType, AttributeValue, Feature, FeatureCollection, FeatureId, MassOperation, Schema,
};

/// Parsed filter text.
///
/// - `""` matches every row
/// - `text` matches rows where any cell contains `text`
/// - `column:text` matches rows whose `column` contains `text`
///
/// Matching is a case-insensitive substring test on the displayed value.
/// A prefix before `:` that is not a column name is treated as plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RowFilter {
    #[default]
    All,
    Any { needle: String },
    Column { column: String, needle: String },
}

impl RowFilter {
    pub fn parse(schema: &Schema, text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return RowFilter::All;
        }
        if let Some((prefix, rest)) = text.split_once(':') {
            let prefix = prefix.trim();
            if let Some(name) = schema.names().find(|n| n.eq_ignore_ascii_case(prefix)) {
                return RowFilter::Column {
                    column: name.to_string(),
                    needle: rest.trim().to_lowercase(),
                };
            }
        }
        RowFilter::Any {
            needle: text.to_lowercase(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RowFilter::All)
    }

    fn contains(value: &AttributeValue, needle: &str) -> bool {
        value.to_string().to_lowercase().contains(needle)
    }

    pub fn matches(&self, schema: &Schema, feature: &Feature) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Any { needle } => feature.values().iter().any(|v| Self::contains(v, needle)),
            RowFilter::Column { column, needle } => schema
                .index_of(column)
                .and_then(|i| feature.values().get(i))
                .is_some_and(|v| Self::contains(v, needle)),
        }
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFilter::All => Ok(()),
            RowFilter::Any { needle } => f.write_str(needle),
            RowFilter::Column { column, needle } => write!(f, "{}:{}", column, needle),
        }
    }
}

/// One visible row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableRow<'a> {
    pub id: FeatureId,
    pub cells: &'a [AttributeValue],
}

impl TableRow<'_> {
    /// Cell texts as displayed.
    pub fn texts(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.iter().map(|v| v.to_string())
    }
}

/// Lazy iterator over the rows matching a filter, in collection order.
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    collection: &'a FeatureCollection,
    filter: &'a RowFilter,
    position: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = TableRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let features = self.collection.features();
        while let Some(feature) = features.get(self.position) {
            self.position += 1;
            if self.filter.matches(self.collection.schema(), feature) {
                return Some(TableRow {
                    id: feature.id,
                    cells: feature.values(),
                });
            }
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttributeTableView {
    filter: RowFilter,
}

impl AttributeTableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> &RowFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, collection: &FeatureCollection, text: &str) {
        self.filter = RowFilter::parse(collection.schema(), text);
        debug!(filter = %self.filter, "Table filter set");
    }

    pub fn clear_filter(&mut self) {
        self.filter = RowFilter::All;
    }

    /// Drops a column filter whose column no longer exists.
    pub fn reconcile(&mut self, collection: &FeatureCollection) {
        if let RowFilter::Column { column, .. } = &self.filter {
            if collection.schema().index_of(column).is_none() {
                self.filter = RowFilter::All;
            }
        }
    }

    pub fn rows<'a>(&'a self, collection: &'a FeatureCollection) -> Rows<'a> {
        Rows {
            collection,
            filter: &self.filter,
            position: 0,
        }
    }

    /// Header labels: column name and type.
    pub fn columns(collection: &FeatureCollection) -> Vec<(String, String)> {
        collection
            .schema()
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.kind.to_string()))
            .collect()
    }

    /// Parses `text` for the column's type and stores it.
    pub fn edit_cell(
        &self,
        collection: &mut FeatureCollection,
        id: FeatureId,
        column: &str,
        text: &str,
    ) -> Result<(), ValidationError> {
        collection.set_attribute_text(id, column, text)
    }

    /// Appends a row reusing `template`'s geometry with empty attributes.
    pub fn add_row(
        &self,
        collection: &mut FeatureCollection,
        template: FeatureId,
    ) -> Result<FeatureId, ValidationError> {
        let geometry = collection.feature(template)?.geometry.clone();
        collection.add_feature(geometry, BTreeMap::new())
    }

    pub fn delete_row(
        &self,
        collection: &mut FeatureCollection,
        id: FeatureId,
    ) -> Result<(), ValidationError> {
        collection.delete_feature(id).map(|_| ())
    }

    pub fn add_column(
        &self,
        collection: &mut FeatureCollection,
        name: &str,
        kind: AttributeType,
        default_text: &str,
    ) -> Result<(), ValidationError> {
        collection.add_field(name, kind, default_text)
    }

    pub fn delete_column(
        &mut self,
        collection: &mut FeatureCollection,
        name: &str,
    ) -> Result<(), ValidationError> {
        collection.remove_field(name)?;
        self.reconcile(collection);
        Ok(())
    }

    pub fn mass_update(
        &self,
        collection: &mut FeatureCollection,
        columns: &[String],
        operation: MassOperation,
        operand: f64,
    ) -> Result<usize, ValidationError> {
        collection.mass_update(columns, operation, operand)
    }
}
