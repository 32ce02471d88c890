//! Attribute schema and value types.

use chrono::NaiveDate;
use std::fmt;

use crate::error::ValidationError;

/// Maximum length of a dBase field name.
pub const MAX_FIELD_NAME_LEN: usize = 10;

/// Default width for new text columns.
pub const DEFAULT_TEXT_LENGTH: u8 = 80;

/// Default width and precision for new numeric columns.
pub const DEFAULT_NUMBER_LENGTH: u8 = 18;
pub const DEFAULT_NUMBER_DECIMALS: u8 = 6;

/// Default width of integer columns; holds every 32-bit value.
pub const DEFAULT_INTEGER_LENGTH: u8 = 11;

/// Widest integer column that still maps onto `i64`.
pub const MAX_INTEGER_LENGTH: u8 = 18;

/// Stable identifier of a feature within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared type of an attribute column.
///
/// Widths are dBase field widths in bytes. `Integer` is stored as a
/// numeric field without decimals so that blank (Null) cells survive a
/// save; `Double` and `Currency` are 8-byte binary fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Text { length: u8 },
    Number { length: u8, decimals: u8 },
    Float { length: u8, decimals: u8 },
    Double,
    Currency,
    Integer { length: u8 },
    Logical,
    Date,
}

impl AttributeType {
    /// Whether the column holds numbers that arithmetic can apply to.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AttributeType::Number { .. }
                | AttributeType::Float { .. }
                | AttributeType::Double
                | AttributeType::Currency
                | AttributeType::Integer { .. }
        )
    }

    /// Short name used in messages and the `add-column` command.
    pub fn label(&self) -> &'static str {
        match self {
            AttributeType::Text { .. } => "text",
            AttributeType::Number { .. } => "number",
            AttributeType::Float { .. } => "float",
            AttributeType::Double => "double",
            AttributeType::Currency => "currency",
            AttributeType::Integer { .. } => "integer",
            AttributeType::Logical => "logical",
            AttributeType::Date => "date",
        }
    }

    /// Parses a type label with default widths.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "text" | "string" | "str" | "character" => Some(AttributeType::Text {
                length: DEFAULT_TEXT_LENGTH,
            }),
            "number" | "numeric" => Some(AttributeType::Number {
                length: DEFAULT_NUMBER_LENGTH,
                decimals: DEFAULT_NUMBER_DECIMALS,
            }),
            "float" => Some(AttributeType::Float {
                length: DEFAULT_NUMBER_LENGTH,
                decimals: DEFAULT_NUMBER_DECIMALS,
            }),
            "double" => Some(AttributeType::Double),
            "currency" => Some(AttributeType::Currency),
            "integer" | "int" => Some(AttributeType::Integer {
                length: DEFAULT_INTEGER_LENGTH,
            }),
            "logical" | "bool" | "boolean" => Some(AttributeType::Logical),
            "date" => Some(AttributeType::Date),
            _ => None,
        }
    }

    /// Parses cell text into a value of this type.
    ///
    /// Blank text becomes [`AttributeValue::Null`].
    pub fn parse(&self, column: &str, text: &str) -> Result<AttributeValue, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(AttributeValue::Null);
        }
        let mismatch = || ValidationError::TypeMismatch {
            column: column.to_string(),
            expected: self.label().to_string(),
            value: text.to_string(),
        };

        let value = match self {
            AttributeType::Text { .. } => AttributeValue::Text(text.to_string()),
            AttributeType::Number { .. }
            | AttributeType::Float { .. }
            | AttributeType::Double
            | AttributeType::Currency => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(AttributeValue::Number)
                .ok_or_else(mismatch)?,
            AttributeType::Integer { .. } => trimmed
                .parse::<i64>()
                .map(AttributeValue::Integer)
                .map_err(|_| mismatch())?,
            AttributeType::Logical => match trimmed.to_lowercase().as_str() {
                "t" | "true" | "y" | "yes" | "1" => AttributeValue::Logical(true),
                "f" | "false" | "n" | "no" | "0" => AttributeValue::Logical(false),
                _ => return Err(mismatch()),
            },
            AttributeType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d"))
                .map(AttributeValue::Date)
                .map_err(|_| mismatch())?,
        };
        self.check(column, value)
    }

    /// Checks that a typed value is acceptable for this column.
    ///
    /// Integer values are accepted by numeric columns and widened. Values
    /// must fit the column width as written to the `.dbf`.
    pub fn check(&self, column: &str, value: AttributeValue) -> Result<AttributeValue, ValidationError> {
        let mismatch = |value: &AttributeValue| ValidationError::TypeMismatch {
            column: column.to_string(),
            expected: self.label().to_string(),
            value: value.to_string(),
        };
        let fits = |written: String, length: u8, value: AttributeValue| {
            if written.len() > length as usize {
                Err(ValidationError::TooLong {
                    column: column.to_string(),
                    value: written,
                    max: length as usize,
                })
            } else {
                Ok(value)
            }
        };

        match (self, value) {
            (_, AttributeValue::Null) => Ok(AttributeValue::Null),
            (AttributeType::Text { .. }, AttributeValue::Text(s)) if s.trim().is_empty() => {
                Ok(AttributeValue::Null)
            }
            (AttributeType::Text { length }, AttributeValue::Text(s)) => {
                fits(s.clone(), *length, AttributeValue::Text(s))
            }
            (
                AttributeType::Number { length, decimals }
                | AttributeType::Float { length, decimals },
                value @ (AttributeValue::Number(_) | AttributeValue::Integer(_)),
            ) => match value.as_f64().filter(|n| n.is_finite()) {
                // Keep what the .dbf will hold, rounded to the column decimals.
                Some(n) => {
                    let written = format!("{:.*}", *decimals as usize, n);
                    let stored = written.parse::<f64>().unwrap_or(n);
                    fits(written, *length, AttributeValue::Number(stored))
                }
                None => Err(mismatch(&value)),
            },
            (
                AttributeType::Double | AttributeType::Currency,
                value @ (AttributeValue::Number(_) | AttributeValue::Integer(_)),
            ) => match value.as_f64().filter(|n| n.is_finite()) {
                Some(n) => Ok(AttributeValue::Number(n)),
                None => Err(mismatch(&value)),
            },
            (AttributeType::Integer { length }, AttributeValue::Integer(i)) => {
                fits(i.to_string(), *length, AttributeValue::Integer(i))
            }
            (AttributeType::Logical, AttributeValue::Logical(b)) => Ok(AttributeValue::Logical(b)),
            (AttributeType::Date, AttributeValue::Date(d)) => Ok(AttributeValue::Date(d)),
            (_, other) => Err(mismatch(&other)),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::Text { length } => write!(f, "text({})", length),
            AttributeType::Number { length, decimals } => {
                write!(f, "number({},{})", length, decimals)
            }
            AttributeType::Float { length, decimals } => write!(f, "float({},{})", length, decimals),
            AttributeType::Integer { length } => write!(f, "integer({})", length),
            other => f.write_str(other.label()),
        }
    }
}

/// One attribute cell.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Text(String),
    Number(f64),
    Integer(i64),
    Logical(bool),
    Date(NaiveDate),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Logical(b) => f.write_str(if *b { "true" } else { "false" }),
            AttributeValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A named, typed attribute column.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: AttributeType,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered attribute columns shared by every feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub(crate) fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Field {
        self.fields.remove(index)
    }
}

/// Validates a new column name against dBase rules and the schema.
pub fn validate_field_name(schema: &Schema, name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidColumnName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_FIELD_NAME_LEN {
        return Err(invalid("names are limited to 10 characters"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("only ASCII letters, digits and '_' are allowed"));
    }
    if name.eq_ignore_ascii_case("geometry") {
        return Err(invalid("'geometry' is reserved"));
    }
    if schema.names().any(|n| n.eq_ignore_ascii_case(name)) {
        return Err(ValidationError::DuplicateColumn(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number() -> AttributeType {
        AttributeType::Number {
            length: 18,
            decimals: 6,
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(
            number().parse("yield", " 12.5 ").unwrap(),
            AttributeValue::Number(12.5)
        );
    }

    #[test]
    fn test_parse_rejects_text_in_number_column() {
        let err = number().parse("yield", "high").unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));
        assert!(err.to_string().contains("yield"));
    }

    #[test]
    fn test_parse_blank_is_null() {
        assert_eq!(number().parse("yield", "  ").unwrap(), AttributeValue::Null);
    }

    #[test]
    fn test_parse_logical_variants() {
        let t = AttributeType::Logical;
        assert_eq!(t.parse("ok", "Y").unwrap(), AttributeValue::Logical(true));
        assert_eq!(t.parse("ok", "false").unwrap(), AttributeValue::Logical(false));
        assert!(t.parse("ok", "maybe").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let t = AttributeType::Date;
        let expected = AttributeValue::Date(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(t.parse("sown", "2025-02-01").unwrap(), expected);
        assert_eq!(t.parse("sown", "20250201").unwrap(), expected);
    }

    #[test]
    fn test_integer_width_is_enforced() {
        let t = AttributeType::Integer { length: 4 };
        assert_eq!(t.parse("n", "9999").unwrap(), AttributeValue::Integer(9999));
        assert!(t.parse("n", "-999").is_ok());
        assert!(matches!(
            t.parse("n", "10000"),
            Err(ValidationError::TooLong { max: 4, .. })
        ));
        assert!(t.parse("n", "-1000").is_err());
        assert!(t.parse("n", "1.5").is_err());
    }

    #[test]
    fn test_integer_column_accepts_null() {
        let t = AttributeType::from_label("integer").unwrap();
        assert_eq!(t.parse("zone", "").unwrap(), AttributeValue::Null);
        assert_eq!(t.check("zone", AttributeValue::Null).unwrap(), AttributeValue::Null);
    }

    #[test]
    fn test_text_length_enforced() {
        let t = AttributeType::Text { length: 3 };
        let err = t.parse("code", "ABCD").unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 3, .. }));
    }

    #[test]
    fn test_text_length_counts_bytes() {
        let t = AttributeType::Text { length: 5 };
        // Five characters, ten bytes in UTF-8.
        assert!(matches!(
            t.parse("farm", "\u{dc}\u{df}\u{e9}\u{e0}\u{f6}"),
            Err(ValidationError::TooLong { max: 5, .. })
        ));
        assert_eq!(
            t.parse("farm", "M\u{fc}hle").unwrap_err().to_string(),
            "Value 'M\u{fc}hle' does not fit column 'farm' (max 5 bytes)"
        );
        assert!(t.parse("farm", "\u{e9}t\u{e9}").is_ok());
    }

    #[test]
    fn test_number_rounds_to_column_decimals() {
        let t = AttributeType::Number {
            length: 8,
            decimals: 2,
        };
        assert_eq!(t.parse("y", "3.14159").unwrap(), AttributeValue::Number(3.14));
        // "123456.00" is nine bytes wide.
        assert!(matches!(
            t.check("y", AttributeValue::Number(123456.0)),
            Err(ValidationError::TooLong { max: 8, .. })
        ));
    }

    #[test]
    fn test_double_keeps_full_precision() {
        let t = AttributeType::from_label("double").unwrap();
        assert_eq!(t, AttributeType::Double);
        assert_eq!(
            t.parse("pi", "3.141592653589793").unwrap(),
            AttributeValue::Number(std::f64::consts::PI)
        );
        assert!(t.parse("pi", "inf").is_err());
    }

    #[test]
    fn test_check_widens_integer_for_number_column() {
        assert_eq!(
            number().check("y", AttributeValue::Integer(4)).unwrap(),
            AttributeValue::Number(4.0)
        );
    }

    #[test]
    fn test_check_rejects_text_for_logical() {
        let result = AttributeType::Logical.check("ok", AttributeValue::Text("x".into()));
        assert!(result.is_err());
    }

    #[test]
    fn test_field_name_rules() {
        let schema = Schema::new(vec![Field::new(
            "zone",
            AttributeType::Integer {
                length: DEFAULT_INTEGER_LENGTH,
            },
        )]);
        assert!(validate_field_name(&schema, "yield_t").is_ok());
        assert!(matches!(
            validate_field_name(&schema, "ZONE"),
            Err(ValidationError::DuplicateColumn(_))
        ));
        assert!(validate_field_name(&schema, "much_too_long").is_err());
        assert!(validate_field_name(&schema, "bad name").is_err());
        assert!(validate_field_name(&schema, "").is_err());
    }

    #[test]
    fn test_type_labels_round_trip() {
        for label in [
            "text", "number", "float", "double", "currency", "integer", "logical", "date",
        ] {
            let t = AttributeType::from_label(label).unwrap();
            assert_eq!(t.label(), label);
        }
        assert!(AttributeType::from_label("blob").is_none());
    }
}
