//! Column types and column specifications.

use serde::{Deserialize, Serialize};

/// Column types understood by the schema engine.
///
/// Each variant carries its own detail (length, precision). Dialects map
/// these to their concrete SQL types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Auto-incrementing 32-bit integer.
    Serial,
    /// Auto-incrementing 64-bit integer.
    BigSerial,
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Boolean.
    Boolean,
    /// Single precision float.
    Real,
    /// Double precision float.
    Double,
    /// Decimal with precision and scale.
    Decimal(u8, u8),
    /// Fixed-length character string.
    Char(u32),
    /// Variable-length character string.
    Varchar(u32),
    /// Unbounded text.
    Text,
    /// UUID.
    Uuid,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,
    /// Binary large object.
    Blob,
    /// JSON document.
    Json,
    /// Enum, by reference to an [`EnumDefinition`](super::EnumDefinition).
    Enum(String),
    /// Array of another type.
    Array(Box<ColumnType>),
}

impl ColumnType {
    /// Returns whether this is an auto-increment type.
    #[must_use]
    pub const fn is_serial(&self) -> bool {
        matches!(self, Self::Serial | Self::BigSerial)
    }

    /// Returns whether this is a date or time type.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::DateTime | Self::Timestamp
        )
    }

    /// Returns whether this is a numeric type.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Serial
                | Self::BigSerial
                | Self::SmallInt
                | Self::Integer
                | Self::BigInt
                | Self::Real
                | Self::Double
                | Self::Decimal(_, _)
        )
    }

    /// Returns the enum reference if this is an enum type.
    #[must_use]
    pub fn enum_reference(&self) -> Option<&str> {
        match self {
            Self::Enum(reference) => Some(reference),
            _ => None,
        }
    }
}

/// Type, nullability and default of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column type with its detail.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column allows NULL.
    #[serde(default)]
    pub nullable: bool,
    /// Default value as literal text, formatted per dialect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnSpec {
    /// Creates a NOT NULL column spec without default.
    #[must_use]
    pub const fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            nullable: false,
            default: None,
        }
    }

    /// Makes the column nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the default value literal.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A live column: a name plus its spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Column name.
    pub name: String,
    /// Column spec.
    #[serde(flatten)]
    pub spec: ColumnSpec,
}

impl Property {
    /// Creates a property.
    #[must_use]
    pub fn new(name: impl Into<String>, spec: ColumnSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    /// Returns whether NULL is allowed. Serial columns never are.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.spec.nullable && !self.spec.column_type.is_serial()
    }

    /// Returns whether this is an auto-increment column.
    #[must_use]
    pub const fn is_serial(&self) -> bool {
        self.spec.column_type.is_serial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_is_never_nullable() {
        let id = Property::new("id", ColumnSpec::new(ColumnType::Serial).nullable());
        assert!(id.is_serial());
        assert!(!id.is_nullable());
    }

    #[test]
    fn test_column_type_json_shape() {
        let spec = ColumnSpec::new(ColumnType::Varchar(12)).default_value("n/a");
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"type":{"varchar":12},"nullable":false,"default":"n/a"}"#);

        let parsed: ColumnSpec = serde_json::from_str(r#"{"type":"serial"}"#).unwrap();
        assert_eq!(parsed, ColumnSpec::new(ColumnType::Serial));
    }

    #[test]
    fn test_enum_reference() {
        assert_eq!(
            ColumnType::Enum("status".into()).enum_reference(),
            Some("status")
        );
        assert_eq!(ColumnType::Text.enum_reference(), None);
    }
}
