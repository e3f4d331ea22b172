//! Error types for changelog construction and statement building.

/// Errors raised while building a changelog.
///
/// Every variant is fatal: the build stops at the first violation and no
/// partial changelog is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A table definition has no version change at all.
    #[error("table definition '{table}' without any scheme version")]
    MissingVersions {
        /// Table definition id.
        table: String,
    },

    /// The first version change does not name the table.
    #[error("first version of table definition '{table}' does not supply a table name")]
    MissingBaseName {
        /// Table definition id.
        table: String,
    },

    /// Version labels of a timeline are not strictly ascending.
    #[error("versions of '{table}' are not strictly ascending at '{version}'")]
    UnorderedTimeline {
        /// Table definition id.
        table: String,
        /// Offending version label.
        version: String,
    },

    /// A table's first version contains something other than property additions.
    #[error("table '{table}' is created with a non-add change on property '{property}'")]
    NonAddOnCreation {
        /// Table name.
        table: String,
        /// Property name.
        property: String,
    },

    /// A table is created without properties.
    #[error("table '{table}' is created without any property")]
    EmptyTable {
        /// Table name.
        table: String,
    },

    /// A property name collides with an existing one.
    #[error("property '{property}' already exists in table '{table}'")]
    DuplicateProperty {
        /// Table name.
        table: String,
        /// Property name.
        property: String,
    },

    /// A change targets a property that does not exist.
    #[error("property '{property}' does not exist in table '{table}'")]
    UnknownProperty {
        /// Table name.
        table: String,
        /// Property name.
        property: String,
    },

    /// Retyping from or to an enum.
    #[error("property '{property}' of table '{table}' cannot be retyped from or to an enum")]
    EnumRetype {
        /// Table name.
        table: String,
        /// Property name.
        property: String,
    },

    /// A property references an enum that is not defined.
    #[error("unknown enum reference '{reference}'")]
    UnknownEnum {
        /// Enum reference.
        reference: String,
    },

    /// An enum is used at a version before its first values.
    #[error("enum '{reference}' has no values at version '{version}'")]
    EnumNotDefined {
        /// Enum reference.
        reference: String,
        /// Version label.
        version: String,
    },

    /// A constraint lists no columns.
    #[error("constraint '{name}' on table '{table}' has no columns")]
    EmptyConstraint {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },

    /// A primary key includes a nullable column.
    #[error("primary key '{name}' on table '{table}' uses nullable column '{column}'")]
    NullablePrimaryKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
        /// Column name.
        column: String,
    },

    /// A second primary key is added.
    #[error("table '{table}' already has primary key")]
    DuplicatePrimaryKey {
        /// Table name.
        table: String,
    },

    /// A primary key is removed from a table without one.
    #[error("table '{table}' has no primary key '{name}' to remove")]
    MissingPrimaryKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },

    /// A constraint or index name is already registered on any table.
    #[error("constraint or index name '{name}' is already in use")]
    DuplicateName {
        /// Constraint or index name.
        name: String,
    },

    /// A foreign key to remove does not exist.
    #[error("constraint '{name}' does not exist on table '{table}'")]
    UnknownConstraint {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
    },

    /// A foreign key uses an auto-increment column.
    #[error("foreign key '{name}' on table '{table}' uses auto-increment column '{column}'")]
    SerialForeignKey {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
        /// Column name.
        column: String,
    },

    /// A foreign key target is not materialized.
    #[error(
        "foreign key '{name}' on table '{table}' references unknown column '{column}' of '{referenced_table}'"
    )]
    UnknownReference {
        /// Table name.
        table: String,
        /// Constraint name.
        name: String,
        /// Referenced table id.
        referenced_table: String,
        /// Referenced column.
        column: String,
    },

    /// An index lists no columns.
    #[error("index '{name}' on table '{table}' has no columns")]
    EmptyIndex {
        /// Table name.
        table: String,
        /// Index name.
        name: String,
    },

    /// An index covers the same columns as an existing one.
    #[error("index '{name}' on table '{table}' duplicates the columns of index '{existing}'")]
    DuplicateIndexColumns {
        /// Table name.
        table: String,
        /// Index name.
        name: String,
        /// Existing index name.
        existing: String,
    },

    /// An index to remove does not exist.
    #[error("index '{name}' does not exist on table '{table}'")]
    UnknownIndex {
        /// Table name.
        table: String,
        /// Index name.
        name: String,
    },

    /// A table ends up with several auto-increment properties.
    #[error("table '{table}' has more than one auto-increment property")]
    MultipleSerial {
        /// Table name.
        table: String,
    },

    /// The active dialect cannot render a type.
    #[error("cannot render type for property '{property}' in the {dialect} dialect")]
    UnsupportedType {
        /// Property (or function parameter) name.
        property: String,
        /// Dialect name.
        dialect: &'static str,
    },

    /// A default literal does not fit its column type.
    #[error("invalid default '{value}' for property '{property}': {reason}")]
    InvalidDefault {
        /// Property name.
        property: String,
        /// Raw default literal.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for changelog construction.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised by the statement builders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The dialect has no upsert form.
    #[error("upsert is not supported by the {0} dialect")]
    UpsertUnsupported(&'static str),

    /// An upsert has neither an explicit conflict target nor key columns.
    #[error("upsert into '{0}' has no conflict key")]
    MissingConflictKey(String),
}
