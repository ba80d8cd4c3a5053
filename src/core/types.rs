use super::{DbError, Result, Value};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Row as supplied by a caller: column name to value. Keys are matched
/// case-insensitively on insert.
pub type RowValues = HashMap<String, Value>;

pub type Row = Vec<Value>;

/// Name of the surrogate key column every gateway table carries.
pub const ID_COLUMN: &str = "id";

/// PostgreSQL truncates identifiers longer than this (NAMEDATALEN - 1).
const MAX_IDENTIFIER_LEN: usize = 63;

lazy_static! {
    static ref IDENTIFIER_PATTERN: Regex = Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap();
}

/// Validated table or column name.
///
/// Names are folded to lower case, the way PostgreSQL folds unquoted
/// identifiers, so `AT` and `at` address the same column. Only the
/// quoted form ever reaches SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(raw: &str) -> Result<Self> {
        let folded = raw.to_ascii_lowercase();

        if folded.len() > MAX_IDENTIFIER_LEN {
            return Err(DbError::InvalidIdentifier(format!(
                "'{}' is longer than {} bytes",
                raw, MAX_IDENTIFIER_LEN
            )));
        }

        if !IDENTIFIER_PATTERN.is_match(&folded) {
            return Err(DbError::InvalidIdentifier(format!(
                "'{}' must start with a letter or underscore and contain only letters, digits and underscores",
                raw
            )));
        }

        Ok(Self(folded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form produced by the driver's identifier escaping.
    pub fn quoted(&self) -> String {
        postgres_protocol::escape::escape_identifier(&self.0)
    }

    pub fn is_id(&self) -> bool {
        self.0 == ID_COLUMN
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Declared SQL type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    Integer,
    BigInt,
    Numeric,
    DoublePrecision,
    Text,
    Boolean,
    Timestamp,
    /// Catalog type with no counterpart above; readable, never declarable.
    Other(String),
}

impl SqlType {
    /// Keyword used in `CREATE TABLE`.
    pub fn ddl(&self) -> Result<&str> {
        match self {
            Self::Integer => Ok("INTEGER"),
            Self::BigInt => Ok("BIGINT"),
            Self::Numeric => Ok("NUMERIC"),
            Self::DoublePrecision => Ok("DOUBLE PRECISION"),
            Self::Text => Ok("TEXT"),
            Self::Boolean => Ok("BOOLEAN"),
            Self::Timestamp => Ok("TIMESTAMP"),
            Self::Other(name) => Err(DbError::TypeMismatch(format!(
                "column type '{}' cannot be declared",
                name
            ))),
        }
    }

    /// Spelling used by `information_schema.columns.data_type`.
    pub fn catalog_name(&self) -> &str {
        match self {
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Numeric => "numeric",
            Self::DoublePrecision => "double precision",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp without time zone",
            Self::Other(name) => name,
        }
    }

    pub fn from_catalog(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" | "int4" | "serial" => Self::Integer,
            "bigint" | "int8" | "bigserial" => Self::BigInt,
            "numeric" | "decimal" => Self::Numeric,
            "double precision" | "float8" => Self::DoublePrecision,
            "text" => Self::Text,
            "boolean" | "bool" => Self::Boolean,
            "timestamp" | "timestamp without time zone" => Self::Timestamp,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer | Self::BigInt, Value::Integer(_)) => true,
            (Self::Numeric | Self::DoublePrecision, Value::Integer(_) | Value::Float(_)) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Timestamp, Value::Timestamp(_)) => true,
            (Self::Other(_), _) => true,
            _ => false,
        }
    }

    /// Value as the store hands it back: integers written to a numeric
    /// column read back as floats.
    pub fn stored_form(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Numeric | Self::DoublePrecision, Value::Integer(i)) => Value::Float(i as f64),
            (_, value) => value,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.catalog_name())
    }
}

impl Serialize for SqlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.catalog_name())
    }
}

/// Column name and declared type, as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: SqlType,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: SqlType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "null value in column '{}' violates not-null constraint",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(DbError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(())
    }
}
