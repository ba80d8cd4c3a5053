pub mod error;
pub mod types;
pub mod value;

pub use error::{DbError, Result};
pub use types::{ColumnDescriptor, ID_COLUMN, Identifier, Row, RowValues, SqlType};
pub use value::Value;
