use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Current transaction is aborted, statements are refused until rollback")]
    TransactionAborted,

    #[error("Missing value for column '{column}' of table '{table}'")]
    MissingColumnValue { table: String, column: String },

    #[error("Column '{column}' of table '{table}' was given more than one value")]
    DuplicateColumnValue { table: String, column: String },

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<csv::Error> for DbError {
    fn from(err: csv::Error) -> Self {
        Self::Seed(err.to_string())
    }
}

impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        Self::Seed(err.to_string())
    }
}
