pub mod gateway;
pub mod schema;

pub use gateway::{DEFAULT_RETRIEVE_LIMIT, TableGateway};
