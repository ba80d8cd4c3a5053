pub mod lookup;
#[allow(clippy::module_inception)]
pub mod result;

pub use lookup::TableLookup;
pub use result::{Record, RowSet};
