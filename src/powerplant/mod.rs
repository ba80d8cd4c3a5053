//! Combined cycle power plant readings.
//!
//! Five hourly averages per row: ambient temperature (`AT`), exhaust
//! vacuum (`V`), ambient pressure (`AP`), relative humidity (`RH`) and net
//! electrical output (`PE`). Data set: Tüfekci (2014), UCI ML repository.

pub mod seed;

use crate::core::{RowValues, SqlType, Value};
use serde::{Deserialize, Serialize};

pub use seed::{SeedReport, fetch_csv, initialize, read_csv};

pub const TABLE_NAME: &str = "powerplant";

/// Declared columns of the power plant table, in order.
pub fn table_columns() -> [(&'static str, SqlType); 5] {
    [
        ("AT", SqlType::Numeric),
        ("V", SqlType::Numeric),
        ("AP", SqlType::Numeric),
        ("RH", SqlType::Numeric),
        ("PE", SqlType::Numeric),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct PowerPlantReading {
    pub AT: f64,
    pub V: f64,
    pub AP: f64,
    pub RH: f64,
    pub PE: f64,
}

impl PowerPlantReading {
    pub fn to_row(&self) -> RowValues {
        RowValues::from([
            ("AT".to_string(), Value::Float(self.AT)),
            ("V".to_string(), Value::Float(self.V)),
            ("AP".to_string(), Value::Float(self.AP)),
            ("RH".to_string(), Value::Float(self.RH)),
            ("PE".to_string(), Value::Float(self.PE)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_serializes_with_upper_case_keys() {
        let reading = PowerPlantReading {
            AT: 14.96,
            V: 41.76,
            AP: 1024.07,
            RH: 73.17,
            PE: 463.26,
        };

        assert_eq!(
            serde_json::to_value(reading).unwrap(),
            serde_json::json!({"AT": 14.96, "V": 41.76, "AP": 1024.07, "RH": 73.17, "PE": 463.26})
        );
        assert_eq!(reading.to_row().get("RH"), Some(&Value::Float(73.17)));
    }

    #[test]
    fn test_columns_cover_reading_fields() {
        let names: Vec<&str> = table_columns().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["AT", "V", "AP", "RH", "PE"]);
    }
}
