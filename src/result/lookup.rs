/// Outcome of an operation against a table that may not exist yet.
///
/// A missing table is not an error for the gateway: reads degrade to the
/// empty result. The variant keeps that degradation visible to callers
/// instead of folding it into a zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLookup<T> {
    Found(T),
    MissingTable,
}

impl<T> TableLookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingTable)
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::MissingTable => None,
        }
    }

    pub fn as_ref(&self) -> TableLookup<&T> {
        match self {
            Self::Found(value) => TableLookup::Found(value),
            Self::MissingTable => TableLookup::MissingTable,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> TableLookup<U> {
        match self {
            Self::Found(value) => TableLookup::Found(f(value)),
            Self::MissingTable => TableLookup::MissingTable,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.found().unwrap_or(default)
    }
}

impl<T: Default> TableLookup<T> {
    /// Empty, zero or false result of the permissive contract.
    pub fn unwrap_or_default(self) -> T {
        self.found().unwrap_or_default()
    }
}

impl<T> From<Option<T>> for TableLookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::MissingTable, Self::Found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_table_defaults() {
        let count: TableLookup<i64> = TableLookup::MissingTable;
        assert!(count.is_missing());
        assert_eq!(count.unwrap_or_default(), 0);

        let names: TableLookup<Vec<String>> = TableLookup::MissingTable;
        assert!(names.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_found_passes_through() {
        let count = TableLookup::Found(5i64).map(|n| n * 2);
        assert_eq!(count, TableLookup::Found(10));
        assert_eq!(count.unwrap_or(0), 10);
        assert_eq!(TableLookup::from(None::<i64>), TableLookup::MissingTable);
    }
}
