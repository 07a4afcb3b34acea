//! Storage classes for Vista values.
//!
//! Embedded engines store every cell in one of five storage classes; a
//! `Value` always carries exactly one of them.

/// Storage class of a database value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageClass {
    /// The NULL value
    Null,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit floating point number
    Real,
    /// UTF-8 text
    Text,
    /// Binary blob
    Blob,
}

impl StorageClass {
    /// Returns the SQL type name used in casts and diagnostics.
    pub fn sql_name(&self) -> &'static str {
        match self {
            StorageClass::Null => "NULL",
            StorageClass::Integer => "INTEGER",
            StorageClass::Real => "REAL",
            StorageClass::Text => "TEXT",
            StorageClass::Blob => "BLOB",
        }
    }

    /// Returns whether values of this class compare numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, StorageClass::Integer | StorageClass::Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_order() {
        assert!(StorageClass::Null < StorageClass::Integer);
        assert!(StorageClass::Text < StorageClass::Blob);
    }

    #[test]
    fn test_sql_name() {
        assert_eq!(StorageClass::Integer.sql_name(), "INTEGER");
        assert_eq!(StorageClass::Blob.sql_name(), "BLOB");
    }

    #[test]
    fn test_numeric() {
        assert!(StorageClass::Integer.is_numeric());
        assert!(StorageClass::Real.is_numeric());
        assert!(!StorageClass::Text.is_numeric());
        assert!(!StorageClass::Null.is_numeric());
    }
}
