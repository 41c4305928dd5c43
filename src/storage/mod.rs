//! Data access abstraction
//!
//! Defines the [`DataSource`] capability every component receives explicitly,
//! and its implementations:
//! - PostgrestDataSource: the backend's REST data API (default)
//! - MemoryDataSource: in-process tables (tests, offline demos)

use async_trait::async_trait;
use serde_json::Value;

/// Error type for data access operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid table name: {0}")]
    InvalidTable(String),
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Row predicate understood by the data API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, String),
    In(String, Vec<String>),
    Gte(String, String),
    Lte(String, String),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Filter::Eq(column.into(), value.to_string())
    }

    pub fn is_in<I, T>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Filter::In(
            column.into(),
            values.into_iter().map(|v| v.to_string()).collect(),
        )
    }

    pub fn gte(column: impl Into<String>, value: impl ToString) -> Self {
        Filter::Gte(column.into(), value.to_string())
    }

    pub fn lte(column: impl Into<String>, value: impl ToString) -> Self {
        Filter::Lte(column.into(), value.to_string())
    }

    /// Column the predicate applies to
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(column, _)
            | Filter::In(column, _)
            | Filter::Gte(column, _)
            | Filter::Lte(column, _) => column,
        }
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }
}

/// Table-scoped select with filters and ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub table: String,
    /// Comma separated column list, `*` for all columns
    pub select: String,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
}

impl TableQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = columns.into();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }
}

/// Offset window of a paginated read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub offset: usize,
    pub limit: usize,
}

impl PageRange {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Inclusive index of the last row in the window
    pub fn last_index(&self) -> usize {
        (self.offset + self.limit).saturating_sub(1)
    }
}

/// Data access capability
///
/// Injected into every component that talks to the backend instead of a
/// process-wide client handle.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read one window of rows matching `query`
    async fn query_page(&self, query: &TableQuery, range: PageRange)
    -> Result<Vec<Value>, StorageError>;

    /// Insert a record and return the id the backend assigned
    async fn insert(&self, table: &str, record: Value) -> Result<String, StorageError>;

    /// Patch every row matching `filters`, returning the number of rows changed
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<usize, StorageError>;
}

/// Maximum length of a Postgres identifier
const MAX_TABLE_NAME_LENGTH: usize = 63;

/// Validate a table or column name before it is placed in a request path.
///
/// Only ASCII alphanumerics and underscores are accepted.
pub fn validate_identifier(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidTable(
            "name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_TABLE_NAME_LENGTH {
        return Err(StorageError::InvalidTable(format!(
            "{} (max {} characters)",
            name, MAX_TABLE_NAME_LENGTH
        )));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StorageError::InvalidTable(name.to_string()));
    }

    Ok(())
}

#[cfg(feature = "api-backend")]
pub mod api;

pub mod memory;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("sales").is_ok());
        assert!(validate_identifier("lost_sales").is_ok());
        assert!(validate_identifier("pdm_entries2").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_injection() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("../auth").is_err());
        assert!(validate_identifier("sales?select=*").is_err());
        assert!(validate_identifier("sales; drop").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_page_range_last_index() {
        assert_eq!(PageRange::new(0, 500).last_index(), 499);
        assert_eq!(PageRange::new(500, 500).last_index(), 999);
        assert_eq!(PageRange::new(0, 0).last_index(), 0);
    }

    #[test]
    fn test_filter_builders() {
        assert_eq!(Filter::eq("filiale_id", 7), Filter::Eq("filiale_id".into(), "7".into()));
        assert_eq!(
            Filter::is_in("user_id", ["a", "b"]),
            Filter::In("user_id".into(), vec!["a".into(), "b".into()])
        );
        assert_eq!(Filter::gte("sale_date", "2024-01-01").column(), "sale_date");
    }
}
