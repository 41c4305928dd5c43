//! In-memory data source
//!
//! Holds tables as JSON rows and evaluates the same filters, ordering and
//! ranges as the REST backend. Every read is counted and logged so callers
//! can assert how many requests an operation issued, and a failure can be
//! scheduled on the n-th read.

use super::{DataSource, Filter, PageRange, StorageError, TableQuery};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use uuid::Uuid;

/// Data source backed by in-process tables
#[derive(Default)]
pub struct MemoryDataSource {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    requests: AtomicUsize,
    log: Mutex<Vec<(TableQuery, PageRange)>>,
    failure: Mutex<Option<(usize, String)>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of `table`
    pub fn with_table(self, table: impl Into<String>, rows: Vec<Value>) -> Self {
        self.lock_tables().insert(table.into(), rows);
        self
    }

    /// Make the `nth` read (1-based, counted from now on) fail with a network error
    pub fn fail_on_request(&self, nth: usize, message: impl Into<String>) {
        let target = self.request_count() + nth;
        *self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some((target, message.into()));
    }

    /// Number of reads issued so far
    pub fn request_count(&self) -> usize {
        self.requests.load(AtomicOrdering::SeqCst)
    }

    /// Reads issued so far, in order
    pub fn request_log(&self) -> Vec<(TableQuery, PageRange)> {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Current rows of `table`
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock_tables().get(table).cloned().unwrap_or_default()
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Scalar value of a column as the REST API would compare it
fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare_scalars(left: &str, right: &str) -> Ordering {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let Some(actual) = scalar(row.get(filter.column())) else {
        return false;
    };
    match filter {
        Filter::Eq(_, expected) => actual == *expected,
        Filter::In(_, values) => values.contains(&actual),
        Filter::Gte(_, bound) => compare_scalars(&actual, bound) != Ordering::Less,
        Filter::Lte(_, bound) => compare_scalars(&actual, bound) != Ordering::Greater,
    }
}

/// Postgres ordering: NULL sorts after every value ascending, before every value descending
fn compare_rows(left: &Value, right: &Value, query: &TableQuery) -> Ordering {
    for key in &query.order {
        let ordering = match (
            scalar(left.get(&key.column)),
            scalar(right.get(&key.column)),
        ) {
            (Some(l), Some(r)) => compare_scalars(&l, &r),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        let ordering = if key.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn project(row: &Value, select: &str) -> Value {
    if select.trim() == "*" {
        return row.clone();
    }
    let mut projected = serde_json::Map::new();
    for column in select.split(',').map(str::trim) {
        if let Some(value) = row.get(column) {
            projected.insert(column.to_string(), value.clone());
        }
    }
    Value::Object(projected)
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn query_page(
        &self,
        query: &TableQuery,
        range: PageRange,
    ) -> Result<Vec<Value>, StorageError> {
        let request = self.requests.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((query.clone(), range));

        let failure = self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some((target, message)) = failure
            && target == request
        {
            return Err(StorageError::NetworkError(message));
        }

        let tables = self.lock_tables();
        let rows = tables.get(&query.table).ok_or_else(|| {
            StorageError::BackendError(format!("relation \"{}\" does not exist", query.table))
        })?;

        let mut selected: Vec<&Value> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .collect();
        // Stable: rows equal on every key keep insertion order
        selected.sort_by(|a, b| compare_rows(a, b, query));

        Ok(selected
            .into_iter()
            .skip(range.offset)
            .take(range.limit)
            .map(|row| project(row, &query.select))
            .collect())
    }

    async fn insert(&self, table: &str, mut record: Value) -> Result<String, StorageError> {
        let Some(object) = record.as_object_mut() else {
            return Err(StorageError::SerializationError(
                "record must be a JSON object".to_string(),
            ));
        };
        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                object.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        self.lock_tables()
            .entry(table.to_string())
            .or_default()
            .push(record);
        Ok(id)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<usize, StorageError> {
        let Some(patch) = patch.as_object() else {
            return Err(StorageError::SerializationError(
                "patch must be a JSON object".to_string(),
            ));
        };
        let mut tables = self.lock_tables();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let mut changed = 0;
        for row in rows.iter_mut() {
            if !filters.iter().all(|f| matches(row, f)) {
                continue;
            }
            if let Some(object) = row.as_object_mut() {
                for (key, value) in patch {
                    object.insert(key.clone(), value.clone());
                }
                changed += 1;
            }
        }
        Ok(changed)
    }
}
