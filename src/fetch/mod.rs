//! Paginated fetching
//!
//! Exports need the complete result set, not the lazily extended page the
//! dashboard tables show. [`PageCursor`] walks a query in fixed windows:
//! offset 0, then +page size, until a window comes back short. Each request
//! asks for one row past the window so a full final page is recognised
//! without an extra empty request. Windows are requested strictly one after
//! another.
//!
//! [`fetch_all`] combines scope planning, the cursor and row decoding. It is
//! all-or-nothing: any failing request or undecodable row drops everything
//! gathered so far and returns the error.

use crate::models::{DatasetDescriptor, DatasetId, DatasetRow, DateKind, ExportFilter};
use crate::scope::{ScopePlan, TenantScope, plan_scope};
use crate::storage::{DataSource, Filter, OrderBy, PageRange, StorageError, TableQuery};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors raised while fetching a dataset
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Failed to decode {dataset} row {index}: {message}")]
    Decode {
        dataset: DatasetId,
        index: usize,
        message: String,
    },
    #[error("Failed to decode {table} reference row {index}: {message}")]
    DecodeReference {
        table: String,
        index: usize,
        message: String,
    },
    #[error("Page size must be at least 1")]
    InvalidPageSize,
}

/// Offset cursor over a query
///
/// Yields a finite sequence of row batches. Once the cursor has returned a
/// short batch, or an error, it is exhausted for good; there is no rewind.
pub struct PageCursor<'a> {
    source: &'a dyn DataSource,
    query: TableQuery,
    page_size: usize,
    offset: usize,
    requests: usize,
    exhausted: bool,
}

impl<'a> PageCursor<'a> {
    pub fn new(
        source: &'a dyn DataSource,
        query: TableQuery,
        page_size: usize,
    ) -> Result<Self, FetchError> {
        if page_size == 0 {
            return Err(FetchError::InvalidPageSize);
        }
        Ok(Self {
            source,
            query,
            page_size,
            offset: 0,
            requests: 0,
            exhausted: false,
        })
    }

    /// Fetch the next window, or `None` once the source is exhausted
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Value>>, FetchError> {
        if self.exhausted {
            return Ok(None);
        }

        let range = PageRange::new(self.offset, self.page_size.saturating_add(1));
        self.requests += 1;
        let mut batch = match self.source.query_page(&self.query, range).await {
            Ok(batch) => batch,
            Err(e) => {
                self.exhausted = true;
                return Err(e.into());
            }
        };

        debug!(
            table = %self.query.table,
            offset = self.offset,
            rows = batch.len(),
            "Fetched page"
        );

        if batch.len() > self.page_size {
            batch.truncate(self.page_size);
        } else {
            self.exhausted = true;
        }
        self.offset += self.page_size;
        Ok(Some(batch))
    }

    /// Requests issued so far
    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Rows of a completed fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub rows: Vec<DatasetRow>,
    /// Remote requests issued, member lookups included
    pub requests: usize,
}

/// Base query for a dataset: date range, user filter and ordering
///
/// Rows are ordered by the date field descending, then by `id` descending so
/// rows sharing a date keep a stable position across page boundaries.
pub fn dataset_query(descriptor: &DatasetDescriptor, filter: &ExportFilter) -> TableQuery {
    let mut query = TableQuery::new(descriptor.table)
        .order(OrderBy::desc(descriptor.date_field))
        .order(OrderBy::desc("id"));

    match (descriptor.user_column, filter.user_id) {
        (Some(column), Some(user_id)) => query = query.filter(Filter::eq(column, user_id)),
        (None, Some(_)) => {
            debug!(dataset = %descriptor.id, "Dataset has no owner column, user filter ignored")
        }
        _ => {}
    }

    if let Some(from) = filter.date_range.from {
        query = query.filter(Filter::gte(descriptor.date_field, from.format("%Y-%m-%d")));
    }
    if let Some(to) = filter.date_range.to {
        let bound = match descriptor.date_kind {
            DateKind::Date => to.format("%Y-%m-%d").to_string(),
            DateKind::Timestamp => format!("{}T23:59:59.999999", to.format("%Y-%m-%d")),
        };
        query = query.filter(Filter::lte(descriptor.date_field, bound));
    }

    query
}

/// Ids of every profile attached to `filiale_id`
pub async fn filiale_members(
    source: &dyn DataSource,
    filiale_id: Uuid,
    page_size: usize,
) -> Result<(Vec<Uuid>, usize), FetchError> {
    let profiles = DatasetId::Profiles.descriptor();
    let query = TableQuery::new(profiles.table)
        .select("id")
        .filter(Filter::eq("filiale_id", filiale_id))
        .order(OrderBy::asc("id"));

    let mut cursor = PageCursor::new(source, query, page_size)?;
    let mut members = Vec::new();
    while let Some(batch) = cursor.next_batch().await? {
        for value in batch {
            let index = members.len();
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| FetchError::Decode {
                    dataset: DatasetId::Profiles,
                    index,
                    message: "missing or invalid id".to_string(),
                })?;
            members.push(id);
        }
    }
    Ok((members, cursor.requests()))
}

/// Fetch every row of a dataset visible under `scope` and `filter`
///
/// # Example
///
/// ```rust
/// # use filiale_report_sdk::fetch::fetch_all;
/// # use filiale_report_sdk::models::{DatasetId, ExportFilter};
/// # use filiale_report_sdk::scope::TenantScope;
/// # use filiale_report_sdk::storage::memory::MemoryDataSource;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MemoryDataSource::new().with_table("sales", vec![]);
/// let outcome = fetch_all(
///     &source,
///     DatasetId::Sales.descriptor(),
///     TenantScope::All,
///     &ExportFilter::new(),
///     500,
/// )
/// .await?;
/// assert!(outcome.rows.is_empty());
/// assert_eq!(outcome.requests, 1);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_all(
    source: &dyn DataSource,
    descriptor: &DatasetDescriptor,
    scope: TenantScope,
    filter: &ExportFilter,
    page_size: usize,
) -> Result<FetchOutcome, FetchError> {
    if page_size == 0 {
        return Err(FetchError::InvalidPageSize);
    }

    let mut query = dataset_query(descriptor, filter);
    let mut requests = 0;

    match plan_scope(scope, descriptor) {
        ScopePlan::Unrestricted => {}
        ScopePlan::FilialeColumn { column, filiale_id } => {
            query = query.filter(Filter::eq(column, filiale_id));
        }
        ScopePlan::Members {
            user_column,
            filiale_id,
        } => {
            let (members, lookups) = filiale_members(source, filiale_id, page_size).await?;
            requests += lookups;
            if members.is_empty() {
                debug!(
                    dataset = %descriptor.id,
                    %filiale_id,
                    "Filiale has no members, nothing to fetch"
                );
                return Ok(FetchOutcome {
                    rows: Vec::new(),
                    requests,
                });
            }
            query = query.filter(Filter::is_in(user_column, members));
        }
        ScopePlan::Empty(reason) => {
            warn!(dataset = %descriptor.id, %reason, "Scope resolves to no rows");
            return Ok(FetchOutcome::default());
        }
    }

    let mut cursor = PageCursor::new(source, query, page_size)?;
    let mut rows = Vec::new();
    while let Some(batch) = cursor.next_batch().await? {
        for value in batch {
            let index = rows.len();
            let row = DatasetRow::decode(descriptor.id, value).map_err(|e| FetchError::Decode {
                dataset: descriptor.id,
                index,
                message: e.to_string(),
            })?;
            rows.push(row);
        }
    }
    requests += cursor.requests();

    info!(
        dataset = %descriptor.id,
        rows = rows.len(),
        requests,
        "Fetched dataset"
    );

    Ok(FetchOutcome { rows, requests })
}
