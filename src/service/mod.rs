//! Export service
//!
//! Runs one scoped export end to end:
//!
//! 1. gate on the caller's role
//! 2. resolve the tenant scope
//! 3. fetch every page
//! 4. decorate
//! 5. render and hand the artifact to the sink
//!
//! A service runs at most one export at a time. Nothing reaches the sink
//! unless the whole fetch succeeded.

use crate::auth::{Session, View};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::decorate::{LabelMaps, decorate};
use crate::export::{
    CsvExporter, ExportArtifact, ExportError, ExportFormat, ExportSink, HtmlExporter,
};
use crate::fetch::fetch_all;
use crate::models::{DatasetDescriptor, DatasetId, ExportFilter};
use crate::scope::{TenantScope, resolve_scope};
use crate::storage::DataSource;
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// What to export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub dataset: DatasetId,
    pub format: ExportFormat,
    pub filter: ExportFilter,
}

impl ExportRequest {
    pub fn new(dataset: DatasetId, format: ExportFormat) -> Self {
        Self {
            dataset,
            format,
            filter: ExportFilter::new(),
        }
    }

    pub fn with_filter(mut self, filter: ExportFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Summary of a completed export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub filename: String,
    pub format: ExportFormat,
    pub rows: usize,
    /// Remote requests issued, member lookups included
    pub requests: usize,
}

/// View a role must be allowed to open to export `dataset`
pub fn required_view(dataset: DatasetId) -> View {
    match dataset {
        DatasetId::LoginEvents => View::AuthLogs,
        DatasetId::Profiles => View::UserManagement,
        _ => View::DataExport,
    }
}

/// Filters as they were applied to `descriptor`
///
/// The tenant selection is dropped in favour of the resolved scope, and the
/// user filter is dropped for datasets without an owner column.
pub fn applied_filter(
    descriptor: &DatasetDescriptor,
    scope: TenantScope,
    filter: &ExportFilter,
) -> ExportFilter {
    ExportFilter {
        filiale_id: match scope {
            TenantScope::Only(filiale_id) => Some(filiale_id),
            TenantScope::All | TenantScope::Nothing => None,
        },
        user_id: filter.user_id.filter(|_| descriptor.user_column.is_some()),
        date_range: filter.date_range,
    }
}

/// Clears the busy flag when dropped
struct ExportGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ExportGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ExportError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::AlreadyRunning)?;
        Ok(Self { flag })
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Orchestrates scoped exports against one data source
pub struct ExportService {
    source: Arc<dyn DataSource>,
    page_size: usize,
    exporting: AtomicBool,
}

impl ExportService {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
            exporting: AtomicBool::new(false),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// True while an export is in flight
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Run an export, stamping the artifact with today's local date
    pub async fn export(
        &self,
        session: &Session,
        request: &ExportRequest,
        labels: &LabelMaps,
        sink: &dyn ExportSink,
    ) -> Result<ExportOutcome, ExportError> {
        let today = chrono::Local::now().date_naive();
        self.export_dated(session, request, labels, sink, today).await
    }

    /// Run an export, stamping the artifact with `date`
    pub async fn export_dated(
        &self,
        session: &Session,
        request: &ExportRequest,
        labels: &LabelMaps,
        sink: &dyn ExportSink,
        date: NaiveDate,
    ) -> Result<ExportOutcome, ExportError> {
        let view = required_view(request.dataset);
        if !session.can_access(view) {
            warn!(
                user_id = %session.user_id(),
                role = %session.role(),
                dataset = %request.dataset,
                "Export refused"
            );
            return Err(ExportError::PermissionDenied(format!(
                "role {} may not export {}",
                session.role(),
                request.dataset
            )));
        }

        let _guard = ExportGuard::acquire(&self.exporting)?;

        let descriptor = request.dataset.descriptor();
        let scope = resolve_scope(session.role(), session.filiale_id(), request.filter.filiale_id);
        let fetched = fetch_all(
            self.source.as_ref(),
            descriptor,
            scope,
            &request.filter,
            self.page_size,
        )
        .await?;

        let rows = decorate(descriptor, &fetched.rows, labels);
        let content = match request.format {
            ExportFormat::Csv => CsvExporter::export(&rows)?,
            ExportFormat::Html => {
                let applied = applied_filter(descriptor, scope, &request.filter);
                HtmlExporter::export(descriptor, scope, &applied, labels, &rows, date)
            }
        };
        let artifact = ExportArtifact::new(request.dataset, date, request.format, content);

        match request.format {
            ExportFormat::Csv => sink.download(&artifact)?,
            ExportFormat::Html => sink.print(&artifact)?,
        }

        info!(
            dataset = %request.dataset,
            format = %request.format,
            rows = rows.len(),
            requests = fetched.requests,
            "Export complete"
        );

        Ok(ExportOutcome {
            filename: artifact.filename,
            format: request.format,
            rows: rows.len(),
            requests: fetched.requests,
        })
    }
}
