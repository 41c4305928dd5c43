//! Filiale Report SDK - scoped dataset exports for the multi-filiale dashboard
//!
//! Provides unified interfaces for:
//! - Data access against the PostgREST backend (via data sources)
//! - Role gating and tenant scope resolution
//! - Paginated, all-or-nothing dataset fetching
//! - Row decoration with user and filiale labels
//! - CSV and printable HTML export
//! - User management (listing and activation)

pub mod admin;
pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod decorate;
pub mod export;
pub mod fetch;
pub mod models;
pub mod scope;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use storage::memory::MemoryDataSource;
#[cfg(feature = "api-backend")]
pub use storage::api::PostgrestDataSource;
pub use storage::{DataSource, StorageError};

pub use admin::{AdminError, UserAdmin};
pub use auth::{Role, Session, SessionError, View};
pub use config::{ClientConfig, ConfigError};
pub use decorate::{DecoratedRow, LabelMaps, decorate, load_labels};
pub use export::{
    CsvExporter, DirectorySink, ExportArtifact, ExportError, ExportFormat, ExportSink,
    HtmlExporter,
};
pub use fetch::{FetchError, FetchOutcome, PageCursor, fetch_all};
pub use scope::{TenantScope, resolve_scope};
pub use service::{ExportOutcome, ExportRequest, ExportService};

// Re-export models
pub use models::{DatasetDescriptor, DatasetId, DatasetRow, ExportFilter, Filiale, UserProfile};
