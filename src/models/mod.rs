//! Models module for the SDK
//!
//! Dataset catalog, typed rows of the exportable tables, reference records
//! and the per-request export filter.

pub mod dataset;
pub mod filter;
pub mod profile;
pub mod rows;

pub use dataset::{
    DatasetDescriptor, DatasetId, DateKind, FILIALE_LABEL_COLUMN, FILIALES_TABLE,
    USER_LABEL_COLUMN,
};
pub use filter::{DateRange, ExportFilter};
pub use profile::{Filiale, UserProfile};
pub use rows::{
    Budget, Cell, DatasetRow, ExportRecord, LoginEvent, LostSale, Opportunity, Order, PdmEntry,
    Sale, StockItem, Visit,
};
