//! Row decoration
//!
//! Adds display-only label columns to fetched rows: the owning user's name
//! and the filiale's name, resolved from in-memory [`LabelMaps`]. Missing
//! lookups degrade to the raw identifier; decoration never fails.

use crate::fetch::{FetchError, PageCursor};
use crate::models::{
    DatasetDescriptor, DatasetId, DatasetRow, ExportRecord, FILIALE_LABEL_COLUMN, FILIALES_TABLE,
    Filiale, USER_LABEL_COLUMN, UserProfile,
};
use crate::storage::{DataSource, OrderBy, TableQuery};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Placeholder shown when a row has no owning user
pub const UNKNOWN_USER: &str = "Unknown user";

/// Id to display name caches for users and filiales
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMaps {
    users: HashMap<Uuid, String>,
    filiales: HashMap<Uuid, String>,
}

impl LabelMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the profile and filiale reference lists
    pub fn from_reference(profiles: &[UserProfile], filiales: &[Filiale]) -> Self {
        Self {
            users: profiles
                .iter()
                .map(|p| (p.id, p.display_name()))
                .collect(),
            filiales: filiales.iter().map(|f| (f.id, f.name.clone())).collect(),
        }
    }

    pub fn with_user(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.users.insert(id, name.into());
        self
    }

    pub fn with_filiale(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.filiales.insert(id, name.into());
        self
    }

    /// Owning-user label: mapped name, raw id, or [`UNKNOWN_USER`]
    pub fn user_label(&self, id: Option<Uuid>) -> String {
        match id {
            Some(id) => self
                .users
                .get(&id)
                .cloned()
                .unwrap_or_else(|| id.to_string()),
            None => UNKNOWN_USER.to_string(),
        }
    }

    /// Filiale label: mapped name, raw id, or empty
    pub fn filiale_label(&self, id: Option<Uuid>) -> String {
        match id {
            Some(id) => self
                .filiales
                .get(&id)
                .cloned()
                .unwrap_or_else(|| id.to_string()),
            None => String::new(),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn filiale_count(&self) -> usize {
        self.filiales.len()
    }
}

/// Load both reference lists and build the label maps
///
/// The lists are small (hundreds of rows) but still read page by page.
pub async fn load_labels(
    source: &dyn DataSource,
    page_size: usize,
) -> Result<LabelMaps, FetchError> {
    let profiles_table = DatasetId::Profiles.descriptor().table;
    let profiles: Vec<UserProfile> = load_reference(source, profiles_table, page_size).await?;
    let filiales: Vec<Filiale> = load_reference(source, FILIALES_TABLE, page_size).await?;
    info!(
        users = profiles.len(),
        filiales = filiales.len(),
        "Loaded label reference lists"
    );
    Ok(LabelMaps::from_reference(&profiles, &filiales))
}

async fn load_reference<T: serde::de::DeserializeOwned>(
    source: &dyn DataSource,
    table: &str,
    page_size: usize,
) -> Result<Vec<T>, FetchError> {
    let query = TableQuery::new(table).order(OrderBy::asc("id"));
    let mut cursor = PageCursor::new(source, query, page_size)?;
    let mut items = Vec::new();
    while let Some(batch) = cursor.next_batch().await? {
        for value in batch {
            let index = items.len();
            let item = serde_json::from_value(value).map_err(|e| FetchError::DecodeReference {
                table: table.to_string(),
                index,
                message: e.to_string(),
            })?;
            items.push(item);
        }
    }
    Ok(items)
}

/// A fetched row plus its display labels
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedRow {
    pub row: DatasetRow,
    /// Present when the dataset has an owning-user column
    pub user_label: Option<String>,
    /// Present when the dataset has a filiale column
    pub filiale_label: Option<String>,
}

impl DecoratedRow {
    /// Named string fields in export order: record columns, then labels
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = self
            .row
            .cells()
            .into_iter()
            .map(|(name, cell)| (name, cell.to_string()))
            .collect();
        if let Some(label) = &self.user_label {
            fields.push((USER_LABEL_COLUMN, label.clone()));
        }
        if let Some(label) = &self.filiale_label {
            fields.push((FILIALE_LABEL_COLUMN, label.clone()));
        }
        fields
    }
}

/// Decorate `rows` with labels from `labels`
pub fn decorate(
    descriptor: &DatasetDescriptor,
    rows: &[DatasetRow],
    labels: &LabelMaps,
) -> Vec<DecoratedRow> {
    rows.iter()
        .map(|row| DecoratedRow {
            row: row.clone(),
            user_label: descriptor
                .user_column
                .map(|_| labels.user_label(row.owner_id())),
            filiale_label: descriptor
                .filiale_column
                .map(|_| labels.filiale_label(row.filiale_id())),
        })
        .collect()
}
