//! Export filter
//!
//! Ephemeral request state built per interaction and dropped once the export
//! completes or fails.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive date range; either bound may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// True when neither bound is set
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Human readable form used in report headers, `None` when open
    pub fn describe(&self) -> Option<String> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some(format!("{} to {}", from, to)),
            (Some(from), None) => Some(format!("from {}", from)),
            (None, Some(to)) => Some(format!("until {}", to)),
            (None, None) => None,
        }
    }
}

/// Tenant, user and date constraints applied to one export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFilter {
    /// Filiale picked in the UI; only honoured for siege admins
    pub filiale_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub date_range: DateRange,
}

impl ExportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filiale(mut self, filiale_id: Uuid) -> Self {
        self.filiale_id = Some(filiale_id);
        self
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_range = DateRange::new(from, to);
        self
    }
}
