//! User profile and filiale reference records

use super::rows::{Cell, ExportRecord};
use crate::auth::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row of the `profiles` table
///
/// One profile per authenticated account; carries the role and the filiale
/// the account belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub filiale_id: Option<Uuid>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl UserProfile {
    /// Name shown in tables: full name, then email, then the raw id
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref().filter(|email| !email.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}

impl ExportRecord for UserProfile {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("created_at", self.created_at.into()),
            ("full_name", self.full_name.as_ref().into()),
            ("email", self.email.as_ref().into()),
            ("role", Cell::Text(self.role.as_str().to_string())),
            ("filiale_id", self.filiale_id.into()),
            ("active", self.active.into()),
        ]
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

/// Row of the `filiales` reference table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filiale {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}
