//! Signed-in session and auth log recording

use super::{Role, View};
use crate::models::{DatasetId, UserProfile};
use crate::storage::{DataSource, Filter, PageRange, StorageError, TableQuery};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors raised while establishing a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("No profile found for user {0}")]
    ProfileNotFound(Uuid),
    #[error("Account {0} is deactivated")]
    Inactive(Uuid),
    #[error("Invalid profile record: {0}")]
    InvalidProfile(String),
}

/// The authenticated caller, as derived from their profile row
///
/// The bearer token lives on the data source, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub profile: UserProfile,
}

impl Session {
    /// Wrap an already loaded profile
    pub fn new(profile: UserProfile) -> Self {
        Self { profile }
    }

    /// Read the profile of `user_id` and open a session for it
    ///
    /// Deactivated accounts are refused.
    pub async fn load(source: &dyn DataSource, user_id: Uuid) -> Result<Self, SessionError> {
        let query = TableQuery::new(DatasetId::Profiles.descriptor().table)
            .filter(Filter::eq("id", user_id));
        let rows = source.query_page(&query, PageRange::new(0, 1)).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(SessionError::ProfileNotFound(user_id))?;
        let profile: UserProfile =
            serde_json::from_value(row).map_err(|e| SessionError::InvalidProfile(e.to_string()))?;

        if !profile.active {
            warn!(%user_id, "Refusing session for deactivated account");
            return Err(SessionError::Inactive(user_id));
        }

        info!(%user_id, role = %profile.role, "Session loaded");
        Ok(Self::new(profile))
    }

    pub fn user_id(&self) -> Uuid {
        self.profile.id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    /// Own filiale; `None` for head office accounts
    pub fn filiale_id(&self) -> Option<Uuid> {
        self.profile.filiale_id
    }

    pub fn can_access(&self, view: View) -> bool {
        self.profile.role.can_access(view)
    }
}

/// Kind of auth log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginEventKind {
    SignIn,
    SignOut,
    Failed,
}

impl LoginEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginEventKind::SignIn => "sign_in",
            LoginEventKind::SignOut => "sign_out",
            LoginEventKind::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LoginEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append an entry to the auth log, returning the new row id
pub async fn record_login(
    source: &dyn DataSource,
    user_id: Option<Uuid>,
    kind: LoginEventKind,
    ip_address: Option<&str>,
    user_agent: Option<&str>,
) -> Result<String, StorageError> {
    let record = json!({
        "created_at": Utc::now().to_rfc3339(),
        "user_id": user_id,
        "event": kind.as_str(),
        "ip_address": ip_address,
        "user_agent": user_agent,
    });
    let id = source
        .insert(DatasetId::LoginEvents.descriptor().table, record)
        .await?;
    info!(event = %kind, "Recorded auth event");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatasetRow, ExportRecord};
    use crate::storage::memory::MemoryDataSource;

    fn profile_row(id: Uuid, role: &str, active: bool) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": "Nadia Bennani",
            "role": role,
            "filiale_id": "11111111-1111-4111-8111-111111111111",
            "active": active
        })
    }

    #[tokio::test]
    async fn test_load_session() {
        let id = Uuid::new_v4();
        let source = MemoryDataSource::new().with_table(
            "profiles",
            vec![
                profile_row(Uuid::new_v4(), "commercial", true),
                profile_row(id, "subsidiary_manager", true),
            ],
        );

        let session = Session::load(&source, id).await.unwrap();
        assert_eq!(session.user_id(), id);
        assert_eq!(session.role(), Role::SubsidiaryManager);
        assert!(session.filiale_id().is_some());
        assert!(session.can_access(View::DataExport));
        assert!(!session.can_access(View::AuthLogs));
        assert_eq!(source.request_count(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_or_inactive_profile() {
        let inactive = Uuid::new_v4();
        let source = MemoryDataSource::new()
            .with_table("profiles", vec![profile_row(inactive, "technician", false)]);

        assert!(matches!(
            Session::load(&source, Uuid::new_v4()).await,
            Err(SessionError::ProfileNotFound(_))
        ));
        assert!(matches!(
            Session::load(&source, inactive).await,
            Err(SessionError::Inactive(_))
        ));
    }

    #[tokio::test]
    async fn test_record_login_writes_decodable_event() {
        let user = Uuid::new_v4();
        let source = MemoryDataSource::new().with_table("auth_logs", vec![]);

        let id = record_login(&source, Some(user), LoginEventKind::SignIn, Some("10.0.0.1"), None)
            .await
            .unwrap();

        let rows = source.rows("auth_logs");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], id);
        let event = DatasetRow::decode(DatasetId::LoginEvents, rows[0].clone()).unwrap();
        assert_eq!(event.owner_id(), Some(user));
    }
}
