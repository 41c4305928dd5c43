//! User management
//!
//! Scoped listing of profiles and account activation. Listing follows the
//! same tenant rules as exports; activation is reserved to roles that may
//! open the user management view.

use crate::auth::{Session, View};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::fetch::{FetchError, fetch_all};
use crate::models::{DatasetId, DatasetRow, ExportFilter, UserProfile};
use crate::scope::resolve_scope;
use crate::storage::{DataSource, Filter, StorageError};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Errors raised by user management operations
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("You cannot deactivate your own account")]
    SelfDeactivation,
    #[error("User not found: {0}")]
    UserNotFound(Uuid),
}

/// User management operations against one data source
pub struct UserAdmin {
    source: Arc<dyn DataSource>,
    page_size: usize,
}

impl UserAdmin {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Profiles visible to `session`, newest first
    ///
    /// `selected_filiale` narrows the list for siege admins and is ignored
    /// for everyone else.
    pub async fn list_users(
        &self,
        session: &Session,
        selected_filiale: Option<Uuid>,
    ) -> Result<Vec<UserProfile>, AdminError> {
        let scope = resolve_scope(session.role(), session.filiale_id(), selected_filiale);
        let outcome = fetch_all(
            self.source.as_ref(),
            DatasetId::Profiles.descriptor(),
            scope,
            &ExportFilter::new(),
            self.page_size,
        )
        .await?;

        Ok(outcome
            .rows
            .into_iter()
            .filter_map(|row| match row {
                DatasetRow::Profile(profile) => Some(profile),
                _ => None,
            })
            .collect())
    }

    /// Activate or deactivate the account `target`
    pub async fn set_active(
        &self,
        actor: &Session,
        target: Uuid,
        active: bool,
    ) -> Result<(), AdminError> {
        if !actor.can_access(View::UserManagement) {
            return Err(AdminError::PermissionDenied(format!(
                "role {} may not manage users",
                actor.role()
            )));
        }
        if !active && target == actor.user_id() {
            return Err(AdminError::SelfDeactivation);
        }

        let affected = self
            .source
            .update(
                DatasetId::Profiles.descriptor().table,
                &[Filter::eq("id", target)],
                json!({ "active": active }),
            )
            .await?;
        if affected == 0 {
            return Err(AdminError::UserNotFound(target));
        }

        info!(actor = %actor.user_id(), %target, active, "Account status changed");
        Ok(())
    }
}
