//! Access scope resolution
//!
//! Derives which filiale a caller may see from their role, then decides how
//! that restriction is applied to a given dataset. Both steps are pure.
//!
//! Resolution fails closed: a non-admin caller without a filiale sees
//! nothing, never everything.

use crate::auth::Role;
use crate::models::DatasetDescriptor;
use uuid::Uuid;

/// Effective tenant restriction of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// Every filiale
    All,
    /// A single filiale
    Only(Uuid),
    /// No visibility at all
    Nothing,
}

/// Resolve the effective tenant filter.
///
/// Siege admins get the filiale they selected, or every filiale when nothing
/// is selected. Every other role is pinned to their own filiale and any
/// selection is ignored.
///
/// # Example
///
/// ```rust
/// use filiale_report_sdk::auth::Role;
/// use filiale_report_sdk::scope::{TenantScope, resolve_scope};
/// use uuid::Uuid;
///
/// let own = Uuid::new_v4();
/// let other = Uuid::new_v4();
/// assert_eq!(
///     resolve_scope(Role::Commercial, Some(own), Some(other)),
///     TenantScope::Only(own)
/// );
/// assert_eq!(resolve_scope(Role::Technician, None, Some(other)), TenantScope::Nothing);
/// assert_eq!(resolve_scope(Role::SiegeAdmin, None, None), TenantScope::All);
/// ```
pub fn resolve_scope(role: Role, own_filiale: Option<Uuid>, selected: Option<Uuid>) -> TenantScope {
    if role.is_siege_admin() {
        return match selected {
            Some(id) => TenantScope::Only(id),
            None => TenantScope::All,
        };
    }
    match own_filiale {
        Some(id) => TenantScope::Only(id),
        None => TenantScope::Nothing,
    }
}

/// How a tenant scope translates into predicates on one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopePlan {
    /// No tenant predicate
    Unrestricted,
    /// `column = filiale_id`
    FilialeColumn {
        column: &'static str,
        filiale_id: Uuid,
    },
    /// Look up the filiale's members, then `user_column IN (members)`
    Members {
        user_column: &'static str,
        filiale_id: Uuid,
    },
    /// Resolves to an empty result without querying the dataset
    Empty(EmptyReason),
}

/// Why a scope plan is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// Caller has no filiale and is not a siege admin
    NoVisibility,
    /// Dataset carries neither a filiale nor an owning user column
    NotPartitioned,
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmptyReason::NoVisibility => write!(f, "caller has no filiale"),
            EmptyReason::NotPartitioned => write!(f, "dataset cannot be narrowed to a filiale"),
        }
    }
}

/// Decide how `scope` applies to `descriptor`
pub fn plan_scope(scope: TenantScope, descriptor: &DatasetDescriptor) -> ScopePlan {
    match scope {
        TenantScope::All => ScopePlan::Unrestricted,
        TenantScope::Nothing => ScopePlan::Empty(EmptyReason::NoVisibility),
        TenantScope::Only(filiale_id) => {
            if let Some(column) = descriptor.filiale_column {
                ScopePlan::FilialeColumn { column, filiale_id }
            } else if let Some(user_column) = descriptor.user_column {
                ScopePlan::Members {
                    user_column,
                    filiale_id,
                }
            } else {
                ScopePlan::Empty(EmptyReason::NotPartitioned)
            }
        }
    }
}
