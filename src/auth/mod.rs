//! Roles, view gating and the authenticated session
//!
//! Authentication itself is owned by the backend; this module only models
//! what the dashboard derives from a signed-in profile:
//! - the caller's [`Role`] and filiale
//! - which dashboard views a role may open (static lookup table)
//! - session loading and sign-in event recording

mod session;

pub use session::{LoginEventKind, Session, SessionError, record_login};

use serde::{Deserialize, Serialize};

/// Access level of a profile
///
/// # Example
///
/// ```rust
/// use filiale_report_sdk::auth::{Role, View};
///
/// let role: Role = "subsidiary-manager".parse().unwrap();
/// assert!(role.can_access(View::DataExport));
/// assert!(!role.can_access(View::UserManagement));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Head office administrator, sees every filiale
    SiegeAdmin,
    /// Manager of one filiale
    SubsidiaryManager,
    Commercial,
    Technician,
    /// Back-office data entry
    DataEntry,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SiegeAdmin,
        Role::SubsidiaryManager,
        Role::Commercial,
        Role::Technician,
        Role::DataEntry,
    ];

    /// Wire name, as stored in the `profiles.role` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SiegeAdmin => "siege_admin",
            Role::SubsidiaryManager => "subsidiary_manager",
            Role::Commercial => "commercial",
            Role::Technician => "technician",
            Role::DataEntry => "data_entry",
        }
    }

    pub fn is_siege_admin(&self) -> bool {
        matches!(self, Role::SiegeAdmin)
    }

    /// Views this role may open
    pub fn allowed_views(&self) -> &'static [View] {
        match self {
            Role::SiegeAdmin => &View::ALL,
            Role::SubsidiaryManager => &[
                View::Dashboard,
                View::Sales,
                View::Stock,
                View::Orders,
                View::Forecasts,
                View::MarketShare,
                View::Visits,
                View::Fleet,
                View::Opportunities,
                View::LostSales,
                View::Budgets,
                View::DataExport,
            ],
            Role::Commercial => &[
                View::Dashboard,
                View::Sales,
                View::Orders,
                View::Forecasts,
                View::MarketShare,
                View::Visits,
                View::Opportunities,
                View::LostSales,
            ],
            Role::Technician => &[View::Dashboard, View::Stock, View::Visits, View::Fleet],
            Role::DataEntry => &[
                View::Dashboard,
                View::Sales,
                View::Stock,
                View::Orders,
                View::Budgets,
                View::MarketShare,
            ],
        }
    }

    pub fn can_access(&self, view: View) -> bool {
        self.allowed_views().contains(&view)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "siege_admin" | "admin" => Ok(Role::SiegeAdmin),
            "subsidiary_manager" | "manager" => Ok(Role::SubsidiaryManager),
            "commercial" => Ok(Role::Commercial),
            "technician" => Ok(Role::Technician),
            "data_entry" => Ok(Role::DataEntry),
            _ => Err(format!(
                "Invalid role: {}. Expected: siege-admin, subsidiary-manager, commercial, technician, data-entry",
                s
            )),
        }
    }
}

/// Dashboard views subject to role gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Dashboard,
    Sales,
    Stock,
    Orders,
    Forecasts,
    MarketShare,
    Visits,
    Fleet,
    Opportunities,
    LostSales,
    Budgets,
    /// Connection log viewer
    AuthLogs,
    /// Generic dataset exporter
    DataExport,
    UserManagement,
}

impl View {
    pub const ALL: [View; 14] = [
        View::Dashboard,
        View::Sales,
        View::Stock,
        View::Orders,
        View::Forecasts,
        View::MarketShare,
        View::Visits,
        View::Fleet,
        View::Opportunities,
        View::LostSales,
        View::Budgets,
        View::AuthLogs,
        View::DataExport,
        View::UserManagement,
    ];
}
