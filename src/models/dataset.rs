//! Dataset catalog
//!
//! Static descriptors for every remote table that can be exported. The
//! catalog is fixed at build time; nothing here is loaded from the backend.

use serde::{Deserialize, Serialize};

/// Identifier of an exportable dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetId {
    /// Sign-in events (auth log viewer)
    LoginEvents,
    /// Invoiced machine sales
    Sales,
    /// Stock positions per filiale
    Stock,
    /// Customer orders
    Orders,
    /// Client visits by sales and technical staff
    Visits,
    /// Open sales opportunities
    Opportunities,
    /// Deals lost to competitors
    LostSales,
    /// Monthly budget targets
    Budgets,
    /// Market share (PDM) entries
    PdmEntries,
    /// User profiles (user management)
    Profiles,
}

impl DatasetId {
    /// All datasets, in catalog order
    pub const ALL: [DatasetId; 10] = [
        DatasetId::LoginEvents,
        DatasetId::Sales,
        DatasetId::Stock,
        DatasetId::Orders,
        DatasetId::Visits,
        DatasetId::Opportunities,
        DatasetId::LostSales,
        DatasetId::Budgets,
        DatasetId::PdmEntries,
        DatasetId::Profiles,
    ];

    /// Stable identifier used in filenames and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetId::LoginEvents => "login_events",
            DatasetId::Sales => "sales",
            DatasetId::Stock => "stock",
            DatasetId::Orders => "orders",
            DatasetId::Visits => "visits",
            DatasetId::Opportunities => "opportunities",
            DatasetId::LostSales => "lost_sales",
            DatasetId::Budgets => "budgets",
            DatasetId::PdmEntries => "pdm_entries",
            DatasetId::Profiles => "profiles",
        }
    }

    /// Descriptor of this dataset
    pub fn descriptor(&self) -> &'static DatasetDescriptor {
        match self {
            DatasetId::LoginEvents => &LOGIN_EVENTS,
            DatasetId::Sales => &SALES,
            DatasetId::Stock => &STOCK,
            DatasetId::Orders => &ORDERS,
            DatasetId::Visits => &VISITS,
            DatasetId::Opportunities => &OPPORTUNITIES,
            DatasetId::LostSales => &LOST_SALES,
            DatasetId::Budgets => &BUDGETS,
            DatasetId::PdmEntries => &PDM_ENTRIES,
            DatasetId::Profiles => &PROFILES,
        }
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DatasetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        DatasetId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = DatasetId::ALL.iter().map(|id| id.as_str()).collect();
                format!("Unknown dataset: {}. Expected one of: {}", s, known.join(", "))
            })
    }
}

/// Whether a date column holds a calendar date or a full timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    /// `YYYY-MM-DD` column
    Date,
    /// `timestamptz` column
    Timestamp,
}

/// Static metadata describing one exportable remote table
#[derive(Debug, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub id: DatasetId,
    /// Remote table name
    pub table: &'static str,
    /// Human readable title, used in printed reports
    pub title: &'static str,
    /// Column used for ordering and date range filtering
    pub date_field: &'static str,
    pub date_kind: DateKind,
    /// Column holding the owning filiale, if the table is tenant-partitioned
    pub filiale_column: Option<&'static str>,
    /// Column holding the owning user, if any
    pub user_column: Option<&'static str>,
    /// Exported record columns, in output order
    pub columns: &'static [&'static str],
}

/// Label column appended for the owning user
pub const USER_LABEL_COLUMN: &str = "user_name";
/// Label column appended for the owning filiale
pub const FILIALE_LABEL_COLUMN: &str = "filiale_name";

impl DatasetDescriptor {
    /// Whether rows can be narrowed to a single filiale directly
    pub fn supports_filiale_filter(&self) -> bool {
        self.filiale_column.is_some()
    }

    /// Whether rows can be narrowed to a single user
    pub fn supports_user_filter(&self) -> bool {
        self.user_column.is_some()
    }

    /// Columns of a decorated row: record columns followed by label columns
    pub fn export_columns(&self) -> Vec<&'static str> {
        let mut columns = self.columns.to_vec();
        if self.user_column.is_some() {
            columns.push(USER_LABEL_COLUMN);
        }
        if self.filiale_column.is_some() {
            columns.push(FILIALE_LABEL_COLUMN);
        }
        columns
    }
}

static LOGIN_EVENTS: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::LoginEvents,
    table: "auth_logs",
    title: "Connection log",
    date_field: "created_at",
    date_kind: DateKind::Timestamp,
    filiale_column: None,
    user_column: Some("user_id"),
    columns: &["id", "created_at", "user_id", "event", "ip_address", "user_agent"],
};

static SALES: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::Sales,
    table: "sales",
    title: "Sales",
    date_field: "sale_date",
    date_kind: DateKind::Date,
    filiale_column: Some("filiale_id"),
    user_column: Some("commercial_id"),
    columns: &[
        "id",
        "sale_date",
        "filiale_id",
        "commercial_id",
        "client_name",
        "brand",
        "model",
        "quantity",
        "amount",
    ],
};

static STOCK: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::Stock,
    table: "stock",
    title: "Stock",
    date_field: "updated_at",
    date_kind: DateKind::Timestamp,
    filiale_column: Some("filiale_id"),
    user_column: None,
    columns: &[
        "id",
        "updated_at",
        "filiale_id",
        "brand",
        "model",
        "serial_number",
        "status",
        "quantity",
    ],
};

static ORDERS: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::Orders,
    table: "orders",
    title: "Orders",
    date_field: "order_date",
    date_kind: DateKind::Date,
    filiale_column: Some("filiale_id"),
    user_column: Some("created_by"),
    columns: &[
        "id",
        "order_date",
        "filiale_id",
        "created_by",
        "client_name",
        "model",
        "quantity",
        "amount",
        "status",
    ],
};

static VISITS: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::Visits,
    table: "visits",
    title: "Client visits",
    date_field: "visit_date",
    date_kind: DateKind::Date,
    filiale_column: Some("filiale_id"),
    user_column: Some("user_id"),
    columns: &[
        "id",
        "visit_date",
        "filiale_id",
        "user_id",
        "client_name",
        "purpose",
        "outcome",
    ],
};

static OPPORTUNITIES: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::Opportunities,
    table: "opportunities",
    title: "Opportunities",
    date_field: "created_at",
    date_kind: DateKind::Timestamp,
    filiale_column: Some("filiale_id"),
    user_column: Some("owner_id"),
    columns: &[
        "id",
        "created_at",
        "filiale_id",
        "owner_id",
        "client_name",
        "model",
        "estimated_amount",
        "probability",
        "stage",
    ],
};

static LOST_SALES: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::LostSales,
    table: "lost_sales",
    title: "Lost sales",
    date_field: "lost_date",
    date_kind: DateKind::Date,
    filiale_column: Some("filiale_id"),
    user_column: Some("user_id"),
    columns: &[
        "id",
        "lost_date",
        "filiale_id",
        "user_id",
        "client_name",
        "competitor",
        "reason",
        "amount",
    ],
};

static BUDGETS: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::Budgets,
    table: "budgets",
    title: "Budgets",
    date_field: "period",
    date_kind: DateKind::Date,
    filiale_column: Some("filiale_id"),
    user_column: None,
    columns: &["id", "period", "filiale_id", "category", "target_amount", "target_units"],
};

static PDM_ENTRIES: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::PdmEntries,
    table: "pdm_entries",
    title: "Market share",
    date_field: "entry_date",
    date_kind: DateKind::Date,
    filiale_column: Some("filiale_id"),
    user_column: Some("user_id"),
    columns: &[
        "id",
        "entry_date",
        "filiale_id",
        "user_id",
        "segment",
        "brand",
        "units",
        "market_units",
    ],
};

static PROFILES: DatasetDescriptor = DatasetDescriptor {
    id: DatasetId::Profiles,
    table: "profiles",
    title: "Users",
    date_field: "created_at",
    date_kind: DateKind::Timestamp,
    filiale_column: Some("filiale_id"),
    user_column: None,
    columns: &[
        "id",
        "created_at",
        "full_name",
        "email",
        "role",
        "filiale_id",
        "active",
    ],
};

/// Remote table holding the filiale reference list
pub const FILIALES_TABLE: &str = "filiales";
