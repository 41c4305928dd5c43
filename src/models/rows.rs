//! Typed rows of the exportable tables
//!
//! Every dataset decodes into a declared record type. The export path works
//! over the closed union [`DatasetRow`] instead of free-form maps, so a
//! column rename on the backend shows up as a decode error rather than a
//! silently empty CSV column.

use super::dataset::DatasetId;
use super::profile::UserProfile;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single exported value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Id(Uuid),
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(value) => write!(f, "{}", value),
            Cell::Integer(value) => write!(f, "{}", value),
            Cell::Decimal(value) => write!(f, "{}", value),
            Cell::Bool(value) => write!(f, "{}", value),
            Cell::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Cell::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            Cell::Id(value) => write!(f, "{}", value),
        }
    }
}

impl From<&String> for Cell {
    fn from(value: &String) -> Self {
        Cell::Text(value.clone())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Decimal(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Timestamp(value)
    }
}

impl From<Uuid> for Cell {
    fn from(value: Uuid) -> Self {
        Cell::Id(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

/// A record that can be flattened into export cells
pub trait ExportRecord {
    /// Named cells, in the dataset's column order
    fn cells(&self) -> Vec<(&'static str, Cell)>;

    /// Owning user, when the table records one
    fn owner_id(&self) -> Option<Uuid> {
        None
    }

    /// Owning filiale, when the table is tenant-partitioned
    fn filiale_id(&self) -> Option<Uuid> {
        None
    }
}

/// Sign-in event from the auth log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub event: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ExportRecord for LoginEvent {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("created_at", self.created_at.into()),
            ("user_id", self.user_id.into()),
            ("event", (&self.event).into()),
            ("ip_address", self.ip_address.as_ref().into()),
            ("user_agent", self.user_agent.as_ref().into()),
        ]
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub sale_date: NaiveDate,
    pub filiale_id: Option<Uuid>,
    pub commercial_id: Option<Uuid>,
    pub client_name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub amount: Option<f64>,
}

fn default_quantity() -> i64 {
    1
}

impl ExportRecord for Sale {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("sale_date", self.sale_date.into()),
            ("filiale_id", self.filiale_id.into()),
            ("commercial_id", self.commercial_id.into()),
            ("client_name", (&self.client_name).into()),
            ("brand", self.brand.as_ref().into()),
            ("model", self.model.as_ref().into()),
            ("quantity", self.quantity.into()),
            ("amount", self.amount.into()),
        ]
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.commercial_id
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

/// Machine or part held in a filiale's yard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: Uuid,
    pub updated_at: DateTime<Utc>,
    pub filiale_id: Option<Uuid>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub quantity: i64,
}

impl ExportRecord for StockItem {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("updated_at", self.updated_at.into()),
            ("filiale_id", self.filiale_id.into()),
            ("brand", self.brand.as_ref().into()),
            ("model", self.model.as_ref().into()),
            ("serial_number", self.serial_number.as_ref().into()),
            ("status", self.status.as_ref().into()),
            ("quantity", self.quantity.into()),
        ]
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_date: NaiveDate,
    pub filiale_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub client_name: String,
    pub model: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub amount: Option<f64>,
    pub status: Option<String>,
}

impl ExportRecord for Order {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("order_date", self.order_date.into()),
            ("filiale_id", self.filiale_id.into()),
            ("created_by", self.created_by.into()),
            ("client_name", (&self.client_name).into()),
            ("model", self.model.as_ref().into()),
            ("quantity", self.quantity.into()),
            ("amount", self.amount.into()),
            ("status", self.status.as_ref().into()),
        ]
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.created_by
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub visit_date: NaiveDate,
    pub filiale_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub client_name: String,
    pub purpose: Option<String>,
    pub outcome: Option<String>,
}

impl ExportRecord for Visit {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("visit_date", self.visit_date.into()),
            ("filiale_id", self.filiale_id.into()),
            ("user_id", self.user_id.into()),
            ("client_name", (&self.client_name).into()),
            ("purpose", self.purpose.as_ref().into()),
            ("outcome", self.outcome.as_ref().into()),
        ]
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.user_id
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub filiale_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub client_name: String,
    pub model: Option<String>,
    pub estimated_amount: Option<f64>,
    /// Win probability in percent
    pub probability: Option<i64>,
    pub stage: Option<String>,
}

impl ExportRecord for Opportunity {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("created_at", self.created_at.into()),
            ("filiale_id", self.filiale_id.into()),
            ("owner_id", self.owner_id.into()),
            ("client_name", (&self.client_name).into()),
            ("model", self.model.as_ref().into()),
            ("estimated_amount", self.estimated_amount.into()),
            ("probability", self.probability.into()),
            ("stage", self.stage.as_ref().into()),
        ]
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostSale {
    pub id: Uuid,
    pub lost_date: NaiveDate,
    pub filiale_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub client_name: String,
    pub competitor: Option<String>,
    pub reason: Option<String>,
    pub amount: Option<f64>,
}

impl ExportRecord for LostSale {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("lost_date", self.lost_date.into()),
            ("filiale_id", self.filiale_id.into()),
            ("user_id", self.user_id.into()),
            ("client_name", (&self.client_name).into()),
            ("competitor", self.competitor.as_ref().into()),
            ("reason", self.reason.as_ref().into()),
            ("amount", self.amount.into()),
        ]
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.user_id
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

/// Monthly target of a filiale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    /// First day of the budgeted month
    pub period: NaiveDate,
    pub filiale_id: Option<Uuid>,
    pub category: String,
    pub target_amount: Option<f64>,
    pub target_units: Option<i64>,
}

impl ExportRecord for Budget {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("period", self.period.into()),
            ("filiale_id", self.filiale_id.into()),
            ("category", (&self.category).into()),
            ("target_amount", self.target_amount.into()),
            ("target_units", self.target_units.into()),
        ]
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

/// Market share (PDM) observation for one brand in one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdmEntry {
    pub id: Uuid,
    pub entry_date: NaiveDate,
    pub filiale_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub segment: String,
    pub brand: String,
    #[serde(default)]
    pub units: i64,
    pub market_units: Option<i64>,
}

impl ExportRecord for PdmEntry {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("id", self.id.into()),
            ("entry_date", self.entry_date.into()),
            ("filiale_id", self.filiale_id.into()),
            ("user_id", self.user_id.into()),
            ("segment", (&self.segment).into()),
            ("brand", (&self.brand).into()),
            ("units", self.units.into()),
            ("market_units", self.market_units.into()),
        ]
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.user_id
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.filiale_id
    }
}

/// A decoded row of any exportable dataset
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetRow {
    LoginEvent(LoginEvent),
    Sale(Sale),
    Stock(StockItem),
    Order(Order),
    Visit(Visit),
    Opportunity(Opportunity),
    LostSale(LostSale),
    Budget(Budget),
    PdmEntry(PdmEntry),
    Profile(UserProfile),
}

impl DatasetRow {
    /// Decode a raw backend row into the record type of `dataset`
    pub fn decode(dataset: DatasetId, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match dataset {
            DatasetId::LoginEvents => DatasetRow::LoginEvent(serde_json::from_value(value)?),
            DatasetId::Sales => DatasetRow::Sale(serde_json::from_value(value)?),
            DatasetId::Stock => DatasetRow::Stock(serde_json::from_value(value)?),
            DatasetId::Orders => DatasetRow::Order(serde_json::from_value(value)?),
            DatasetId::Visits => DatasetRow::Visit(serde_json::from_value(value)?),
            DatasetId::Opportunities => DatasetRow::Opportunity(serde_json::from_value(value)?),
            DatasetId::LostSales => DatasetRow::LostSale(serde_json::from_value(value)?),
            DatasetId::Budgets => DatasetRow::Budget(serde_json::from_value(value)?),
            DatasetId::PdmEntries => DatasetRow::PdmEntry(serde_json::from_value(value)?),
            DatasetId::Profiles => DatasetRow::Profile(serde_json::from_value(value)?),
        })
    }

    /// Dataset this row belongs to
    pub fn dataset(&self) -> DatasetId {
        match self {
            DatasetRow::LoginEvent(_) => DatasetId::LoginEvents,
            DatasetRow::Sale(_) => DatasetId::Sales,
            DatasetRow::Stock(_) => DatasetId::Stock,
            DatasetRow::Order(_) => DatasetId::Orders,
            DatasetRow::Visit(_) => DatasetId::Visits,
            DatasetRow::Opportunity(_) => DatasetId::Opportunities,
            DatasetRow::LostSale(_) => DatasetId::LostSales,
            DatasetRow::Budget(_) => DatasetId::Budgets,
            DatasetRow::PdmEntry(_) => DatasetId::PdmEntries,
            DatasetRow::Profile(_) => DatasetId::Profiles,
        }
    }

    fn record(&self) -> &dyn ExportRecord {
        match self {
            DatasetRow::LoginEvent(row) => row,
            DatasetRow::Sale(row) => row,
            DatasetRow::Stock(row) => row,
            DatasetRow::Order(row) => row,
            DatasetRow::Visit(row) => row,
            DatasetRow::Opportunity(row) => row,
            DatasetRow::LostSale(row) => row,
            DatasetRow::Budget(row) => row,
            DatasetRow::PdmEntry(row) => row,
            DatasetRow::Profile(row) => row,
        }
    }
}

impl ExportRecord for DatasetRow {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        self.record().cells()
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.record().owner_id()
    }

    fn filiale_id(&self) -> Option<Uuid> {
        self.record().filiale_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(dataset: DatasetId) -> serde_json::Value {
        let id = "7d9f1c2e-5b6a-4c3d-9e8f-0a1b2c3d4e5f";
        let filiale = "11111111-1111-4111-8111-111111111111";
        let user = "22222222-2222-4222-8222-222222222222";
        match dataset {
            DatasetId::LoginEvents => json!({
                "id": id, "created_at": "2024-03-01T08:15:00+00:00",
                "user_id": user, "event": "sign_in"
            }),
            DatasetId::Sales => json!({
                "id": id, "sale_date": "2024-03-01", "filiale_id": filiale,
                "commercial_id": user, "client_name": "BTP Atlas", "quantity": 2,
                "amount": 185000.5
            }),
            DatasetId::Stock => json!({
                "id": id, "updated_at": "2024-03-01T08:15:00Z", "filiale_id": filiale,
                "model": "320 GC", "quantity": 3
            }),
            DatasetId::Orders => json!({
                "id": id, "order_date": "2024-03-01", "filiale_id": filiale,
                "created_by": user, "client_name": "BTP Atlas"
            }),
            DatasetId::Visits => json!({
                "id": id, "visit_date": "2024-03-01", "filiale_id": filiale,
                "user_id": user, "client_name": "BTP Atlas"
            }),
            DatasetId::Opportunities => json!({
                "id": id, "created_at": "2024-03-01T08:15:00Z", "filiale_id": filiale,
                "owner_id": user, "client_name": "BTP Atlas", "probability": 60
            }),
            DatasetId::LostSales => json!({
                "id": id, "lost_date": "2024-03-01", "filiale_id": filiale,
                "user_id": user, "client_name": "BTP Atlas", "competitor": "Volvo"
            }),
            DatasetId::Budgets => json!({
                "id": id, "period": "2024-03-01", "filiale_id": filiale,
                "category": "machines", "target_amount": 1000000.0
            }),
            DatasetId::PdmEntries => json!({
                "id": id, "entry_date": "2024-03-01", "filiale_id": filiale,
                "user_id": user, "segment": "excavators", "brand": "CAT", "units": 4
            }),
            DatasetId::Profiles => json!({
                "id": id, "created_at": "2024-03-01T08:15:00Z", "full_name": "Amina Idrissi",
                "email": "amina@example.com", "role": "commercial", "filiale_id": filiale,
                "active": true
            }),
        }
    }

    #[test]
    fn test_cells_follow_descriptor_columns() {
        for dataset in DatasetId::ALL {
            let row = DatasetRow::decode(dataset, sample(dataset)).unwrap();
            let names: Vec<&str> = row.cells().into_iter().map(|(name, _)| name).collect();
            assert_eq!(names, dataset.descriptor().columns, "{}", dataset);
            assert_eq!(row.dataset(), dataset);
        }
    }

    #[test]
    fn test_owner_and_filiale_follow_descriptor() {
        for dataset in DatasetId::ALL {
            let descriptor = dataset.descriptor();
            let row = DatasetRow::decode(dataset, sample(dataset)).unwrap();
            assert_eq!(row.owner_id().is_some(), descriptor.user_column.is_some(), "{}", dataset);
            assert_eq!(
                row.filiale_id().is_some(),
                descriptor.filiale_column.is_some(),
                "{}",
                dataset
            );
        }
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let result = DatasetRow::decode(DatasetId::Sales, json!({"id": "not-a-uuid"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Empty.to_string(), "");
        assert_eq!(Cell::Decimal(185000.5).to_string(), "185000.5");
        assert_eq!(
            Cell::from(NaiveDate::from_ymd_opt(2024, 3, 1)).to_string(),
            "2024-03-01"
        );
        assert_eq!(Cell::from(None::<i64>), Cell::Empty);
    }
}
