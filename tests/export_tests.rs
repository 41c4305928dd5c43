//! End-to-end export tests against the in-memory data source

use async_trait::async_trait;
use chrono::NaiveDate;
use filiale_report_sdk::auth::{Role, Session};
use filiale_report_sdk::decorate::{LabelMaps, load_labels};
use filiale_report_sdk::export::{DirectorySink, ExportError, ExportFormat};
use filiale_report_sdk::fetch::fetch_all;
use filiale_report_sdk::models::{DatasetId, ExportFilter, UserProfile};
use filiale_report_sdk::scope::{TenantScope, resolve_scope};
use filiale_report_sdk::service::{ExportRequest, ExportService};
use filiale_report_sdk::storage::memory::MemoryDataSource;
use filiale_report_sdk::storage::{DataSource, Filter, PageRange, StorageError, TableQuery};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Notify;
use uuid::Uuid;

const FILIALE_A: &str = "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa";
const FILIALE_B: &str = "bbbbbbbb-bbbb-4bbb-8bbb-bbbbbbbbbbbb";
const USER_A: &str = "11111111-1111-4111-8111-111111111111";

fn uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap()
}

fn export_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

fn session(role: Role, filiale: Option<&str>) -> Session {
    Session::new(UserProfile {
        id: Uuid::new_v4(),
        created_at: None,
        full_name: Some("Caller".to_string()),
        email: None,
        role,
        filiale_id: filiale.map(uuid),
        active: true,
    })
}

fn sale(index: usize, filiale: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "sale_date": format!("2024-{:02}-{:02}", index % 12 + 1, index % 28 + 1),
        "filiale_id": filiale,
        "commercial_id": USER_A,
        "client_name": format!("Client {}", index),
        "quantity": 1,
        "amount": 1000.0
    })
}

fn dashboard_source(sales: Vec<Value>) -> MemoryDataSource {
    MemoryDataSource::new()
        .with_table("sales", sales)
        .with_table(
            "profiles",
            vec![json!({
                "id": USER_A,
                "full_name": "Amine Tazi",
                "role": "commercial",
                "filiale_id": FILIALE_A,
                "active": true
            })],
        )
        .with_table(
            "filiales",
            vec![
                json!({"id": FILIALE_A, "name": "Casablanca"}),
                json!({"id": FILIALE_B, "name": "Marrakech"}),
            ],
        )
        .with_table(
            "auth_logs",
            vec![json!({
                "id": Uuid::new_v4(),
                "created_at": "2024-06-30T09:00:00Z",
                "user_id": USER_A,
                "event": "sign_in"
            })],
        )
}

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_admin_all_filiales_exports_every_row() {
        let source = Arc::new(dashboard_source((0..3).map(|i| sale(i, FILIALE_A)).collect()));
        let labels = load_labels(source.as_ref(), 500).await.unwrap();
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());

        let outcome = service
            .export_dated(
                &session(Role::SiegeAdmin, None),
                &ExportRequest::new(DatasetId::Sales, ExportFormat::Csv),
                &labels,
                &sink,
                export_date(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.rows, 3);
        assert_eq!(outcome.filename, "sales_2024-07-01.csv");
        let csv = std::fs::read_to_string(temp.path().join(&outcome.filename)).unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.contains("\"Amine Tazi\",\"Casablanca\""));
    }

    #[tokio::test]
    async fn test_manager_of_empty_filiale_only_issues_member_lookup() {
        let source = dashboard_source(vec![]);
        let scope = resolve_scope(Role::SubsidiaryManager, Some(uuid(FILIALE_B)), None);
        assert_eq!(scope, TenantScope::Only(uuid(FILIALE_B)));

        let outcome = fetch_all(
            &source,
            DatasetId::LoginEvents.descriptor(),
            scope,
            &ExportFilter::new(),
            500,
        )
        .await
        .unwrap();

        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.requests, 1);
        assert_eq!(source.request_count(), 1);
        assert_eq!(source.request_log()[0].0.table, "profiles");
    }

    #[tokio::test]
    async fn test_admin_selecting_filiale_scopes_login_events_through_members() {
        let source = Arc::new(dashboard_source(vec![]));
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());
        let request = ExportRequest::new(DatasetId::LoginEvents, ExportFormat::Csv)
            .with_filter(ExportFilter::new().with_filiale(uuid(FILIALE_A)));

        let outcome = service
            .export_dated(
                &session(Role::SiegeAdmin, None),
                &request,
                &LabelMaps::new(),
                &sink,
                export_date(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.rows, 1);
        assert_eq!(outcome.requests, 2);
        let data_query = &source.request_log()[1].0;
        assert!(data_query.filters.contains(&Filter::is_in("user_id", [USER_A])));
    }

    #[tokio::test]
    async fn test_twelve_hundred_rows_take_three_requests() {
        let source = Arc::new(dashboard_source((0..1200).map(|i| sale(i, FILIALE_A)).collect()));
        let service = ExportService::new(source.clone()).with_page_size(500);
        let temp = TempDir::new().unwrap();

        let outcome = service
            .export_dated(
                &session(Role::SiegeAdmin, None),
                &ExportRequest::new(DatasetId::Sales, ExportFormat::Csv),
                &LabelMaps::new(),
                &DirectorySink::new(temp.path()),
                export_date(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.rows, 1200);
        assert_eq!(outcome.requests, 3);
        let limits: Vec<PageRange> = source.request_log().into_iter().map(|(_, r)| r).collect();
        assert_eq!(
            limits,
            vec![PageRange::new(0, 501), PageRange::new(500, 501), PageRange::new(1000, 501)]
        );
    }

    #[tokio::test]
    async fn test_exact_multiple_of_page_size_takes_no_extra_request() {
        let source = dashboard_source((0..1000).map(|i| sale(i, FILIALE_A)).collect());

        let outcome = fetch_all(
            &source,
            DatasetId::Sales.descriptor(),
            TenantScope::All,
            &ExportFilter::new(),
            500,
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows.len(), 1000);
        assert_eq!(outcome.requests, 2);
        assert_eq!(source.request_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_mid_fetch_writes_nothing() {
        let source = Arc::new(dashboard_source((0..1200).map(|i| sale(i, FILIALE_A)).collect()));
        source.fail_on_request(2, "network error");
        let service = ExportService::new(source.clone()).with_page_size(500);
        let temp = TempDir::new().unwrap();

        let result = service
            .export_dated(
                &session(Role::SiegeAdmin, None),
                &ExportRequest::new(DatasetId::Sales, ExportFormat::Csv),
                &LabelMaps::new(),
                &DirectorySink::new(temp.path()),
                export_date(),
            )
            .await;

        let error = result.unwrap_err();
        assert!(matches!(error, ExportError::Fetch(_)));
        assert!(error.to_string().contains("network error"));
        assert_eq!(source.request_count(), 2);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
        assert!(!service.is_exporting());
    }

    #[tokio::test]
    async fn test_non_admin_without_filiale_issues_no_request() {
        let source = Arc::new(dashboard_source((0..3).map(|i| sale(i, FILIALE_A)).collect()));
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();

        let outcome = service
            .export_dated(
                &session(Role::SubsidiaryManager, None),
                &ExportRequest::new(DatasetId::Sales, ExportFormat::Csv)
                    .with_filter(ExportFilter::new().with_filiale(uuid(FILIALE_A))),
                &LabelMaps::new(),
                &DirectorySink::new(temp.path()),
                export_date(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.rows, 0);
        assert_eq!(source.request_count(), 0);
        let csv = std::fs::read_to_string(temp.path().join(&outcome.filename)).unwrap();
        assert_eq!(csv, "");
    }
}

mod gating_tests {
    use super::*;

    #[tokio::test]
    async fn test_roles_without_export_view_are_refused() {
        let source = Arc::new(dashboard_source(vec![]));
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());

        let technician = session(Role::Technician, Some(FILIALE_A));
        let result = service
            .export_dated(
                &technician,
                &ExportRequest::new(DatasetId::Stock, ExportFormat::Csv),
                &LabelMaps::new(),
                &sink,
                export_date(),
            )
            .await;
        assert!(matches!(result, Err(ExportError::PermissionDenied(_))));

        let manager = session(Role::SubsidiaryManager, Some(FILIALE_A));
        let result = service
            .export_dated(
                &manager,
                &ExportRequest::new(DatasetId::LoginEvents, ExportFormat::Csv),
                &LabelMaps::new(),
                &sink,
                export_date(),
            )
            .await;
        assert!(matches!(result, Err(ExportError::PermissionDenied(_))));
        assert_eq!(source.request_count(), 0);
    }

    #[tokio::test]
    async fn test_manager_selection_is_ignored() {
        let mut sales: Vec<Value> = (0..2).map(|i| sale(i, FILIALE_A)).collect();
        sales.extend((2..7).map(|i| sale(i, FILIALE_B)));
        let source = Arc::new(dashboard_source(sales));
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();

        let outcome = service
            .export_dated(
                &session(Role::SubsidiaryManager, Some(FILIALE_A)),
                &ExportRequest::new(DatasetId::Sales, ExportFormat::Csv)
                    .with_filter(ExportFilter::new().with_filiale(uuid(FILIALE_B))),
                &LabelMaps::new(),
                &DirectorySink::new(temp.path()),
                export_date(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.rows, 2);
    }
}

mod print_tests {
    use super::*;

    #[tokio::test]
    async fn test_html_export_goes_to_print_surface() {
        let source = Arc::new(dashboard_source((0..2).map(|i| sale(i, FILIALE_A)).collect()));
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();

        let outcome = service
            .export_dated(
                &session(Role::SiegeAdmin, None),
                &ExportRequest::new(DatasetId::Sales, ExportFormat::Html),
                &LabelMaps::new(),
                &DirectorySink::new(temp.path()),
                export_date(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.filename, "sales_2024-07-01.html");
        let html = std::fs::read_to_string(temp.path().join(&outcome.filename)).unwrap();
        assert!(html.contains("<h1>Sales (2024-07-01)</h1>"));
    }

    #[tokio::test]
    async fn test_manager_report_names_own_filiale_not_selection() {
        let sales = vec![sale(0, FILIALE_A), sale(1, FILIALE_B)];
        let source = Arc::new(dashboard_source(sales));
        let labels = load_labels(source.as_ref(), 500).await.unwrap();
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();
        let request = ExportRequest::new(DatasetId::Sales, ExportFormat::Html)
            .with_filter(ExportFilter::new().with_filiale(uuid(FILIALE_B)));

        let outcome = service
            .export_dated(
                &session(Role::SubsidiaryManager, Some(FILIALE_A)),
                &request,
                &labels,
                &DirectorySink::new(temp.path()),
                export_date(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.rows, 1);
        let html = std::fs::read_to_string(temp.path().join(&outcome.filename)).unwrap();
        assert!(html.contains("Filiale: Casablanca"));
        assert!(!html.contains("Marrakech"));
    }

    #[tokio::test]
    async fn test_user_filter_omitted_from_report_when_not_applied() {
        let source = Arc::new(dashboard_source(vec![]).with_table("stock", vec![]));
        let labels = load_labels(source.as_ref(), 500).await.unwrap();
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();
        let request = ExportRequest::new(DatasetId::Stock, ExportFormat::Html)
            .with_filter(ExportFilter::new().with_user(uuid(USER_A)));

        let outcome = service
            .export_dated(
                &session(Role::SiegeAdmin, None),
                &request,
                &labels,
                &DirectorySink::new(temp.path()),
                export_date(),
            )
            .await
            .unwrap();

        let html = std::fs::read_to_string(temp.path().join(&outcome.filename)).unwrap();
        assert!(!html.contains("User:"));
        assert!(!html.contains("Amine Tazi"));
    }

    #[tokio::test]
    async fn test_blocked_print_window_is_reported() {
        let source = Arc::new(dashboard_source(vec![]));
        let service = ExportService::new(source.clone());
        let temp = TempDir::new().unwrap();

        let result = service
            .export_dated(
                &session(Role::SiegeAdmin, None),
                &ExportRequest::new(DatasetId::Sales, ExportFormat::Html),
                &LabelMaps::new(),
                &DirectorySink::new(temp.path()).without_print(),
                export_date(),
            )
            .await;

        assert!(matches!(result, Err(ExportError::PrintWindowBlocked)));
        assert!(!service.is_exporting());
    }
}

mod busy_flag_tests {
    use super::*;

    /// Source whose first read blocks until released
    struct GatedSource {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl DataSource for GatedSource {
        async fn query_page(
            &self,
            _query: &TableQuery,
            _range: PageRange,
        ) -> Result<Vec<Value>, StorageError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(Vec::new())
        }

        async fn insert(&self, _table: &str, _record: Value) -> Result<String, StorageError> {
            Err(StorageError::BackendError("read only".to_string()))
        }

        async fn update(
            &self,
            _table: &str,
            _filters: &[Filter],
            _patch: Value,
        ) -> Result<usize, StorageError> {
            Err(StorageError::BackendError("read only".to_string()))
        }
    }

    #[tokio::test]
    async fn test_second_export_fails_fast_while_first_runs() {
        let source = Arc::new(GatedSource {
            started: Notify::new(),
            release: Notify::new(),
        });
        let service = ExportService::new(source.clone());
        let admin = session(Role::SiegeAdmin, None);
        let request = ExportRequest::new(DatasetId::Stock, ExportFormat::Csv);
        let labels = LabelMaps::new();
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path());

        let first = service.export_dated(&admin, &request, &labels, &sink, export_date());
        let second = async {
            source.started.notified().await;
            assert!(service.is_exporting());
            let result = service
                .export_dated(&admin, &request, &labels, &sink, export_date())
                .await;
            source.release.notify_one();
            result
        };

        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(ExportError::AlreadyRunning)));
        assert!(!service.is_exporting());
    }
}
