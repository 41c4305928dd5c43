//! Output formatting for CLI

use crate::decorate::LabelMaps;
use crate::models::{DatasetId, UserProfile};
use crate::service::ExportOutcome;
use std::path::Path;

/// Format the dataset catalog as an aligned table
pub fn format_dataset_catalog() -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<16} {:<16} {:<12} {:<8} {}\n",
        "DATASET", "TABLE", "DATE", "FILIALE", "OWNER"
    ));
    for id in DatasetId::ALL {
        let d = id.descriptor();
        output.push_str(&format!(
            "{:<16} {:<16} {:<12} {:<8} {}\n",
            id.as_str(),
            d.table,
            d.date_field,
            if d.supports_filiale_filter() { "yes" } else { "-" },
            d.user_column.unwrap_or("-")
        ));
    }
    output
}

/// Summary printed after a successful export
pub fn format_export_outcome(outcome: &ExportOutcome, dir: &Path) -> String {
    let mut output = format!(
        "✅ Exported {} row(s) to {}\n",
        outcome.rows,
        dir.join(&outcome.filename).display()
    );
    output.push_str(&format!("  Requests: {}\n", outcome.requests));
    if outcome.rows == 0 {
        output.push_str("  ⚠️  No rows matched the current filters\n");
    }
    output
}

/// Format a user list with filiale names
pub fn format_user_list(users: &[UserProfile], labels: &LabelMaps) -> String {
    if users.is_empty() {
        return "No users visible for this account\n".to_string();
    }
    let mut output = String::new();
    for user in users {
        output.push_str(&format!(
            "{}  {:<28} {:<20} {:<16} {}\n",
            user.id,
            user.display_name(),
            user.role.as_str(),
            labels.filiale_label(user.filiale_id),
            if user.active { "active" } else { "inactive" }
        ));
    }
    output.push_str(&format!("\n{} user(s)\n", users.len()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use uuid::Uuid;

    #[test]
    fn test_catalog_lists_every_dataset() {
        let catalog = format_dataset_catalog();
        for id in DatasetId::ALL {
            assert!(catalog.contains(id.as_str()));
        }
    }

    #[test]
    fn test_user_list_marks_inactive() {
        let filiale = Uuid::new_v4();
        let user = UserProfile {
            id: Uuid::new_v4(),
            created_at: None,
            full_name: Some("Youssef".to_string()),
            email: None,
            role: Role::Technician,
            filiale_id: Some(filiale),
            active: false,
        };
        let labels = LabelMaps::new().with_filiale(filiale, "Oujda");
        let text = format_user_list(&[user], &labels);
        assert!(text.contains("Youssef"));
        assert!(text.contains("Oujda"));
        assert!(text.contains("inactive"));
    }
}
