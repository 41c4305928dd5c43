//! Print report exporter
//!
//! Produces a small self-contained HTML document (inline styles, no
//! scripts) that the print surface renders and prints.

use crate::decorate::{DecoratedRow, LabelMaps};
use crate::models::{DatasetDescriptor, ExportFilter};
use crate::scope::TenantScope;
use chrono::NaiveDate;

const STYLE: &str = "body{font-family:Arial,sans-serif;font-size:11px;margin:24px}\
h1{font-size:18px;margin:0 0 4px}\
p.filters{color:#555;margin:0 0 12px}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #ccc;padding:4px 6px;text-align:left}\
th{background:#f2f2f2}\
td.empty{text-align:center;color:#888}";

/// Tenant label of a report whose caller has no filiale
pub const NO_FILIALE: &str = "none";

/// Exporter for the printable HTML report.
pub struct HtmlExporter;

impl HtmlExporter {
    /// Render a print-ready report of `rows`.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - Dataset being exported; provides the title and columns
    /// * `scope` - Tenant scope the rows were fetched under
    /// * `filter` - User and date filters as applied; its `filiale_id` is not read
    /// * `labels` - Used to name the filiale and user in the summary
    /// * `rows` - Decorated rows, already in export order
    /// * `generated_on` - Date printed in the header
    pub fn export(
        descriptor: &DatasetDescriptor,
        scope: TenantScope,
        filter: &ExportFilter,
        labels: &LabelMaps,
        rows: &[DecoratedRow],
        generated_on: NaiveDate,
    ) -> String {
        let columns = descriptor.export_columns();
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n",
            escape_html(descriptor.title),
            STYLE
        ));
        html.push_str(&format!(
            "<h1>{} ({})</h1>\n",
            escape_html(descriptor.title),
            generated_on.format("%Y-%m-%d")
        ));

        if let Some(summary) = filter_summary(scope, filter, labels) {
            html.push_str(&format!("<p class=\"filters\">{}</p>\n", escape_html(&summary)));
        }

        html.push_str("<table>\n<thead><tr>");
        for column in &columns {
            html.push_str(&format!("<th>{}</th>", escape_html(column)));
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        if rows.is_empty() {
            html.push_str(&format!(
                "<tr><td class=\"empty\" colspan=\"{}\">No data</td></tr>\n",
                columns.len()
            ));
        }
        for row in rows {
            html.push_str("<tr>");
            for (_, value) in row.fields() {
                html.push_str(&format!("<td>{}</td>", escape_html(&value)));
            }
            html.push_str("</tr>\n");
        }

        html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
        html
    }
}

/// One line describing the active filters, `None` when nothing is set
///
/// The tenant part follows `scope`, so a filiale the caller picked but was
/// not allowed to select never shows up.
pub fn filter_summary(
    scope: TenantScope,
    filter: &ExportFilter,
    labels: &LabelMaps,
) -> Option<String> {
    let mut parts = Vec::new();
    match scope {
        TenantScope::All => {}
        TenantScope::Only(filiale_id) => {
            parts.push(format!("Filiale: {}", labels.filiale_label(Some(filiale_id))));
        }
        TenantScope::Nothing => parts.push(format!("Filiale: {}", NO_FILIALE)),
    }
    if let Some(user_id) = filter.user_id {
        parts.push(format!("User: {}", labels.user_label(Some(user_id))));
    }
    if let Some(range) = filter.date_range.describe() {
        parts.push(format!("Period: {}", range));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// Escape text for use in element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
