//! CSV exporter
//!
//! Every field is wrapped in double quotes and inner quotes are doubled, so
//! labels containing commas or quotes survive a round trip through any
//! standard CSV reader. Records are separated by `\n` with no trailing
//! newline.

use crate::decorate::DecoratedRow;
use crate::export::ExportError;

/// Exporter for the CSV download format.
pub struct CsvExporter;

impl CsvExporter {
    /// Render decorated rows to CSV text.
    ///
    /// The header is taken from the first row's field names. No rows gives
    /// an empty string, not a header-only file.
    ///
    /// # Example
    ///
    /// ```rust
    /// use filiale_report_sdk::export::CsvExporter;
    ///
    /// assert_eq!(CsvExporter::export(&[]).unwrap(), "");
    /// ```
    pub fn export(rows: &[DecoratedRow]) -> Result<String, ExportError> {
        let Some(first) = rows.first() else {
            return Ok(String::new());
        };

        let mut writer = ::csv::WriterBuilder::new()
            .quote_style(::csv::QuoteStyle::Always)
            .terminator(::csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let header: Vec<&str> = first.fields().iter().map(|(name, _)| *name).collect();
        writer
            .write_record(&header)
            .map_err(|e| ExportError::Render(format!("Failed to write CSV header: {}", e)))?;

        for (index, row) in rows.iter().enumerate() {
            let values: Vec<String> = row.fields().into_iter().map(|(_, value)| value).collect();
            writer.write_record(&values).map_err(|e| {
                ExportError::Render(format!("Failed to write CSV record {}: {}", index, e))
            })?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Render(format!("Failed to flush CSV: {}", e)))?;
        let mut text = String::from_utf8(bytes)
            .map_err(|e| ExportError::Render(format!("CSV is not valid UTF-8: {}", e)))?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}
