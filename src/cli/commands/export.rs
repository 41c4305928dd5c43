//! Export command implementation

use super::connect;
use crate::auth::Session;
use crate::cli::error::CliError;
use crate::cli::output::format_export_outcome;
use crate::decorate::load_labels;
use crate::export::{DirectorySink, ExportFormat};
use crate::models::{DatasetId, ExportFilter};
use crate::service::{ExportRequest, ExportService};
use chrono::NaiveDate;
use std::path::PathBuf;
use uuid::Uuid;

/// Arguments of the export command
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub config: Option<PathBuf>,
    pub as_user: Uuid,
    pub dataset: DatasetId,
    pub format: ExportFormat,
    pub filiale: Option<Uuid>,
    pub user: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub output: Option<PathBuf>,
    /// Fail print exports instead of writing the report file
    pub no_print: bool,
}

impl ExportOptions {
    fn filter(&self) -> Result<ExportFilter, CliError> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(CliError::InvalidArgument(format!(
                "--from {} is after --to {}",
                from, to
            )));
        }
        let mut filter = ExportFilter::new().with_date_range(self.from, self.to);
        if let Some(filiale) = self.filiale {
            filter = filter.with_filiale(filiale);
        }
        if let Some(user) = self.user {
            filter = filter.with_user(user);
        }
        Ok(filter)
    }
}

/// Handle the export command
pub async fn handle_export(options: ExportOptions) -> Result<(), CliError> {
    let filter = options.filter()?;
    let (config, source) = connect(options.config.as_deref())?;

    let session = Session::load(source.as_ref(), options.as_user).await?;
    let labels = load_labels(source.as_ref(), config.page_size).await?;

    let dir = options.output.clone().unwrap_or_else(|| config.output_dir.clone());
    let mut sink = DirectorySink::new(&dir);
    if options.no_print {
        sink = sink.without_print();
    }

    let service = ExportService::new(source).with_page_size(config.page_size);
    let request = ExportRequest::new(options.dataset, options.format).with_filter(filter);
    let outcome = service.export(&session, &request, &labels, &sink).await?;

    print!("{}", format_export_outcome(&outcome, &dir));
    Ok(())
}
