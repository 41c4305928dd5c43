//! CLI command implementations

pub mod datasets;
pub mod export;
pub mod users;

use crate::cli::error::CliError;
use crate::config::ClientConfig;
use crate::storage::DataSource;
use crate::storage::api::PostgrestDataSource;
use std::path::Path;
use std::sync::Arc;

/// Load configuration and open the backend data source
pub(crate) fn connect(
    config_path: Option<&Path>,
) -> Result<(ClientConfig, Arc<dyn DataSource>), CliError> {
    let config = ClientConfig::load(config_path)?;
    let source: Arc<dyn DataSource> = Arc::new(PostgrestDataSource::from_config(&config)?);
    Ok((config, source))
}
