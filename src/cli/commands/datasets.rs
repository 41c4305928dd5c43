//! Datasets command implementation

use crate::cli::error::CliError;
use crate::cli::output::format_dataset_catalog;

/// Handle the datasets command
pub fn handle_datasets() -> Result<(), CliError> {
    print!("{}", format_dataset_catalog());
    Ok(())
}
