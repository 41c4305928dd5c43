//! filiale-report: scoped dataset exports from the command line

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use filiale_report_sdk::cli::commands::datasets::handle_datasets;
use filiale_report_sdk::cli::commands::export::{ExportOptions, handle_export};
use filiale_report_sdk::cli::commands::users::{handle_set_active, handle_users};
use filiale_report_sdk::export::ExportFormat;
use filiale_report_sdk::models::DatasetId;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "filiale-report",
    version,
    about = "Scoped dataset exports for the filiale dashboard"
)]
struct Cli {
    /// TOML configuration file; FILIALE_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List exportable datasets
    Datasets,
    /// Export a dataset as the given user
    Export {
        /// Profile id of the caller
        #[arg(long = "as")]
        as_user: Uuid,
        #[arg(long)]
        dataset: DatasetId,
        /// Filiale to export (siege admins only)
        #[arg(long)]
        filiale: Option<Uuid>,
        /// Only rows owned by this user
        #[arg(long)]
        user: Option<Uuid>,
        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Output directory, overrides the configured one
        #[arg(long)]
        output: Option<PathBuf>,
        /// Refuse print exports instead of writing the report
        #[arg(long)]
        no_print: bool,
    },
    /// List users visible to the caller
    Users {
        #[arg(long = "as")]
        as_user: Uuid,
        #[arg(long)]
        filiale: Option<Uuid>,
    },
    /// Activate or deactivate an account
    SetActive {
        #[arg(long = "as")]
        as_user: Uuid,
        target: Uuid,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Datasets => handle_datasets()?,
        Commands::Export {
            as_user,
            dataset,
            filiale,
            user,
            from,
            to,
            format,
            output,
            no_print,
        } => {
            handle_export(ExportOptions {
                config: cli.config.clone(),
                as_user,
                dataset,
                format,
                filiale,
                user,
                from,
                to,
                output,
                no_print,
            })
            .await?
        }
        Commands::Users { as_user, filiale } => handle_users(config, as_user, filiale).await?,
        Commands::SetActive {
            as_user,
            target,
            active,
        } => handle_set_active(config, as_user, target, active).await?,
    }

    Ok(())
}
