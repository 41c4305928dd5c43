//! User management command implementations

use super::connect;
use crate::admin::UserAdmin;
use crate::auth::Session;
use crate::cli::error::CliError;
use crate::cli::output::format_user_list;
use crate::decorate::load_labels;
use std::path::Path;
use uuid::Uuid;

/// Handle the users command
pub async fn handle_users(
    config_path: Option<&Path>,
    as_user: Uuid,
    filiale: Option<Uuid>,
) -> Result<(), CliError> {
    let (config, source) = connect(config_path)?;
    let session = Session::load(source.as_ref(), as_user).await?;
    let labels = load_labels(source.as_ref(), config.page_size).await?;

    let admin = UserAdmin::new(source).with_page_size(config.page_size);
    let users = admin.list_users(&session, filiale).await?;

    print!("{}", format_user_list(&users, &labels));
    Ok(())
}

/// Handle the set-active command
pub async fn handle_set_active(
    config_path: Option<&Path>,
    as_user: Uuid,
    target: Uuid,
    active: bool,
) -> Result<(), CliError> {
    let (config, source) = connect(config_path)?;
    let session = Session::load(source.as_ref(), as_user).await?;

    let admin = UserAdmin::new(source).with_page_size(config.page_size);
    admin.set_active(&session, target, active).await?;

    println!(
        "✅ User {} {}",
        target,
        if active { "activated" } else { "deactivated" }
    );
    Ok(())
}
