//! Stores command - inspect or purge cache stores

use super::status::is_current;
use super::Workspace;
use crate::cli::args::{OutputFormat, StoresAction, StoresArgs};
use crate::config::Config;
use crate::error::SwcacheResult;
use crate::store::CacheStorage;
use crate::ui::{self, Status, StoreRow, UiContext};

/// Execute the stores command
pub async fn execute(args: StoresArgs, config: &Config) -> SwcacheResult<()> {
    let workspace = Workspace::new(config);

    match args.action {
        StoresAction::List { format } => list(&workspace, format).await,
        StoresAction::Show { name } => show(&workspace, &name).await,
        StoresAction::Purge { yes } => purge(&workspace, yes).await,
    }
}

async fn list(workspace: &Workspace, format: OutputFormat) -> SwcacheResult<()> {
    let registration = workspace.registration().await?;
    let active = registration.active.as_ref().map(|v| v.store_names());

    let mut rows = Vec::new();
    for name in workspace.storage.keys().await? {
        let entries = workspace.storage.entries(&name).await?.len();
        rows.push(StoreRow {
            current: is_current(active.as_ref(), &name),
            name,
            entries,
        });
    }

    if rows.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step(&ctx, Status::Info, "No cache stores");
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => ui::store_table(&UiContext::detect(), &rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }

    Ok(())
}

async fn show(workspace: &Workspace, name: &str) -> SwcacheResult<()> {
    let keys = workspace.storage.entries(name).await?;
    if keys.is_empty() {
        let ctx = UiContext::detect();
        ui::step(&ctx, Status::Info, &format!("{} is empty", name));
        return Ok(());
    }
    for key in keys {
        println!("{}", key);
    }
    Ok(())
}

async fn purge(workspace: &Workspace, yes: bool) -> SwcacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let names = workspace.storage.keys().await?;

    if names.is_empty() {
        ui::step(&ctx, Status::Info, "No cache stores");
        return Ok(());
    }

    let prompt = format!("Delete {} store(s) and forget the active version?", names.len());
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::warn_with_hint(&ctx, "Purge cancelled", "Pass --yes to skip the prompt");
        return Ok(());
    }

    let mut deleted = Vec::new();
    for name in names {
        if workspace.storage.delete(&name).await? {
            deleted.push(name);
        }
    }

    let mut registration = workspace.registration().await?;
    registration.clear();
    workspace.save_registration(&registration).await?;

    workspace
        .journal
        .record("stores.purged", &serde_json::json!({ "deleted": deleted }))
        .await;

    ui::step(&ctx, Status::Ok, &format!("Deleted {} store(s)", deleted.len()));
    Ok(())
}
