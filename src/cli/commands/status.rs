//! Status command - show versions and store health

use super::Workspace;
use crate::config::Config;
use crate::error::SwcacheResult;
use crate::store::CacheStorage;
use crate::ui::{self, Status, UiContext};
use crate::version::StoreNames;

/// Execute the status command
pub async fn execute(config: &Config) -> SwcacheResult<()> {
    let ctx = UiContext::detect();
    let workspace = Workspace::new(config);
    let registration = workspace.registration().await?;
    let configured = config.version_tag()?;

    ui::banner(&ctx, "swcache status");

    ui::heading(&ctx, "Versions");
    ui::field(&ctx, "Configured", configured.as_str(), None);
    let (active, active_status) = match registration.active {
        Some(ref active) if active == &configured => (active.as_str(), Status::Ok),
        Some(ref active) => (active.as_str(), Status::Warn),
        None => ("none", Status::Warn),
    };
    ui::field(&ctx, "Active", active, Some(active_status));
    if let Some(ref waiting) = registration.waiting {
        ui::field(&ctx, "Waiting", waiting.as_str(), Some(Status::Warn));
    }

    ui::heading(&ctx, "Stores");
    let root = workspace.storage.root().display().to_string();
    ui::field(&ctx, "Directory", &root, None);

    let names = workspace.storage.keys().await?;
    let current = registration.active.as_ref().map(|v| v.store_names());
    let mut stale = 0;
    for name in &names {
        let entries = workspace.storage.entries(name).await?.len();
        let is_current = is_current(current.as_ref(), name);
        if !is_current {
            stale += 1;
        }
        let status = if is_current { Status::Ok } else { Status::Warn };
        ui::field(&ctx, name, &format!("{} entries", entries), Some(status));
    }
    if names.is_empty() {
        ui::hint(&ctx, "No cache stores");
    }

    if let Some(ref active) = registration.active {
        let expected = active.store_names();
        if !workspace.storage.has(&expected.assets).await? {
            ui::warn_with_hint(
                &ctx,
                &format!("Asset store {} is missing", expected.assets),
                "Run `swcache install` to repopulate it",
            );
        }
    }

    if stale > 0 {
        ui::warn_with_hint(
            &ctx,
            &format!("{} stale store(s)", stale),
            "Run `swcache activate` to delete them",
        );
    } else if registration.active.is_some() {
        ui::step(&ctx, Status::Ok, "Only the active generation is stored");
    }

    Ok(())
}

/// Whether a store belongs to the active generation
pub(crate) fn is_current(active: Option<&StoreNames>, name: &str) -> bool {
    active.map(|names| names.contains(name)).unwrap_or(false)
}
