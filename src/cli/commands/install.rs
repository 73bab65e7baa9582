//! Install command - populate the asset store and activate

use super::Workspace;
use crate::config::Config;
use crate::error::SwcacheResult;
use crate::ui::{self, InstallProgress, Status, UiContext};
use tracing::debug;

/// Execute the install command
pub async fn execute(config: &Config) -> SwcacheResult<()> {
    let ctx = UiContext::detect();
    let workspace = Workspace::new(config);
    let version = config.version_tag()?;
    let mut registration = workspace.registration().await?;

    ui::banner(&ctx, &format!("swcache install {}", version));

    let mut manager = workspace.manager(config, version.clone())?;
    let progress = InstallProgress::new(&ctx, version.as_str(), manager.manifest().len());
    let installed = manager
        .install_with_progress(&|url| progress.on_fetched(url))
        .await;
    progress.finish();

    let report = match installed {
        Ok(report) => report,
        Err(e) => {
            ui::step(&ctx, Status::Fail, &format!("Install of {} failed", version));
            if let Some(active) = &registration.active {
                ui::hint(&ctx, &format!("{} remains active", active));
            }
            return Err(e);
        }
    };
    ui::step_with(
        &ctx,
        Status::Ok,
        &format!("Stored {} assets", report.entries),
        &report.store,
    );

    // Persist the waiting state first so a failed activation can be retried
    registration.set_waiting(version.clone());
    workspace.save_registration(&registration).await?;

    if !manager.ready_to_activate().await {
        debug!(version = %version, "left waiting");
        ui::warn_with_hint(
            &ctx,
            &format!("{} is waiting", version),
            "Send {\"type\":\"SKIP_WAITING\"} with `swcache message` to activate it",
        );
        return Ok(());
    }

    let activation = manager.activate().await?;
    registration.set_active(version.clone());
    workspace.save_registration(&registration).await?;

    ui::activation_summary(&ctx, &activation);
    ui::done(&ctx, &format!("{} is active", version));

    Ok(())
}
