//! Activate command - re-run activation for the installed version

use super::Workspace;
use crate::config::Config;
use crate::error::{SwcacheError, SwcacheResult};
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the activate command
pub async fn execute(config: &Config) -> SwcacheResult<()> {
    let ctx = UiContext::detect();
    let workspace = Workspace::new(config);
    let mut registration = workspace.registration().await?;

    // A waiting version takes precedence over the active one
    let version = registration
        .waiting
        .clone()
        .or_else(|| registration.active.clone())
        .ok_or_else(|| SwcacheError::InvalidTransition {
            action: "activate".to_string(),
            state: "not installed".to_string(),
        })?;

    let mut manager = workspace.manager(config, version.clone())?.resume_installed();

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Activating {}...", version));
    let report = match manager.activate().await {
        Ok(report) => report,
        Err(e) => {
            spinner.stop_error(&format!("Activation of {} failed", version));
            return Err(e);
        }
    };
    spinner.stop(&format!("{} activated", version));

    registration.set_active(version);
    workspace.save_registration(&registration).await?;

    ui::activation_summary(&ctx, &report);
    ui::field(&ctx, "Kept", &report.kept.join(", "), None);

    Ok(())
}
