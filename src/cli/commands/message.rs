//! Message command - deliver a control message to the waiting version

use super::Workspace;
use crate::cli::args::MessageArgs;
use crate::config::Config;
use crate::error::SwcacheResult;
use crate::lifecycle::ControlMessage;
use crate::ui::{self, Status, UiContext};

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config) -> SwcacheResult<()> {
    let ctx = UiContext::detect();
    let message = ControlMessage::parse(&args.payload)?;

    let workspace = Workspace::new(config);
    let mut registration = workspace.registration().await?;

    let Some(version) = registration.waiting.clone() else {
        ui::step(&ctx, Status::Info, "No waiting version; message has no effect");
        return Ok(());
    };

    let mut manager = workspace.manager(config, version.clone())?.resume_installed();
    if !manager.handle_message(&message) {
        ui::step(&ctx, Status::Info, "Message ignored");
        return Ok(());
    }

    if !manager.ready_to_activate().await {
        ui::step(&ctx, Status::Warn, &format!("{} is still waiting", version));
        return Ok(());
    }

    let report = manager.activate().await?;
    registration.set_active(version.clone());
    workspace.save_registration(&registration).await?;

    ui::activation_summary(&ctx, &report);
    ui::step(&ctx, Status::Ok, &format!("{} is active", version));

    Ok(())
}
