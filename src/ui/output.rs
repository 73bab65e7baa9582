//! Terminal output for the swcache commands
//!
//! Every step line carries a [`Status`]. On a terminal it becomes the
//! matching cliclack log symbol; in CI and when piped it is printed as a
//! bracketed tag (`[OK]`, `[WARN]`, ...) so logs stay greppable.

use super::context::UiContext;
use crate::lifecycle::ActivationReport;
use console::{style, StyledObject};
use serde::Serialize;

/// Outcome attached to a step line or a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Info,
    Warn,
    Fail,
}

impl Status {
    /// Plain-text tag used when output is not a terminal
    pub fn tag(self) -> &'static str {
        match self {
            Status::Ok => "[OK]",
            Status::Info => "[INFO]",
            Status::Warn => "[WARN]",
            Status::Fail => "[FAIL]",
        }
    }

    fn paint<D>(self, value: D) -> StyledObject<D> {
        let styled = style(value);
        match self {
            Status::Ok => styled.green(),
            Status::Info => styled.blue(),
            Status::Warn => styled.yellow(),
            Status::Fail => styled.red(),
        }
    }
}

/// Opening line of a command
pub fn banner(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).blue().bold()).ok();
    } else {
        println!("{}", style(title).bold());
        println!();
    }
}

/// Closing line of a command that changed state
pub fn done(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(Status::Ok.paint(message).bold()).ok();
    } else {
        println!();
        println!("{} {}", Status::Ok.paint(Status::Ok.tag()), message);
    }
}

pub fn heading(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        cliclack::log::info(style(title).bold()).ok();
    } else {
        println!("{}", style(title).bold());
    }
}

pub fn step(ctx: &UiContext, status: Status, message: &str) {
    if !ctx.use_fancy_output() {
        println!("  {} {}", status.paint(status.tag()), message);
        return;
    }
    let shown = match status {
        Status::Ok => cliclack::log::success(message),
        Status::Info => cliclack::log::info(message),
        Status::Warn => cliclack::log::warning(message),
        Status::Fail => cliclack::log::error(message),
    };
    shown.ok();
}

/// Step line with a dimmed detail, e.g. a store name
pub fn step_with(ctx: &UiContext, status: Status, message: &str, detail: &str) {
    step(ctx, status, &format!("{} ({})", message, style(detail).dim()));
}

/// Warning followed by what to do about it
pub fn warn_with_hint(ctx: &UiContext, message: &str, next: &str) {
    step(ctx, Status::Warn, message);
    hint(ctx, next);
}

pub fn hint(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

/// `key: value`, colored (or tagged) by `status` when one is given
pub fn field(ctx: &UiContext, key: &str, value: &str, status: Option<Status>) {
    match status {
        None => println!("  {}: {}", style(key).dim(), value),
        Some(status) if ctx.use_fancy_output() => {
            println!("  {}: {}", style(key).dim(), status.paint(value))
        }
        Some(status) => println!("  {} {}: {}", status.tag(), key, value),
    }
}

/// Summarize an activation run: stores collected and clients claimed
pub fn activation_summary(ctx: &UiContext, report: &ActivationReport) {
    if report.deleted.is_empty() {
        step(ctx, Status::Ok, "No stale stores");
    }
    for name in &report.deleted {
        step_with(ctx, Status::Ok, "Deleted stale store", name);
    }
    if report.claimed > 0 {
        step(
            ctx,
            Status::Info,
            &format!("Claimed {} client(s)", report.claimed),
        );
    }
}

/// One cache store as listed by `stores list`
#[derive(Debug, Clone, Serialize)]
pub struct StoreRow {
    pub name: String,
    pub entries: usize,
    /// Belongs to the active generation
    pub current: bool,
}

pub fn store_table(ctx: &UiContext, rows: &[StoreRow]) {
    banner(ctx, "Cache stores");

    println!(
        "{:<40} {:<10} {:<8}",
        style("NAME").bold(),
        style("ENTRIES").bold(),
        style("STATUS").bold()
    );
    println!("{}", "-".repeat(60));

    for row in rows {
        let status = if row.current {
            Status::Ok.paint("current")
        } else {
            Status::Warn.paint("stale")
        };
        println!("{:<40} {:<10} {:<8}", row.name, row.entries, status);
    }

    println!();
    println!("{} store(s)", rows.len());
}
