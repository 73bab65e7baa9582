//! Terminal output for the swcache binary
//!
//! Uses `cliclack` for interactive terminals and falls back to plain,
//! tag-prefixed lines in CI and when output is piped.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    activation_summary, banner, done, field, heading, hint, step, step_with, store_table,
    warn_with_hint, Status, StoreRow,
};
pub use progress::{InstallProgress, TaskSpinner};
pub use prompts::confirm;
