//! Version lifecycle: install, activate, control messages
//!
//! A new build goes through `install` (pre-populate the asset store from
//! the static manifest) and `activate` (claim clients, delete every store
//! of older generations). Only an activated version routes requests.
//!
//! # Worker States
//!
//! | State | Entered when | Next |
//! |-------|--------------|------|
//! | Parsed | manager created | Installing |
//! | Installing | install started | Installed, Redundant |
//! | Installed | manifest stored | Activating |
//! | Activating | activation started | Activated |
//! | Activated | stale stores collected | Activating (re-run) |
//! | Redundant | install failed | - |

pub mod clients;
pub mod manager;
pub mod manifest;
pub mod message;
pub mod registration;
pub mod state;

pub use clients::{Client, Clients};
pub use manager::{ActivationReport, InstallReport, LifecycleManager, Transition};
pub use manifest::StaticAssetManifest;
pub use message::ControlMessage;
pub use registration::Registration;
pub use state::WorkerState;
