//! Worker state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version will never activate
    Redundant,
}

impl WorkerState {
    /// Whether activation may start from this state
    pub fn can_activate(&self) -> bool {
        matches!(self, Self::Installed | Self::Activated)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        f.write_str(s)
    }
}
