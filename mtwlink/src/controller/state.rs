//! Controller lifecycle states.

use std::fmt;

/// Where the controller is in its run.
///
/// ```text
/// Idle -> PortOpened -> Configured -> AwaitingTrackers -> Recording
///      -> Measuring -> Draining -> Stopped
/// ```
///
/// Any failure moves to the terminal `Failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MasterState {
    #[default]
    Idle,
    PortOpened,
    Configured,
    AwaitingTrackers,
    Recording,
    Measuring,
    Draining,
    Stopped,
    Failed,
}

impl MasterState {
    /// True for `Stopped` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for MasterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::PortOpened => "port opened",
            Self::Configured => "configured",
            Self::AwaitingTrackers => "awaiting trackers",
            Self::Recording => "recording",
            Self::Measuring => "measuring",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
