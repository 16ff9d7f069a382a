use std::fmt;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

/// High-availability role of this management node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HaState {
    Initializing,
    Master,
    HotStandby,
    Standby,
    Failed,
    /// HA coordination switched off; the node acts as a standalone master.
    Disabled,
}

impl HaState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Master => "master",
            Self::HotStandby => "hot-standby",
            Self::Standby => "standby",
            Self::Failed => "failed",
            Self::Disabled => "disabled",
        }
    }

    /// Whether the node may serve every API request.
    pub const fn is_master_like(&self) -> bool {
        matches!(self, Self::Master | Self::Disabled)
    }
}

impl fmt::Display for HaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active/standby coordination owned by the management platform.
pub trait HighAvailabilityManager: Send + Sync {
    /// Turn HA coordination off for this node.
    fn disable(&self);

    fn state(&self) -> HaState;
}

/// Single-node HA manager: master until disabled.
#[derive(Debug)]
pub struct LocalHighAvailability {
    state: RwLock<HaState>,
}

impl LocalHighAvailability {
    pub fn new() -> Self {
        Self::with_state(HaState::Master)
    }

    pub fn with_state(state: HaState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn set_state(&self, state: HaState) {
        *self.state.write() = state;
    }
}

impl Default for LocalHighAvailability {
    fn default() -> Self {
        Self::new()
    }
}

impl HighAvailabilityManager for LocalHighAvailability {
    fn disable(&self) {
        let mut state = self.state.write();
        if *state != HaState::Disabled {
            info!(previous = %*state, "High availability disabled");
            *state = HaState::Disabled;
        }
    }

    fn state(&self) -> HaState {
        *self.state.read()
    }
}
