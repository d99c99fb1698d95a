//! Controller lifecycle state machine
//!
//! | From | Transition | To |
//! |------|------------|----|
//! | Installing | install succeeded | Waiting |
//! | Installing | install failed | InstallFailed |
//! | Waiting | activate, no previous version holds pages | Active |
//! | Waiting | activate with skip-waiting | Active |
//! | Waiting | skip waiting | Active |
//! | Active | newer version activated | Redundant |
//!
//! InstallFailed and Redundant are terminal. Only Active routes requests.

use crate::error::{ShelterError, ShelterResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one controller version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Installing,
    Waiting,
    Active,
    InstallFailed,
    Redundant,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InstallFailed | Self::Redundant)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::InstallFailed => "install failed",
            Self::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Lifecycle of one controller version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub version: String,
    pub state: LifecycleState,
    pub updated_at: DateTime<Utc>,
}

impl Lifecycle {
    /// A version that has just started installing
    pub fn new(version: impl Into<String>) -> Self {
        Self::restore(version, LifecycleState::Installing)
    }

    /// Resume a version at a known state
    pub fn restore(version: impl Into<String>, state: LifecycleState) -> Self {
        Self {
            version: version.into(),
            state,
            updated_at: Utc::now(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn routes_requests(&self) -> bool {
        self.state == LifecycleState::Active
    }

    pub fn install_succeeded(&mut self) -> ShelterResult<()> {
        self.transition("finish installing", LifecycleState::Installing, LifecycleState::Waiting)
    }

    pub fn install_failed(&mut self) -> ShelterResult<()> {
        self.transition("fail installing", LifecycleState::Installing, LifecycleState::InstallFailed)
    }

    /// Try to activate a waiting version, returning whether it became active
    pub fn activate(
        &mut self,
        previous_holds_clients: bool,
        skip_waiting: bool,
    ) -> ShelterResult<bool> {
        self.require("activate", LifecycleState::Waiting)?;

        if previous_holds_clients && !skip_waiting {
            return Ok(false);
        }

        self.set(LifecycleState::Active);
        Ok(true)
    }

    /// Activate a waiting version regardless of older controlled pages
    pub fn skip_waiting(&mut self) -> ShelterResult<()> {
        self.transition("skip waiting", LifecycleState::Waiting, LifecycleState::Active)
    }

    /// Retire an active version after a newer one took over
    pub fn supersede(&mut self) -> ShelterResult<()> {
        self.transition("be superseded", LifecycleState::Active, LifecycleState::Redundant)
    }

    /// Guard used by request handling
    pub fn ensure_active(&self) -> ShelterResult<()> {
        if self.routes_requests() {
            Ok(())
        } else {
            Err(ShelterError::ControllerNotActive {
                version: self.version.clone(),
                state: self.state.to_string(),
            })
        }
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: LifecycleState,
        to: LifecycleState,
    ) -> ShelterResult<()> {
        self.require(action, from)?;
        self.set(to);
        Ok(())
    }

    pub(crate) fn require(&self, action: &'static str, from: LifecycleState) -> ShelterResult<()> {
        if self.state == from {
            Ok(())
        } else {
            Err(ShelterError::InvalidTransition {
                version: self.version.clone(),
                action,
                state: self.state.to_string(),
            })
        }
    }

    fn set(&mut self, state: LifecycleState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}
