use thiserror::Error;

/// Phases of one benchmark run. Transitions happen only through the named
/// methods below, so illegal orderings are caught instead of silently run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Staging,
    Running,
    Finalizing,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid run state transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub to: RunState,
}

impl RunState {
    fn transition(self, allowed_from: &[RunState], to: RunState) -> Result<Self, InvalidTransition> {
        if allowed_from.contains(&self) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    pub fn begin_staging(self) -> Result<Self, InvalidTransition> {
        self.transition(&[RunState::Idle], RunState::Staging)
    }

    pub fn begin_running(self) -> Result<Self, InvalidTransition> {
        self.transition(&[RunState::Staging], RunState::Running)
    }

    /// Both the success path (process exit observed) and the failure branch
    /// out of staging fold into Finalizing.
    pub fn begin_finalizing(self) -> Result<Self, InvalidTransition> {
        self.transition(&[RunState::Staging, RunState::Running], RunState::Finalizing)
    }

    pub fn complete(self) -> Result<Self, InvalidTransition> {
        self.transition(&[RunState::Finalizing], RunState::Idle)
    }
}
