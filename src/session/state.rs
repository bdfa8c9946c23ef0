//! Session lifecycle state machine.

use serde::Serialize;

/// Lifecycle state of a live session.
///
/// Every state other than `Active` is terminal: once reached, the session is
/// detached from live updates and further input is answered with a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Accepting input.
    #[default]
    Active,
    /// Closed explicitly by its owner.
    Closed,
    /// The game reached a win, draw or loss.
    Finished,
    /// No input arrived within the idle timeout.
    TimedOut,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Active -> Closed
    /// - Active -> Finished
    /// - Active -> TimedOut
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Active, Closed) | (Active, Finished) | (Active, TimedOut)
        )
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: SessionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::CogbotError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Active)
    }
}
