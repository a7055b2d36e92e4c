//! Per-source collector state machine. Generalizes the harness's run-level
//! state machine (PENDING → ... → DONE/FAILED, transitions validated
//! against a table, illegal transitions are a loud bug not a retry) to the
//! per-source fetch/parse/upsert lifecycle.

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorState {
    Pending,
    Fetching,
    Parsing,
    Upserting,
    SourceDone,
    SourceFailed,
}

impl CollectorState {
    fn valid_transitions(self) -> &'static [CollectorState] {
        use CollectorState::*;
        match self {
            Pending => &[Fetching, SourceFailed],
            Fetching => &[Parsing, SourceFailed],
            Parsing => &[Upserting, SourceFailed],
            Upserting => &[SourceDone, SourceFailed],
            SourceDone => &[],
            SourceFailed => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CollectorState::SourceDone | CollectorState::SourceFailed)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid collector state transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: CollectorState,
    pub to: CollectorState,
}

/// Tracks one source's progress through its lifecycle. An illegal
/// transition is a programming bug: it is logged loudly and the source is
/// failed rather than silently ignored.
pub struct CollectorStateMachine {
    state: CollectorState,
    source_id: String,
}

impl CollectorStateMachine {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            state: CollectorState::Pending,
            source_id: source_id.into(),
        }
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn can_transition(&self, to: CollectorState) -> bool {
        self.state.valid_transitions().contains(&to)
    }

    pub fn transition(&mut self, to: CollectorState) -> Result<(), IllegalTransition> {
        if !self.can_transition(to) {
            warn!(source_id = %self.source_id, from = ?self.state, to = ?to, "illegal collector state transition");
            return Err(IllegalTransition { from: self.state, to });
        }
        info!(source_id = %self.source_id, from = ?self.state, to = ?to, "collector state transition");
        self.state = to;
        Ok(())
    }

    /// Force a failure transition. Unlike `transition`, this never errors:
    /// SourceFailed is reachable from every non-terminal state.
    pub fn fail(&mut self, reason: &str) {
        if self.state.is_terminal() {
            warn!(source_id = %self.source_id, state = ?self.state, reason, "source already terminal, ignoring fail()");
            return;
        }
        warn!(source_id = %self.source_id, from = ?self.state, reason, "source failed");
        self.state = CollectorState::SourceFailed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_in_order() {
        let mut m = CollectorStateMachine::new("src-1");
        m.transition(CollectorState::Fetching).unwrap();
        m.transition(CollectorState::Parsing).unwrap();
        m.transition(CollectorState::Upserting).unwrap();
        m.transition(CollectorState::SourceDone).unwrap();
        assert_eq!(m.state(), CollectorState::SourceDone);
    }

    #[test]
    fn skipping_a_state_is_illegal() {
        let mut m = CollectorStateMachine::new("src-1");
        let err = m.transition(CollectorState::Upserting).unwrap_err();
        assert_eq!(err.from, CollectorState::Pending);
    }

    #[test]
    fn fail_is_idempotent_once_terminal() {
        let mut m = CollectorStateMachine::new("src-1");
        m.fail("boom");
        assert_eq!(m.state(), CollectorState::SourceFailed);
        m.fail("boom again");
        assert_eq!(m.state(), CollectorState::SourceFailed);
    }
}
