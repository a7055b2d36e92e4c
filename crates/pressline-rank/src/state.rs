//! Ranker stage state machine: `STORIES_FINAL -> SCORED -> QUOTA_FILTERED
//! -> ORDERED_OUTPUTS`, each transition one-way, mirroring the collector's
//! per-source state machine but for the single ranking pass over the
//! whole run's linked stories.

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankerState {
    StoriesFinal,
    Scored,
    QuotaFiltered,
    OrderedOutputs,
}

impl RankerState {
    fn valid_transitions(self) -> &'static [RankerState] {
        use RankerState::*;
        match self {
            StoriesFinal => &[Scored],
            Scored => &[QuotaFiltered],
            QuotaFiltered => &[OrderedOutputs],
            OrderedOutputs => &[],
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid ranker state transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: RankerState,
    pub to: RankerState,
}

pub struct RankerStateMachine {
    state: RankerState,
    run_id: String,
}

impl RankerStateMachine {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            state: RankerState::StoriesFinal,
            run_id: run_id.into(),
        }
    }

    pub fn state(&self) -> RankerState {
        self.state
    }

    pub fn transition(&mut self, to: RankerState) -> Result<(), IllegalTransition> {
        if !self.state.valid_transitions().contains(&to) {
            warn!(run_id = %self.run_id, from = ?self.state, to = ?to, "illegal ranker state transition");
            return Err(IllegalTransition { from: self.state, to });
        }
        info!(run_id = %self.run_id, from = ?self.state, to = ?to, "ranker state transition");
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_through_states_in_order() {
        let mut m = RankerStateMachine::new("run-1");
        m.transition(RankerState::Scored).unwrap();
        m.transition(RankerState::QuotaFiltered).unwrap();
        m.transition(RankerState::OrderedOutputs).unwrap();
        assert_eq!(m.state(), RankerState::OrderedOutputs);
    }

    #[test]
    fn cannot_skip_states() {
        let mut m = RankerStateMachine::new("run-1");
        assert!(m.transition(RankerState::QuotaFiltered).is_err());
    }

    #[test]
    fn terminal_state_has_no_outgoing_transitions() {
        let mut m = RankerStateMachine::new("run-1");
        m.transition(RankerState::Scored).unwrap();
        m.transition(RankerState::QuotaFiltered).unwrap();
        m.transition(RankerState::OrderedOutputs).unwrap();
        assert!(m.transition(RankerState::StoriesFinal).is_err());
    }
}
