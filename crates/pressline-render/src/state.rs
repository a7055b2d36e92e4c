//! Render lifecycle state machine: `RENDER_PENDING -> RENDERING_JSON ->
//! RENDERING_HTML -> RENDER_DONE | RENDER_FAILED`. Either rendering stage
//! can fail directly into the terminal `RENDER_FAILED` state.

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    RenderPending,
    RenderingJson,
    RenderingHtml,
    RenderDone,
    RenderFailed,
}

impl RenderState {
    fn valid_transitions(self) -> &'static [RenderState] {
        use RenderState::*;
        match self {
            RenderPending => &[RenderingJson, RenderFailed],
            RenderingJson => &[RenderingHtml, RenderFailed],
            RenderingHtml => &[RenderDone, RenderFailed],
            RenderDone => &[],
            RenderFailed => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RenderState::RenderDone | RenderState::RenderFailed)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid render state transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: RenderState,
    pub to: RenderState,
}

pub struct RenderStateMachine {
    state: RenderState,
    run_id: String,
}

impl RenderStateMachine {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            state: RenderState::RenderPending,
            run_id: run_id.into(),
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn can_transition(&self, to: RenderState) -> bool {
        self.state.valid_transitions().contains(&to)
    }

    pub fn transition(&mut self, to: RenderState) -> Result<(), IllegalTransition> {
        if !self.can_transition(to) {
            warn!(run_id = %self.run_id, from = ?self.state, to = ?to, "illegal render state transition");
            return Err(IllegalTransition { from: self.state, to });
        }
        info!(run_id = %self.run_id, from = ?self.state, to = ?to, "render state transition");
        self.state = to;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_json_then_html_then_done() {
        let mut m = RenderStateMachine::new("run-1");
        m.transition(RenderState::RenderingJson).unwrap();
        m.transition(RenderState::RenderingHtml).unwrap();
        m.transition(RenderState::RenderDone).unwrap();
        assert_eq!(m.state(), RenderState::RenderDone);
    }

    #[test]
    fn either_stage_can_fail_directly() {
        let mut m = RenderStateMachine::new("run-1");
        m.transition(RenderState::RenderingJson).unwrap();
        m.transition(RenderState::RenderFailed).unwrap();
        assert!(m.is_terminal());
    }

    #[test]
    fn cannot_skip_json_stage() {
        let mut m = RenderStateMachine::new("run-1");
        assert!(m.transition(RenderState::RenderingHtml).is_err());
    }
}
