//! Tick-scoped decision outputs
//!
//! Produced in phase 1 and consumed in phase 2 of the same tick.

use crate::core::types::{AgentId, Good, Position};
use crate::economy::trade::BilateralTrade;
use crate::entity::agent::AgentMode;

/// A resource an agent has chosen to pursue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceInfo {
    pub position: Position,
    pub kind: Good,
    pub distance: i32,
    pub score: f64,
}

/// Coordinated action applied in phase 2
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialAction {
    Collect(ResourceInfo),
    Trade(BilateralTrade),
    Pair(AgentId),
}

impl SpecialAction {
    pub fn tag(&self) -> &'static str {
        match self {
            SpecialAction::Collect(_) => "collect",
            SpecialAction::Trade(_) => "trade",
            SpecialAction::Pair(_) => "pair",
        }
    }
}

/// One agent's intent for this tick
#[derive(Debug, Clone, PartialEq)]
pub struct AgentAction {
    pub agent: AgentId,
    pub mode: AgentMode,
    pub target: Option<Position>,
    pub special: Option<SpecialAction>,
    /// Dissolve the current partnership before the special is applied
    pub unpair: bool,
    /// Short human-readable explanation, used in logs
    pub reason: &'static str,
}

impl AgentAction {
    pub fn idle(agent: AgentId, reason: &'static str) -> Self {
        Self {
            agent,
            mode: AgentMode::Idle,
            target: None,
            special: None,
            unpair: false,
            reason,
        }
    }

    pub fn travel(agent: AgentId, mode: AgentMode, target: Position, reason: &'static str) -> Self {
        Self {
            agent,
            mode,
            target: Some(target),
            special: None,
            unpair: false,
            reason,
        }
    }

    pub fn with_special(mut self, special: SpecialAction) -> Self {
        self.special = Some(special);
        self
    }

    pub fn with_unpair(mut self) -> Self {
        self.unpair = true;
        self
    }

    /// Idle with nothing to coordinate: the "no opportunity" outcome
    pub fn is_plain_idle(&self) -> bool {
        self.mode == AgentMode::Idle && self.special.is_none() && !self.unpair
    }
}
