//! Events generated during a simulation tick
//!
//! Returned by `Simulation::step` so callers can log or display what
//! happened without diffing state.

use serde::Serialize;

use crate::core::types::{AgentId, Good, Position, Tick};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    ResourceCollected {
        tick: Tick,
        agent: AgentId,
        position: Position,
        kind: Good,
    },
    TradeExecuted {
        tick: Tick,
        proposer: AgentId,
        partner: AgentId,
        proposer_gives: Good,
        partner_gives: Good,
        proposer_utility_before: f64,
        proposer_utility_after: f64,
        partner_utility_before: f64,
        partner_utility_after: f64,
    },
    Paired {
        tick: Tick,
        agent: AgentId,
        partner: AgentId,
    },
    Unpaired {
        tick: Tick,
        agent: AgentId,
        partner: AgentId,
    },
    ResourcesRespawned {
        tick: Tick,
        count: usize,
    },
}

impl SimulationEvent {
    pub fn tick(&self) -> Tick {
        match self {
            Self::ResourceCollected { tick, .. }
            | Self::TradeExecuted { tick, .. }
            | Self::Paired { tick, .. }
            | Self::Unpaired { tick, .. }
            | Self::ResourcesRespawned { tick, .. } => *tick,
        }
    }
}
