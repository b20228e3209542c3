//! Step executor - the two-phase tick
//!
//! 1. Decision collection: every agent, ascending id, decides against the
//!    same frozen copy of the world.
//! 2. Action execution: actions are applied in the same order. Mode and
//!    target always land; special actions are re-validated against the
//!    live state and silently dropped when a race made them stale.
//! 3. Movement, then (on scheduled ticks) respawn.

use rand_chacha::ChaCha8Rng;

use crate::core::config::{FeatureFlags, SimConfig};
use crate::core::error::Result;
use crate::core::types::{AgentId, Tick};
use crate::economy::trade::{evaluate_swap, is_pareto_improvement, BilateralTrade};
use crate::entity::agent::Agent;
use crate::simulation::action::{AgentAction, ResourceInfo, SpecialAction};
use crate::simulation::decision::{decide, DecisionContext, DecisionParams};
use crate::simulation::events::SimulationEvent;
use crate::simulation::movement::plan_moves;
use crate::simulation::respawn::RespawnScheduler;
use crate::spatial::agent_index::AgentIndex;
use crate::spatial::resource_grid::ResourceGrid;

#[derive(Debug, Clone)]
pub struct StepExecutor {
    agents: Vec<Agent>,
    index: AgentIndex,
    respawn: RespawnScheduler,
    respawn_interval: u64,
    params: DecisionParams,
}

impl StepExecutor {
    pub fn new(mut agents: Vec<Agent>, config: &SimConfig) -> Self {
        agents.sort_by_key(|a| a.id());
        let index = AgentIndex::from_agents(&agents);
        Self {
            agents,
            index,
            respawn: RespawnScheduler::from(&config.respawn),
            respawn_interval: config.respawn.interval,
            params: DecisionParams::from(config),
        }
    }

    /// Agents in ascending id order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn index(&self) -> &AgentIndex {
        &self.index
    }

    fn slot(&self, id: AgentId) -> Option<usize> {
        self.agents.binary_search_by_key(&id, |a| a.id()).ok()
    }

    /// Run one complete tick
    pub fn step(
        &mut self,
        grid: &mut ResourceGrid,
        features: FeatureFlags,
        tick: Tick,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<SimulationEvent>> {
        let actions = self.collect_decisions(grid, features, tick, rng)?;

        let mut events = Vec::new();
        for action in &actions {
            self.apply_action(action, grid, features, tick, &mut events)?;
        }

        let moved = self.resolve_movement();
        self.run_respawn(grid, tick, rng, &mut events);

        tracing::debug!(
            tick,
            actions = actions.len(),
            moved,
            events = events.len(),
            resources = grid.resource_count(),
            "tick complete"
        );
        Ok(events)
    }

    /// Phase 1: decisions against a frozen snapshot
    fn collect_decisions(
        &mut self,
        grid: &ResourceGrid,
        features: FeatureFlags,
        tick: Tick,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<AgentAction>> {
        let snapshot = self.agents.clone();
        let ctx = DecisionContext {
            grid,
            agents: &snapshot,
            index: &self.index,
            features,
            params: self.params,
            tick,
        };
        let mut actions = Vec::with_capacity(self.agents.len());
        for agent in self.agents.iter_mut() {
            let action = decide(agent, &ctx, rng)?;
            tracing::trace!(
                tick,
                agent = %action.agent,
                mode = ?action.mode,
                special = action.special.as_ref().map(SpecialAction::tag),
                unpair = action.unpair,
                reason = action.reason,
                "decided"
            );
            actions.push(action);
        }
        Ok(actions)
    }

    /// Phase 2: apply one action
    fn apply_action(
        &mut self,
        action: &AgentAction,
        grid: &mut ResourceGrid,
        features: FeatureFlags,
        tick: Tick,
        events: &mut Vec<SimulationEvent>,
    ) -> Result<()> {
        let Some(i) = self.slot(action.agent) else {
            return Ok(());
        };
        self.agents[i].mode = action.mode;
        self.agents[i].target = action.target;
        if action.unpair {
            self.apply_unpair(i, tick, events);
        }

        match &action.special {
            None => Ok(()),
            Some(SpecialAction::Collect(info)) => self.apply_collect(i, info, grid, tick, events),
            Some(SpecialAction::Trade(trade)) => {
                if features.trade_execution {
                    self.apply_trade(i, trade, tick, events);
                } else {
                    tracing::trace!(tick, agent = %action.agent, "trade drafted, execution disabled");
                }
                Ok(())
            }
            Some(SpecialAction::Pair(target)) => {
                self.apply_pair(i, *target, tick, events);
                Ok(())
            }
        }
    }

    fn apply_collect(
        &mut self,
        i: usize,
        info: &ResourceInfo,
        grid: &mut ResourceGrid,
        tick: Tick,
        events: &mut Vec<SimulationEvent>,
    ) -> Result<()> {
        let agent = &self.agents[i];
        let pos = info.position;
        if agent.position != pos {
            tracing::trace!(tick, agent = %agent.id(), "collect skipped: not on resource cell");
            return Ok(());
        }
        if grid.resource_at(pos.x, pos.y)? != Some(info.kind) {
            tracing::trace!(tick, agent = %agent.id(), %pos, "collect skipped: resource gone");
            return Ok(());
        }
        if agent.carried() >= self.params.carrying_capacity {
            tracing::trace!(tick, agent = %agent.id(), "collect skipped: at capacity");
            return Ok(());
        }
        if let Some(kind) = grid.take_resource_kind(pos.x, pos.y)? {
            let agent = &mut self.agents[i];
            agent.carrying.add(kind, 1);
            events.push(SimulationEvent::ResourceCollected {
                tick,
                agent: agent.id(),
                position: pos,
                kind,
            });
        }
        Ok(())
    }

    /// Only the lower-id side of a pair executes; the other side's trade
    /// action is a no-op.
    fn apply_trade(
        &mut self,
        i: usize,
        trade: &BilateralTrade,
        tick: Tick,
        events: &mut Vec<SimulationEvent>,
    ) {
        let me = self.agents[i].id();
        if trade.proposer != me || trade.executor() != me {
            return;
        }
        let Some(j) = self.slot(trade.partner) else {
            return;
        };
        let min_gain = self.params.min_trade_gain;
        let Some((a, b)) = pair_mut(&mut self.agents, i, j) else {
            return;
        };

        if a.partner != Some(b.id()) || b.partner != Some(a.id()) {
            tracing::trace!(tick, agent = %me, "trade skipped: no longer partners");
            return;
        }
        if a.position.manhattan(&b.position) != 0 {
            tracing::trace!(tick, agent = %me, "trade skipped: not co-located");
            return;
        }
        let Some((gain_a, gain_b)) = evaluate_swap(
            &a.as_trade_party(),
            &b.as_trade_party(),
            trade.proposer_gives,
            trade.partner_gives,
        ) else {
            tracing::trace!(tick, agent = %me, "trade skipped: goods missing");
            return;
        };
        if !is_pareto_improvement(gain_a, gain_b, min_gain) {
            tracing::trace!(tick, agent = %me, "trade skipped: no longer an improvement");
            return;
        }

        let before_a = a.total_utility();
        let before_b = b.total_utility();
        let took_a = a.carrying.remove(trade.proposer_gives, 1);
        let took_b = b.carrying.remove(trade.partner_gives, 1);
        debug_assert!(took_a && took_b);
        a.carrying.add(trade.partner_gives, 1);
        b.carrying.add(trade.proposer_gives, 1);

        tracing::debug!(
            tick,
            proposer = %a.id(),
            partner = %b.id(),
            gives = %trade.proposer_gives,
            receives = %trade.partner_gives,
            "trade executed"
        );
        events.push(SimulationEvent::TradeExecuted {
            tick,
            proposer: a.id(),
            partner: b.id(),
            proposer_gives: trade.proposer_gives,
            partner_gives: trade.partner_gives,
            proposer_utility_before: before_a,
            proposer_utility_after: a.total_utility(),
            partner_utility_before: before_b,
            partner_utility_after: b.total_utility(),
        });
    }

    /// Lower ids are applied first, so the first proposer to reach a free
    /// target wins it.
    fn apply_pair(&mut self, i: usize, target: AgentId, tick: Tick, events: &mut Vec<SimulationEvent>) {
        let Some(j) = self.slot(target) else {
            return;
        };
        let Some((a, b)) = pair_mut(&mut self.agents, i, j) else {
            return;
        };
        if a.partner.is_some() {
            tracing::trace!(tick, agent = %a.id(), "pair skipped: already paired");
            return;
        }
        if b.partner.is_some() {
            tracing::trace!(tick, agent = %a.id(), target = %b.id(), "pair skipped: target taken");
            return;
        }
        a.partner = Some(b.id());
        b.partner = Some(a.id());
        tracing::debug!(tick, agent = %a.id(), partner = %b.id(), "paired");
        events.push(SimulationEvent::Paired {
            tick,
            agent: a.id(),
            partner: b.id(),
        });
    }

    fn apply_unpair(&mut self, i: usize, tick: Tick, events: &mut Vec<SimulationEvent>) {
        let me = self.agents[i].id();
        let Some(partner) = self.agents[i].partner.take() else {
            return;
        };
        if let Some(j) = self.slot(partner) {
            if self.agents[j].partner == Some(me) {
                self.agents[j].partner = None;
            }
        }
        tracing::debug!(tick, agent = %me, %partner, "unpaired");
        events.push(SimulationEvent::Unpaired {
            tick,
            agent: me,
            partner,
        });
    }

    /// Move everyone one step and sync the index with the agents that moved
    fn resolve_movement(&mut self) -> usize {
        let planned = plan_moves(&self.agents);
        let mut moved = Vec::new();
        for (i, pos) in planned.into_iter().enumerate() {
            if self.agents[i].position != pos {
                self.agents[i].position = pos;
                moved.push(i);
            }
        }
        self.index.update(moved.iter().map(|&i| &self.agents[i]))
    }

    /// Respawn failures are logged and never abort the tick
    fn run_respawn(
        &self,
        grid: &mut ResourceGrid,
        tick: Tick,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimulationEvent>,
    ) {
        if self.respawn_interval == 0 || tick % self.respawn_interval != 0 {
            return;
        }
        match self.respawn.respawn(grid, rng) {
            Ok(0) => {}
            Ok(count) => events.push(SimulationEvent::ResourcesRespawned { tick, count }),
            Err(err) => tracing::warn!(tick, %err, "respawn failed, continuing tick"),
        }
    }
}

/// Two distinct mutable agents
fn pair_mut(agents: &mut [Agent], i: usize, j: usize) -> Option<(&mut Agent, &mut Agent)> {
    if i == j || i >= agents.len() || j >= agents.len() {
        return None;
    }
    if i < j {
        let (lo, hi) = agents.split_at_mut(j);
        Some((&mut lo[i], &mut hi[0]))
    } else {
        let (lo, hi) = agents.split_at_mut(i);
        Some((&mut hi[0], &mut lo[j]))
    }
}
