//! Decision engine - what should this agent do this tick?
//!
//! A decision reads the world as it stood at the start of the tick and
//! never touches the grid or other agents. The only writes allowed are to
//! the deciding agent's own inventories (deposit on arriving home full,
//! withdrawal before trading), and those are visible only to the agent's
//! own reasoning for the rest of the call.
//!
//! Dispatch by feature flags:
//! - forage only: collect toward capacity, return home and deposit
//! - trade only: withdraw home goods, find a partner, pair, trade
//! - both: foraging wins while hands are empty and a resource is visible;
//!   trading is the fallback
//! - neither: idle

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::core::config::{FeatureFlags, SimConfig};
use crate::core::error::Result;
use crate::core::types::{AgentId, Tick};
use crate::economy::trade::{find_best_trade, BilateralTrade};
use crate::entity::agent::{Agent, AgentMode};
use crate::simulation::action::{AgentAction, ResourceInfo, SpecialAction};
use crate::spatial::agent_index::AgentIndex;
use crate::spatial::resource_grid::ResourceGrid;

/// Tunables the decision engine reads from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionParams {
    pub perception_radius: i32,
    pub carrying_capacity: u32,
    pub distance_scaling: f64,
    pub min_trade_gain: f64,
}

impl From<&SimConfig> for DecisionParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            perception_radius: config.perception_radius,
            carrying_capacity: config.carrying_capacity,
            distance_scaling: config.distance_scaling_factor,
            min_trade_gain: config.min_trade_gain,
        }
    }
}

/// Frozen world view handed to every decision in a tick
pub struct DecisionContext<'a> {
    pub grid: &'a ResourceGrid,
    /// Agents as they were at tick start, ascending id
    pub agents: &'a [Agent],
    pub index: &'a AgentIndex,
    pub features: FeatureFlags,
    pub params: DecisionParams,
    pub tick: Tick,
}

impl DecisionContext<'_> {
    /// Snapshot of another agent by id
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents
            .binary_search_by_key(&id, |a| a.id())
            .ok()
            .map(|i| &self.agents[i])
    }
}

/// Score for a resource: marginal utility discounted by distance
pub fn distance_discount(marginal_utility: f64, distance: i32, scaling: f64) -> f64 {
    marginal_utility * (-scaling * f64::from(distance)).exp()
}

/// Produce this tick's action for `agent`
///
/// `rng` is threaded through for stochastic policies but no current
/// decision path draws from it.
pub fn decide<R: Rng + ?Sized>(
    agent: &mut Agent,
    ctx: &DecisionContext<'_>,
    _rng: &mut R,
) -> Result<AgentAction> {
    let FeatureFlags {
        forage, trade_draft, ..
    } = ctx.features;
    match (forage, trade_draft) {
        (true, false) => decide_forage(agent, ctx),
        (false, true) => decide_exchange(agent, ctx),
        (true, true) => decide_dual(agent, ctx),
        (false, false) => Ok(release_partner(
            agent,
            AgentAction::idle(agent.id(), "all behaviours disabled"),
        )),
    }
}

fn decide_forage(agent: &mut Agent, ctx: &DecisionContext<'_>) -> Result<AgentAction> {
    if let Some(action) = unload_if_full(agent, ctx)? {
        return Ok(action);
    }
    Ok(match best_resource(agent, ctx) {
        Some(resource) => forage_toward(agent, resource),
        None => release_partner(agent, AgentAction::idle(agent.id(), "no resources in view")),
    })
}

fn decide_dual(agent: &mut Agent, ctx: &DecisionContext<'_>) -> Result<AgentAction> {
    if let Some(action) = unload_if_full(agent, ctx)? {
        return Ok(action);
    }
    if agent.carrying.is_empty() {
        if let Some(resource) = best_resource(agent, ctx) {
            return Ok(forage_toward(agent, resource));
        }
    }
    let action = decide_exchange(agent, ctx)?;
    if action.is_plain_idle() && agent.carried() < ctx.params.carrying_capacity {
        if let Some(resource) = best_resource(agent, ctx) {
            return Ok(forage_toward(agent, resource));
        }
    }
    Ok(action)
}

fn decide_exchange(agent: &mut Agent, ctx: &DecisionContext<'_>) -> Result<AgentAction> {
    if agent.carrying.is_empty() {
        if agent.home_inventory.is_empty() {
            return Ok(release_partner(
                agent,
                AgentAction::idle(agent.id(), "nothing to trade"),
            ));
        }
        if !agent.is_at_home() {
            return Ok(AgentAction::travel(
                agent.id(),
                AgentMode::ReturnHome,
                agent.home(),
                "returning home to fetch trade goods",
            ));
        }
        let room = ctx
            .params
            .carrying_capacity
            .saturating_sub(agent.carried());
        agent.withdraw_up_to(room)?;
    }

    match agent.partner {
        Some(partner) => Ok(trade_with_partner(agent, partner, ctx)),
        None => Ok(seek_partner(agent, ctx)),
    }
}

/// At capacity: deposit if home (and carry on deciding), else head home
fn unload_if_full(agent: &mut Agent, ctx: &DecisionContext<'_>) -> Result<Option<AgentAction>> {
    if agent.carried() < ctx.params.carrying_capacity {
        return Ok(None);
    }
    if agent.is_at_home() {
        agent.deposit_all()?;
        return Ok(None);
    }
    Ok(Some(release_partner(
        agent,
        AgentAction::travel(
            agent.id(),
            AgentMode::ReturnHome,
            agent.home(),
            "carrying capacity reached",
        ),
    )))
}

/// Leaving the exchange path dissolves any partnership; mode, target and
/// special are kept so the agent still acts this tick.
fn release_partner(agent: &Agent, action: AgentAction) -> AgentAction {
    if agent.partner.is_some() {
        action.with_unpair()
    } else {
        action
    }
}

fn forage_toward(agent: &Agent, resource: ResourceInfo) -> AgentAction {
    let action = AgentAction::travel(
        agent.id(),
        AgentMode::Forage,
        resource.position,
        "foraging",
    );
    let action = if resource.distance == 0 {
        action.with_special(SpecialAction::Collect(resource))
    } else {
        action
    };
    release_partner(agent, action)
}

/// Perception radius capped at the largest distance the grid can hold
fn effective_radius(ctx: &DecisionContext<'_>) -> i32 {
    ctx.params
        .perception_radius
        .min(ctx.grid.width().saturating_add(ctx.grid.height()))
}

/// Highest-scoring visible resource with positive marginal utility.
/// Ties: smaller distance, then smaller x, then smaller y.
pub fn best_resource(agent: &Agent, ctx: &DecisionContext<'_>) -> Option<ResourceInfo> {
    let total = agent.total_bundle();
    let utility = agent.utility_function();
    ctx.grid
        .resources_within(agent.position, effective_radius(ctx))
        .into_iter()
        .filter_map(|placed| {
            let gain = utility.marginal_utility(&total, placed.kind, 1);
            if gain <= 0.0 {
                return None;
            }
            let distance = agent.position.manhattan(&placed.position);
            Some(ResourceInfo {
                position: placed.position,
                kind: placed.kind,
                distance,
                score: distance_discount(gain, distance, ctx.params.distance_scaling),
            })
        })
        .min_by_key(|r| {
            (
                Reverse(OrderedFloat(r.score)),
                r.distance,
                r.position.x,
                r.position.y,
            )
        })
}

fn trade_with_partner(agent: &Agent, partner_id: AgentId, ctx: &DecisionContext<'_>) -> AgentAction {
    let Some(partner) = ctx.agent(partner_id) else {
        return AgentAction::idle(agent.id(), "partner not found").with_unpair();
    };
    if agent.position.manhattan(&partner.position) > 0 {
        return AgentAction::travel(
            agent.id(),
            AgentMode::MoveToPartner,
            partner.position,
            "moving to partner",
        );
    }
    match find_best_trade(
        &agent.as_trade_party(),
        &partner.as_trade_party(),
        ctx.params.min_trade_gain,
    ) {
        Some(trade) => AgentAction::travel(
            agent.id(),
            AgentMode::MoveToPartner,
            partner.position,
            "trading with partner",
        )
        .with_special(SpecialAction::Trade(trade)),
        None => AgentAction::idle(agent.id(), "no beneficial trade with partner").with_unpair(),
    }
}

/// Pick the unpaired visible agent offering the largest gain; ties go to
/// the lowest id.
fn seek_partner(agent: &Agent, ctx: &DecisionContext<'_>) -> AgentAction {
    let radius = effective_radius(ctx);
    let here = agent.position;
    let candidates = ctx
        .index
        .agents_at(here)
        .into_iter()
        .chain(
            ctx.index
                .neighbors_within(here.x, here.y, radius)
                .into_iter()
                .map(|n| n.id),
        )
        .filter(|&id| id != agent.id());

    let mut best: Option<(&Agent, BilateralTrade)> = None;
    for id in candidates {
        let Some(other) = ctx.agent(id) else {
            continue;
        };
        if other.partner.is_some() {
            continue;
        }
        let Some(trade) = find_best_trade(
            &agent.as_trade_party(),
            &other.as_trade_party(),
            ctx.params.min_trade_gain,
        ) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((incumbent, current)) => {
                (Reverse(OrderedFloat(trade.proposer_gain)), other.id())
                    < (Reverse(OrderedFloat(current.proposer_gain)), incumbent.id())
            }
        };
        if better {
            best = Some((other, trade));
        }
    }

    match best {
        Some((other, _)) => AgentAction::travel(
            agent.id(),
            AgentMode::MoveToPartner,
            other.position,
            "requesting partner",
        )
        .with_special(SpecialAction::Pair(other.id())),
        None => AgentAction::idle(agent.id(), "no beneficial trade partner in range"),
    }
}
