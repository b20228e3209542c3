//! Movement resolution
//!
//! One cell per tick along a single axis. Partners walking toward each
//! other use a coordinated rule so they meet instead of swapping cells.

use crate::core::types::Position;
use crate::entity::agent::Agent;

/// Where `agent` ends up this tick, given its partner's pre-move state
pub fn plan_move(agent: &Agent, partner: Option<&Agent>) -> Position {
    let Some(target) = agent.target else {
        return agent.position;
    };
    match partner {
        Some(p) if target == p.position => coordinated_step(agent, p),
        _ => agent.position.step_toward(target),
    }
}

/// Step rule for two linked agents heading for each other
///
/// - same cell: stay
/// - adjacent: only the higher id steps onto the lower id's cell
/// - diagonal at distance 2: lower id moves along x, higher id along y
/// - otherwise: plain step
fn coordinated_step(agent: &Agent, partner: &Agent) -> Position {
    let here = agent.position;
    let there = partner.position;
    let dx = there.x - here.x;
    let dy = there.y - here.y;
    match here.manhattan(&there) {
        0 => here,
        1 => {
            if agent.id() > partner.id() {
                there
            } else {
                here
            }
        }
        2 if dx.abs() == 1 && dy.abs() == 1 => {
            if agent.id() < partner.id() {
                here.step_x_toward(there)
            } else {
                here.step_y_toward(there)
            }
        }
        _ => here.step_toward(there),
    }
}

/// Planned positions for every agent, computed against the pre-move state.
/// `agents` must be sorted by id.
pub fn plan_moves(agents: &[Agent]) -> Vec<Position> {
    agents
        .iter()
        .map(|agent| {
            let partner = agent.partner.and_then(|id| {
                agents
                    .binary_search_by_key(&id, |a| a.id())
                    .ok()
                    .map(|i| &agents[i])
            });
            plan_move(agent, partner)
        })
        .collect()
}
