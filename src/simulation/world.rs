//! Simulation coordinator
//!
//! Owns the authoritative resource grid, the configuration, the seeded RNG
//! and the per-tick feature flags; delegates every tick to the
//! [`StepExecutor`]. External code builds one with [`build`] and reads
//! state back through the accessors here.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::core::config::{FeatureFlags, SimConfig};
use crate::core::error::{Result, SimError};
use crate::core::types::{AgentId, Position, Tick};
use crate::economy::bundle::Bundle;
use crate::economy::utility::UtilityFunction;
use crate::entity::agent::Agent;
use crate::simulation::events::SimulationEvent;
use crate::simulation::executor::StepExecutor;
use crate::spatial::resource_grid::{PlacedResource, ResourceGrid};

/// Serializable read-back of the full world state
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub features: FeatureFlags,
    /// Ascending id
    pub agents: Vec<Agent>,
    /// Sorted by (x, y)
    pub resources: Vec<PlacedResource>,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    grid: ResourceGrid,
    executor: StepExecutor,
    features: FeatureFlags,
    tick: Tick,
    rng: ChaCha8Rng,
}

/// Build a simulation from a validated configuration
///
/// With `agent_positions` omitted, starting cells are drawn from the seed,
/// unique while the grid has room. Each agent's home is its starting cell.
pub fn build(config: SimConfig, agent_positions: Option<&[Position]>) -> Result<Simulation> {
    config.validate()?;

    let rng = ChaCha8Rng::seed_from_u64(config.seed);

    let grid = ResourceGrid::with_resources(
        config.grid_width,
        config.grid_height,
        config
            .initial_resources
            .iter()
            .map(|spec| (spec.x, spec.y, spec.good())),
    )?;

    let positions = match agent_positions {
        Some(positions) => {
            if positions.len() != config.agent_count {
                return Err(SimError::AgentPositionCount {
                    expected: config.agent_count,
                    got: positions.len(),
                });
            }
            for pos in positions {
                if !grid.contains(pos.x, pos.y) {
                    return Err(SimError::OutOfBounds {
                        x: pos.x,
                        y: pos.y,
                        width: config.grid_width,
                        height: config.grid_height,
                    });
                }
            }
            positions.to_vec()
        }
        // Placement draws from a clone so the runtime stream stays untouched
        None => generate_positions(&config, &mut rng.clone()),
    };

    let agents = positions
        .into_iter()
        .enumerate()
        .map(|(i, pos)| spawn_agent(&config, i, pos))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        width = config.grid_width,
        height = config.grid_height,
        agents = agents.len(),
        resources = grid.resource_count(),
        seed = config.seed,
        "simulation built"
    );

    let executor = StepExecutor::new(agents, &config);
    Ok(Simulation {
        features: config.features,
        config,
        grid,
        executor,
        tick: 0,
        rng,
    })
}

/// Unique cells while they last, then uniform draws that may repeat
fn generate_positions(config: &SimConfig, rng: &mut ChaCha8Rng) -> Vec<Position> {
    let mut cells: Vec<Position> = (0..config.grid_width)
        .flat_map(|x| (0..config.grid_height).map(move |y| Position::new(x, y)))
        .collect();
    cells.shuffle(rng);

    let count = config.agent_count;
    if count > cells.len() {
        tracing::warn!(
            agents = count,
            cells = cells.len(),
            "grid too small for unique agent positions, allowing duplicates"
        );
        let extra = count - cells.len();
        for _ in 0..extra {
            let x = rng.gen_range(0..config.grid_width);
            let y = rng.gen_range(0..config.grid_height);
            cells.push(Position::new(x, y));
        }
    }
    cells.truncate(count);
    cells
}

fn spawn_agent(config: &SimConfig, index: usize, position: Position) -> Result<Agent> {
    let id = AgentId(index as u32);
    if config.agent_profiles.is_empty() {
        return Ok(Agent::new(id, position, UtilityFunction::default()));
    }
    let profile = &config.agent_profiles[index % config.agent_profiles.len()];
    let utility = UtilityFunction::try_from(&profile.utility)?;
    Ok(Agent::new(id, position, utility)
        .with_inventories(profile.carrying.clone(), profile.home.clone()))
}

impl Simulation {
    /// Advance exactly one tick using the internal seeded RNG
    pub fn step(&mut self) -> Result<Vec<SimulationEvent>> {
        let events = self
            .executor
            .step(&mut self.grid, self.features, self.tick, &mut self.rng)?;
        self.tick += 1;
        Ok(events)
    }

    /// Same as [`Simulation::step`]. The caller's stream is accepted for
    /// call-site compatibility and never drawn from.
    pub fn step_with_rng<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> Result<Vec<SimulationEvent>> {
        self.step()
    }

    /// Run `ticks` steps, collecting every event
    pub fn run(&mut self, ticks: u64) -> Result<Vec<SimulationEvent>> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(self.step()?);
        }
        Ok(events)
    }

    /// Agents in ascending id order
    pub fn agents(&self) -> &[Agent] {
        self.executor.agents()
    }

    pub fn agent(&self, id: AgentId) -> Result<&Agent> {
        self.agents()
            .binary_search_by_key(&id, |a| a.id())
            .map(|i| &self.agents()[i])
            .map_err(|_| SimError::UnknownAgent(id))
    }

    pub fn grid(&self) -> &ResourceGrid {
        &self.grid
    }

    /// Completed ticks
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    /// Takes effect from the next tick
    pub fn set_features(&mut self, features: FeatureFlags) {
        tracing::debug!(tick = self.tick, ?features, "feature flags changed");
        self.features = features;
    }

    /// Sum of every agent's carried and stored goods
    pub fn total_goods(&self) -> Bundle {
        self.agents().iter().map(|a| a.total_bundle()).fold(Bundle::new(), |mut acc, b| {
            acc.merge(&b);
            acc
        })
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            features: self.features,
            agents: self.agents().to_vec(),
            resources: self.grid.iter_sorted().collect(),
        }
    }

    /// FNV-1a over the serialized snapshot; equal states hash equal
    pub fn state_digest(&self) -> Result<u64> {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;
        let bytes = serde_json::to_vec(&self.snapshot())?;
        Ok(bytes
            .iter()
            .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME)))
    }
}
