//! Tick-based simulation: decisions, execution, movement and respawn

pub mod action;
pub mod decision;
pub mod events;
pub mod executor;
pub mod movement;
pub mod respawn;
pub mod world;

pub use action::{AgentAction, ResourceInfo, SpecialAction};
pub use decision::{decide, DecisionContext, DecisionParams};
pub use events::SimulationEvent;
pub use executor::StepExecutor;
pub use respawn::RespawnScheduler;
pub use world::{build, Simulation, WorldSnapshot};
