//! Barter Grid - forage and bilateral barter on a tick-based grid
//!
//! Agents with two-good utility functions forage resources, carry them
//! home, pair up with neighbours and swap goods one-for-one whenever both
//! sides gain. Every tick is deterministic for a fixed seed.

pub mod core;
pub mod economy;
pub mod entity;
pub mod simulation;
pub mod spatial;

pub use crate::core::config::{FeatureFlags, SimConfig};
pub use crate::core::error::{Result, SimError};
pub use crate::simulation::{build, Simulation, SimulationEvent};
