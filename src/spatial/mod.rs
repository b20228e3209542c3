//! Grid storage and proximity queries

pub mod agent_index;
pub mod grid;
pub mod resource_grid;

pub use agent_index::{AgentIndex, Neighbor};
pub use grid::Grid;
pub use resource_grid::{PlacedResource, ResourceGrid};
