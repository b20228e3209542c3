pub mod config;
pub mod error;
pub mod types;

pub use error::{Result, SimError};
pub use types::{AgentId, Good, Position, Tick};
