use thiserror::Error;

use crate::core::types::{AgentId, Good};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Expected {expected} agent positions, got {got}")]
    AgentPositionCount { expected: usize, got: usize },

    #[error("Cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: i32, y: i32, width: i32, height: i32 },

    #[error("{0} is not at its home cell")]
    NotAtHome(AgentId),

    #[error("{agent} holds {available} of {good}, cannot move {requested}")]
    InsufficientGoods {
        agent: AgentId,
        good: Good,
        requested: u32,
        available: u32,
    },

    #[error("Invalid utility parameters: {0}")]
    InvalidUtility(String),

    #[error("Unknown good kind: {0}")]
    UnknownGood(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
