//! Simulation configuration with documented constants
//!
//! Configuration is plain serde data, loadable from TOML. `validate()`
//! is run by the simulation factory before any state is built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{Good, Position};
use crate::economy::bundle::Bundle;
use crate::economy::trade::MIN_TRADE_GAIN;
use crate::economy::utility::UtilitySpec;

/// Default ceiling on goods an agent can carry at once
pub const CARRYING_CAPACITY: u32 = 5;

/// Default perception radius (Manhattan cells)
pub const DEFAULT_PERCEPTION_RADIUS: i32 = 8;

/// Default distance discount rate: scores are `du * exp(-k * distance)`
pub const DEFAULT_DISTANCE_SCALING: f64 = 0.1;

/// Bounds for the presentation viewport size (pixels)
pub const VIEWPORT_MIN: u32 = 200;
pub const VIEWPORT_MAX: u32 = 2000;

/// Per-tick feature toggles
///
/// Owned by the coordinator and passed explicitly into the decision engine;
/// callers may change them between ticks to script phased scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Agents may look for and collect resources
    pub forage: bool,
    /// Agents may look for partners and draft trade proposals
    pub trade_draft: bool,
    /// Drafted trades are actually executed in phase 2
    pub trade_execution: bool,
}

impl FeatureFlags {
    pub const fn forage_only() -> Self {
        Self {
            forage: true,
            trade_draft: false,
            trade_execution: false,
        }
    }

    pub const fn trade_only() -> Self {
        Self {
            forage: false,
            trade_draft: true,
            trade_execution: true,
        }
    }

    pub const fn all() -> Self {
        Self {
            forage: true,
            trade_draft: true,
            trade_execution: true,
        }
    }

    pub const fn disabled() -> Self {
        Self {
            forage: false,
            trade_draft: false,
            trade_execution: false,
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::forage_only()
    }
}

/// Resource replenishment parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnConfig {
    /// Run every `interval` ticks; 0 disables respawn
    pub interval: u64,
    /// Fraction of cells that should hold a resource
    pub target_density: f64,
    /// Fraction of the current deficit refilled per invocation
    pub rate: f64,
    /// Hard cap on resources spawned per invocation
    pub max_per_tick: usize,
}

impl RespawnConfig {
    pub const fn disabled() -> Self {
        Self {
            interval: 0,
            target_density: 0.0,
            rate: 1.0,
            max_per_tick: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.target_density) {
            return Err(SimError::config(
                "respawn.target_density",
                format!("must be in [0, 1], got {}", self.target_density),
            ));
        }
        if !(self.rate > 0.0 && self.rate <= 1.0) {
            return Err(SimError::config(
                "respawn.rate",
                format!("must be in (0, 1], got {}", self.rate),
            ));
        }
        Ok(())
    }
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            interval: 1,
            target_density: 0.2,
            rate: 0.5,
            max_per_tick: 8,
        }
    }
}

/// Initial resource placement; a missing kind means `Good::A`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub kind: Option<Good>,
}

impl ResourceSpec {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, kind: None }
    }

    pub fn typed(x: i32, y: i32, kind: Good) -> Self {
        Self {
            x,
            y,
            kind: Some(kind),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn good(&self) -> Good {
        self.kind.unwrap_or(Good::A)
    }
}

/// Preferences and starting inventories handed to agents round-robin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    pub utility: UtilitySpec,
    pub carrying: Bundle,
    pub home: Bundle,
}

/// Full configuration for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    pub initial_resources: Vec<ResourceSpec>,
    pub agent_count: usize,
    /// Manhattan radius for seeing resources and other agents
    pub perception_radius: i32,
    pub carrying_capacity: u32,
    /// Discount rate applied to resource scores by distance
    pub distance_scaling_factor: f64,
    /// A trade must give at least one side more than this
    pub min_trade_gain: f64,
    pub respawn: RespawnConfig,
    pub seed: u64,
    /// Presentation metadata; validated, not interpreted
    pub viewport_size: u32,
    pub agent_profiles: Vec<AgentProfile>,
    pub features: FeatureFlags,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            initial_resources: Vec::new(),
            agent_count: 0,
            perception_radius: DEFAULT_PERCEPTION_RADIUS,
            carrying_capacity: CARRYING_CAPACITY,
            distance_scaling_factor: DEFAULT_DISTANCE_SCALING,
            min_trade_gain: MIN_TRADE_GAIN,
            respawn: RespawnConfig::default(),
            seed: 42,
            viewport_size: 600,
            agent_profiles: Vec::new(),
            features: FeatureFlags::default(),
        }
    }
}

impl SimConfig {
    pub fn total_cells(&self) -> usize {
        (self.grid_width.max(0) as usize) * (self.grid_height.max(0) as usize)
    }

    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate every field against its documented range
    pub fn validate(&self) -> Result<()> {
        if self.grid_width <= 0 {
            return Err(SimError::config(
                "grid_width",
                format!("must be positive, got {}", self.grid_width),
            ));
        }
        if self.grid_height <= 0 {
            return Err(SimError::config(
                "grid_height",
                format!("must be positive, got {}", self.grid_height),
            ));
        }
        if self.perception_radius < 0 {
            return Err(SimError::config(
                "perception_radius",
                format!("must be non-negative, got {}", self.perception_radius),
            ));
        }
        if self.carrying_capacity == 0 {
            return Err(SimError::config("carrying_capacity", "must be at least 1"));
        }
        if !self.distance_scaling_factor.is_finite() || self.distance_scaling_factor < 0.0 {
            return Err(SimError::config(
                "distance_scaling_factor",
                format!("must be finite and >= 0, got {}", self.distance_scaling_factor),
            ));
        }
        if !(self.min_trade_gain.is_finite() && self.min_trade_gain > 0.0) {
            return Err(SimError::config(
                "min_trade_gain",
                format!("must be finite and > 0, got {}", self.min_trade_gain),
            ));
        }
        if !(VIEWPORT_MIN..=VIEWPORT_MAX).contains(&self.viewport_size) {
            return Err(SimError::config(
                "viewport_size",
                format!(
                    "must be in [{VIEWPORT_MIN}, {VIEWPORT_MAX}], got {}",
                    self.viewport_size
                ),
            ));
        }
        self.respawn.validate()?;

        for spec in &self.initial_resources {
            if spec.x < 0 || spec.x >= self.grid_width || spec.y < 0 || spec.y >= self.grid_height {
                return Err(SimError::config(
                    "initial_resources",
                    format!("resource at {} is outside the grid", spec.position()),
                ));
            }
        }
        for profile in &self.agent_profiles {
            crate::economy::utility::UtilityFunction::try_from(&profile.utility)?;
            if profile.carrying.total() > self.carrying_capacity {
                return Err(SimError::config(
                    "agent_profiles",
                    format!(
                        "starting carrying load {} exceeds capacity {}",
                        profile.carrying.total(),
                        self.carrying_capacity
                    ),
                ));
            }
        }
        Ok(())
    }
}
