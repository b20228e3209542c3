//! Agent state: position, mode, inventories and trading partner

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{AgentId, Good, Position};
use crate::economy::bundle::Bundle;
use crate::economy::trade::TradeParty;
use crate::economy::utility::UtilityFunction;

/// What an agent is currently doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentMode {
    Forage,
    ReturnHome,
    #[default]
    Idle,
    MoveToPartner,
}

/// A single simulated agent
///
/// The partner link is a plain id; symmetry and exclusivity are maintained
/// by the step executor, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    id: AgentId,
    pub position: Position,
    home: Position,
    pub mode: AgentMode,
    pub target: Option<Position>,
    pub carrying: Bundle,
    pub home_inventory: Bundle,
    utility: UtilityFunction,
    pub partner: Option<AgentId>,
}

impl Agent {
    /// New agent standing on its home cell
    pub fn new(id: AgentId, home: Position, utility: UtilityFunction) -> Self {
        Self {
            id,
            position: home,
            home,
            mode: AgentMode::Idle,
            target: None,
            carrying: Bundle::new(),
            home_inventory: Bundle::new(),
            utility,
            partner: None,
        }
    }

    pub fn with_inventories(mut self, carrying: Bundle, home: Bundle) -> Self {
        self.carrying = carrying;
        self.home_inventory = home;
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn home(&self) -> Position {
        self.home
    }

    pub fn utility_function(&self) -> &UtilityFunction {
        &self.utility
    }

    pub fn is_at_home(&self) -> bool {
        self.position == self.home
    }

    pub fn carried(&self) -> u32 {
        self.carrying.total()
    }

    /// Carrying plus home storage, the bundle every utility is evaluated on
    pub fn total_bundle(&self) -> Bundle {
        self.carrying.combined(&self.home_inventory)
    }

    /// Utility of the total bundle
    pub fn total_utility(&self) -> f64 {
        self.utility.utility(&self.total_bundle())
    }

    pub fn total_goods(&self) -> u32 {
        self.carrying.total() + self.home_inventory.total()
    }

    pub fn as_trade_party(&self) -> TradeParty<'_> {
        TradeParty {
            id: self.id,
            utility: &self.utility,
            carrying: &self.carrying,
            home: &self.home_inventory,
        }
    }

    /// Move `amount` of `good` from carrying into home storage
    pub fn deposit(&mut self, good: Good, amount: u32) -> Result<()> {
        if !self.is_at_home() {
            return Err(SimError::NotAtHome(self.id));
        }
        if !self.carrying.remove(good, amount) {
            return Err(SimError::InsufficientGoods {
                agent: self.id,
                good,
                requested: amount,
                available: self.carrying.get(good),
            });
        }
        self.home_inventory.add(good, amount);
        Ok(())
    }

    /// Move `amount` of `good` from home storage into carrying
    ///
    /// Withdrawals are not capped by carrying capacity here; the caller
    /// decides how much to take.
    pub fn withdraw(&mut self, good: Good, amount: u32) -> Result<()> {
        if !self.is_at_home() {
            return Err(SimError::NotAtHome(self.id));
        }
        if !self.home_inventory.remove(good, amount) {
            return Err(SimError::InsufficientGoods {
                agent: self.id,
                good,
                requested: amount,
                available: self.home_inventory.get(good),
            });
        }
        self.carrying.add(good, amount);
        Ok(())
    }

    /// Deposit everything carried; returns what was moved
    pub fn deposit_all(&mut self) -> Result<Bundle> {
        if !self.is_at_home() {
            return Err(SimError::NotAtHome(self.id));
        }
        let moved = self.carrying.take_all();
        self.home_inventory.merge(&moved);
        Ok(moved)
    }

    /// Withdraw home goods up to `room` units, in good order
    pub fn withdraw_up_to(&mut self, room: u32) -> Result<Bundle> {
        if !self.is_at_home() {
            return Err(SimError::NotAtHome(self.id));
        }
        let mut remaining = room;
        let mut moved = Bundle::new();
        let held: Vec<(Good, u32)> = self.home_inventory.iter().collect();
        for (good, count) in held {
            if remaining == 0 {
                break;
            }
            let take = count.min(remaining);
            self.withdraw(good, take)?;
            moved.add(good, take);
            remaining -= take;
        }
        Ok(moved)
    }
}
