//! Goods, preferences and barter

pub mod bundle;
pub mod trade;
pub mod utility;

pub use bundle::Bundle;
pub use trade::{find_best_trade, is_pareto_improvement, BilateralTrade, TradeParty, MIN_TRADE_GAIN};
pub use utility::{UtilityFunction, UtilitySpec, UTILITY_EPSILON};
