//! Bilateral 1-for-1 barter between two agents
//!
//! Only single-unit swaps of two different goods are considered. A swap is
//! acceptable when it is a Pareto improvement over both parties' total
//! bundles (carrying + home).

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Good};
use crate::economy::bundle::Bundle;
use crate::economy::utility::UtilityFunction;

/// Floor on the larger side's gain for a trade to count as an improvement
pub const MIN_TRADE_GAIN: f64 = 1e-9;

/// Read-only view of one side of a prospective trade
#[derive(Debug, Clone, Copy)]
pub struct TradeParty<'a> {
    pub id: AgentId,
    pub utility: &'a UtilityFunction,
    pub carrying: &'a Bundle,
    pub home: &'a Bundle,
}

impl TradeParty<'_> {
    fn total(&self) -> Bundle {
        self.carrying.combined(self.home)
    }
}

/// A proposed swap: the proposer hands over one `proposer_gives` and
/// receives one `partner_gives`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BilateralTrade {
    pub proposer: AgentId,
    pub partner: AgentId,
    pub proposer_gives: Good,
    pub partner_gives: Good,
    pub proposer_gain: f64,
    pub partner_gain: f64,
}

impl BilateralTrade {
    /// The lower-id participant, which is the only one allowed to execute
    pub fn executor(&self) -> AgentId {
        self.proposer.min(self.partner)
    }
}

/// Pareto test: nobody loses, and someone gains more than `min_gain`
pub fn is_pareto_improvement(gain_a: f64, gain_b: f64, min_gain: f64) -> bool {
    gain_a >= 0.0 && gain_b >= 0.0 && gain_a.max(gain_b) > min_gain
}

/// Utility gains for both sides of a single-unit swap, or `None` when
/// either side lacks the unit it would hand over.
pub fn evaluate_swap(
    proposer: &TradeParty<'_>,
    partner: &TradeParty<'_>,
    proposer_gives: Good,
    partner_gives: Good,
) -> Option<(f64, f64)> {
    if proposer_gives == partner_gives {
        return None;
    }
    if proposer.carrying.get(proposer_gives) == 0 || partner.carrying.get(partner_gives) == 0 {
        return None;
    }

    let proposer_before = proposer.total();
    let partner_before = partner.total();

    let proposer_after = proposer_before
        .with_delta(proposer_gives, -1)
        .with_delta(partner_gives, 1);
    let partner_after = partner_before
        .with_delta(partner_gives, -1)
        .with_delta(proposer_gives, 1);

    let proposer_gain =
        proposer.utility.utility(&proposer_after) - proposer.utility.utility(&proposer_before);
    let partner_gain =
        partner.utility.utility(&partner_after) - partner.utility.utility(&partner_before);
    Some((proposer_gain, partner_gain))
}

/// Best Pareto-improving single-unit swap from the proposer's point of view
///
/// Candidates are scanned in `Good` order and only a strictly larger
/// proposer gain replaces the incumbent, so ties resolve to the earliest
/// `(proposer_gives, partner_gives)` pair.
pub fn find_best_trade(
    proposer: &TradeParty<'_>,
    partner: &TradeParty<'_>,
    min_gain: f64,
) -> Option<BilateralTrade> {
    let mut best: Option<BilateralTrade> = None;
    for give in Good::ALL {
        for receive in Good::ALL {
            let Some((proposer_gain, partner_gain)) = evaluate_swap(proposer, partner, give, receive)
            else {
                continue;
            };
            if !is_pareto_improvement(proposer_gain, partner_gain, min_gain) {
                continue;
            }
            if best.map_or(true, |b| proposer_gain > b.proposer_gain) {
                best = Some(BilateralTrade {
                    proposer: proposer.id,
                    partner: partner.id,
                    proposer_gives: give,
                    partner_gives: receive,
                    proposer_gain,
                    partner_gain,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party<'a>(
        id: u32,
        utility: &'a UtilityFunction,
        carrying: &'a Bundle,
        home: &'a Bundle,
    ) -> TradeParty<'a> {
        TradeParty {
            id: AgentId(id),
            utility,
            carrying,
            home,
        }
    }

    #[test]
    fn test_complementary_preferences_trade() {
        let likes_a = UtilityFunction::cobb_douglas(0.8).unwrap();
        let likes_b = UtilityFunction::cobb_douglas(0.2).unwrap();
        let holds_b = Bundle::from_pairs([(Good::B, 2)]);
        let holds_a = Bundle::from_pairs([(Good::A, 2)]);
        let empty = Bundle::new();

        let p = party(0, &likes_a, &holds_b, &empty);
        let q = party(1, &likes_b, &holds_a, &empty);

        let trade = find_best_trade(&p, &q, MIN_TRADE_GAIN).expect("trade should exist");
        assert_eq!(trade.proposer_gives, Good::B);
        assert_eq!(trade.partner_gives, Good::A);
        assert!(trade.proposer_gain > 0.0);
        assert!(trade.partner_gain > 0.0);
        assert_eq!(trade.executor(), AgentId(0));
    }

    #[test]
    fn test_no_trade_when_partner_would_lose() {
        let likes_a = UtilityFunction::perfect_substitutes(2.0, 1.0).unwrap();
        let holds_b = Bundle::from_pairs([(Good::B, 2)]);
        let holds_a = Bundle::from_pairs([(Good::A, 2)]);
        let empty = Bundle::new();

        // Both value A above B at a constant rate; whoever gives A loses
        let p = party(0, &likes_a, &holds_b, &empty);
        let q = party(1, &likes_a, &holds_a, &empty);
        let (gain_p, gain_q) = evaluate_swap(&p, &q, Good::B, Good::A).unwrap();
        assert!(gain_p > 0.0);
        assert!(gain_q < 0.0);
        assert!(find_best_trade(&p, &q, MIN_TRADE_GAIN).is_none());
    }

    #[test]
    fn test_no_trade_with_nothing_to_offer() {
        let u = UtilityFunction::default();
        let empty = Bundle::new();
        let holds_a = Bundle::from_pairs([(Good::A, 3)]);
        let p = party(0, &u, &empty, &empty);
        let q = party(1, &u, &holds_a, &empty);
        assert!(find_best_trade(&p, &q, MIN_TRADE_GAIN).is_none());
    }

    #[test]
    fn test_home_goods_count_toward_utility() {
        // Proposer carries B but already has plenty of A at home, so
        // swapping B for A is a loss once home is counted.
        let u = UtilityFunction::cobb_douglas(0.5).unwrap();
        let carrying = Bundle::from_pairs([(Good::B, 1)]);
        let home = Bundle::from_pairs([(Good::A, 10)]);
        let empty = Bundle::new();
        let partner_carry = Bundle::from_pairs([(Good::A, 1)]);

        let p = party(0, &u, &carrying, &home);
        let q = party(1, &u, &partner_carry, &empty);
        let (gain, _) = evaluate_swap(&p, &q, Good::B, Good::A).unwrap();
        assert!(gain < 0.0);
    }

    #[test]
    fn test_pareto_predicate() {
        assert!(is_pareto_improvement(0.5, 0.0, 1e-9));
        assert!(is_pareto_improvement(0.0, 0.5, 1e-9));
        assert!(!is_pareto_improvement(0.5, -0.01, 1e-9));
        assert!(!is_pareto_improvement(1e-12, 1e-12, 1e-9));
    }

    #[test]
    fn test_same_good_swap_rejected() {
        let u = UtilityFunction::default();
        let a = Bundle::from_pairs([(Good::A, 1)]);
        let p = party(0, &u, &a, &a);
        let q = party(1, &u, &a, &a);
        assert!(evaluate_swap(&p, &q, Good::A, Good::A).is_none());
    }
}
