//! Bundle - an ordered good -> count inventory

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::Good;

/// Goods held by an agent, keyed by kind
///
/// Backed by a `BTreeMap` so iteration is always in `Good` order.
/// Zero counts are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bundle {
    goods: BTreeMap<Good, u32>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bundle from `(good, count)` pairs, summing duplicates
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Good, u32)>) -> Self {
        let mut bundle = Self::new();
        for (good, count) in pairs {
            bundle.add(good, count);
        }
        bundle
    }

    /// Get current amount of a good
    pub fn get(&self, good: Good) -> u32 {
        self.goods.get(&good).copied().unwrap_or(0)
    }

    pub fn add(&mut self, good: Good, amount: u32) {
        if amount == 0 {
            return;
        }
        *self.goods.entry(good).or_insert(0) += amount;
    }

    /// Remove exactly `amount`, or nothing if fewer are held.
    ///
    /// Returns false on overdraw; callers turn that into an error.
    pub fn remove(&mut self, good: Good, amount: u32) -> bool {
        let held = self.get(good);
        if held < amount {
            return false;
        }
        if held == amount {
            self.goods.remove(&good);
        } else {
            self.goods.insert(good, held - amount);
        }
        true
    }

    /// Total units across all goods
    pub fn total(&self) -> u32 {
        self.goods.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.goods.is_empty()
    }

    /// Move everything out of this bundle
    pub fn take_all(&mut self) -> Bundle {
        std::mem::take(self)
    }

    /// Add every good of `other` into this bundle
    pub fn merge(&mut self, other: &Bundle) {
        for (good, count) in other.iter() {
            self.add(good, count);
        }
    }

    /// Sum of two bundles without mutating either
    pub fn combined(&self, other: &Bundle) -> Bundle {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Copy with `delta` applied to one good; negative deltas saturate at zero
    pub fn with_delta(&self, good: Good, delta: i64) -> Bundle {
        let mut out = self.clone();
        let next = (i64::from(self.get(good)) + delta).max(0);
        out.goods.remove(&good);
        out.add(good, u32::try_from(next).unwrap_or(u32::MAX));
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (Good, u32)> + '_ {
        self.goods.iter().map(|(g, c)| (*g, *c))
    }
}

impl FromIterator<(Good, u32)> for Bundle {
    fn from_iter<T: IntoIterator<Item = (Good, u32)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}
