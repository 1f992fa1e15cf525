//! Resource bookkeeping shared by every game variant.
//!
//! Stocks are whole units held as i64 so a purchase or consumption can
//! drive a value negative mid-step. Only `settle` brings a value back to
//! the non-negative integer domain, and it runs once at the end of a step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed resource map. Keys are a variant's resource enum.
pub type Stock<K> = BTreeMap<K, i64>;

pub fn amount<K: Ord>(stock: &Stock<K>, key: &K) -> i64 {
    stock.get(key).copied().unwrap_or(0)
}

pub fn adjust<K: Ord + Copy>(stock: &mut Stock<K>, key: K, delta: i64) {
    *stock.entry(key).or_insert(0) += delta;
}

/// How many units a recipe can make from the current stock: for every
/// resource with a positive requirement, floor(stock / requirement), then
/// the minimum. `None` when nothing is required.
pub fn capacity<K: Ord>(stock: &Stock<K>, requirements: &Stock<K>) -> Option<i64> {
    requirements
        .iter()
        .filter(|(_, per_unit)| **per_unit > 0)
        .map(|(key, per_unit)| amount(stock, key).max(0) / per_unit)
        .min()
}

/// Remove `units * requirement` of every required resource.
pub fn consume<K: Ord + Copy>(stock: &mut Stock<K>, requirements: &Stock<K>, units: i64) {
    for (key, per_unit) in requirements {
        adjust(stock, *key, -(units * per_unit));
    }
}

/// Round half up. Inputs are already clamped to >= 0 by callers.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Clamp to >= 0, then round to the nearest whole unit.
pub fn settle(value: f64) -> i64 {
    round_half_up(value.max(0.0))
}

/// Multiplicative decay rate for one resource: `base + spread * draw`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decay {
    pub base:   f64,
    pub spread: f64,
}

impl Decay {
    pub fn rate(&self, draw: f64) -> f64 {
        (self.base + self.spread * draw).clamp(0.0, 1.0)
    }
}

// ── Delta rules ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cmp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Cmp {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
        }
    }
}

/// One threshold rule: when `metric cmp threshold` holds, add `delta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRule<M> {
    pub metric:    M,
    pub cmp:       Cmp,
    pub threshold: f64,
    pub delta:     i32,
}

/// Evaluate every rule independently and sum the deltas that fire.
pub fn sum_deltas<M: Copy>(rules: &[DeltaRule<M>], value_of: impl Fn(M) -> f64) -> i32 {
    rules
        .iter()
        .filter(|rule| rule.cmp.holds(value_of(rule.metric), rule.threshold))
        .map(|rule| rule.delta)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum R {
        A,
        B,
        C,
    }

    #[test]
    fn capacity_is_min_of_floor_divisions() {
        let stock: Stock<R> = [(R::A, 10), (R::B, 7), (R::C, 100)].into();
        let req: Stock<R> = [(R::A, 3), (R::B, 2), (R::C, 0)].into();
        assert_eq!(capacity(&stock, &req), Some(3));
    }

    #[test]
    fn negative_or_missing_stock_has_no_capacity() {
        let stock: Stock<R> = [(R::A, -4)].into();
        let req: Stock<R> = [(R::A, 1), (R::B, 1)].into();
        assert_eq!(capacity(&stock, &req), Some(0));
        assert_eq!(capacity(&stock, &Stock::new()), None);
    }

    #[test]
    fn settle_clamps_then_rounds() {
        assert_eq!(settle(-3.7), 0);
        assert_eq!(settle(2.5), 3);
        assert_eq!(settle(2.49), 2);
    }

    #[test]
    fn rules_sum_independently() {
        #[derive(Clone, Copy)]
        enum M {
            X,
        }
        let rules = vec![
            DeltaRule { metric: M::X, cmp: Cmp::Ge, threshold: 1.0, delta: -10 },
            DeltaRule { metric: M::X, cmp: Cmp::Ge, threshold: 2.0, delta: -10 },
            DeltaRule { metric: M::X, cmp: Cmp::Lt, threshold: 1.0, delta: 4 },
        ];
        assert_eq!(sum_deltas(&rules, |_| 0.0), 4);
        assert_eq!(sum_deltas(&rules, |_| 1.0), -10);
        assert_eq!(sum_deltas(&rules, |_| 2.0), -20);
    }
}
