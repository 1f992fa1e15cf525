//! Outcome generators: cumulative threshold tables over draws.
//!
//! One mechanism serves every game variant: a table of bands, each with
//! an exclusive upper bound, evaluated in order. The first band whose
//! bound is strictly greater than the draw wins (`draw < below`).
//!
//! Band order is part of the recorded-game contract. Never reorder.

use crate::{
    draw::draw,
    error::{SimError, SimResult},
    types::{Round, Seed},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band<T> {
    pub below:   f64,
    pub outcome: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable<T> {
    bands: Vec<Band<T>>,
}

impl<T> ThresholdTable<T> {
    pub fn new(bands: Vec<Band<T>>) -> Self {
        Self { bands }
    }

    /// Build from `(below, outcome)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, T)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(below, outcome)| Band { below, outcome })
                .collect(),
        )
    }

    pub fn bands(&self) -> &[Band<T>] {
        &self.bands
    }

    /// Select the outcome for a draw. A draw no band admits (only 1.0 on
    /// a valid table) falls through to the last band.
    pub fn pick(&self, value: f64) -> &T {
        let last = self.bands.len().saturating_sub(1);
        let index = self
            .bands
            .iter()
            .position(|band| value < band.below)
            .unwrap_or(last);
        &self.bands[index].outcome
    }

    /// Draw for (seed, round, salt) and select.
    pub fn roll(&self, seed: &Seed, round: Round, salt: &str) -> &T {
        self.pick(draw(seed, round, salt))
    }

    /// Non-empty, strictly increasing, closed at 1.0.
    pub fn validate(&self, name: &str) -> SimResult<()> {
        let Some(last) = self.bands.last() else {
            return Err(SimError::InvalidConfig(format!("{name}: table is empty")));
        };
        for pair in self.bands.windows(2) {
            if pair[1].below <= pair[0].below {
                return Err(SimError::InvalidConfig(format!(
                    "{name}: thresholds must increase ({} then {})",
                    pair[0].below, pair[1].below
                )));
            }
        }
        if self.bands[0].below <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "{name}: first threshold must be above 0"
            )));
        }
        if last.below != 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "{name}: last threshold must be 1.0, got {}",
                last.below
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ThresholdTable<&'static str> {
        ThresholdTable::from_pairs([(0.25, "low"), (0.75, "mid"), (1.0, "high")])
    }

    #[test]
    fn boundary_is_exclusive() {
        let t = table();
        assert_eq!(*t.pick(0.0), "low");
        assert_eq!(*t.pick(0.2499), "low");
        assert_eq!(*t.pick(0.25), "mid");
        assert_eq!(*t.pick(0.75), "high");
        assert_eq!(*t.pick(0.999), "high");
    }

    #[test]
    fn exact_one_falls_through_to_last_band() {
        assert_eq!(*table().pick(1.0), "high");
    }

    #[test]
    fn validation_rejects_bad_tables() {
        assert!(table().validate("ok").is_ok());
        let empty: ThresholdTable<&str> = ThresholdTable::new(vec![]);
        assert!(empty.validate("empty").is_err());
        let unordered = ThresholdTable::from_pairs([(0.5, "a"), (0.4, "b"), (1.0, "c")]);
        assert!(unordered.validate("unordered").is_err());
        let open = ThresholdTable::from_pairs([(0.5, "a"), (0.9, "b")]);
        assert!(open.validate("open").is_err());
    }
}
