//! Score cards, letter grades and the per-identity game history.
//!
//! RULE: the replay-derived score is the system of record. A score a
//! client reports is only ever compared against it (see `check_claim`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn letter(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    /// True when `self` is `other` or better (S is best).
    pub fn at_least(&self, other: Grade) -> bool {
        *self <= other
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(Self::S),
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "F" => Ok(Self::F),
            other => Err(format!("unknown grade '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub min:   i64,
    pub grade: Grade,
}

/// Breakpoints checked top-down; the first band whose `min` the score
/// reaches wins. Scores under every band grade F.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeTable {
    bands: Vec<GradeBand>,
}

impl GradeTable {
    pub fn new(bands: Vec<GradeBand>) -> Self {
        Self { bands }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, Grade)>) -> Self {
        Self::new(pairs.into_iter().map(|(min, grade)| GradeBand { min, grade }).collect())
    }

    pub fn grade(&self, score: i64) -> Grade {
        self.bands
            .iter()
            .find(|band| score >= band.min)
            .map(|band| band.grade)
            .unwrap_or(Grade::F)
    }

    pub fn is_descending(&self) -> bool {
        self.bands.windows(2).all(|w| w[0].min > w[1].min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: i64,
    pub grade: Grade,
}

/// One completed, verified game as kept by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub score:     i64,
    pub grade:     Grade,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_card(card: &ScoreCard, timestamp: DateTime<Utc>) -> Self {
        Self {
            score: card.score,
            grade: card.grade,
            timestamp,
        }
    }
}

// ── Client claims ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimCheck {
    Match { score: i64 },
    Mismatch { claimed: i64, authoritative: i64 },
}

impl ClaimCheck {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }

    /// The score to persist. Always the replay's.
    pub fn authoritative(&self) -> i64 {
        match self {
            Self::Match { score } => *score,
            Self::Mismatch { authoritative, .. } => *authoritative,
        }
    }
}

/// Compare a client-reported score to the replay-derived card.
/// A mismatch is flagged for triage, never a rejection.
pub fn check_claim(card: &ScoreCard, claimed: i64, tolerance: i64) -> ClaimCheck {
    if claimed.abs_diff(card.score) <= tolerance.unsigned_abs() {
        ClaimCheck::Match { score: card.score }
    } else {
        log::warn!(
            "score mismatch: client claimed {claimed}, replay derived {} (tolerance {tolerance})",
            card.score
        );
        ClaimCheck::Mismatch {
            claimed,
            authoritative: card.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_breakpoints_are_inclusive_minimums() {
        let table = GradeTable::from_pairs([(900, Grade::A), (500, Grade::B), (100, Grade::D)]);
        assert!(table.is_descending());
        assert_eq!(table.grade(900), Grade::A);
        assert_eq!(table.grade(899), Grade::B);
        assert_eq!(table.grade(100), Grade::D);
        assert_eq!(table.grade(99), Grade::F);
        assert_eq!(table.grade(-40), Grade::F);
    }

    #[test]
    fn grade_ordering() {
        assert!(Grade::S.at_least(Grade::B));
        assert!(Grade::B.at_least(Grade::B));
        assert!(!Grade::C.at_least(Grade::B));
    }

    #[test]
    fn claim_within_tolerance_matches() {
        let card = ScoreCard { score: 640, grade: Grade::B };
        assert_eq!(check_claim(&card, 641, 1), ClaimCheck::Match { score: 640 });
        let check = check_claim(&card, 900, 1);
        assert!(check.is_mismatch());
        assert_eq!(check.authoritative(), 640);
    }

    #[test]
    fn extreme_claims_are_mismatches() {
        let card = ScoreCard { score: 640, grade: Grade::B };
        for claimed in [i64::MIN, i64::MIN + 640, i64::MAX] {
            let check = check_claim(&card, claimed, 0);
            assert_eq!(check, ClaimCheck::Mismatch { claimed, authoritative: 640 });
        }
        let negative = ScoreCard { score: -50, grade: Grade::F };
        assert!(check_claim(&negative, i64::MAX, 10).is_mismatch());
        assert!(!check_claim(&negative, -45, 10).is_mismatch());
    }
}
