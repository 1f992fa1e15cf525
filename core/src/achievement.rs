//! Achievement evaluation.
//!
//! RULE: an achievement is a static catalog entry with one side-effect-free
//! predicate. The evaluator never mutates shared state; it maps
//! (report, history, already unlocked) to the set of new unlocks.
//!
//! Two passes, each in catalog order:
//!   1. game rules:    need a valid replay report (plus the history
//!                     that already includes this game)
//!   2. history rules: read the score history alone; re-runnable at any
//!                     time without a replay (`evaluate_history`)

use crate::{replay::ReplayReport, scoring::HistoryEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type GamePredicate<S, RR> = fn(&ReplayReport<S, RR>, &[HistoryEntry]) -> bool;
pub type HistoryPredicate = fn(&[HistoryEntry]) -> bool;

pub enum Rule<S, RR> {
    Game(GamePredicate<S, RR>),
    History(HistoryPredicate),
}

pub struct AchievementDef<S, RR> {
    pub id:     &'static str,
    pub name:   &'static str,
    pub points: u32,
    /// Hidden from players until unlocked.
    pub secret: bool,
    pub rule:   Rule<S, RR>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unlock {
    pub id:     String,
    pub name:   String,
    pub points: u32,
    pub secret: bool,
}

impl<S, RR> From<&AchievementDef<S, RR>> for Unlock {
    fn from(def: &AchievementDef<S, RR>) -> Self {
        Self {
            id:     def.id.to_string(),
            name:   def.name.to_string(),
            points: def.points,
            secret: def.secret,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub all_unlocked:   BTreeSet<String>,
    pub newly_unlocked: Vec<Unlock>,
}

impl Evaluation {
    pub fn points_earned(&self) -> u32 {
        self.newly_unlocked.iter().map(|u| u.points).sum()
    }

    fn starting_from(previously_unlocked: &BTreeSet<String>) -> Self {
        Self {
            all_unlocked:   previously_unlocked.clone(),
            newly_unlocked: Vec::new(),
        }
    }

    fn unlock<S, RR>(&mut self, def: &AchievementDef<S, RR>) {
        if self.all_unlocked.insert(def.id.to_string()) {
            self.newly_unlocked.push(Unlock::from(def));
        }
    }
}

/// Evaluate a freshly replayed game. `updated_history` must already hold
/// this game's entry. An invalid report earns nothing from game rules.
pub fn evaluate<S, RR>(
    catalog:             &[AchievementDef<S, RR>],
    report:              &ReplayReport<S, RR>,
    updated_history:     &[HistoryEntry],
    previously_unlocked: &BTreeSet<String>,
) -> Evaluation {
    let mut evaluation = Evaluation::starting_from(previously_unlocked);

    if report.valid {
        for def in catalog {
            if evaluation.all_unlocked.contains(def.id) {
                continue;
            }
            if let Rule::Game(predicate) = def.rule {
                if predicate(report, updated_history) {
                    evaluation.unlock(def);
                }
            }
        }
    }

    history_pass(catalog, updated_history, &mut evaluation);

    if !evaluation.newly_unlocked.is_empty() {
        log::info!(
            "unlocked {} achievement(s) worth {} points",
            evaluation.newly_unlocked.len(),
            evaluation.points_earned()
        );
    }
    evaluation
}

/// History-only pass: milestones and streaks over past scores.
pub fn evaluate_history<S, RR>(
    catalog:             &[AchievementDef<S, RR>],
    history:             &[HistoryEntry],
    previously_unlocked: &BTreeSet<String>,
) -> Evaluation {
    let mut evaluation = Evaluation::starting_from(previously_unlocked);
    history_pass(catalog, history, &mut evaluation);
    evaluation
}

fn history_pass<S, RR>(
    catalog:    &[AchievementDef<S, RR>],
    history:    &[HistoryEntry],
    evaluation: &mut Evaluation,
) {
    for def in catalog {
        if evaluation.all_unlocked.contains(def.id) {
            continue;
        }
        if let Rule::History(predicate) = def.rule {
            if predicate(history) {
                evaluation.unlock(def);
            }
        }
    }
}

pub fn find<'a, S, RR>(catalog: &'a [AchievementDef<S, RR>], id: &str) -> Option<&'a AchievementDef<S, RR>> {
    catalog.iter().find(|def| def.id == id)
}

// ── History helpers ───────────────────────────────────────────────

pub fn games_played(history: &[HistoryEntry]) -> usize {
    history.len()
}

pub fn latest(history: &[HistoryEntry]) -> Option<&HistoryEntry> {
    history.last()
}

/// Longest run of consecutive games satisfying `pred`.
pub fn longest_streak(history: &[HistoryEntry], pred: impl Fn(&HistoryEntry) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for entry in history {
        if pred(entry) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
