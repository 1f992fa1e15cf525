//! Replay: independent recomputation of a finished game.
//!
//! For every entry, in order:
//!   1. the round index must be exactly the next round   (Malformed)
//!   2. the action payload must decode                    (Malformed)
//!   3. the stored hash must equal the recomputed link    (ChainBreak)
//!   4. the shared round step must accept the action      (step error)
//!
//! The first failure stops the fold: nothing after an unverified round
//! is ever applied. The engine is pure, so replaying the same log twice
//! yields the same report.

use crate::{
    action_log::LogEntry,
    chain::ChainBuilder,
    error::SimError,
    rules::GameRules,
    scoring::ScoreCard,
    types::{Round, Seed},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreakReason {
    ChainBreak { expected: String, stored: String },
    Malformed { detail: String },
    UnknownReference { reference: String, key: String },
    InvalidAction { reason: String },
    GameOver,
}

impl BreakReason {
    pub fn from_error(error: SimError) -> Self {
        match error {
            SimError::Malformed { detail, .. } => Self::Malformed { detail },
            SimError::UnknownReference { kind, key, .. } => Self::UnknownReference {
                reference: kind.to_string(),
                key,
            },
            SimError::InvalidAction { reason, .. } => Self::InvalidAction { reason },
            SimError::GameOver { .. } => Self::GameOver,
            other => Self::Malformed { detail: other.to_string() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFailure {
    pub round:  Round,
    pub reason: BreakReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport<S, RR> {
    pub valid:       bool,
    pub failure:     Option<ReplayFailure>,
    /// State after the last verified round.
    pub final_state: S,
    /// Results of every verified round.
    pub rounds:      Vec<RR>,
    /// Recomputed head over the verified prefix.
    pub chain_head:  String,
    /// Present only for a fully valid log.
    pub score_card:  Option<ScoreCard>,
    /// Configured length of the game the log was replayed under.
    pub max_rounds:  Round,
}

impl<S, RR> ReplayReport<S, RR> {
    pub fn break_round(&self) -> Option<Round> {
        self.failure.as_ref().map(|f| f.round)
    }

    pub fn rounds_played(&self) -> usize {
        self.rounds.len()
    }

    /// Every configured round was verified.
    pub fn reached_last_round(&self) -> bool {
        self.rounds.len() >= self.max_rounds as usize
    }
}

pub type ReportFor<R> = ReplayReport<<R as GameRules>::State, <R as GameRules>::RoundResult>;

pub fn replay<R: GameRules>(rules: &R, seed: &Seed, entries: &[LogEntry]) -> ReportFor<R> {
    let mut state = rules.initial_state();
    let mut rounds = Vec::with_capacity(entries.len());
    let mut chain = ChainBuilder::new(seed);

    for (index, entry) in entries.iter().enumerate() {
        let expected_round = index as Round + 1;
        match verify_and_step(rules, seed, &chain, state.clone(), expected_round, entry) {
            Ok((next, result, canonical)) => {
                chain.append(&canonical);
                state = next;
                rounds.push(result);
            }
            Err(reason) => {
                log::warn!(
                    "replay of '{seed}' ({}) broke at round {expected_round}: {reason:?}",
                    rules.variant()
                );
                return ReplayReport {
                    valid:       false,
                    failure:     Some(ReplayFailure { round: expected_round, reason }),
                    final_state: state,
                    rounds,
                    chain_head:  chain.head().to_string(),
                    score_card:  None,
                    max_rounds:  rules.max_rounds(),
                };
            }
        }
    }

    let score_card = rules.score_card(&state, &rounds);
    log::debug!(
        "replay of '{seed}' ({}) valid: {} rounds, score {} ({})",
        rules.variant(),
        rounds.len(),
        score_card.score,
        score_card.grade
    );
    ReplayReport {
        valid:       true,
        failure:     None,
        final_state: state,
        rounds,
        chain_head:  chain.head().to_string(),
        score_card:  Some(score_card),
        max_rounds:  rules.max_rounds(),
    }
}

fn verify_and_step<R: GameRules>(
    rules:  &R,
    seed:   &Seed,
    chain:  &ChainBuilder,
    state:  R::State,
    round:  Round,
    entry:  &LogEntry,
) -> Result<(R::State, R::RoundResult, String), BreakReason> {
    if entry.round != round {
        return Err(BreakReason::Malformed {
            detail: format!("expected round {round}, entry says {}", entry.round),
        });
    }
    let action: R::Action = entry.decode().map_err(BreakReason::from_error)?;

    let canonical = rules.canonical(round, &action);
    let expected = chain.next_hash(&canonical);
    if expected != entry.hash {
        return Err(BreakReason::ChainBreak {
            expected,
            stored: entry.hash.clone(),
        });
    }

    let (next, result) = rules
        .step(seed, state, round, &action)
        .map_err(BreakReason::from_error)?;
    Ok((next, result, canonical))
}

/// Recompute the chain head over a whole log without stepping the game.
/// Stored hashes are ignored; only the decoded actions count.
pub fn recompute_head<R: GameRules>(
    rules:   &R,
    seed:    &Seed,
    entries: &[LogEntry],
) -> Result<String, ReplayFailure> {
    let mut chain = ChainBuilder::new(seed);
    for (index, entry) in entries.iter().enumerate() {
        let round = index as Round + 1;
        let action: R::Action = entry.decode().map_err(|e| ReplayFailure {
            round,
            reason: BreakReason::from_error(e),
        })?;
        chain.append(&rules.canonical(round, &action));
    }
    Ok(chain.head().to_string())
}
