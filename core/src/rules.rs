//! The game rules contract.
//!
//! RULE: every game variant implements GameRules, and `step` is the one
//! and only round transition. The live session and the replay engine
//! both call it; neither carries its own copy of any formula.
//!
//! Step order inside every implementation (fixed, never reordered):
//!   1. purchases / builds (stock may go negative transiently)
//!   2. weather, temperature, event from the draw function
//!   3. primary yield = min(capacity, demand or target)
//!   4. apply yield, decay, then clamp to >= 0 and round
//!   5. reputation / morale rule table
//!   6. population loss for resources that went negative

use crate::{
    achievement::AchievementDef,
    error::{SimError, SimResult},
    scoring::{Grade, GradeTable, ScoreCard},
    types::{GameVariant, Round, Seed},
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

pub trait GameRules: Send + Sync {
    type State: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;
    type Action: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;
    type RoundResult: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;

    fn variant(&self) -> GameVariant;

    /// The canonical starting state. Every game of this variant begins here.
    fn initial_state(&self) -> Self::State;

    /// Last playable round.
    fn max_rounds(&self) -> Round;

    /// True once the state itself admits no further rounds.
    fn has_ended(&self, _state: &Self::State) -> bool {
        false
    }

    /// Apply one round. Takes the state by value and returns the next one.
    fn step(
        &self,
        seed:   &Seed,
        state:  Self::State,
        round:  Round,
        action: &Self::Action,
    ) -> SimResult<(Self::State, Self::RoundResult)>;

    /// Pinned serialization of one round's action for the hash chain.
    /// Field order and number formatting are part of the contract.
    fn canonical(&self, round: Round, action: &Self::Action) -> String;

    fn score(&self, state: &Self::State, rounds: &[Self::RoundResult]) -> i64;

    fn grade_table(&self) -> &GradeTable;

    fn achievements(&self) -> &'static [AchievementDef<Self::State, Self::RoundResult>];

    fn grade(&self, score: i64) -> Grade {
        self.grade_table().grade(score)
    }

    fn score_card(&self, state: &Self::State, rounds: &[Self::RoundResult]) -> ScoreCard {
        let score = self.score(state, rounds);
        ScoreCard {
            score,
            grade: self.grade(score),
        }
    }

    /// Fails with GameOver past the last round or once the state has ended.
    fn ensure_open(&self, state: &Self::State, round: Round) -> SimResult<()> {
        if round > self.max_rounds() || self.has_ended(state) {
            return Err(SimError::GameOver { round });
        }
        Ok(())
    }
}
