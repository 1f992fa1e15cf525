//! Live game session, the incremental play path.
//!
//! A session owns the current state and grows the action log and hash
//! chain one round at a time. It holds no formula of its own: every
//! round goes through `GameRules::step`, the same call the replay engine
//! folds over a finished log, so live and audited scores cannot drift.

use crate::{
    action_log::{ActionLog, LogEntry},
    chain::ChainBuilder,
    error::SimResult,
    rules::GameRules,
    scoring::ScoreCard,
    types::Round,
};

pub struct GameSession<'r, R: GameRules> {
    rules:  &'r R,
    seed:   String,
    state:  R::State,
    chain:  ChainBuilder,
    log:    ActionLog,
    rounds: Vec<R::RoundResult>,
}

impl<'r, R: GameRules> GameSession<'r, R> {
    pub fn new(rules: &'r R, seed: impl Into<String>) -> Self {
        let seed = seed.into();
        Self {
            state:  rules.initial_state(),
            chain:  ChainBuilder::new(&seed),
            log:    Vec::new(),
            rounds: Vec::new(),
            rules,
            seed,
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn rules(&self) -> &R {
        self.rules
    }

    pub fn state(&self) -> &R::State {
        &self.state
    }

    pub fn rounds(&self) -> &[R::RoundResult] {
        &self.rounds
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn chain_head(&self) -> &str {
        self.chain.head()
    }

    /// The round the next `play` will close.
    pub fn next_round(&self) -> Round {
        self.rounds.len() as Round + 1
    }

    pub fn is_finished(&self) -> bool {
        self.next_round() > self.rules.max_rounds() || self.rules.has_ended(&self.state)
    }

    /// Close one round. On error the session is left untouched.
    pub fn play(&mut self, action: R::Action) -> SimResult<&R::RoundResult> {
        let round = self.next_round();
        let (next, result) = self.rules.step(&self.seed, self.state.clone(), round, &action)?;

        let payload = serde_json::to_value(&action)?;
        let hash = self.chain.append(&self.rules.canonical(round, &action));
        self.log.push(LogEntry {
            round,
            action: payload,
            hash,
        });
        self.state = next;
        self.rounds.push(result);

        Ok(&self.rounds[self.rounds.len() - 1])
    }

    /// Score of the game so far, computed the same way replay computes it.
    pub fn score_card(&self) -> ScoreCard {
        self.rules.score_card(&self.state, &self.rounds)
    }

    pub fn into_log(self) -> ActionLog {
        self.log
    }
}
