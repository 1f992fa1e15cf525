//! Submission audit: replay, claim check, achievements, ledger write.
//!
//! The verdict's score is always the replay's. A client claim is only
//! compared against it and flagged on mismatch.

use crate::ledger::{GameRecord, Ledger, LedgerError};
use anyhow::{ensure, Result};
use chrono::Utc;
use proofplay_core::{
    achievement::{evaluate, Unlock},
    action_log::Submission,
    replay::{replay, ReplayFailure},
    rules::GameRules,
    scoring::{check_claim, ClaimCheck, HistoryEntry, ScoreCard},
    types::GameVariant,
};
use serde::Serialize;

/// Allowed difference between a claimed and the replayed score.
pub const SCORE_TOLERANCE: i64 = 0;

/// Re-reads of a profile after a stale write before giving up.
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub game_id:       String,
    pub player:        String,
    pub variant:       GameVariant,
    pub seed:          String,
    pub valid:         bool,
    pub failure:       Option<ReplayFailure>,
    pub rounds:        usize,
    pub chain_head:    String,
    pub score:         Option<ScoreCard>,
    pub claim:         Option<ClaimCheck>,
    pub unlocked:      Vec<Unlock>,
    pub points_earned: u32,
    pub version:       i64,
}

pub fn audit<R: GameRules>(rules: &R, ledger: &mut Ledger, submission: &Submission) -> Result<Verdict> {
    ensure!(
        submission.variant == rules.variant(),
        "submission is for {}, rules are for {}",
        submission.variant,
        rules.variant()
    );

    let report = replay(rules, &submission.seed, &submission.entries);
    let claim = match (&report.score_card, submission.claimed_score) {
        (Some(card), Some(claimed)) => Some(check_claim(card, claimed, SCORE_TOLERANCE)),
        _ => None,
    };
    let game_id = uuid::Uuid::new_v4().to_string();
    let recorded_at = Utc::now();

    let mut attempt = 0;
    loop {
        let profile = ledger.load_profile(&submission.player, submission.variant)?;
        let mut history = profile.history;
        if let Some(card) = &report.score_card {
            history.push(HistoryEntry::from_card(card, recorded_at));
        }
        let evaluation = evaluate(rules.achievements(), &report, &history, &profile.unlocked);

        let record = GameRecord {
            game_id:       game_id.clone(),
            player:        submission.player.clone(),
            variant:       submission.variant,
            seed:          submission.seed.clone(),
            valid:         report.valid,
            break_round:   report.break_round(),
            rounds:        report.rounds_played(),
            chain_head:    report.chain_head.clone(),
            score:         report.score_card,
            claimed_score: submission.claimed_score,
            mismatch:      claim.as_ref().is_some_and(ClaimCheck::is_mismatch),
            recorded_at,
        };

        match ledger.record_game(&record, &evaluation.newly_unlocked, profile.version) {
            Ok(version) => {
                log::info!(
                    "audited {} for {} ({}): valid={} score={:?} +{} points",
                    game_id,
                    submission.player,
                    submission.variant,
                    report.valid,
                    report.score_card.map(|card| card.score),
                    evaluation.points_earned()
                );
                return Ok(Verdict {
                    game_id,
                    player:        submission.player.clone(),
                    variant:       submission.variant,
                    seed:          submission.seed.clone(),
                    valid:         report.valid,
                    failure:       report.failure.clone(),
                    rounds:        report.rounds_played(),
                    chain_head:    report.chain_head.clone(),
                    score:         report.score_card,
                    claim,
                    points_earned: evaluation.points_earned(),
                    unlocked:      evaluation.newly_unlocked,
                    version,
                });
            }
            Err(LedgerError::VersionConflict { found, .. }) if attempt < MAX_RETRIES => {
                attempt += 1;
                log::warn!(
                    "stale profile for {} (now at version {found}), retrying {attempt}/{MAX_RETRIES}",
                    submission.player
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofplay_core::{autopilot::autoplay, colony::ColonyRules, lemonade::LemonadeRules};
    use serde_json::json;

    fn ledger() -> Ledger {
        let ledger = Ledger::in_memory().expect("in-memory ledger");
        ledger.migrate().expect("migration");
        ledger
    }

    fn submission<R: proofplay_core::autopilot::Autopilot>(rules: &R, seed: &str) -> Submission {
        let session = autoplay(rules, seed, rules.max_rounds(), 21).unwrap();
        Submission {
            player:        "alice".into(),
            variant:       rules.variant(),
            seed:          seed.into(),
            claimed_score: Some(session.score_card().score),
            entries:       session.log().to_vec(),
        }
    }

    #[test]
    fn honest_game_is_accepted_and_recorded() {
        let rules = LemonadeRules::standard();
        let mut ledger = ledger();
        let verdict = audit(&rules, &mut ledger, &submission(&rules, "alice")).unwrap();

        assert!(verdict.valid);
        assert!(verdict.failure.is_none());
        assert_eq!(verdict.rounds, 30);
        assert!(matches!(verdict.claim, Some(ClaimCheck::Match { .. })));
        assert!(verdict.unlocked.iter().any(|u| u.id == "open_for_business"));
        assert_eq!(verdict.version, 1);

        let profile = ledger.load_profile("alice", GameVariant::Lemonade).unwrap();
        assert_eq!(profile.history.len(), 1);
        assert_eq!(Some(profile.history[0].score), verdict.score.map(|c| c.score));
    }

    #[test]
    fn inflated_claim_is_flagged_not_trusted() {
        let rules = ColonyRules::standard();
        let mut ledger = ledger();
        let mut sub = submission(&rules, "bob");
        let honest = sub.claimed_score.unwrap();
        sub.claimed_score = Some(honest + 5000);

        let verdict = audit(&rules, &mut ledger, &sub).unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.score.map(|c| c.score), Some(honest));
        assert!(verdict.claim.as_ref().is_some_and(ClaimCheck::is_mismatch));
        assert_eq!(ledger.mismatch_count().unwrap(), 1);
    }

    #[test]
    fn out_of_range_claim_is_flagged() {
        let rules = LemonadeRules::standard();
        let mut ledger = ledger();
        let mut sub = submission(&rules, "frank");
        let honest = sub.claimed_score.unwrap();
        sub.claimed_score = Some(i64::MIN);

        let verdict = audit(&rules, &mut ledger, &sub).unwrap();
        assert!(verdict.valid);
        assert_eq!(
            verdict.claim,
            Some(ClaimCheck::Mismatch { claimed: i64::MIN, authoritative: honest })
        );
        assert_eq!(ledger.mismatch_count().unwrap(), 1);
    }

    #[test]
    fn tampered_game_is_recorded_without_history() {
        let rules = LemonadeRules::standard();
        let mut ledger = ledger();
        let mut sub = submission(&rules, "carol");
        sub.entries[9].action["price_cents"] = json!(1);

        let verdict = audit(&rules, &mut ledger, &sub).unwrap();
        assert!(!verdict.valid);
        assert_eq!(verdict.failure.as_ref().map(|f| f.round), Some(10));
        assert!(verdict.score.is_none());
        assert!(verdict.unlocked.is_empty());

        let profile = ledger.load_profile("alice", GameVariant::Lemonade).unwrap();
        assert!(profile.history.is_empty());
        assert_eq!(ledger.game_count("alice", GameVariant::Lemonade).unwrap(), 1);
    }

    #[test]
    fn unlocks_are_not_awarded_twice() {
        let rules = LemonadeRules::standard();
        let mut ledger = ledger();
        let first = audit(&rules, &mut ledger, &submission(&rules, "dave")).unwrap();
        let second = audit(&rules, &mut ledger, &submission(&rules, "dave")).unwrap();

        for unlock in &second.unlocked {
            assert!(first.unlocked.iter().all(|u| u.id != unlock.id), "{} awarded twice", unlock.id);
        }
        assert_eq!(second.version, 2);
    }

    #[test]
    fn wrong_rules_for_variant_is_an_error() {
        let lemonade = LemonadeRules::standard();
        let colony = ColonyRules::standard();
        let mut ledger = ledger();
        assert!(audit(&colony, &mut ledger, &submission(&lemonade, "erin")).is_err());
    }
}
