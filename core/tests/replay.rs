//! Replay engine and hash chain tests.
//!
//! A tampered log must break at the first round whose recorded hash no
//! longer matches, and nothing after that round may be applied.

use proofplay_core::{
    action_log::{LogEntry, Submission},
    autopilot::autoplay,
    chain::{genesis, ChainBuilder},
    colony::ColonyRules,
    lemonade::{LemonadeRules, StandAction},
    replay::{recompute_head, replay, BreakReason},
    rules::GameRules,
    types::GameVariant,
};
use serde_json::json;

fn honest_log(seed: &str, days: u32) -> Vec<LogEntry> {
    let rules = LemonadeRules::standard();
    autoplay(&rules, seed, days, 11).expect("autoplay").into_log()
}

#[test]
fn empty_log_replays_to_the_baseline() {
    let lemonade = LemonadeRules::standard();
    let report = replay(&lemonade, "alice", &[]);
    assert!(report.valid);
    assert_eq!(report.rounds_played(), 0);
    assert_eq!(report.chain_head, genesis("alice"));
    assert_eq!(report.score_card.map(|c| c.score), Some(100));

    let colony = ColonyRules::standard();
    let report = replay(&colony, "alice", &[]);
    assert!(report.valid);
    assert_eq!(report.score_card.map(|c| c.score), Some(490));
}

#[test]
fn altered_action_breaks_at_its_round() {
    let rules = LemonadeRules::standard();
    let mut log = honest_log("alice", 12);
    let honest = replay(&rules, "alice", &log);
    assert!(honest.valid);

    let price = log[4].action["price_cents"].as_u64().unwrap();
    log[4].action["price_cents"] = json!(price + 1);

    let report = replay(&rules, "alice", &log);
    assert!(!report.valid);
    assert_eq!(report.break_round(), Some(5));
    assert!(matches!(
        report.failure.as_ref().map(|f| &f.reason),
        Some(BreakReason::ChainBreak { .. })
    ));
    // Only the verified prefix was applied.
    assert_eq!(report.rounds_played(), 4);
    assert_eq!(report.rounds[..], honest.rounds[..4]);
    assert!(report.score_card.is_none());
}

#[test]
fn flipped_hash_breaks_at_its_round() {
    let rules = LemonadeRules::standard();
    let mut log = honest_log("bob", 8);
    let hash = &mut log[2].hash;
    let flipped = if hash.starts_with('0') { "1" } else { "0" };
    hash.replace_range(0..1, flipped);

    let report = replay(&rules, "bob", &log);
    assert_eq!(report.break_round(), Some(3));
    assert_eq!(report.rounds_played(), 2);
}

#[test]
fn rechained_forgery_breaks_at_the_next_round() {
    let rules = LemonadeRules::standard();
    let mut log = honest_log("carol", 10);

    // Alter round 6 and relink it onto round 5's stored hash.
    log[5].action["price_cents"] = json!(199);
    let action: StandAction = log[5].decode().unwrap();
    let mut chain = ChainBuilder::new("carol");
    for entry in &log[..5] {
        let earlier: StandAction = entry.decode().unwrap();
        chain.append(&rules.canonical(entry.round, &earlier));
    }
    log[5].hash = chain.next_hash(&rules.canonical(6, &action));

    let report = replay(&rules, "carol", &log);
    assert_eq!(report.break_round(), Some(7));
    assert_eq!(report.rounds_played(), 6);
}

#[test]
fn chain_head_commits_to_round_one() {
    let rules = LemonadeRules::standard();
    let log = honest_log("dave", 20);
    let head = recompute_head(&rules, "dave", &log).unwrap();

    let mut altered = log.clone();
    let cups = altered[0].action["cups"].as_u64().unwrap();
    altered[0].action["cups"] = json!(cups + 1);
    let altered_head = recompute_head(&rules, "dave", &altered).unwrap();
    assert_ne!(head, altered_head);
}

#[test]
fn garbled_payload_is_malformed() {
    let rules = LemonadeRules::standard();
    let mut log = honest_log("erin", 6);
    log[3].action = json!("not an action");

    let report = replay(&rules, "erin", &log);
    assert_eq!(report.break_round(), Some(4));
    assert!(matches!(
        report.failure.map(|f| f.reason),
        Some(BreakReason::Malformed { .. })
    ));
}

#[test]
fn extra_field_is_malformed() {
    let rules = LemonadeRules::standard();
    let mut log = honest_log("erin", 3);
    log[0].action["free_lemons"] = json!(500);

    let report = replay(&rules, "erin", &log);
    assert_eq!(report.break_round(), Some(1));
    assert!(matches!(
        report.failure.map(|f| f.reason),
        Some(BreakReason::Malformed { .. })
    ));
}

#[test]
fn out_of_order_rounds_are_malformed() {
    let rules = LemonadeRules::standard();
    let mut log = honest_log("frank", 6);
    log.swap(2, 3);

    let report = replay(&rules, "frank", &log);
    assert_eq!(report.break_round(), Some(3));
    assert!(matches!(
        report.failure.map(|f| f.reason),
        Some(BreakReason::Malformed { .. })
    ));
}

#[test]
fn correctly_chained_illegal_action_is_reported_as_such() {
    let rules = LemonadeRules::standard();
    let action = StandAction {
        lemons:      1,
        sugar:       1,
        ice:         2,
        cups:        1,
        recipe:      "mystery".into(),
        price_cents: 100,
    };
    let mut chain = ChainBuilder::new("gina");
    let entry = LogEntry {
        round:  1,
        action: serde_json::to_value(&action).unwrap(),
        hash:   chain.append(&rules.canonical(1, &action)),
    };

    let report = replay(&rules, "gina", &[entry]);
    assert_eq!(report.break_round(), Some(1));
    assert_eq!(
        report.failure.map(|f| f.reason),
        Some(BreakReason::UnknownReference {
            reference: "recipe".into(),
            key:       "mystery".into(),
        })
    );
}

#[test]
fn entries_past_the_last_round_are_game_over() {
    let rules = LemonadeRules::standard();
    let mut log = honest_log("hank", 30);
    let extra: StandAction = log[29].decode().unwrap();
    let mut chain = ChainBuilder::new("hank");
    for entry in &log {
        let action: StandAction = entry.decode().unwrap();
        chain.append(&rules.canonical(entry.round, &action));
    }
    log.push(LogEntry {
        round:  31,
        action: serde_json::to_value(&extra).unwrap(),
        hash:   chain.next_hash(&rules.canonical(31, &extra)),
    });

    let report = replay(&rules, "hank", &log);
    assert_eq!(report.break_round(), Some(31));
    assert_eq!(report.failure.as_ref().map(|f| &f.reason), Some(&BreakReason::GameOver));
    assert_eq!(report.rounds_played(), 30);
}

#[test]
fn submission_envelope_parses() {
    let log = honest_log("ivy", 2);
    let submission = Submission {
        player:        "ivy".into(),
        variant:       GameVariant::Lemonade,
        seed:          "ivy".into(),
        claimed_score: None,
        entries:       log,
    };
    let json = submission.to_json().unwrap();
    assert!(json.contains("\"variant\": \"lemonade\""));

    // claimed_score may be left out entirely.
    let bare = r#"{"player":"p","variant":"colony","seed":"s","entries":[]}"#;
    let parsed = Submission::from_json(bare).unwrap();
    assert_eq!(parsed.variant, GameVariant::Colony);
    assert_eq!(parsed.claimed_score, None);
}
