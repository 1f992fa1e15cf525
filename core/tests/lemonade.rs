//! Lemonade stand round step tests.
//!
//! Day 1 under seed "alice" is pinned: cloudy, 61°F, competitor event.

use proofplay_core::{
    autopilot::autoplay,
    config::LemonadeConfig,
    error::SimError,
    inventory::amount,
    lemonade::{LemonadeRules, StandAction, Supply},
    rules::GameRules,
    scoring::Grade,
};

fn classic(lemons: u32, sugar: u32, ice: u32, cups: u32, price_cents: u32) -> StandAction {
    StandAction {
        lemons,
        sugar,
        ice,
        cups,
        recipe: "classic".into(),
        price_cents,
    }
}

#[test]
fn initial_state_and_baseline_score() {
    let rules = LemonadeRules::standard();
    let state = rules.initial_state();
    assert_eq!(state.cash_cents, 2000);
    assert_eq!(state.reputation, 50);
    assert_eq!(state.cups_sold_total, 0);
    for supply in Supply::ALL {
        assert_eq!(amount(&state.inventory, &supply), 0);
    }

    let card = rules.score_card(&state, &[]);
    assert_eq!(card.score, 100);
    assert_eq!(card.grade, Grade::D);
}

#[test]
fn alice_day_one_is_pinned() {
    let rules = LemonadeRules::standard();
    let (next, day) = rules
        .step("alice", rules.initial_state(), 1, &classic(10, 10, 20, 10, 100))
        .expect("day 1");

    assert_eq!(day.weather, "cloudy");
    assert_eq!(day.temperature, 61);
    assert_eq!(day.event, "competitor");
    assert_eq!(day.demand, 27);
    // Ice caps capacity at 20 / 2 = 10 cups.
    assert_eq!(day.sold, 10);
    assert_eq!(day.spent_cents, 440);
    assert_eq!(day.revenue_cents, 1000);
    assert_eq!(day.profit_cents(), 560);
    // Sell-through 10/27 is under one half.
    assert_eq!(day.reputation_delta, -3);

    assert_eq!(next.cash_cents, 2560);
    assert_eq!(next.reputation, 47);
    assert_eq!(next.cups_sold_total, 10);
    for supply in Supply::ALL {
        assert_eq!(amount(&next.inventory, &supply), 0, "{supply:?} left over");
    }
    assert_eq!(rules.score(&next, &[day]), 56 + 94 + 5);
}

#[test]
fn ice_melts_overnight() {
    let rules = LemonadeRules::standard();
    // No cups bought, so nothing sells and all ice is lost.
    let (next, day) = rules
        .step("alice", rules.initial_state(), 1, &classic(5, 5, 40, 0, 100))
        .unwrap();
    assert_eq!(day.sold, 0);
    assert_eq!(amount(&next.inventory, &Supply::Ice), 0);
    assert_eq!(amount(&next.inventory, &Supply::Sugar), 5);
    assert!(amount(&next.inventory, &Supply::Lemons) <= 5);
    assert!(day.spoiled >= 40);
}

#[test]
fn unknown_recipe_is_rejected() {
    let rules = LemonadeRules::standard();
    let mut action = classic(1, 1, 2, 1, 100);
    action.recipe = "mystery".into();
    let err = rules.step("alice", rules.initial_state(), 1, &action).unwrap_err();
    assert!(
        matches!(err, SimError::UnknownReference { round: 1, kind: "recipe", ref key } if key == "mystery"),
        "unexpected error: {err:?}"
    );
}

#[test]
fn zero_price_is_rejected() {
    let rules = LemonadeRules::standard();
    let err = rules
        .step("alice", rules.initial_state(), 1, &classic(1, 1, 2, 1, 0))
        .unwrap_err();
    assert!(matches!(err, SimError::InvalidAction { round: 1, .. }));
}

#[test]
fn purchases_beyond_cash_are_rejected() {
    let rules = LemonadeRules::standard();
    // 101 lemons at 20 cents is 2020 cents, more than the 2000 on hand.
    let err = rules
        .step("alice", rules.initial_state(), 1, &classic(101, 0, 0, 0, 100))
        .unwrap_err();
    assert!(matches!(err, SimError::InvalidAction { round: 1, .. }));

    // Exactly the cash on hand is fine.
    assert!(rules
        .step("alice", rules.initial_state(), 1, &classic(100, 0, 0, 0, 100))
        .is_ok());
}

#[test]
fn past_the_last_day_is_game_over() {
    let rules = LemonadeRules::standard();
    let err = rules
        .step("alice", rules.initial_state(), 31, &classic(0, 0, 0, 0, 100))
        .unwrap_err();
    assert!(matches!(err, SimError::GameOver { round: 31 }));
}

#[test]
fn canonical_form_is_pinned() {
    let rules = LemonadeRules::standard();
    let action = StandAction {
        lemons:      3,
        sugar:       4,
        ice:         5,
        cups:        6,
        recipe:      "tart".into(),
        price_cents: 125,
    };
    assert_eq!(
        rules.canonical(7, &action),
        "day=7;lemons=3;sugar=4;ice=5;cups=6;recipe=tart;price=125"
    );
}

#[test]
fn actions_reject_unknown_fields() {
    let json = r#"{"lemons":1,"sugar":1,"ice":2,"cups":1,"recipe":"classic","price_cents":100,"bonus":5}"#;
    assert!(serde_json::from_str::<StandAction>(json).is_err());
}

#[test]
fn stock_and_reputation_stay_in_bounds() {
    let rules = LemonadeRules::standard();
    for policy in 0..20u64 {
        let seed = format!("bounds-{policy}");
        let session = autoplay(&rules, &seed, 30, policy).unwrap();
        assert_eq!(session.rounds().len(), 30);

        let state = session.state();
        assert!(state.cash_cents >= 0);
        assert!((0..=100).contains(&state.reputation));
        for supply in Supply::ALL {
            assert!(amount(&state.inventory, &supply) >= 0);
        }
        for day in session.rounds() {
            assert!(day.sold <= day.demand);
            assert!(day.sold >= 0);
        }
    }
}

#[test]
fn shipped_data_file_matches_standard_rules() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/lemonade.json");
    let loaded = LemonadeConfig::load(path).expect("load data/lemonade.json");
    assert_eq!(loaded, LemonadeConfig::standard());
}
