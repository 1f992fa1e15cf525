//! Achievement catalogs for the standard rulesets.
//!
//! Append only. Ids are persisted in unlocked sets; never rename or
//! remove one. Each predicate is a plain fn so it can be tested alone.

use crate::{
    achievement::{games_played, latest, longest_streak, AchievementDef, Rule},
    colony::{ColonySol, ColonyState},
    lemonade::{StandDay, StandState},
    replay::ReplayReport,
    scoring::{Grade, HistoryEntry},
};

pub type StandReport = ReplayReport<StandState, StandDay>;
pub type ColonyReport = ReplayReport<ColonyState, ColonySol>;

pub const CENTURY_SCORE: i64 = 100;
pub const RUSH_HOUR_CUPS: i64 = 100;
pub const LOCAL_FAVORITE_REPUTATION: i32 = 90;
pub const HOT_STREAK_SCORE: i64 = 500;
pub const STREAK_LENGTH: usize = 3;
pub const ARCHITECT_UPGRADES: usize = 5;
pub const HIGH_SPIRITS_MORALE: i32 = 90;

// ── Shared ────────────────────────────────────────────────────────

/// The freshly appended history entry reached the century mark.
pub fn century(history: &[HistoryEntry]) -> bool {
    latest(history).is_some_and(|entry| entry.score >= CENTURY_SCORE)
}

pub fn five_games(history: &[HistoryEntry]) -> bool {
    games_played(history) >= 5
}

pub fn twenty_five_games(history: &[HistoryEntry]) -> bool {
    games_played(history) >= 25
}

// ── Lemonade stand ────────────────────────────────────────────────

pub fn open_for_business(report: &StandReport, _history: &[HistoryEntry]) -> bool {
    report.rounds_played() >= 1
}

pub fn stand_century(_report: &StandReport, history: &[HistoryEntry]) -> bool {
    century(history)
}

pub fn rush_hour(report: &StandReport, _history: &[HistoryEntry]) -> bool {
    report.rounds.iter().any(|day| day.sold >= RUSH_HOUR_CUPS)
}

pub fn rain_check(report: &StandReport, _history: &[HistoryEntry]) -> bool {
    report
        .rounds
        .iter()
        .any(|day| matches!(day.weather.as_str(), "rainy" | "stormy") && day.profit_cents() > 0)
}

pub fn local_favorite(report: &StandReport, _history: &[HistoryEntry]) -> bool {
    report.final_state.reputation >= LOCAL_FAVORITE_REPUTATION
}

pub fn lemon_tycoon(report: &StandReport, _history: &[HistoryEntry]) -> bool {
    report.score_card.is_some_and(|card| card.grade == Grade::S)
}

pub fn hot_streak(history: &[HistoryEntry]) -> bool {
    longest_streak(history, |entry| entry.score >= HOT_STREAK_SCORE) >= STREAK_LENGTH
}

pub static LEMONADE: &[AchievementDef<StandState, StandDay>] = &[
    AchievementDef {
        id:     "open_for_business",
        name:   "Open for Business",
        points: 5,
        secret: false,
        rule:   Rule::Game(open_for_business),
    },
    AchievementDef {
        id:     "century",
        name:   "Century",
        points: 10,
        secret: false,
        rule:   Rule::Game(stand_century),
    },
    AchievementDef {
        id:     "rush_hour",
        name:   "Rush Hour",
        points: 15,
        secret: false,
        rule:   Rule::Game(rush_hour),
    },
    AchievementDef {
        id:     "rain_check",
        name:   "Rain Check",
        points: 20,
        secret: true,
        rule:   Rule::Game(rain_check),
    },
    AchievementDef {
        id:     "local_favorite",
        name:   "Local Favorite",
        points: 20,
        secret: false,
        rule:   Rule::Game(local_favorite),
    },
    AchievementDef {
        id:     "lemon_tycoon",
        name:   "Lemon Tycoon",
        points: 50,
        secret: false,
        rule:   Rule::Game(lemon_tycoon),
    },
    AchievementDef {
        id:     "regular",
        name:   "Regular",
        points: 10,
        secret: false,
        rule:   Rule::History(five_games),
    },
    AchievementDef {
        id:     "veteran",
        name:   "Veteran",
        points: 25,
        secret: false,
        rule:   Rule::History(twenty_five_games),
    },
    AchievementDef {
        id:     "hot_streak",
        name:   "Hot Streak",
        points: 30,
        secret: false,
        rule:   Rule::History(hot_streak),
    },
];

// ── Mars colony ───────────────────────────────────────────────────

pub fn first_sol(report: &ColonyReport, _history: &[HistoryEntry]) -> bool {
    report.rounds.first().is_some_and(|sol| sol.colonists_after > 0)
}

pub fn colony_century(_report: &ColonyReport, history: &[HistoryEntry]) -> bool {
    century(history)
}

pub fn full_mission(report: &ColonyReport, _history: &[HistoryEntry]) -> bool {
    report.reached_last_round() && report.final_state.colonists > 0
}

pub fn no_one_left_behind(report: &ColonyReport, history: &[HistoryEntry]) -> bool {
    full_mission(report, history) && report.final_state.deaths_total == 0
}

pub fn architect(report: &ColonyReport, _history: &[HistoryEntry]) -> bool {
    report.final_state.upgrades.len() >= ARCHITECT_UPGRADES
}

pub fn storm_chaser(report: &ColonyReport, _history: &[HistoryEntry]) -> bool {
    report
        .rounds
        .iter()
        .any(|sol| sol.weather == "dust_storm" && sol.target > 0 && sol.produced >= sol.target)
}

pub fn high_spirits(report: &ColonyReport, _history: &[HistoryEntry]) -> bool {
    report.rounds_played() >= 1 && report.final_state.morale >= HIGH_SPIRITS_MORALE
}

pub fn steady_hands(history: &[HistoryEntry]) -> bool {
    longest_streak(history, |entry| entry.grade.at_least(Grade::B)) >= STREAK_LENGTH
}

pub static COLONY: &[AchievementDef<ColonyState, ColonySol>] = &[
    AchievementDef {
        id:     "first_sol",
        name:   "First Sol",
        points: 5,
        secret: false,
        rule:   Rule::Game(first_sol),
    },
    AchievementDef {
        id:     "century",
        name:   "Century",
        points: 10,
        secret: false,
        rule:   Rule::Game(colony_century),
    },
    AchievementDef {
        id:     "full_mission",
        name:   "Full Mission",
        points: 25,
        secret: false,
        rule:   Rule::Game(full_mission),
    },
    AchievementDef {
        id:     "no_one_left_behind",
        name:   "No One Left Behind",
        points: 40,
        secret: false,
        rule:   Rule::Game(no_one_left_behind),
    },
    AchievementDef {
        id:     "architect",
        name:   "Architect",
        points: 30,
        secret: false,
        rule:   Rule::Game(architect),
    },
    AchievementDef {
        id:     "storm_chaser",
        name:   "Storm Chaser",
        points: 20,
        secret: true,
        rule:   Rule::Game(storm_chaser),
    },
    AchievementDef {
        id:     "high_spirits",
        name:   "High Spirits",
        points: 15,
        secret: false,
        rule:   Rule::Game(high_spirits),
    },
    AchievementDef {
        id:     "mission_control",
        name:   "Mission Control",
        points: 10,
        secret: false,
        rule:   Rule::History(five_games),
    },
    AchievementDef {
        id:     "steady_hands",
        name:   "Steady Hands",
        points: 30,
        secret: false,
        rule:   Rule::History(steady_hands),
    },
];
