//! SQLite audit ledger.
//!
//! RULE: only ledger.rs talks to the database. The audit path reads a
//! profile, replays and evaluates in memory, then records the game in
//! one transaction.
//!
//! Writes for one (player, variant) are serialized by an optimistic
//! `version` column. A write carries the version its profile was read
//! at; a stale one fails with VersionConflict and must be re-audited
//! against a fresh profile.

use chrono::{DateTime, SecondsFormat, Utc};
use proofplay_core::{
    achievement::Unlock,
    scoring::{Grade, HistoryEntry, ScoreCard},
    types::{GameVariant, Round},
};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Stale write for {player} ({variant}): expected version {expected}, found {found}")]
    VersionConflict {
        player:   String,
        variant:  GameVariant,
        expected: i64,
        found:    i64,
    },

    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Everything the evaluator needs about one player in one variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    /// Valid games only, oldest first.
    pub history:  Vec<HistoryEntry>,
    pub unlocked: BTreeSet<String>,
    pub version:  i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub game_id:       String,
    pub player:        String,
    pub variant:       GameVariant,
    pub seed:          String,
    pub valid:         bool,
    pub break_round:   Option<Round>,
    pub rounds:        usize,
    pub chain_head:    String,
    /// Replay-derived; absent for an invalid log.
    pub score:         Option<ScoreCard>,
    pub claimed_score: Option<i64>,
    pub mismatch:      bool,
    pub recorded_at:   DateTime<Utc>,
}

pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: &str) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> LedgerResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_ledger.sql"))?;
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────

    pub fn version(&self, player: &str, variant: GameVariant) -> LedgerResult<i64> {
        let version = self
            .conn
            .query_row(
                "SELECT version FROM player WHERE player_id = ?1 AND variant = ?2",
                params![player, variant.name()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(version.unwrap_or(0))
    }

    pub fn load_profile(&self, player: &str, variant: GameVariant) -> LedgerResult<Profile> {
        let version = self.version(player, variant)?;

        let mut stmt = self.conn.prepare(
            "SELECT score, grade, recorded_at FROM game
             WHERE player_id = ?1 AND variant = ?2 AND valid = 1
             ORDER BY recorded_at ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![player, variant.name()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let history = rows
            .into_iter()
            .map(|(score, grade, recorded_at)| {
                Ok(HistoryEntry {
                    score,
                    grade:     parse_grade(&grade)?,
                    timestamp: parse_time(&recorded_at)?,
                })
            })
            .collect::<LedgerResult<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT achievement_id FROM unlock WHERE player_id = ?1 AND variant = ?2",
        )?;
        let unlocked = stmt
            .query_map(params![player, variant.name()], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Profile { history, unlocked, version })
    }

    pub fn game_count(&self, player: &str, variant: GameVariant) -> LedgerResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM game WHERE player_id = ?1 AND variant = ?2",
            params![player, variant.name()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn mismatch_count(&self) -> LedgerResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM game WHERE mismatch = 1", [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Writes ─────────────────────────────────────────────────

    /// Record one audited game and its new unlocks. Returns the player's
    /// new version.
    pub fn record_game(
        &mut self,
        record:           &GameRecord,
        unlocks:          &[Unlock],
        expected_version: i64,
    ) -> LedgerResult<i64> {
        let player = record.player.as_str();
        let variant = record.variant.name();
        let recorded_at = format_time(&record.recorded_at);
        let tx = self.conn.transaction()?;

        let found = tx
            .query_row(
                "SELECT version FROM player WHERE player_id = ?1 AND variant = ?2",
                params![player, variant],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        let conflict = |found: i64| LedgerError::VersionConflict {
            player:   record.player.clone(),
            variant:  record.variant,
            expected: expected_version,
            found,
        };
        if found.unwrap_or(0) != expected_version {
            return Err(conflict(found.unwrap_or(0)));
        }
        if found.is_none() {
            tx.execute(
                "INSERT INTO player (player_id, variant, version) VALUES (?1, ?2, 0)",
                params![player, variant],
            )?;
        }
        let bumped = tx.execute(
            "UPDATE player SET version = version + 1
             WHERE player_id = ?1 AND variant = ?2 AND version = ?3",
            params![player, variant, expected_version],
        )?;
        if bumped != 1 {
            return Err(conflict(expected_version + 1));
        }

        tx.execute(
            "INSERT INTO game (game_id, player_id, variant, seed, valid, break_round, rounds,
                               chain_head, score, grade, claimed_score, mismatch, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                record.game_id,
                player,
                variant,
                record.seed,
                record.valid,
                record.break_round,
                record.rounds as i64,
                record.chain_head,
                record.score.map(|card| card.score),
                record.score.map(|card| card.grade.letter()),
                record.claimed_score,
                record.mismatch,
                recorded_at,
            ],
        )?;

        for unlock in unlocks {
            tx.execute(
                "INSERT OR IGNORE INTO unlock
                     (player_id, variant, achievement_id, points, game_id, unlocked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![player, variant, unlock.id, unlock.points, record.game_id, recorded_at],
            )?;
        }

        tx.commit()?;
        log::debug!(
            "recorded game {} for {player} ({variant}), {} unlock(s), version {}",
            record.game_id,
            unlocks.len(),
            expected_version + 1
        );
        Ok(expected_version + 1)
    }
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(raw: &str) -> LedgerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| LedgerError::Corrupt(format!("timestamp '{raw}': {e}")))
}

fn parse_grade(raw: &str) -> LedgerResult<Grade> {
    raw.parse().map_err(LedgerError::Corrupt)
}
