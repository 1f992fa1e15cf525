//! Action log entries and the submission envelope.
//!
//! An entry keeps its action payload as raw JSON. The payload is decoded
//! round by round during replay, so a garbled entry breaks the replay at
//! its own round instead of rejecting the log wholesale.

use crate::{
    error::{SimError, SimResult},
    types::{GameVariant, Round},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub round:  Round,
    pub action: serde_json::Value,
    pub hash:   String,
}

impl LogEntry {
    /// Decode the payload into a variant's action type.
    pub fn decode<A: DeserializeOwned>(&self) -> SimResult<A> {
        A::deserialize(&self.action).map_err(|e| SimError::Malformed {
            round:  self.round,
            detail: e.to_string(),
        })
    }
}

pub type ActionLog = Vec<LogEntry>;

/// What a client hands to a verifier after a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub player:        String,
    pub variant:       GameVariant,
    pub seed:          String,
    #[serde(default)]
    pub claimed_score: Option<i64>,
    pub entries:       ActionLog,
}

impl Submission {
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
