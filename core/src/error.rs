use crate::types::Round;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Malformed action entry at round {round}: {detail}")]
    Malformed { round: Round, detail: String },

    #[error("Unknown {kind} '{key}' at round {round}")]
    UnknownReference {
        round: Round,
        kind:  &'static str,
        key:   String,
    },

    #[error("Invalid action at round {round}: {reason}")]
    InvalidAction { round: Round, reason: String },

    #[error("Game is over: round {round} cannot be played")]
    GameOver { round: Round },

    #[error("Invalid rules config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
