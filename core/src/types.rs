//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A simulation round. One round = one in-game day (stand) or sol (colony).
/// Rounds start at 1 and never skip.
pub type Round = u32;

/// The opaque identity string every outcome of a game is derived from.
pub type Seed = str;

/// The two game variants sharing one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    Lemonade,
    Colony,
}

impl GameVariant {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lemonade => "lemonade",
            Self::Colony   => "colony",
        }
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lemonade" => Ok(Self::Lemonade),
            "colony"   => Ok(Self::Colony),
            other      => Err(format!("unknown game variant '{other}'")),
        }
    }
}
