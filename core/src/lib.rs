//! proofplay-core: deterministic proof-of-gameplay.
//!
//! A game is a pure function of a seed and the player's actions. Every
//! round is hash-chained into an action log, and `replay` recomputes the
//! whole game from that log to prove the final score.

pub mod achievement;
pub mod action_log;
pub mod autopilot;
pub mod catalog;
pub mod chain;
pub mod colony;
pub mod config;
pub mod draw;
pub mod error;
pub mod inventory;
pub mod lemonade;
pub mod outcome;
pub mod replay;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod types;
