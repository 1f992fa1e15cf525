//! Deterministic draw function.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! Every random-looking outcome of a game is a draw derived from
//! (seed, round, salt) through the 32-bit FNV-1a hash below.
//!
//! The construction must stay bit-identical to every other verifier:
//!   - hash input is the UTF-8 string "{seed}::round{round}::{salt}"
//!   - all arithmetic is u32 with wrapping multiply
//!   - the draw is the hash divided by 0xffffffff as f64
//!
//! Use a distinct salt for every logically distinct roll within a round.

use crate::types::{Round, Seed};

pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Stable salts. Renaming any of these changes every recorded game.
pub mod salt {
    pub const WEATHER: &str = "weather";
    pub const TEMPERATURE: &str = "temperature";
    pub const EVENT: &str = "event";
    pub const DEMAND: &str = "demand";
    pub const SPOILAGE: &str = "spoilage";
}

/// 32-bit FNV-1a over raw bytes.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for &b in bytes {
        h ^= u32::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Roll a float in [0.0, 1.0]. Exactly 1.0 only for the hash 0xffffffff.
pub fn draw(seed: &Seed, round: Round, salt: &str) -> f64 {
    let key = format!("{seed}::round{round}::{salt}");
    f64::from(fnv1a32(key.as_bytes())) / f64::from(u32::MAX)
}

/// Map a draw onto the inclusive integer range [min, max].
pub fn draw_int(seed: &Seed, round: Round, salt: &str, min: i64, max: i64) -> i64 {
    if max <= min {
        return min;
    }
    let span = (max - min + 1) as f64;
    let value = (draw(seed, round, salt) * span).floor() as i64 + min;
    value.min(max)
}
