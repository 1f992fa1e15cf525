//! Seeded autopilot: a policy that plays legal actions on its own.
//!
//! RULE: the policy RNG only chooses *actions*. Game outcomes still come
//! from the draw function inside `GameRules::step`, so a log produced by
//! the autopilot replays exactly like one produced by a human.
//!
//! The policy stream is a Pcg64Mcg seeded from a u64, so the same
//! (seed, policy_seed) pair always produces the same game.

use crate::{
    colony::{ColonyAction, ColonyRules, ColonyState, Resource},
    error::SimResult,
    inventory::amount,
    lemonade::{LemonadeRules, StandAction, StandState, Supply},
    rules::GameRules,
    session::GameSession,
    types::Round,
};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Deterministic RNG for policy choices.
pub struct PolicyRng {
    inner: Pcg64Mcg,
}

impl PolicyRng {
    pub fn new(policy_seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(policy_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n). Returns 0 when `n` is 0.
    pub fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    /// Roll a u32 in [lo, hi].
    pub fn between(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        lo + self.below(u64::from(hi - lo) + 1) as u32
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.get(self.below(items.len() as u64) as usize)
    }
}

/// A ruleset that can suggest a legal action for any open round.
pub trait Autopilot: GameRules {
    fn suggest(&self, state: &Self::State, round: Round, rng: &mut PolicyRng) -> Self::Action;
}

/// Play up to `rounds` rounds (capped at the variant's length) with the
/// autopilot policy. Stops early once the game has ended.
pub fn autoplay<'r, R: Autopilot>(
    rules:       &'r R,
    seed:        &str,
    rounds:      Round,
    policy_seed: u64,
) -> SimResult<GameSession<'r, R>> {
    let mut rng = PolicyRng::new(policy_seed);
    let mut session = GameSession::new(rules, seed);
    let limit = rounds.min(rules.max_rounds());

    while session.next_round() <= limit && !session.is_finished() {
        let round = session.next_round();
        let action = rules.suggest(session.state(), round, &mut rng);
        session.play(action)?;
    }

    log::debug!(
        "autoplay '{seed}' ({}) policy={policy_seed}: {} rounds",
        rules.variant(),
        session.rounds().len()
    );
    Ok(session)
}

// ── Lemonade stand ────────────────────────────────────────────────

impl Autopilot for LemonadeRules {
    /// Spend part of the cash on enough supplies for a batch of cups.
    /// Purchases never exceed the cash on hand.
    fn suggest(&self, state: &StandState, _day: Round, rng: &mut PolicyRng) -> StandAction {
        let config = self.config();
        let keys: Vec<&String> = config.recipes.keys().collect();
        let recipe_key = rng.pick(&keys).map(|k| k.to_string()).unwrap_or_default();

        let mut action = StandAction {
            lemons:      0,
            sugar:       0,
            ice:         0,
            cups:        0,
            recipe:      recipe_key.clone(),
            price_cents: rng.between(50, 200),
        };
        let Some(recipe) = config.recipes.get(&recipe_key) else {
            return action;
        };

        let cost_per_cup: i64 = recipe
            .requirements
            .iter()
            .map(|(supply, per_cup)| per_cup * amount(&config.unit_costs_cents, supply))
            .sum();
        let budget = (state.cash_cents.max(0) as f64 * (0.3 + 0.6 * rng.next_f64())) as i64;
        let batch = if cost_per_cup > 0 { budget / cost_per_cup } else { 0 };

        for supply in Supply::ALL {
            let wanted = batch * amount(&recipe.requirements, &supply);
            let to_buy = (wanted - amount(&state.inventory, &supply)).max(0) as u32;
            match supply {
                Supply::Lemons => action.lemons = to_buy,
                Supply::Sugar  => action.sugar = to_buy,
                Supply::Ice    => action.ice = to_buy,
                Supply::Cups   => action.cups = to_buy,
            }
        }
        action
    }
}

// ── Mars colony ───────────────────────────────────────────────────

impl Autopilot for ColonyRules {
    /// Work on the scarcest life-support resource, top up stocks to two
    /// sols of need, and sometimes commission the cheapest unbuilt upgrade.
    fn suggest(&self, state: &ColonyState, _sol: Round, rng: &mut PolicyRng) -> ColonyAction {
        let config = self.config();
        let limits = config.ration;
        let ration_pct = rng.between(limits.min.max(90), limits.max.min(110)).clamp(limits.min, limits.max);

        let cover = |resource: &Resource| {
            let need = config.needs.get(resource).copied().unwrap_or(0.0) * state.colonists.max(1) as f64;
            amount(&state.stock, resource) as f64 / need.max(1.0)
        };
        let scarcest = [Resource::Oxygen, Resource::Water, Resource::Food]
            .into_iter()
            .min_by(|a, b| cover(a).total_cmp(&cover(b)))
            .unwrap_or(Resource::Food);
        let strategy = config
            .strategies
            .iter()
            .find(|(_, s)| s.output == scarcest)
            .or_else(|| config.strategies.iter().next())
            .map(|(key, _)| key.clone())
            .unwrap_or_default();

        let mut action = ColonyAction {
            food: 0,
            water: 0,
            oxygen: 0,
            strategy,
            ration_pct,
            build: None,
        };

        let mut credits = state.credits.max(0);
        for resource in [Resource::Oxygen, Resource::Water, Resource::Food] {
            let per_colonist = config.needs.get(&resource).copied().unwrap_or(0.0);
            let wanted = (per_colonist * state.colonists.max(0) as f64 * 2.0).ceil() as i64;
            let unit_cost = amount(&config.unit_costs, &resource);
            let mut qty = (wanted - amount(&state.stock, &resource)).max(0);
            if unit_cost > 0 {
                qty = qty.min(credits / unit_cost);
            }
            credits -= qty * unit_cost;
            match resource {
                Resource::Food   => action.food = qty as u32,
                Resource::Water  => action.water = qty as u32,
                Resource::Oxygen => action.oxygen = qty as u32,
                Resource::Power  => {}
            }
        }

        if rng.chance(0.25) {
            action.build = config
                .upgrades
                .iter()
                .filter(|(key, upgrade)| !state.upgrades.contains(*key) && upgrade.cost <= credits)
                .min_by_key(|(_, upgrade)| upgrade.cost)
                .map(|(key, _)| key.clone());
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_rng_is_reproducible() {
        let mut a = PolicyRng::new(7);
        let mut b = PolicyRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.below(1000), b.below(1000));
        }
    }

    #[test]
    fn between_stays_inclusive() {
        let mut rng = PolicyRng::new(3);
        for _ in 0..1000 {
            let v = rng.between(50, 55);
            assert!((50..=55).contains(&v));
        }
        assert_eq!(rng.between(9, 9), 9);
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn autoplay_respects_round_limit() {
        let rules = LemonadeRules::standard();
        let session = autoplay(&rules, "alice", 5, 1).unwrap();
        assert_eq!(session.rounds().len(), 5);
        assert_eq!(session.log().len(), 5);
    }
}
