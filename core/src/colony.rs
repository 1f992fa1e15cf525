//! Mars colony. One round is one sol.
//!
//! The player orders supplies, assigns the crew to one production
//! strategy, sets the food ration and may commission one upgrade per sol.
//! Colonists consume food, water and oxygen every sol; a resource that
//! runs negative before settling costs lives in `death_priority` order.

use crate::{
    achievement::AchievementDef,
    catalog,
    config::{ColonyConfig, ColonyMetric, UpgradeEffect},
    draw::{draw, draw_int, salt},
    error::{SimError, SimResult},
    inventory::{adjust, amount, capacity, consume, round_half_up, settle, sum_deltas, Stock},
    rules::GameRules,
    scoring::GradeTable,
    types::{GameVariant, Round, Seed},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Food,
    Water,
    Oxygen,
    Power,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Food, Resource::Water, Resource::Oxygen, Resource::Power];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyState {
    pub credits:      i64,
    pub morale:       i32,
    pub colonists:    i64,
    pub stock:        Stock<Resource>,
    pub upgrades:     BTreeSet<String>,
    pub deaths_total: i64,
}

/// One sol's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColonyAction {
    pub food:       u32,
    pub water:      u32,
    pub oxygen:     u32,
    pub strategy:   String,
    pub ration_pct: u32,
    #[serde(default)]
    pub build:      Option<String>,
}

impl ColonyAction {
    pub fn purchases(&self) -> [(Resource, i64); 3] {
        [
            (Resource::Food, i64::from(self.food)),
            (Resource::Water, i64::from(self.water)),
            (Resource::Oxygen, i64::from(self.oxygen)),
        ]
    }
}

/// What happened on one sol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonySol {
    pub sol:             Round,
    pub weather:         String,
    pub temperature:     i64,
    pub event:           String,
    pub output:          Resource,
    pub target:          i64,
    pub produced:        i64,
    pub power_generated: i64,
    /// Resources that ran negative before settling, with the deficit.
    pub shortages:       Vec<(Resource, i64)>,
    pub deaths:          i64,
    pub morale_delta:    i32,
    pub built:           Option<String>,
    pub colonists_after: i64,
}

pub struct ColonyRules {
    config: ColonyConfig,
}

impl ColonyRules {
    pub fn new(config: ColonyConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn standard() -> Self {
        Self { config: ColonyConfig::standard() }
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    fn solar_multiplier(&self, upgrades: &BTreeSet<String>) -> f64 {
        self.effects(upgrades)
            .filter_map(|effect| match effect {
                UpgradeEffect::SolarMultiplier { factor } => Some(*factor),
                _ => None,
            })
            .product()
    }

    fn output_multiplier(&self, upgrades: &BTreeSet<String>, output: Resource) -> f64 {
        self.effects(upgrades)
            .filter_map(|effect| match effect {
                UpgradeEffect::OutputMultiplier { resource, factor } if *resource == output => {
                    Some(*factor)
                }
                _ => None,
            })
            .product()
    }

    fn morale_bonus(&self, upgrades: &BTreeSet<String>) -> i32 {
        self.effects(upgrades)
            .filter_map(|effect| match effect {
                UpgradeEffect::MoraleBonus { amount } => Some(*amount),
                _ => None,
            })
            .sum()
    }

    /// Effects of built upgrades, in key order.
    fn effects<'a>(&'a self, upgrades: &'a BTreeSet<String>) -> impl Iterator<Item = &'a UpgradeEffect> {
        upgrades
            .iter()
            .filter_map(|key| self.config.upgrades.get(key))
            .map(|upgrade| &upgrade.effect)
    }

    /// Per-colonist need for one sol. Food scales with the ration.
    fn need(&self, resource: Resource, ration_pct: u32) -> f64 {
        let base = self.config.needs.get(&resource).copied().unwrap_or(0.0);
        if resource == Resource::Food {
            base * f64::from(ration_pct) / 100.0
        } else {
            base
        }
    }
}

impl GameRules for ColonyRules {
    type State = ColonyState;
    type Action = ColonyAction;
    type RoundResult = ColonySol;

    fn variant(&self) -> GameVariant {
        GameVariant::Colony
    }

    fn initial_state(&self) -> ColonyState {
        let mut stock: Stock<Resource> = Resource::ALL.iter().map(|r| (*r, 0)).collect();
        stock.extend(self.config.starting_stock.iter().map(|(r, v)| (*r, *v)));
        ColonyState {
            credits:      self.config.starting_credits,
            morale:       self.config.starting_morale,
            colonists:    self.config.starting_colonists,
            stock,
            upgrades:     BTreeSet::new(),
            deaths_total: 0,
        }
    }

    fn max_rounds(&self) -> Round {
        self.config.sols
    }

    fn has_ended(&self, state: &ColonyState) -> bool {
        state.colonists <= 0
    }

    fn step(
        &self,
        seed:   &Seed,
        state:  ColonyState,
        sol:    Round,
        action: &ColonyAction,
    ) -> SimResult<(ColonyState, ColonySol)> {
        self.ensure_open(&state, sol)?;

        let strategy = self
            .config
            .strategies
            .get(&action.strategy)
            .ok_or_else(|| SimError::UnknownReference {
                round: sol,
                kind:  "strategy",
                key:   action.strategy.clone(),
            })?;
        let ration = &self.config.ration;
        if action.ration_pct < ration.min || action.ration_pct > ration.max {
            return Err(SimError::InvalidAction {
                round:  sol,
                reason: format!(
                    "ration {}% outside {}..={}",
                    action.ration_pct, ration.min, ration.max
                ),
            });
        }

        let mut next = state;

        // 1. Purchases and construction.
        let mut spent: i64 = action
            .purchases()
            .iter()
            .map(|(resource, qty)| qty * amount(&self.config.unit_costs, resource))
            .sum();
        if let Some(key) = &action.build {
            let upgrade = self.config.upgrades.get(key).ok_or_else(|| SimError::UnknownReference {
                round: sol,
                kind:  "upgrade",
                key:   key.clone(),
            })?;
            if next.upgrades.contains(key) {
                return Err(SimError::InvalidAction {
                    round:  sol,
                    reason: format!("upgrade '{key}' is already built"),
                });
            }
            spent += upgrade.cost;
        }
        if spent > next.credits {
            return Err(SimError::InvalidAction {
                round:  sol,
                reason: format!("orders cost {spent} credits, only {} on hand", next.credits),
            });
        }
        for (resource, qty) in action.purchases() {
            adjust(&mut next.stock, resource, qty);
        }
        if let Some(key) = &action.build {
            next.upgrades.insert(key.clone());
        }
        next.credits -= spent;

        // 2. Outcomes.
        let weather = self.config.weather.roll(seed, sol, salt::WEATHER);
        let temperature = draw_int(seed, sol, salt::TEMPERATURE, weather.temp_min, weather.temp_max);
        let event = self.config.events.roll(seed, sol, salt::EVENT);

        // 3. Power, then production.
        let solar = self.config.solar_base
            * weather.solar_multiplier
            * self.solar_multiplier(&next.upgrades);
        let power_generated = solar.floor() as i64;
        adjust(&mut next.stock, Resource::Power, power_generated);
        let power_lost = amount(&next.stock, &Resource::Power).max(0) * event.power_loss_pct / 100;
        adjust(&mut next.stock, Resource::Power, -power_lost);
        next.credits += event.credits;

        let target = (next.colonists as f64
            * strategy.per_worker
            * event.production_multiplier
            * self.output_multiplier(&next.upgrades, strategy.output))
        .floor()
        .max(0.0) as i64;
        let produced = capacity(&next.stock, &strategy.inputs).map_or(target, |cap| cap.min(target));
        consume(&mut next.stock, &strategy.inputs, produced);
        adjust(&mut next.stock, strategy.output, produced);

        // 4. Consumption, spoilage, settle.
        for resource in Resource::ALL {
            let need = self.need(resource, action.ration_pct);
            if need > 0.0 {
                let total = round_half_up(need * next.colonists as f64);
                adjust(&mut next.stock, resource, -total);
            }
        }
        let shortages: Vec<(Resource, i64)> = Resource::ALL
            .iter()
            .map(|r| (*r, amount(&next.stock, r)))
            .filter(|(_, v)| *v < 0)
            .map(|(r, v)| (r, -v))
            .collect();
        next.credits += self.config.income_per_colonist * next.colonists;

        let spoil_draw = draw(seed, sol, salt::SPOILAGE);
        for resource in Resource::ALL {
            let held = amount(&next.stock, &resource);
            let kept = match self.config.decay.get(&resource) {
                Some(decay) => settle(held as f64 * (1.0 - decay.rate(spoil_draw))),
                None => settle(held as f64),
            };
            next.stock.insert(resource, kept);
        }
        next.credits = settle(next.credits as f64);

        // 5. Morale.
        let shortfall = if target > 0 {
            1.0 - produced as f64 / target as f64
        } else {
            0.0
        };
        let rules_delta = sum_deltas(&self.config.morale_rules, |metric| match metric {
            ColonyMetric::RationPct => f64::from(action.ration_pct),
            ColonyMetric::Shortages => shortages.len() as f64,
            ColonyMetric::Shortfall => shortfall,
            ColonyMetric::Upgrades  => next.upgrades.len() as f64,
        });
        let prev_morale = next.morale;
        let delta = rules_delta + weather.morale + event.morale + self.morale_bonus(&next.upgrades);
        next.morale = (next.morale + delta).clamp(0, 100);

        // 6. Deaths, in priority order, capped at the population.
        let mut deaths = 0;
        for resource in &self.config.death_priority {
            let Some((_, deficit)) = shortages.iter().find(|(r, _)| r == resource) else {
                continue;
            };
            let per_colonist = self.need(*resource, action.ration_pct).max(f64::MIN_POSITIVE);
            let lost = (*deficit as f64 / per_colonist).ceil() as i64;
            deaths = (deaths + lost).min(next.colonists);
        }
        next.colonists -= deaths;
        next.deaths_total += deaths;

        if deaths > 0 {
            log::warn!("sol={sol} {deaths} colonists lost, {} remain", next.colonists);
        }
        log::debug!(
            "sol={sol} {}/{} {}={produced}/{target} power+{power_generated} morale={} credits={}",
            weather.label,
            event.label,
            action.strategy,
            next.morale,
            next.credits
        );

        let result = ColonySol {
            sol,
            weather:         weather.label.clone(),
            temperature,
            event:           event.label.clone(),
            output:          strategy.output,
            target,
            produced,
            power_generated,
            shortages,
            deaths,
            morale_delta:    next.morale - prev_morale,
            built:           action.build.clone(),
            colonists_after: next.colonists,
        };
        Ok((next, result))
    }

    fn canonical(&self, sol: Round, action: &ColonyAction) -> String {
        format!(
            "sol={sol};food={};water={};oxygen={};strategy={};ration={};build={}",
            action.food,
            action.water,
            action.oxygen,
            action.strategy,
            action.ration_pct,
            action.build.as_deref().unwrap_or("-")
        )
    }

    fn score(&self, state: &ColonyState, sols: &[ColonySol]) -> i64 {
        let s = &self.config.scoring;
        let survived = sols.iter().filter(|sol| sol.colonists_after > 0).count() as i64;
        survived * s.per_sol
            + state.colonists * s.per_colonist
            + i64::from(state.morale) * s.per_morale
            + state.upgrades.len() as i64 * s.per_upgrade
            + state.credits / s.credits_divisor
            - state.deaths_total * s.per_death
    }

    fn grade_table(&self) -> &GradeTable {
        &self.config.grades
    }

    fn achievements(&self) -> &'static [AchievementDef<ColonyState, ColonySol>] {
        catalog::COLONY
    }
}
