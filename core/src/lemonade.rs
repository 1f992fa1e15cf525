//! Lemonade stand. One round is one day.
//!
//! The player buys supplies, picks a recipe and a price. Demand comes
//! from weather, temperature, the day's event, price, reputation and
//! recipe quality. Cups sold are capped by what the stock can make.
//!
//! Money is held in integer cents throughout.

use crate::{
    achievement::AchievementDef,
    catalog,
    config::{LemonadeConfig, StandEvent, StandMetric, StandWeather},
    draw::{draw, draw_int, salt},
    error::{SimError, SimResult},
    inventory::{adjust, amount, capacity, consume, settle, sum_deltas, Stock},
    rules::GameRules,
    scoring::GradeTable,
    types::{GameVariant, Round, Seed},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Supply {
    Lemons,
    Sugar,
    Ice,
    Cups,
}

impl Supply {
    pub const ALL: [Supply; 4] = [Supply::Lemons, Supply::Sugar, Supply::Ice, Supply::Cups];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandState {
    pub cash_cents:      i64,
    pub reputation:      i32,
    pub inventory:       Stock<Supply>,
    pub cups_sold_total: i64,
}

/// One day's choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandAction {
    pub lemons:      u32,
    pub sugar:       u32,
    pub ice:         u32,
    pub cups:        u32,
    pub recipe:      String,
    pub price_cents: u32,
}

impl StandAction {
    pub fn purchases(&self) -> [(Supply, i64); 4] {
        [
            (Supply::Lemons, i64::from(self.lemons)),
            (Supply::Sugar, i64::from(self.sugar)),
            (Supply::Ice, i64::from(self.ice)),
            (Supply::Cups, i64::from(self.cups)),
        ]
    }
}

/// What happened on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandDay {
    pub day:              Round,
    pub weather:          String,
    pub temperature:      i64,
    pub event:            String,
    pub demand:           i64,
    pub sold:             i64,
    pub revenue_cents:    i64,
    pub spent_cents:      i64,
    /// Units lost to spoilage and melting.
    pub spoiled:          i64,
    pub reputation_delta: i32,
}

impl StandDay {
    pub fn profit_cents(&self) -> i64 {
        self.revenue_cents - self.spent_cents
    }
}

pub struct LemonadeRules {
    config: LemonadeConfig,
}

impl LemonadeRules {
    pub fn new(config: LemonadeConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn standard() -> Self {
        Self { config: LemonadeConfig::standard() }
    }

    pub fn config(&self) -> &LemonadeConfig {
        &self.config
    }

    /// Customers who want a cup today. Factor order is fixed.
    #[allow(clippy::too_many_arguments)]
    fn demand(
        &self,
        seed:        &Seed,
        day:         Round,
        weather:     &StandWeather,
        event:       &StandEvent,
        temperature: i64,
        reputation:  i32,
        quality:     f64,
        price_cents: u32,
    ) -> i64 {
        let m = &self.config.demand;
        let temp_factor = (1.0 + (temperature as f64 - m.temp_pivot) * m.temp_slope).max(m.temp_floor);
        let price_factor =
            (m.reference_price_cents as f64 / f64::from(price_cents)).powf(m.price_elasticity);
        let rep_factor = 0.5 + f64::from(reputation) / 100.0;
        let noise = m.noise_floor + draw(seed, day, salt::DEMAND) * m.noise_span;

        let raw = m.base_customers
            * weather.demand_multiplier
            * event.demand_multiplier
            * temp_factor
            * price_factor
            * rep_factor
            * quality
            * noise;
        raw.floor().max(0.0) as i64
    }
}

impl GameRules for LemonadeRules {
    type State = StandState;
    type Action = StandAction;
    type RoundResult = StandDay;

    fn variant(&self) -> GameVariant {
        GameVariant::Lemonade
    }

    fn initial_state(&self) -> StandState {
        StandState {
            cash_cents:      self.config.starting_cash_cents,
            reputation:      self.config.starting_reputation,
            inventory:       Supply::ALL.iter().map(|s| (*s, 0)).collect(),
            cups_sold_total: 0,
        }
    }

    fn max_rounds(&self) -> Round {
        self.config.days
    }

    fn step(
        &self,
        seed:   &Seed,
        state:  StandState,
        day:    Round,
        action: &StandAction,
    ) -> SimResult<(StandState, StandDay)> {
        self.ensure_open(&state, day)?;

        let recipe = self
            .config
            .recipes
            .get(&action.recipe)
            .ok_or_else(|| SimError::UnknownReference {
                round: day,
                kind:  "recipe",
                key:   action.recipe.clone(),
            })?;
        if action.price_cents == 0 {
            return Err(SimError::InvalidAction {
                round:  day,
                reason: "price must be above zero".into(),
            });
        }

        let mut next = state;
        let prev_reputation = next.reputation;

        // 1. Purchases.
        let spent: i64 = action
            .purchases()
            .iter()
            .map(|(supply, qty)| qty * amount(&self.config.unit_costs_cents, supply))
            .sum();
        if spent > next.cash_cents {
            return Err(SimError::InvalidAction {
                round:  day,
                reason: format!("purchases cost {spent} cents, only {} on hand", next.cash_cents),
            });
        }
        for (supply, qty) in action.purchases() {
            adjust(&mut next.inventory, supply, qty);
        }
        next.cash_cents -= spent;

        // 2. Outcomes.
        let weather = self.config.weather.roll(seed, day, salt::WEATHER);
        let temperature = draw_int(seed, day, salt::TEMPERATURE, weather.temp_min, weather.temp_max);
        let event = self.config.events.roll(seed, day, salt::EVENT);

        // 3. Cups sold.
        let demand = self.demand(
            seed,
            day,
            weather,
            event,
            temperature,
            next.reputation,
            recipe.quality,
            action.price_cents,
        );
        let sold = capacity(&next.inventory, &recipe.requirements)
            .map_or(demand, |cap| cap.min(demand));

        // 4. Sales, spoilage, settle.
        consume(&mut next.inventory, &recipe.requirements, sold);
        let revenue = sold * i64::from(action.price_cents);
        next.cash_cents += revenue;
        next.cups_sold_total += sold;

        let spoil_draw = draw(seed, day, salt::SPOILAGE);
        let mut spoiled = 0;
        for supply in Supply::ALL {
            let held = amount(&next.inventory, &supply);
            let kept = match self.config.decay.get(&supply) {
                Some(decay) => settle(held as f64 * (1.0 - decay.rate(spoil_draw))),
                None => settle(held as f64),
            };
            spoiled += held.max(0) - kept;
            next.inventory.insert(supply, kept);
        }
        next.cash_cents = settle(next.cash_cents as f64);

        // 5. Reputation.
        let sell_through = if demand > 0 { sold as f64 / demand as f64 } else { 1.0 };
        let price_ratio =
            f64::from(action.price_cents) / self.config.demand.reference_price_cents as f64;
        let delta = sum_deltas(&self.config.reputation_rules, |metric| match metric {
            StandMetric::SellThrough => sell_through,
            StandMetric::PriceRatio  => price_ratio,
            StandMetric::Quality     => recipe.quality,
            StandMetric::CupsSold    => sold as f64,
        });
        next.reputation = (next.reputation + delta).clamp(0, 100);

        log::debug!(
            "day={day} {}/{} temp={temperature} demand={demand} sold={sold} cash={} rep={}",
            weather.label,
            event.label,
            next.cash_cents,
            next.reputation
        );

        let result = StandDay {
            day,
            weather:          weather.label.clone(),
            temperature,
            event:            event.label.clone(),
            demand,
            sold,
            revenue_cents:    revenue,
            spent_cents:      spent,
            spoiled,
            reputation_delta: next.reputation - prev_reputation,
        };
        Ok((next, result))
    }

    fn canonical(&self, day: Round, action: &StandAction) -> String {
        format!(
            "day={day};lemons={};sugar={};ice={};cups={};recipe={};price={}",
            action.lemons, action.sugar, action.ice, action.cups, action.recipe, action.price_cents
        )
    }

    fn score(&self, state: &StandState, _days: &[StandDay]) -> i64 {
        let s = &self.config.scoring;
        let profit = state.cash_cents - self.config.starting_cash_cents;
        profit / s.profit_divisor
            + i64::from(state.reputation) * s.reputation_weight
            + state.cups_sold_total / s.cups_divisor
    }

    fn grade_table(&self) -> &GradeTable {
        &self.config.grades
    }

    fn achievements(&self) -> &'static [AchievementDef<StandState, StandDay>] {
        catalog::LEMONADE
    }
}
