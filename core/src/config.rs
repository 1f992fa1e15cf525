//! Per-variant rules configuration.
//!
//! A config is part of the recorded-game contract: two verifiers only
//! agree on a log when they run the same config. `standard()` is the
//! canonical ruleset; `load()` reads the same shape from JSON under
//! `data/` and validates it before use.

use crate::{
    colony::Resource,
    error::{SimError, SimResult},
    inventory::{Cmp, Decay, DeltaRule, Stock},
    lemonade::Supply,
    outcome::ThresholdTable,
    scoring::{Grade, GradeTable},
    types::Round,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
    let parsed = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
    Ok(parsed)
}

fn check_grades(name: &str, grades: &GradeTable) -> SimResult<()> {
    if grades.is_descending() {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!("{name}: grade breakpoints must descend")))
    }
}

// ── Lemonade stand ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Units of each supply per cup.
    pub requirements: Stock<Supply>,
    pub quality:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandWeather {
    pub label:             String,
    pub temp_min:          i64,
    pub temp_max:          i64,
    pub demand_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandEvent {
    pub label:             String,
    pub demand_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandModel {
    pub base_customers:        f64,
    pub reference_price_cents: i64,
    pub price_elasticity:      f64,
    /// Temperature at which the temperature factor is exactly 1.
    pub temp_pivot:            f64,
    pub temp_slope:            f64,
    pub temp_floor:            f64,
    pub noise_floor:           f64,
    pub noise_span:            f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandMetric {
    SellThrough,
    PriceRatio,
    Quality,
    CupsSold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandScoring {
    pub profit_divisor:    i64,
    pub reputation_weight: i64,
    pub cups_divisor:      i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemonadeConfig {
    pub days:                Round,
    pub starting_cash_cents: i64,
    pub starting_reputation: i32,
    pub unit_costs_cents:    Stock<Supply>,
    pub recipes:             BTreeMap<String, Recipe>,
    pub weather:             ThresholdTable<StandWeather>,
    pub events:              ThresholdTable<StandEvent>,
    pub demand:              DemandModel,
    pub decay:               BTreeMap<Supply, Decay>,
    pub reputation_rules:    Vec<DeltaRule<StandMetric>>,
    pub scoring:             StandScoring,
    pub grades:              GradeTable,
}

impl LemonadeConfig {
    /// Load from a JSON file, e.g. `data/lemonade.json`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.weather.validate("lemonade.weather")?;
        self.events.validate("lemonade.events")?;
        check_grades("lemonade.grades", &self.grades)?;
        if self.days == 0 {
            return Err(SimError::InvalidConfig("lemonade.days must be > 0".into()));
        }
        if self.recipes.is_empty() {
            return Err(SimError::InvalidConfig("lemonade.recipes is empty".into()));
        }
        if let Some(w) = self.weather.bands().iter().find(|b| b.outcome.temp_min > b.outcome.temp_max) {
            return Err(SimError::InvalidConfig(format!(
                "lemonade.weather '{}': temp_min above temp_max",
                w.outcome.label
            )));
        }
        if self.demand.reference_price_cents <= 0
            || self.scoring.profit_divisor <= 0
            || self.scoring.cups_divisor <= 0
        {
            return Err(SimError::InvalidConfig(
                "lemonade: reference price and score divisors must be positive".into(),
            ));
        }
        Ok(())
    }

    /// The canonical 30-day stand.
    pub fn standard() -> Self {
        let weather = |label: &str, temp_min, temp_max, demand_multiplier| StandWeather {
            label: label.into(),
            temp_min,
            temp_max,
            demand_multiplier,
        };
        let event = |label: &str, demand_multiplier| StandEvent {
            label: label.into(),
            demand_multiplier,
        };
        let recipe = |lemons: i64, sugar: i64, ice: i64, cups: i64, quality: f64| Recipe {
            requirements: [
                (Supply::Lemons, lemons),
                (Supply::Sugar, sugar),
                (Supply::Ice, ice),
                (Supply::Cups, cups),
            ]
            .into(),
            quality,
        };
        let rule = |metric, cmp, threshold, delta| DeltaRule { metric, cmp, threshold, delta };

        Self {
            days: 30,
            starting_cash_cents: 2000,
            starting_reputation: 50,
            unit_costs_cents: [
                (Supply::Lemons, 20),
                (Supply::Sugar, 10),
                (Supply::Ice, 5),
                (Supply::Cups, 4),
            ]
            .into(),
            recipes: [
                ("classic".to_string(), recipe(1, 1, 2, 1, 1.0)),
                ("sweet".to_string(), recipe(1, 2, 2, 1, 1.1)),
                ("tart".to_string(), recipe(2, 1, 2, 1, 1.05)),
                ("premium".to_string(), recipe(2, 2, 3, 1, 1.3)),
            ]
            .into(),
            weather: ThresholdTable::from_pairs([
                (0.35, weather("sunny", 75, 92, 1.3)),
                (0.65, weather("cloudy", 60, 75, 1.0)),
                (0.80, weather("hot", 90, 104, 1.6)),
                (0.95, weather("rainy", 50, 65, 0.5)),
                (1.0, weather("stormy", 45, 60, 0.2)),
            ]),
            events: ThresholdTable::from_pairs([
                (0.80, event("none", 1.0)),
                (0.87, event("street_fair", 1.8)),
                (0.93, event("road_work", 0.6)),
                (0.98, event("competitor", 0.75)),
                (1.0, event("heat_advisory", 1.4)),
            ]),
            demand: DemandModel {
                base_customers:        40.0,
                reference_price_cents: 100,
                price_elasticity:      1.5,
                temp_pivot:            70.0,
                temp_slope:            0.02,
                temp_floor:            0.2,
                noise_floor:           0.85,
                noise_span:            0.3,
            },
            decay: [
                (Supply::Lemons, Decay { base: 0.1, spread: 0.1 }),
                (Supply::Ice, Decay { base: 1.0, spread: 0.0 }),
            ]
            .into(),
            reputation_rules: vec![
                rule(StandMetric::SellThrough, Cmp::Lt, 0.5, -3),
                rule(StandMetric::SellThrough, Cmp::Ge, 0.95, 1),
                rule(StandMetric::PriceRatio, Cmp::Gt, 1.5, -2),
                rule(StandMetric::PriceRatio, Cmp::Le, 0.8, 1),
                rule(StandMetric::Quality, Cmp::Ge, 1.2, 2),
                rule(StandMetric::CupsSold, Cmp::Lt, 1.0, -1),
            ],
            scoring: StandScoring {
                profit_divisor:    10,
                reputation_weight: 2,
                cups_divisor:      2,
            },
            grades: GradeTable::from_pairs([
                (1500, Grade::S),
                (900, Grade::A),
                (500, Grade::B),
                (250, Grade::C),
                (100, Grade::D),
            ]),
        }
    }
}

// ── Mars colony ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub output:     Resource,
    /// Target output per colonist per sol, before modifiers.
    pub per_worker: f64,
    /// Units of each input per unit of output.
    pub inputs:     Stock<Resource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpgradeEffect {
    SolarMultiplier { factor: f64 },
    OutputMultiplier { resource: Resource, factor: f64 },
    MoraleBonus { amount: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub cost:   i64,
    pub effect: UpgradeEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyWeather {
    pub label:            String,
    pub temp_min:         i64,
    pub temp_max:         i64,
    pub solar_multiplier: f64,
    pub morale:           i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyEvent {
    pub label:                 String,
    pub production_multiplier: f64,
    pub power_loss_pct:        i64,
    pub credits:               i64,
    pub morale:                i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColonyMetric {
    RationPct,
    Shortages,
    Shortfall,
    Upgrades,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationLimits {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyScoring {
    pub per_sol:         i64,
    pub per_colonist:    i64,
    pub per_morale:      i64,
    pub per_upgrade:     i64,
    pub credits_divisor: i64,
    pub per_death:       i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyConfig {
    pub sols:                Round,
    pub starting_credits:    i64,
    pub starting_morale:     i32,
    pub starting_colonists:  i64,
    pub starting_stock:      Stock<Resource>,
    pub unit_costs:          Stock<Resource>,
    pub strategies:          BTreeMap<String, Strategy>,
    pub upgrades:            BTreeMap<String, Upgrade>,
    pub weather:             ThresholdTable<ColonyWeather>,
    pub events:              ThresholdTable<ColonyEvent>,
    /// Consumption per colonist per sol. Food scales with the ration.
    pub needs:               BTreeMap<Resource, f64>,
    pub ration:              RationLimits,
    pub solar_base:          f64,
    pub income_per_colonist: i64,
    pub decay:               BTreeMap<Resource, Decay>,
    /// Order in which shortages cost lives.
    pub death_priority:      Vec<Resource>,
    pub morale_rules:        Vec<DeltaRule<ColonyMetric>>,
    pub scoring:             ColonyScoring,
    pub grades:              GradeTable,
}

impl ColonyConfig {
    /// Load from a JSON file, e.g. `data/colony.json`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.weather.validate("colony.weather")?;
        self.events.validate("colony.events")?;
        check_grades("colony.grades", &self.grades)?;
        if self.sols == 0 {
            return Err(SimError::InvalidConfig("colony.sols must be > 0".into()));
        }
        if self.strategies.is_empty() {
            return Err(SimError::InvalidConfig("colony.strategies is empty".into()));
        }
        if self.ration.min == 0 || self.ration.min > self.ration.max {
            return Err(SimError::InvalidConfig("colony.ration limits are inverted".into()));
        }
        for resource in &self.death_priority {
            if self.needs.get(resource).copied().unwrap_or(0.0) <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "colony.death_priority: {resource:?} has no positive need"
                )));
            }
        }
        if self.scoring.credits_divisor <= 0 {
            return Err(SimError::InvalidConfig(
                "colony.scoring.credits_divisor must be positive".into(),
            ));
        }
        Ok(())
    }

    /// The canonical 60-sol colony.
    pub fn standard() -> Self {
        let weather = |label: &str, temp_min, temp_max, solar_multiplier, morale| ColonyWeather {
            label: label.into(),
            temp_min,
            temp_max,
            solar_multiplier,
            morale,
        };
        let event = |label: &str, production_multiplier, power_loss_pct, credits, morale| {
            ColonyEvent {
                label: label.into(),
                production_multiplier,
                power_loss_pct,
                credits,
                morale,
            }
        };
        let strategy = |output: Resource, per_worker: f64, water: i64, power: i64| Strategy {
            output,
            per_worker,
            inputs: [(Resource::Water, water), (Resource::Power, power)]
                .into_iter()
                .filter(|(_, per_unit)| *per_unit > 0)
                .collect(),
        };
        let upgrade = |cost, effect| Upgrade { cost, effect };
        let rule = |metric, cmp, threshold, delta| DeltaRule { metric, cmp, threshold, delta };

        Self {
            sols: 60,
            starting_credits: 1000,
            starting_morale: 70,
            starting_colonists: 10,
            starting_stock: [
                (Resource::Food, 60),
                (Resource::Water, 80),
                (Resource::Oxygen, 60),
                (Resource::Power, 50),
            ]
            .into(),
            unit_costs: [
                (Resource::Food, 4),
                (Resource::Water, 3),
                (Resource::Oxygen, 5),
            ]
            .into(),
            strategies: [
                ("hydroponics".to_string(), strategy(Resource::Food, 3.0, 1, 1)),
                ("ice_mining".to_string(), strategy(Resource::Water, 4.0, 0, 2)),
                ("electrolysis".to_string(), strategy(Resource::Oxygen, 4.0, 1, 1)),
            ]
            .into(),
            upgrades: [
                (
                    "solar_array".to_string(),
                    upgrade(300, UpgradeEffect::SolarMultiplier { factor: 1.5 }),
                ),
                (
                    "greenhouse".to_string(),
                    upgrade(250, UpgradeEffect::OutputMultiplier { resource: Resource::Food, factor: 1.4 }),
                ),
                (
                    "water_reclaimer".to_string(),
                    upgrade(250, UpgradeEffect::OutputMultiplier { resource: Resource::Water, factor: 1.4 }),
                ),
                (
                    "oxygen_garden".to_string(),
                    upgrade(250, UpgradeEffect::OutputMultiplier { resource: Resource::Oxygen, factor: 1.4 }),
                ),
                (
                    "habitat_dome".to_string(),
                    upgrade(400, UpgradeEffect::MoraleBonus { amount: 5 }),
                ),
            ]
            .into(),
            weather: ThresholdTable::from_pairs([
                (0.50, weather("clear", -80, -20, 1.0, 0)),
                (0.75, weather("hazy", -85, -30, 0.75, 0)),
                (0.92, weather("dust_storm", -95, -45, 0.35, -3)),
                (1.0, weather("cold_snap", -120, -80, 0.8, -2)),
            ]),
            events: ThresholdTable::from_pairs([
                (0.75, event("none", 1.0, 0, 0, 0)),
                (0.82, event("meteor_shower", 0.85, 25, 0, -4)),
                (0.90, event("equipment_fault", 0.7, 0, 0, -2)),
                (0.96, event("supply_drop", 1.0, 0, 150, 3)),
                (1.0, event("breakthrough", 1.25, 0, 0, 5)),
            ]),
            needs: [
                (Resource::Food, 2.0),
                (Resource::Water, 2.0),
                (Resource::Oxygen, 1.0),
            ]
            .into(),
            ration: RationLimits { min: 50, max: 150 },
            solar_base: 40.0,
            income_per_colonist: 5,
            decay: [(Resource::Food, Decay { base: 0.02, spread: 0.03 })].into(),
            death_priority: vec![Resource::Oxygen, Resource::Water, Resource::Food],
            morale_rules: vec![
                rule(ColonyMetric::RationPct, Cmp::Lt, 75.0, -5),
                rule(ColonyMetric::RationPct, Cmp::Ge, 120.0, 3),
                rule(ColonyMetric::Shortages, Cmp::Ge, 1.0, -10),
                rule(ColonyMetric::Shortages, Cmp::Ge, 2.0, -10),
                rule(ColonyMetric::Shortfall, Cmp::Gt, 0.5, -2),
                rule(ColonyMetric::Upgrades, Cmp::Ge, 3.0, 1),
            ],
            scoring: ColonyScoring {
                per_sol:         10,
                per_colonist:    25,
                per_morale:      2,
                per_upgrade:     50,
                credits_divisor: 10,
                per_death:       40,
            },
            grades: GradeTable::from_pairs([
                (3500, Grade::S),
                (2500, Grade::A),
                (1600, Grade::B),
                (900, Grade::C),
                (400, Grade::D),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_configs_validate() {
        LemonadeConfig::standard().validate().unwrap();
        ColonyConfig::standard().validate().unwrap();
    }

    #[test]
    fn standard_config_survives_json() {
        let lemonade = LemonadeConfig::standard();
        let json = serde_json::to_string(&lemonade).unwrap();
        let back: LemonadeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lemonade);

        let colony = ColonyConfig::standard();
        let json = serde_json::to_string(&colony).unwrap();
        let back: ColonyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, colony);
    }

    #[test]
    fn broken_table_is_rejected() {
        let mut config = LemonadeConfig::standard();
        config.events = ThresholdTable::from_pairs([(0.5, StandEvent {
            label: "none".into(),
            demand_multiplier: 1.0,
        })]);
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }
}
