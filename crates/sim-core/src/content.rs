//! Immutable game catalog: tiers, works, housing, items and global constants.

use crate::state::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A purchasable, stacking upgrade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierDef {
    /// Position in the catalog, equal to the tier's index.
    pub level: usize,
    /// Human-readable name.
    pub name: String,
    /// Price of the first copy.
    pub base_cost: f64,
    /// Geometric growth applied per owned copy (>= 1).
    pub cost_growth: f64,
    /// Output added to the tier sum per owned copy.
    pub production: f64,
    /// Resource the tier is paid with.
    pub currency: ResourceKind,
}

/// Condition that gates a work or housing option.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockCondition {
    /// Available from the start.
    Always,
    /// At least `count` copies of tier `tier` owned.
    TierOwned { tier: usize, count: u32 },
    /// At least this many rebirths performed.
    Rebirths(u32),
    /// At least `amount` of `kind` held.
    Resource { kind: ResourceKind, amount: f64 },
}

/// An occupation; the selected one sets the base production rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkDef {
    /// Stable identifier used by commands and saves.
    pub name: String,
    pub display_name: String,
    /// Production per day before multipliers.
    pub base_rate: f64,
    /// Resource credited by this work.
    pub produces: ResourceKind,
    pub unlock: UnlockCondition,
}

/// A place to live; multiplies production and costs Money every day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HousingDef {
    /// Stable identifier used by commands and saves.
    pub name: String,
    pub display_name: String,
    /// Production multiplier (>= 1 for any sensible housing).
    pub bonus: f64,
    /// Money charged per day while selected.
    pub upkeep: f64,
    pub unlock: UnlockCondition,
}

/// A one-time purchase that multiplies the output of one work for the rest
/// of the current life.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    pub display_name: String,
    /// Money price.
    pub cost: f64,
    /// Name of the boosted [`WorkDef`].
    pub work: String,
    /// Output multiplier while owned (>= 1).
    pub factor: f64,
    pub unlock: UnlockCondition,
}

/// Rules for the prestige reset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebirthRules {
    /// Days that must have elapsed before a rebirth is allowed.
    pub min_elapsed_days: u64,
    pub days_per_year: u64,
    /// Multiplier gained per year lived.
    pub year_weight: f64,
    /// Multiplier gained per rank of the highest owned tier.
    pub tier_weight: f64,
}

/// Global constants of a catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldConstants {
    /// Days added by one tick.
    pub days_per_tick: u32,
    /// Resources of a fresh life.
    pub starting_resources: BTreeMap<ResourceKind, f64>,
    pub rebirth: RebirthRules,
}

/// Read-only content catalog shared by every component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Content version, stamped into every save.
    pub version: String,
    pub tiers: Vec<TierDef>,
    pub works: Vec<WorkDef>,
    pub housing: Vec<HousingDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    pub constants: WorldConstants,
}

impl World {
    /// Built-in content shipped with the game.
    pub fn factory() -> World {
        let tiers = vec![
            tier(0, "Hand Tools", 10.0, 1.15, 0.5, ResourceKind::Money),
            tier(1, "Workshop", 150.0, 1.18, 3.0, ResourceKind::Money),
            tier(2, "Guild Hall", 2_500.0, 1.2, 20.0, ResourceKind::Money),
            tier(3, "Trade Charter", 50.0, 1.25, 100.0, ResourceKind::Influence),
        ];
        let works = vec![
            work("mines", "The Mines", 0.5, ResourceKind::Money, UnlockCondition::Always),
            work(
                "latrine",
                "Latrine Duty",
                1.0,
                ResourceKind::Money,
                UnlockCondition::TierOwned { tier: 0, count: 5 },
            ),
            work(
                "galley_rower",
                "Galley Rower",
                2.5,
                ResourceKind::Money,
                UnlockCondition::TierOwned { tier: 1, count: 3 },
            ),
            work(
                "fields",
                "Field Work",
                5.0,
                ResourceKind::Money,
                UnlockCondition::TierOwned { tier: 1, count: 10 },
            ),
            work(
                "mill",
                "Mill Worker",
                9.0,
                ResourceKind::Money,
                UnlockCondition::TierOwned { tier: 2, count: 5 },
            ),
            work(
                "scribe",
                "Scribe",
                0.2,
                ResourceKind::Influence,
                UnlockCondition::Rebirths(1),
            ),
            work(
                "weaver",
                "Weaver",
                14.0,
                ResourceKind::Money,
                UnlockCondition::Rebirths(2),
            ),
        ];
        let housing = vec![
            housing("homeless", "Homeless", 1.0, 0.0, UnlockCondition::Always),
            housing(
                "shack",
                "Shack",
                1.25,
                1.0,
                UnlockCondition::Resource {
                    kind: ResourceKind::Money,
                    amount: 50.0,
                },
            ),
            housing(
                "cottage",
                "Cottage",
                1.6,
                5.0,
                UnlockCondition::TierOwned { tier: 1, count: 1 },
            ),
            housing(
                "townhouse",
                "Townhouse",
                2.2,
                25.0,
                UnlockCondition::TierOwned { tier: 2, count: 1 },
            ),
            housing("manor", "Manor", 3.5, 120.0, UnlockCondition::Rebirths(1)),
        ];
        let items = vec![
            item("iron_pickaxe", "Iron Pickaxe", 1_000.0, "mines", 2.0, UnlockCondition::Always),
            item(
                "oars",
                "Balanced Oars",
                4_000.0,
                "galley_rower",
                2.0,
                UnlockCondition::TierOwned { tier: 1, count: 5 },
            ),
            item(
                "pitchfork",
                "Pitchfork",
                16_000.0,
                "fields",
                2.0,
                UnlockCondition::Rebirths(1),
            ),
        ];
        let starting_resources = BTreeMap::from([
            (ResourceKind::Money, 10.0),
            (ResourceKind::Influence, 0.0),
        ]);
        debug!(
            tiers = tiers.len(),
            works = works.len(),
            housing = housing.len(),
            items = items.len(),
            "built factory catalog"
        );
        World {
            version: "1".to_string(),
            tiers,
            works,
            housing,
            items,
            constants: WorldConstants {
                days_per_tick: 1,
                starting_resources,
                rebirth: RebirthRules {
                    min_elapsed_days: 3_650,
                    days_per_year: 365,
                    year_weight: 0.05,
                    tier_weight: 0.25,
                },
            },
        }
    }

    pub fn tier(&self, index: usize) -> Option<&TierDef> {
        self.tiers.get(index)
    }

    pub fn work(&self, name: &str) -> Option<&WorkDef> {
        self.works.iter().find(|w| w.name == name)
    }

    pub fn housing(&self, name: &str) -> Option<&HousingDef> {
        self.housing.iter().find(|h| h.name == name)
    }

    pub fn item(&self, name: &str) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.name == name)
    }
}

fn tier(
    level: usize,
    name: &str,
    base_cost: f64,
    cost_growth: f64,
    production: f64,
    currency: ResourceKind,
) -> TierDef {
    TierDef {
        level,
        name: name.to_string(),
        base_cost,
        cost_growth,
        production,
        currency,
    }
}

fn work(
    name: &str,
    display_name: &str,
    base_rate: f64,
    produces: ResourceKind,
    unlock: UnlockCondition,
) -> WorkDef {
    WorkDef {
        name: name.to_string(),
        display_name: display_name.to_string(),
        base_rate,
        produces,
        unlock,
    }
}

fn housing(
    name: &str,
    display_name: &str,
    bonus: f64,
    upkeep: f64,
    unlock: UnlockCondition,
) -> HousingDef {
    HousingDef {
        name: name.to_string(),
        display_name: display_name.to_string(),
        bonus,
        upkeep,
        unlock,
    }
}

fn item(
    name: &str,
    display_name: &str,
    cost: f64,
    work: &str,
    factor: f64,
    unlock: UnlockCondition,
) -> ItemDef {
    ItemDef {
        name: name.to_string(),
        display_name: display_name.to_string(),
        cost,
        work: work.to_string(),
        factor,
        unlock,
    }
}
