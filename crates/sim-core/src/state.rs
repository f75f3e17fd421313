//! Mutable simulation state and the derived view of available actions.

use crate::content::World;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kinds of accumulated resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Earned by most works, spends on tiers and upkeep.
    Money,
    /// Rebirth-gated currency for late tiers.
    Influence,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Money, ResourceKind::Influence];
}

/// Automation toggles; they survive rebirth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Promote to the best available work of the same kind.
    pub auto_work: bool,
    /// Move into the best housing the income can carry.
    pub auto_housing: bool,
    /// Buy each affordable tier once per tick.
    pub auto_buy_tiers: bool,
    /// Buy every affordable item.
    pub auto_buy_items: bool,
    /// Rebirth as soon as it is allowed.
    pub auto_rebirth: bool,
}

/// The live game state. Only the engine mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub resources: BTreeMap<ResourceKind, f64>,
    pub elapsed_days: u64,
    /// Name of the selected [`crate::WorkDef`].
    pub current_work: Option<String>,
    /// Name of the selected [`crate::HousingDef`].
    pub current_housing: Option<String>,
    /// Owned copies, one entry per catalog tier.
    pub owned_tier_levels: Vec<u32>,
    pub rebirth_count: u32,
    pub permanent_multipliers: BTreeMap<ResourceKind, f64>,
    /// Names of the items bought in this life.
    #[serde(default)]
    pub owned_items: BTreeSet<String>,
    #[serde(default)]
    pub options: Options,
}

impl State {
    /// Factory defaults for `world`.
    pub fn factory(world: &World) -> State {
        let mut resources = world.constants.starting_resources.clone();
        for kind in ResourceKind::ALL {
            resources.entry(kind).or_insert(0.0);
        }
        State {
            resources,
            elapsed_days: 0,
            current_work: None,
            current_housing: None,
            owned_tier_levels: vec![0; world.tiers.len()],
            rebirth_count: 0,
            permanent_multipliers: ResourceKind::ALL.iter().map(|k| (*k, 1.0)).collect(),
            owned_items: BTreeSet::new(),
            options: Options::default(),
        }
    }

    /// Amount held of `kind`; missing entries count as zero.
    pub fn resource(&self, kind: ResourceKind) -> f64 {
        self.resources.get(&kind).copied().unwrap_or(0.0)
    }

    /// Permanent multiplier for `kind`; missing entries count as one.
    pub fn multiplier(&self, kind: ResourceKind) -> f64 {
        self.permanent_multipliers.get(&kind).copied().unwrap_or(1.0)
    }

    pub fn owned(&self, tier: usize) -> u32 {
        self.owned_tier_levels.get(tier).copied().unwrap_or(0)
    }
}

/// Actions currently open to the player, derived from `(World, State)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub affordable_tier_indices: BTreeSet<usize>,
    /// Catalog order.
    pub available_work_names: Vec<String>,
    /// Catalog order.
    pub available_housing_names: Vec<String>,
    /// Unlocked, not yet owned and affordable; catalog order.
    pub affordable_item_names: Vec<String>,
    pub can_rebirth: bool,
}

/// Named snapshots saved by the player.
pub type PresetStore = BTreeMap<String, State>;
