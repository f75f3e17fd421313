#![deny(warnings)]

//! Economic rules: tier pricing, purchases, unlocks, production and the
//! prestige curve.
//!
//! Every function here is pure over a [`World`] and a [`State`]; the ones
//! that take `&mut State` either apply their whole effect or return an
//! error without touching it.

pub mod automation;

use sim_core::{
    HousingDef, Input, ItemDef, RebirthRules, ResourceKind, State, TierDef, UnlockCondition,
    WorkDef, World,
};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Which catalog list a rejected name or index was looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Tier,
    Work,
    Housing,
    Item,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptionKind::Tier => "tier",
            OptionKind::Work => "work",
            OptionKind::Housing => "housing",
            OptionKind::Item => "item",
        };
        f.write_str(s)
    }
}

/// Errors produced by economic commands.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// The tier's currency does not cover its current price.
    #[error("tier {tier} costs {cost} but only {available} is held")]
    InsufficientResources {
        tier: usize,
        cost: f64,
        available: f64,
    },
    /// Money does not cover the item's price.
    #[error("item {name} costs {cost} but only {available} is held")]
    ItemUnaffordable {
        name: String,
        cost: f64,
        available: f64,
    },
    #[error("item {0} is already owned")]
    ItemOwned(String),
    /// No unlocked option with this name or index.
    #[error("unknown or locked {kind}: {name}")]
    UnknownOption { kind: OptionKind, name: String },
}

/// Price of the next copy: `base_cost * cost_growth ^ owned`.
pub fn tier_cost(tier: &TierDef, owned: u32) -> f64 {
    tier.base_cost * tier.cost_growth.powf(f64::from(owned))
}

/// Whether tier `level` exists and its next copy is affordable.
pub fn can_buy_tier(world: &World, state: &State, level: usize) -> bool {
    match world.tier(level) {
        Some(t) => state.resource(t.currency) >= tier_cost(t, state.owned(level)),
        None => false,
    }
}

/// Buy one copy of tier `index`, returning the price paid.
pub fn buy_tier(world: &World, state: &mut State, index: usize) -> Result<f64, EconError> {
    let tier = match world.tier(index) {
        Some(t) if index < state.owned_tier_levels.len() => t,
        _ => {
            return Err(EconError::UnknownOption {
                kind: OptionKind::Tier,
                name: index.to_string(),
            })
        }
    };
    let owned = state.owned_tier_levels[index];
    let cost = tier_cost(tier, owned);
    let available = state.resource(tier.currency);
    if available < cost {
        return Err(EconError::InsufficientResources {
            tier: index,
            cost,
            available,
        });
    }
    state.resources.insert(tier.currency, available - cost);
    state.owned_tier_levels[index] = owned.saturating_add(1);
    debug!(tier = index, cost, owned = state.owned_tier_levels[index], "bought tier");
    Ok(cost)
}

/// Evaluate an unlock condition against the current state.
pub fn is_unlocked(condition: &UnlockCondition, state: &State) -> bool {
    match condition {
        UnlockCondition::Always => true,
        UnlockCondition::TierOwned { tier, count } => state.owned(*tier) >= *count,
        UnlockCondition::Rebirths(n) => state.rebirth_count >= *n,
        UnlockCondition::Resource { kind, amount } => state.resource(*kind) >= *amount,
    }
}

pub fn available_works<'w>(
    world: &'w World,
    state: &'w State,
) -> impl Iterator<Item = &'w WorkDef> + 'w {
    world.works.iter().filter(move |w| is_unlocked(&w.unlock, state))
}

pub fn available_housing<'w>(
    world: &'w World,
    state: &'w State,
) -> impl Iterator<Item = &'w HousingDef> + 'w {
    world.housing.iter().filter(move |h| is_unlocked(&h.unlock, state))
}

/// Select the active work.
pub fn set_work(world: &World, state: &mut State, name: &str) -> Result<(), EconError> {
    let work = world
        .work(name)
        .filter(|w| is_unlocked(&w.unlock, state))
        .ok_or_else(|| EconError::UnknownOption {
            kind: OptionKind::Work,
            name: name.to_string(),
        })?;
    state.current_work = Some(work.name.clone());
    Ok(())
}

/// Select the active housing.
pub fn set_housing(world: &World, state: &mut State, name: &str) -> Result<(), EconError> {
    let housing = world
        .housing(name)
        .filter(|h| is_unlocked(&h.unlock, state))
        .ok_or_else(|| EconError::UnknownOption {
            kind: OptionKind::Housing,
            name: name.to_string(),
        })?;
    state.current_housing = Some(housing.name.clone());
    Ok(())
}

/// Production of every owned tier copy; zero with no tiers.
pub fn tier_output(world: &World, state: &State) -> f64 {
    world
        .tiers
        .iter()
        .enumerate()
        .map(|(i, t)| f64::from(state.owned(i)) * t.production)
        .sum()
}

pub fn available_items<'w>(
    world: &'w World,
    state: &'w State,
) -> impl Iterator<Item = &'w ItemDef> + 'w {
    world
        .items
        .iter()
        .filter(move |i| !state.owned_items.contains(&i.name) && is_unlocked(&i.unlock, state))
}

/// Whether item `name` is unlocked, not owned yet and affordable.
pub fn can_buy_item(world: &World, state: &State, name: &str) -> bool {
    available_items(world, state)
        .any(|i| i.name == name && state.resource(ResourceKind::Money) >= i.cost)
}

/// Buy item `name` with Money, returning the price paid.
pub fn buy_item(world: &World, state: &mut State, name: &str) -> Result<f64, EconError> {
    let item = world
        .item(name)
        .filter(|i| is_unlocked(&i.unlock, state))
        .ok_or_else(|| EconError::UnknownOption {
            kind: OptionKind::Item,
            name: name.to_string(),
        })?;
    if state.owned_items.contains(name) {
        return Err(EconError::ItemOwned(name.to_string()));
    }
    let available = state.resource(ResourceKind::Money);
    if available < item.cost {
        return Err(EconError::ItemUnaffordable {
            name: name.to_string(),
            cost: item.cost,
            available,
        });
    }
    state
        .resources
        .insert(ResourceKind::Money, available - item.cost);
    state.owned_items.insert(item.name.clone());
    debug!(item = name, cost = item.cost, "bought item");
    Ok(item.cost)
}

/// Product of the factors of owned items boosting `work`.
pub fn item_multiplier(world: &World, state: &State, work: &str) -> f64 {
    world
        .items
        .iter()
        .filter(|i| i.work == work && state.owned_items.contains(&i.name))
        .map(|i| i.factor)
        .product()
}

fn current_housing<'w>(world: &'w World, state: &State) -> Option<&'w HousingDef> {
    state
        .current_housing
        .as_deref()
        .and_then(|name| world.housing(name))
}

/// What one tick of the selected work yields while living in `housing`.
pub fn projected_production(
    world: &World,
    state: &State,
    housing: Option<&HousingDef>,
) -> Option<(ResourceKind, f64)> {
    let work = state
        .current_work
        .as_deref()
        .and_then(|name| world.work(name))?;
    let bonus = housing.map_or(1.0, |h| h.bonus);
    let amount = work.base_rate
        * bonus
        * tier_output(world, state)
        * state.multiplier(work.produces)
        * item_multiplier(world, state, &work.name)
        * f64::from(world.constants.days_per_tick);
    Some((work.produces, amount))
}

/// What one tick of the current selection yields; `None` without work.
pub fn production_per_tick(world: &World, state: &State) -> Option<(ResourceKind, f64)> {
    projected_production(world, state, current_housing(world, state))
}

/// Money charged by the selected housing for one tick.
pub fn upkeep_per_tick(world: &World, state: &State) -> f64 {
    current_housing(world, state).map_or(0.0, |h| h.upkeep)
        * f64::from(world.constants.days_per_tick)
}

pub fn rebirth_eligible(rules: &RebirthRules, state: &State) -> bool {
    state.elapsed_days >= rules.min_elapsed_days
}

/// Index of the highest tier with at least one copy.
pub fn top_owned_tier(state: &State) -> Option<usize> {
    state.owned_tier_levels.iter().rposition(|&n| n > 0)
}

/// Multiplier earned by a life that lasted `elapsed_days` and reached
/// `top_tier`. Non-decreasing in both arguments and never below one.
pub fn prestige_factor(rules: &RebirthRules, elapsed_days: u64, top_tier: Option<usize>) -> f64 {
    let years = elapsed_days as f64 / rules.days_per_year.max(1) as f64;
    let rank = top_tier.map_or(0.0, |t| (t + 1) as f64);
    1.0 + rules.year_weight * years + rules.tier_weight * rank
}

/// Recompute the derived view of available actions.
pub fn derive_input(world: &World, state: &State) -> Input {
    Input {
        affordable_tier_indices: (0..world.tiers.len())
            .filter(|&i| can_buy_tier(world, state, i))
            .collect(),
        available_work_names: available_works(world, state)
            .map(|w| w.name.clone())
            .collect(),
        available_housing_names: available_housing(world, state)
            .map(|h| h.name.clone())
            .collect(),
        affordable_item_names: available_items(world, state)
            .filter(|i| state.resource(ResourceKind::Money) >= i.cost)
            .map(|i| i.name.clone())
            .collect(),
        can_rebirth: rebirth_eligible(&world.constants.rebirth, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fresh() -> (World, State) {
        let world = World::factory();
        let state = State::factory(&world);
        (world, state)
    }

    #[test]
    fn cost_grows_geometrically() {
        let (world, _) = fresh();
        let t = &world.tiers[0];
        assert_eq!(tier_cost(t, 0), t.base_cost);
        assert!((tier_cost(t, 2) - t.base_cost * t.cost_growth * t.cost_growth).abs() < 1e-9);
    }

    #[test]
    fn buying_exact_balance_leaves_zero() {
        let (world, mut state) = fresh();
        let cost = tier_cost(&world.tiers[0], 0);
        state.resources.insert(ResourceKind::Money, cost);
        assert!(can_buy_tier(&world, &state, 0));
        assert_eq!(buy_tier(&world, &mut state, 0), Ok(cost));
        assert_eq!(state.resource(ResourceKind::Money), 0.0);
        assert_eq!(state.owned_tier_levels[0], 1);

        let before = state.clone();
        assert!(matches!(
            buy_tier(&world, &mut state, 0),
            Err(EconError::InsufficientResources { tier: 0, .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn out_of_range_tier_is_unknown() {
        let (world, mut state) = fresh();
        assert!(!can_buy_tier(&world, &state, 42));
        assert_eq!(
            buy_tier(&world, &mut state, 42),
            Err(EconError::UnknownOption {
                kind: OptionKind::Tier,
                name: "42".into()
            })
        );
    }

    #[test]
    fn influence_tier_ignores_money() {
        let (world, mut state) = fresh();
        state.resources.insert(ResourceKind::Money, 1.0e12);
        assert!(!can_buy_tier(&world, &state, 3));
        state.resources.insert(ResourceKind::Influence, 50.0);
        assert!(can_buy_tier(&world, &state, 3));
    }

    #[test]
    fn locked_work_is_rejected() {
        let (world, mut state) = fresh();
        let err = set_work(&world, &mut state, "latrine").unwrap_err();
        assert_eq!(
            err,
            EconError::UnknownOption {
                kind: OptionKind::Work,
                name: "latrine".into()
            }
        );
        assert!(state.current_work.is_none());

        state.owned_tier_levels[0] = 5;
        set_work(&world, &mut state, "latrine").unwrap();
        assert_eq!(state.current_work.as_deref(), Some("latrine"));
    }

    #[test]
    fn unknown_housing_keeps_selection() {
        let (world, mut state) = fresh();
        set_housing(&world, &mut state, "homeless").unwrap();
        assert!(set_housing(&world, &mut state, "palace").is_err());
        assert!(set_housing(&world, &mut state, "manor").is_err());
        assert_eq!(state.current_housing.as_deref(), Some("homeless"));
    }

    #[test]
    fn production_needs_work() {
        let (world, mut state) = fresh();
        assert_eq!(production_per_tick(&world, &state), None);
        set_work(&world, &mut state, "mines").unwrap();
        state.owned_tier_levels[0] = 2;
        // 0.5 * (2 * 0.5)
        assert_eq!(
            production_per_tick(&world, &state),
            Some((ResourceKind::Money, 0.5))
        );
        state.permanent_multipliers.insert(ResourceKind::Money, 2.0);
        assert_eq!(
            production_per_tick(&world, &state),
            Some((ResourceKind::Money, 1.0))
        );
    }

    #[test]
    fn no_tiers_no_output() {
        let (world, mut state) = fresh();
        set_work(&world, &mut state, "mines").unwrap();
        set_housing(&world, &mut state, "homeless").unwrap();
        state.permanent_multipliers.insert(ResourceKind::Money, 3.0);
        assert_eq!(tier_output(&world, &state), 0.0);
        assert_eq!(
            production_per_tick(&world, &state),
            Some((ResourceKind::Money, 0.0))
        );
    }

    #[test]
    fn item_purchase_and_boost() {
        let (world, mut state) = fresh();
        set_work(&world, &mut state, "mines").unwrap();
        state.owned_tier_levels[0] = 4;
        assert!(!can_buy_item(&world, &state, "iron_pickaxe"));
        let before = state.clone();
        assert!(matches!(
            buy_item(&world, &mut state, "iron_pickaxe"),
            Err(EconError::ItemUnaffordable { .. })
        ));
        assert_eq!(state, before);

        state.resources.insert(ResourceKind::Money, 1_000.0);
        assert!(derive_input(&world, &state)
            .affordable_item_names
            .contains(&"iron_pickaxe".to_string()));
        assert_eq!(buy_item(&world, &mut state, "iron_pickaxe"), Ok(1_000.0));
        assert_eq!(state.resource(ResourceKind::Money), 0.0);
        // 0.5 * (4 * 0.5) * 2
        assert_eq!(
            production_per_tick(&world, &state),
            Some((ResourceKind::Money, 2.0))
        );
        assert_eq!(item_multiplier(&world, &state, "latrine"), 1.0);

        state.resources.insert(ResourceKind::Money, 5_000.0);
        assert_eq!(
            buy_item(&world, &mut state, "iron_pickaxe"),
            Err(EconError::ItemOwned("iron_pickaxe".into()))
        );
        assert_eq!(
            buy_item(&world, &mut state, "pitchfork"),
            Err(EconError::UnknownOption {
                kind: OptionKind::Item,
                name: "pitchfork".into()
            })
        );
        assert!(derive_input(&world, &state).affordable_item_names.is_empty());
    }

    #[test]
    fn housing_scales_production() {
        let (world, mut state) = fresh();
        set_work(&world, &mut state, "mines").unwrap();
        state.owned_tier_levels[0] = 4;
        state.current_housing = Some("shack".into());
        // 0.5 * 1.25 * (4 * 0.5)
        assert_eq!(
            production_per_tick(&world, &state),
            Some((ResourceKind::Money, 1.25))
        );
        assert_eq!(upkeep_per_tick(&world, &state), 1.0);
    }

    #[test]
    fn input_lists_unlocked_options() {
        let (world, mut state) = fresh();
        let input = derive_input(&world, &state);
        assert_eq!(input.available_work_names, vec!["mines".to_string()]);
        assert_eq!(input.available_housing_names, vec!["homeless".to_string()]);
        assert!(input.affordable_tier_indices.contains(&0));
        assert!(!input.can_rebirth);

        state.rebirth_count = 1;
        state.elapsed_days = world.constants.rebirth.min_elapsed_days;
        let input = derive_input(&world, &state);
        assert!(input.available_work_names.contains(&"scribe".to_string()));
        assert!(input.available_housing_names.contains(&"manor".to_string()));
        assert!(input.can_rebirth);
    }

    #[test]
    fn prestige_factor_examples() {
        let rules = World::factory().constants.rebirth;
        assert_eq!(prestige_factor(&rules, 0, None), 1.0);
        // ten years and top tier index 1
        let f = prestige_factor(&rules, 3_650, Some(1));
        assert!((f - (1.0 + 0.5 + 0.5)).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn buy_succeeds_iff_affordable(money in 0.0f64..500.0, owned in 0u32..20, index in 0usize..5) {
            let (world, mut state) = fresh();
            state.resources.insert(ResourceKind::Money, money);
            if index < state.owned_tier_levels.len() {
                state.owned_tier_levels[index] = owned;
            }
            let affordable = can_buy_tier(&world, &state, index);
            let before = state.clone();
            match buy_tier(&world, &mut state, index) {
                Ok(cost) => {
                    prop_assert!(affordable);
                    let currency = world.tiers[index].currency;
                    prop_assert_eq!(cost, tier_cost(&world.tiers[index], owned));
                    prop_assert_eq!(state.resource(currency), before.resource(currency) - cost);
                    prop_assert_eq!(state.owned_tier_levels[index], owned + 1);
                    prop_assert!(state.resource(currency) >= 0.0);
                }
                Err(_) => {
                    prop_assert!(!affordable);
                    prop_assert_eq!(&state, &before);
                }
            }
        }

        #[test]
        fn cost_monotonic_in_owned(owned in 0u32..200) {
            let world = World::factory();
            for t in &world.tiers {
                prop_assert!(tier_cost(t, owned + 1) >= tier_cost(t, owned));
            }
        }

        #[test]
        fn prestige_monotonic(days in 0u64..100_000, extra in 0u64..10_000, top in 0usize..4) {
            let rules = World::factory().constants.rebirth;
            let base = prestige_factor(&rules, days, Some(top));
            prop_assert!(base >= 1.0);
            prop_assert!(prestige_factor(&rules, days + extra, Some(top)) >= base);
            prop_assert!(prestige_factor(&rules, days, Some(top + 1)) >= base);
            prop_assert!(prestige_factor(&rules, days, None) <= base);
        }
    }
}
