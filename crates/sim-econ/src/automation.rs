//! Player automation, applied at the start of a tick for enabled options.

use crate::{
    available_housing, available_items, available_works, buy_item, buy_tier, can_buy_tier,
    projected_production,
};
use sim_core::{ResourceKind, State, World};

/// Switch to the last unlocked work that produces the same resource as the
/// current one (Money when idle). Returns whether the selection changed.
pub fn promote_work(world: &World, state: &mut State) -> bool {
    let kind = state
        .current_work
        .as_deref()
        .and_then(|name| world.work(name))
        .map_or(ResourceKind::Money, |w| w.produces);
    let best = available_works(world, state)
        .filter(|w| w.produces == kind)
        .last()
        .map(|w| w.name.clone());
    match best {
        Some(name) if state.current_work.as_deref() != Some(name.as_str()) => {
            state.current_work = Some(name);
            true
        }
        _ => false,
    }
}

/// Move into the last unlocked housing, later in the catalog than the
/// current one, whose upkeep stays below the Money it would let us earn.
pub fn upgrade_housing(world: &World, state: &mut State) -> bool {
    let current_index = state
        .current_housing
        .as_deref()
        .and_then(|name| world.housing.iter().position(|h| h.name == name));
    let days = f64::from(world.constants.days_per_tick);
    let best = available_housing(world, state)
        .filter(|h| {
            let income = match projected_production(world, state, Some(h)) {
                Some((ResourceKind::Money, amount)) => amount,
                _ => 0.0,
            };
            h.upkeep * days < income
        })
        .last()
        .map(|h| h.name.clone());
    let Some(best) = best else {
        return false;
    };
    let best_index = world.housing.iter().position(|h| h.name == best);
    if best_index > current_index {
        state.current_housing = Some(best);
        true
    } else {
        false
    }
}

/// Buy at most one copy of every affordable tier, in catalog order.
/// Returns how many copies were bought.
pub fn buy_affordable_tiers(world: &World, state: &mut State) -> usize {
    let mut bought = 0;
    for index in 0..world.tiers.len() {
        if can_buy_tier(world, state, index) && buy_tier(world, state, index).is_ok() {
            bought += 1;
        }
    }
    bought
}

/// Buy every unlocked item Money can cover, in catalog order. Returns the
/// names bought.
pub fn buy_affordable_items(world: &World, state: &mut State) -> Vec<String> {
    let candidates: Vec<String> = available_items(world, state)
        .map(|i| i.name.clone())
        .collect();
    candidates
        .into_iter()
        .filter(|name| buy_item(world, state, name).is_ok())
        .collect()
}
