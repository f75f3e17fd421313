//! Development presets: ready-made states for checking late-game balance
//! without playing up to it.

use sim_core::{PresetStore, ResourceKind, State, World};
use sim_econ::prestige_factor;

pub fn builtin_presets(world: &World) -> PresetStore {
    let rules = &world.constants.rebirth;
    let last_tier = world.tiers.len().checked_sub(1);
    let mut presets = PresetStore::new();

    let mut broke = State::factory(world);
    broke.elapsed_days = rules.min_elapsed_days;
    broke.resources.insert(ResourceKind::Money, 10.0);
    presets.insert("1: late life, broke".to_string(), broke);

    let mut rich = State::factory(world);
    rich.elapsed_days = rules.min_elapsed_days;
    rich.resources.insert(ResourceKind::Money, 10_000_000.0);
    presets.insert("2: late life, rich".to_string(), rich);

    let mut veteran = State::factory(world);
    veteran.rebirth_count = 8;
    let factor = prestige_factor(rules, rules.min_elapsed_days, Some(1));
    for kind in ResourceKind::ALL {
        veteran.permanent_multipliers.insert(kind, factor);
    }
    presets.insert("3: veteran".to_string(), veteran);

    let mut full = State::factory(world);
    full.rebirth_count = 16;
    full.resources.insert(ResourceKind::Money, 10_000_000.0);
    full.resources.insert(ResourceKind::Influence, 100_000.0);
    let factor = prestige_factor(rules, rules.min_elapsed_days * 2, last_tier);
    for kind in ResourceKind::ALL {
        full.permanent_multipliers.insert(kind, factor);
    }
    full.owned_items = world.items.iter().map(|i| i.name.clone()).collect();
    presets.insert("4: full unlock".to_string(), full);

    presets
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::validate_state;

    #[test]
    fn builtin_presets_fit_the_catalog() {
        let world = World::factory();
        let presets = builtin_presets(&world);
        assert_eq!(presets.len(), 4);
        for (name, state) in &presets {
            assert!(validate_state(&world, state).is_ok(), "{name}");
        }
        assert!(sim_econ::rebirth_eligible(
            &world.constants.rebirth,
            &presets["1: late life, broke"]
        ));
    }
}
