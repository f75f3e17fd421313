#![deny(warnings)]

//! Core domain model for the idle simulation.
//!
//! This crate defines the content catalog ([`World`]), the live [`State`],
//! the derived [`Input`] view and validation helpers that guard the
//! invariants every other crate relies on.

mod content;
mod state;

pub use content::{
    HousingDef, ItemDef, RebirthRules, TierDef, UnlockCondition, WorkDef, World, WorldConstants,
};
pub use state::{Input, Options, PresetStore, ResourceKind, State};

use std::collections::BTreeSet;
use thiserror::Error;

/// Validation errors for catalogs and incoming states.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite value in {0}")]
    NonFinite(String),
    /// Amounts, rates and costs must be non-negative.
    #[error("negative value in {0}")]
    Negative(String),
    /// Costs and day counts must be strictly positive.
    #[error("{0} must be > 0")]
    NonPositive(String),
    /// Growth below one would make later copies cheaper.
    #[error("cost growth of tier {0} must be >= 1")]
    ShrinkingCost(usize),
    /// Items may only raise output.
    #[error("boost factor of item {0} must be >= 1")]
    WeakBoost(String),
    /// Tier `level` must match its position in the catalog.
    #[error("tier at index {index} declares level {level}")]
    TierLevelMismatch { index: usize, level: usize },
    /// Names must be non-empty and unique per list.
    #[error("empty or duplicate name: {0:?}")]
    BadName(String),
    /// A reference points outside the catalog.
    #[error("unknown reference: {0}")]
    UnknownReference(String),
    /// Tier counts do not line up with the catalog.
    #[error("state tracks {found} tiers, catalog has {expected}")]
    TierCountMismatch { expected: usize, found: usize },
    /// Permanent multipliers never drop below one.
    #[error("multiplier for {0:?} is below 1")]
    MultiplierBelowOne(ResourceKind),
}

fn check_amount(value: f64, what: &str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(what.to_string()));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative(what.to_string()));
    }
    Ok(())
}

fn check_unlock(world: &World, unlock: &UnlockCondition, owner: &str) -> Result<(), ValidationError> {
    match unlock {
        UnlockCondition::TierOwned { tier, .. } if *tier >= world.tiers.len() => Err(
            ValidationError::UnknownReference(format!("{owner} requires tier {tier}")),
        ),
        UnlockCondition::Resource { amount, .. } => check_amount(*amount, owner),
        _ => Ok(()),
    }
}

fn check_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if name.trim().is_empty() || !seen.insert(name) {
            return Err(ValidationError::BadName(name.to_string()));
        }
    }
    Ok(())
}

/// Validate a catalog, including cross-references from unlock conditions.
pub fn validate_world(world: &World) -> Result<(), ValidationError> {
    let c = &world.constants;
    if c.days_per_tick == 0 {
        return Err(ValidationError::NonPositive("days_per_tick".into()));
    }
    if c.rebirth.days_per_year == 0 {
        return Err(ValidationError::NonPositive("days_per_year".into()));
    }
    check_amount(c.rebirth.year_weight, "year_weight")?;
    check_amount(c.rebirth.tier_weight, "tier_weight")?;
    for (kind, amount) in &c.starting_resources {
        check_amount(*amount, &format!("starting {kind:?}"))?;
    }

    check_names(world.tiers.iter().map(|t| t.name.as_str()))?;
    for (index, t) in world.tiers.iter().enumerate() {
        if t.level != index {
            return Err(ValidationError::TierLevelMismatch {
                index,
                level: t.level,
            });
        }
        check_amount(t.base_cost, &t.name)?;
        if t.base_cost == 0.0 {
            return Err(ValidationError::NonPositive(format!("{} base_cost", t.name)));
        }
        if !t.cost_growth.is_finite() {
            return Err(ValidationError::NonFinite(t.name.clone()));
        }
        if t.cost_growth < 1.0 {
            return Err(ValidationError::ShrinkingCost(index));
        }
        check_amount(t.production, &t.name)?;
    }

    check_names(world.works.iter().map(|w| w.name.as_str()))?;
    for w in &world.works {
        check_amount(w.base_rate, &w.name)?;
        check_unlock(world, &w.unlock, &w.name)?;
    }

    check_names(world.housing.iter().map(|h| h.name.as_str()))?;
    for h in &world.housing {
        check_amount(h.bonus, &h.name)?;
        check_amount(h.upkeep, &h.name)?;
        check_unlock(world, &h.unlock, &h.name)?;
    }

    check_names(world.items.iter().map(|i| i.name.as_str()))?;
    for i in &world.items {
        check_amount(i.cost, &i.name)?;
        if i.cost == 0.0 {
            return Err(ValidationError::NonPositive(format!("{} cost", i.name)));
        }
        if !i.factor.is_finite() {
            return Err(ValidationError::NonFinite(i.name.clone()));
        }
        if i.factor < 1.0 {
            return Err(ValidationError::WeakBoost(i.name.clone()));
        }
        if world.work(&i.work).is_none() {
            return Err(ValidationError::UnknownReference(format!(
                "{} boosts work {}",
                i.name, i.work
            )));
        }
        check_unlock(world, &i.unlock, &i.name)?;
    }
    Ok(())
}

/// Validate a state against the catalog it is about to run on.
pub fn validate_state(world: &World, state: &State) -> Result<(), ValidationError> {
    if state.owned_tier_levels.len() != world.tiers.len() {
        return Err(ValidationError::TierCountMismatch {
            expected: world.tiers.len(),
            found: state.owned_tier_levels.len(),
        });
    }
    for (kind, amount) in &state.resources {
        check_amount(*amount, &format!("{kind:?}"))?;
    }
    for (kind, factor) in &state.permanent_multipliers {
        if !factor.is_finite() {
            return Err(ValidationError::NonFinite(format!("{kind:?} multiplier")));
        }
        if *factor < 1.0 {
            return Err(ValidationError::MultiplierBelowOne(*kind));
        }
    }
    if let Some(name) = &state.current_work {
        if world.work(name).is_none() {
            return Err(ValidationError::UnknownReference(format!("work {name}")));
        }
    }
    if let Some(name) = &state.current_housing {
        if world.housing(name).is_none() {
            return Err(ValidationError::UnknownReference(format!("housing {name}")));
        }
    }
    if let Some(name) = state.owned_items.iter().find(|n| world.item(n).is_none()) {
        return Err(ValidationError::UnknownReference(format!("item {name}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn factory_world_is_valid() {
        validate_world(&World::factory()).unwrap();
    }

    #[test]
    fn factory_state_matches_catalog() {
        let world = World::factory();
        let state = State::factory(&world);
        validate_state(&world, &state).unwrap();
        assert_eq!(state.elapsed_days, 0);
        assert!(state.owned_tier_levels.iter().all(|&n| n == 0));
        assert_eq!(state.resource(ResourceKind::Money), 10.0);
        assert_eq!(state.multiplier(ResourceKind::Influence), 1.0);
        assert!(state.current_work.is_none());
        assert!(state.current_housing.is_none());
        assert!(state.owned_items.is_empty());
    }

    #[test]
    fn serde_roundtrip_state() {
        let world = World::factory();
        let mut state = State::factory(&world);
        state.current_work = Some("mines".into());
        state.owned_tier_levels[1] = 3;
        state.owned_items.insert("iron_pickaxe".into());
        state.options.auto_buy_tiers = true;
        state.options.auto_rebirth = true;
        let s = serde_json::to_string(&state).unwrap();
        let back: State = serde_json::from_str(&s).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn state_without_items_or_new_options_still_decodes() {
        let json = r#"{
            "resources": {"Money": 3.5, "Influence": 0.0},
            "elapsed_days": 12,
            "current_work": "mines",
            "current_housing": null,
            "owned_tier_levels": [1, 0, 0, 0],
            "rebirth_count": 0,
            "permanent_multipliers": {"Money": 1.0, "Influence": 1.0},
            "options": {"auto_work": true}
        }"#;
        let state: State = serde_json::from_str(json).unwrap();
        assert!(state.owned_items.is_empty());
        assert!(state.options.auto_work);
        assert!(!state.options.auto_rebirth);
        validate_state(&World::factory(), &state).unwrap();
    }

    #[test]
    fn world_snapshot_roundtrip() {
        let world = World::factory();
        let s = serde_json::to_string_pretty(&world).unwrap();
        let back: World = serde_json::from_str(&s).unwrap();
        assert_eq!(back, world);
    }

    #[test]
    fn rejects_duplicate_work_names() {
        let mut world = World::factory();
        let dup = world.works[0].clone();
        world.works.push(dup);
        assert_eq!(
            validate_world(&world),
            Err(ValidationError::BadName("mines".into()))
        );
    }

    #[test]
    fn rejects_dangling_tier_reference() {
        let mut world = World::factory();
        world.housing[0].unlock = UnlockCondition::TierOwned { tier: 99, count: 1 };
        assert!(matches!(
            validate_world(&world),
            Err(ValidationError::UnknownReference(_))
        ));
    }

    #[test]
    fn rejects_bad_items() {
        let mut world = World::factory();
        world.items[0].factor = 0.5;
        assert_eq!(
            validate_world(&world),
            Err(ValidationError::WeakBoost("iron_pickaxe".into()))
        );

        let mut world = World::factory();
        world.items[0].work = "astronaut".into();
        assert!(matches!(
            validate_world(&world),
            Err(ValidationError::UnknownReference(_))
        ));

        let world = World::factory();
        let mut state = State::factory(&world);
        state.owned_items.insert("crown".into());
        assert_eq!(
            validate_state(&world, &state),
            Err(ValidationError::UnknownReference("item crown".into()))
        );
    }

    #[test]
    fn rejects_misnumbered_tier() {
        let mut world = World::factory();
        world.tiers[2].level = 5;
        assert_eq!(
            validate_world(&world),
            Err(ValidationError::TierLevelMismatch { index: 2, level: 5 })
        );
    }

    #[test]
    fn rejects_state_from_other_catalog() {
        let world = World::factory();
        let mut state = State::factory(&world);
        state.owned_tier_levels.pop();
        assert!(matches!(
            validate_state(&world, &state),
            Err(ValidationError::TierCountMismatch { .. })
        ));

        let mut state = State::factory(&world);
        state.current_housing = Some("castle".into());
        assert!(matches!(
            validate_state(&world, &state),
            Err(ValidationError::UnknownReference(_))
        ));
    }

    proptest! {
        #[test]
        fn shrinking_growth_is_rejected(g in 0.0f64..0.999) {
            let mut world = World::factory();
            world.tiers[0].cost_growth = g;
            prop_assert_eq!(validate_world(&world), Err(ValidationError::ShrinkingCost(0)));
        }

        #[test]
        fn negative_resources_are_rejected(amount in -1.0e9f64..-1.0e-9) {
            let world = World::factory();
            let mut state = State::factory(&world);
            state.resources.insert(ResourceKind::Money, amount);
            prop_assert!(matches!(
                validate_state(&world, &state),
                Err(ValidationError::Negative(_))
            ));
        }
    }
}
