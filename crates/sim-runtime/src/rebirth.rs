//! Prestige reset.

use crate::SimError;
use sim_core::{ResourceKind, State, World};
use sim_econ::{prestige_factor, rebirth_eligible, top_owned_tier};

/// The part of a life that the prestige curve rewards, captured before
/// anything is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progression {
    pub elapsed_days: u64,
    pub top_tier: Option<usize>,
}

impl Progression {
    pub fn of(state: &State) -> Self {
        Self {
            elapsed_days: state.elapsed_days,
            top_tier: top_owned_tier(state),
        }
    }
}

/// Build the state of the next life. `state` itself is left untouched so a
/// rejected rebirth has no effect.
pub fn perform_rebirth(world: &World, state: &State) -> Result<State, SimError> {
    let rules = &world.constants.rebirth;
    if !rebirth_eligible(rules, state) {
        return Err(SimError::RebirthNotEligible {
            elapsed_days: state.elapsed_days,
            required_days: rules.min_elapsed_days,
        });
    }
    let snapshot = Progression::of(state);
    let earned = prestige_factor(rules, snapshot.elapsed_days, snapshot.top_tier);

    let mut next = State::factory(world);
    next.rebirth_count = state.rebirth_count.saturating_add(1);
    next.options = state.options;
    next.permanent_multipliers = ResourceKind::ALL
        .iter()
        .map(|&kind| (kind, state.multiplier(kind).max(earned)))
        .collect();
    Ok(next)
}
