//! Tick engine: one quantum is one run of a chained bevy_ecs schedule over
//! the live resources.

use bevy_ecs::prelude::{IntoSystemConfigs, Res, ResMut, Resource, Schedule};
use bevy_ecs::schedule::ExecutorKind;
use bevy_ecs::world::World as EcsWorld;
use crate::rebirth;
use sim_core::{Input, ResourceKind, State, World};
use sim_econ::automation;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The immutable catalog.
#[derive(Resource)]
pub(crate) struct Content(pub Arc<World>);

/// The live state.
#[derive(Resource)]
pub(crate) struct Live(pub State);

/// The derived action view.
#[derive(Resource)]
pub(crate) struct Derived(pub Input);

pub(crate) fn init_ecs(world: Arc<World>, state: State) -> EcsWorld {
    let input = sim_econ::derive_input(&world, &state);
    let mut ecs = EcsWorld::new();
    ecs.insert_resource(Content(world));
    ecs.insert_resource(Live(state));
    ecs.insert_resource(Derived(input));
    ecs
}

/// Systems of one tick, in order.
pub(crate) fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            advance_clock,
            run_automation,
            apply_production,
            charge_upkeep,
            auto_rebirth,
            refresh_input,
        )
            .chain(),
    );
    schedule
}

fn advance_clock(content: Res<Content>, mut live: ResMut<Live>) {
    let days = u64::from(content.0.constants.days_per_tick);
    live.0.elapsed_days = live.0.elapsed_days.saturating_add(days);
}

fn run_automation(content: Res<Content>, mut live: ResMut<Live>) {
    let options = live.0.options;
    if !(options.auto_work
        || options.auto_housing
        || options.auto_buy_tiers
        || options.auto_buy_items)
    {
        return;
    }
    let world = &content.0;
    let state = &mut live.0;
    if options.auto_work && automation::promote_work(world, state) {
        debug!(work = ?state.current_work, "auto work");
    }
    if options.auto_housing && automation::upgrade_housing(world, state) {
        debug!(housing = ?state.current_housing, "auto housing");
    }
    if options.auto_buy_tiers {
        let bought = automation::buy_affordable_tiers(world, state);
        if bought > 0 {
            debug!(bought, "auto bought tiers");
        }
    }
    if options.auto_buy_items {
        let items = automation::buy_affordable_items(world, state);
        if !items.is_empty() {
            debug!(?items, "auto bought items");
        }
    }
}

fn apply_production(content: Res<Content>, mut live: ResMut<Live>) {
    let state = &mut live.0;
    if let Some((kind, amount)) = sim_econ::production_per_tick(&content.0, state) {
        let held = state.resources.entry(kind).or_insert(0.0);
        *held = (*held + amount).max(0.0);
    }
}

fn charge_upkeep(content: Res<Content>, mut live: ResMut<Live>) {
    let state = &mut live.0;
    let upkeep = sim_econ::upkeep_per_tick(&content.0, state);
    if upkeep <= 0.0 {
        return;
    }
    let money = state.resource(ResourceKind::Money);
    if money >= upkeep {
        state.resources.insert(ResourceKind::Money, money - upkeep);
    } else {
        warn!(
            housing = ?state.current_housing,
            money,
            upkeep,
            "upkeep unpaid, leaving housing"
        );
        state.resources.insert(ResourceKind::Money, 0.0);
        state.current_housing = None;
    }
}

fn auto_rebirth(content: Res<Content>, mut live: ResMut<Live>) {
    if !live.0.options.auto_rebirth {
        return;
    }
    if let Ok(next) = rebirth::perform_rebirth(&content.0, &live.0) {
        info!(rebirths = next.rebirth_count, "auto rebirth");
        live.0 = next;
    }
}

fn refresh_input(content: Res<Content>, live: Res<Live>, mut derived: ResMut<Derived>) {
    derived.0 = sim_econ::derive_input(&content.0, &live.0);
}
