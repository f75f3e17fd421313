#![deny(warnings)]

//! Simulation runtime: the command API a host drives.
//!
//! [`Simulation`] owns the live state inside a bevy_ecs world, advances it
//! with [`Simulation::tick`], applies player commands atomically and
//! persists the current save and the presets through a [`SaveStorage`].

mod engine;
pub mod presets;
pub mod rebirth;
mod shared;

pub use persistence::{Codec, FileStorage, MemoryStorage, SaveStorage, StorageError};
pub use shared::SharedSimulation;

use bevy_ecs::schedule::Schedule;
use bevy_ecs::world::World as EcsWorld;
use engine::{Derived, Live};
use persistence::{CURRENT_SLOT, PRESETS_SLOT};
use sim_core::{
    validate_state, validate_world, Input, Options, PresetStore, State, ValidationError, World,
};
use sim_econ::{EconError, OptionKind};
use std::collections::btree_map::Entry;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned by simulation commands. A failed command leaves the
/// state exactly as it was.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("tier {tier} costs {cost} but only {available} is held")]
    InsufficientResources {
        tier: usize,
        cost: f64,
        available: f64,
    },
    #[error("item {name} costs {cost} but only {available} is held")]
    ItemUnaffordable {
        name: String,
        cost: f64,
        available: f64,
    },
    #[error("item {0} is already owned")]
    ItemOwned(String),
    #[error("unknown or locked {kind}: {name}")]
    UnknownOption { kind: OptionKind, name: String },
    #[error("rebirth requires {required_days} days, {elapsed_days} elapsed")]
    RebirthNotEligible { elapsed_days: u64, required_days: u64 },
    #[error("no preset named {0:?}")]
    PresetNotFound(String),
    /// In-memory state stays usable.
    #[error("storage failure: {0}")]
    StorageFailure(#[from] StorageError),
}

impl From<EconError> for SimError {
    fn from(e: EconError) -> Self {
        match e {
            EconError::InsufficientResources {
                tier,
                cost,
                available,
            } => SimError::InsufficientResources {
                tier,
                cost,
                available,
            },
            EconError::ItemUnaffordable {
                name,
                cost,
                available,
            } => SimError::ItemUnaffordable {
                name,
                cost,
                available,
            },
            EconError::ItemOwned(name) => SimError::ItemOwned(name),
            EconError::UnknownOption { kind, name } => SimError::UnknownOption { kind, name },
        }
    }
}

/// Why [`Simulation::load`] fell back to factory defaults.
#[derive(Debug, Error)]
pub enum FallbackReason {
    #[error("no save in slot")]
    Missing,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("saved state does not fit the catalog: {0}")]
    Invalid(#[from] ValidationError),
}

/// Result of [`Simulation::load`], which never fails.
#[derive(Debug)]
pub enum LoadOutcome {
    Restored,
    FactoryDefaults(FallbackReason),
}

impl LoadOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, LoadOutcome::Restored)
    }
}

/// One live game.
pub struct Simulation<S: SaveStorage> {
    world: Arc<World>,
    ecs: EcsWorld,
    schedule: Schedule,
    presets: PresetStore,
    storage: S,
    codec: Codec,
}

impl<S: SaveStorage> Simulation<S> {
    /// Validate `world`, read the presets from `storage` and start from
    /// factory defaults. Call [`Simulation::load`] to resume a save.
    pub fn open(world: World, storage: S, codec: Codec) -> Result<Self, ValidationError> {
        validate_world(&world)?;
        let world = Arc::new(world);
        let presets = read_presets(&storage, codec, &world);
        let state = State::factory(&world);
        info!(
            version = %world.version,
            presets = presets.len(),
            ?codec,
            "simulation opened"
        );
        Ok(Self {
            ecs: engine::init_ecs(Arc::clone(&world), state),
            world,
            schedule: engine::build_schedule(),
            presets,
            storage,
            codec,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn state(&self) -> &State {
        &self.ecs.resource::<Live>().0
    }

    pub fn input(&self) -> &Input {
        &self.ecs.resource::<Derived>().0
    }

    pub fn preset_saves(&self) -> &PresetStore {
        &self.presets
    }

    /// Advance one quantum.
    pub fn tick(&mut self) {
        self.schedule.run(&mut self.ecs);
        debug!(day = self.state().elapsed_days, "tick");
    }

    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn can_buy_tier(&self, level: usize) -> bool {
        sim_econ::can_buy_tier(&self.world, self.state(), level)
    }

    /// Buy one copy of tier `index`, returning the price paid.
    pub fn buy_tier(&mut self, index: usize) -> Result<f64, SimError> {
        let cost = self.mutate(|world, state| sim_econ::buy_tier(world, state, index))?;
        info!(tier = index, cost, "tier bought");
        Ok(cost)
    }

    /// Buy item `name` with Money, returning the price paid.
    pub fn buy_item(&mut self, name: &str) -> Result<f64, SimError> {
        let cost = self.mutate(|world, state| sim_econ::buy_item(world, state, name))?;
        info!(item = name, cost, "item bought");
        Ok(cost)
    }

    pub fn set_work(&mut self, name: &str) -> Result<(), SimError> {
        self.mutate(|world, state| sim_econ::set_work(world, state, name))?;
        info!(work = name, "work selected");
        Ok(())
    }

    pub fn set_housing(&mut self, name: &str) -> Result<(), SimError> {
        self.mutate(|world, state| sim_econ::set_housing(world, state, name))?;
        info!(housing = name, "housing selected");
        Ok(())
    }

    pub fn set_options(&mut self, options: Options) {
        self.ecs.resource_mut::<Live>().0.options = options;
        info!(?options, "options updated");
    }

    /// Prestige reset; see [`rebirth::perform_rebirth`].
    pub fn do_rebirth(&mut self) -> Result<(), SimError> {
        let next = rebirth::perform_rebirth(&self.world, self.state())?;
        info!(
            rebirths = next.rebirth_count,
            multipliers = ?next.permanent_multipliers,
            "rebirth"
        );
        self.replace_state(next);
        Ok(())
    }

    /// Write the live state to the current slot.
    pub fn save(&mut self) -> Result<(), SimError> {
        let bytes = persistence::encode_save(self.codec, &self.world.version, self.state())?;
        self.storage.write(CURRENT_SLOT, &bytes)?;
        info!(day = self.state().elapsed_days, bytes = bytes.len(), "saved");
        Ok(())
    }

    /// Restore the current slot, or fall back to factory defaults when it
    /// is missing, unreadable or does not fit the catalog.
    pub fn load(&mut self) -> LoadOutcome {
        match self.read_current() {
            Ok(state) => {
                info!(day = state.elapsed_days, rebirths = state.rebirth_count, "loaded");
                self.replace_state(state);
                LoadOutcome::Restored
            }
            Err(reason) => {
                warn!(%reason, "load failed, using factory defaults");
                self.hard_reset();
                LoadOutcome::FactoryDefaults(reason)
            }
        }
    }

    /// Erase the current slot. The live state and the presets are kept, so
    /// the next [`Simulation::load`] starts from factory defaults unless
    /// [`Simulation::save`] runs first.
    pub fn delete_save(&mut self) -> Result<(), SimError> {
        self.storage.remove(CURRENT_SLOT)?;
        info!("current save deleted");
        Ok(())
    }

    /// Replace the live state with factory defaults. Presets and stored
    /// slots are kept.
    pub fn hard_reset(&mut self) {
        let state = State::factory(&self.world);
        self.replace_state(state);
        info!("hard reset");
    }

    /// Store the live state as preset `name`, overwriting any previous one.
    pub fn save_preset(&mut self, name: &str) -> Result<(), SimError> {
        let mut next = self.presets.clone();
        next.insert(name.to_string(), self.state().clone());
        self.commit_presets(next)?;
        info!(preset = name, "preset saved");
        Ok(())
    }

    /// Replace the live state with preset `name`.
    pub fn load_preset(&mut self, name: &str) -> Result<(), SimError> {
        let state = self
            .presets
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::PresetNotFound(name.to_string()))?;
        self.replace_state(state);
        info!(preset = name, "preset loaded");
        Ok(())
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<(), SimError> {
        let mut next = self.presets.clone();
        if next.remove(name).is_none() {
            return Err(SimError::PresetNotFound(name.to_string()));
        }
        self.commit_presets(next)?;
        info!(preset = name, "preset deleted");
        Ok(())
    }

    /// Add the development presets whose names are still free. Returns how
    /// many were added.
    pub fn install_builtin_presets(&mut self) -> Result<usize, SimError> {
        let mut next = self.presets.clone();
        let mut added = 0;
        for (name, state) in presets::builtin_presets(&self.world) {
            if let Entry::Vacant(slot) = next.entry(name) {
                slot.insert(state);
                added += 1;
            }
        }
        if added > 0 {
            self.commit_presets(next)?;
        }
        Ok(added)
    }

    fn mutate<T>(
        &mut self,
        f: impl FnOnce(&World, &mut State) -> Result<T, EconError>,
    ) -> Result<T, SimError> {
        let world: &World = &self.world;
        let result = f(world, &mut self.ecs.resource_mut::<Live>().0);
        if result.is_ok() {
            self.refresh_input();
        }
        result.map_err(SimError::from)
    }

    fn replace_state(&mut self, state: State) {
        self.ecs.insert_resource(Live(state));
        self.refresh_input();
    }

    fn refresh_input(&mut self) {
        let input = sim_econ::derive_input(&self.world, self.state());
        self.ecs.insert_resource(Derived(input));
    }

    fn read_current(&self) -> Result<State, FallbackReason> {
        let bytes = self
            .storage
            .read(CURRENT_SLOT)?
            .ok_or(FallbackReason::Missing)?;
        let state = persistence::decode_save(self.codec, &self.world.version, &bytes)?;
        validate_state(&self.world, &state)?;
        Ok(state)
    }

    fn commit_presets(&mut self, next: PresetStore) -> Result<(), SimError> {
        let bytes = persistence::encode_presets(self.codec, &self.world.version, &next)?;
        self.storage.write(PRESETS_SLOT, &bytes)?;
        self.presets = next;
        Ok(())
    }
}

fn read_presets<S: SaveStorage>(storage: &S, codec: Codec, world: &World) -> PresetStore {
    let bytes = match storage.read(PRESETS_SLOT) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return PresetStore::new(),
        Err(e) => {
            warn!(error = %e, "presets unreadable, starting empty");
            return PresetStore::new();
        }
    };
    let mut presets = match persistence::decode_presets(codec, &world.version, &bytes) {
        Ok(presets) => presets,
        Err(e) => {
            warn!(error = %e, "presets corrupt, starting empty");
            return PresetStore::new();
        }
    };
    presets.retain(|name, state| match validate_state(world, state) {
        Ok(()) => true,
        Err(e) => {
            warn!(preset = %name, error = %e, "dropping invalid preset");
            false
        }
    });
    presets
}
