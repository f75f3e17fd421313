//! Thread-safe handle for hosts that drive the simulation from several
//! threads: commands serialize on the write lock, snapshot reads clone
//! under the read lock.

use crate::{SaveStorage, Simulation};
use sim_core::{Input, State};
use std::sync::{Arc, PoisonError, RwLock};

pub struct SharedSimulation<S: SaveStorage> {
    inner: Arc<RwLock<Simulation<S>>>,
}

impl<S: SaveStorage> Clone for SharedSimulation<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SaveStorage> SharedSimulation<S> {
    pub fn new(sim: Simulation<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(sim)),
        }
    }

    /// Run a command with exclusive access. Every command is atomic, so a
    /// poisoned lock still guards a consistent simulation.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut Simulation<S>) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    pub fn with<T>(&self, f: impl FnOnce(&Simulation<S>) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    pub fn tick(&self) {
        self.with_mut(Simulation::tick);
    }

    pub fn state_snapshot(&self) -> State {
        self.with(|sim| sim.state().clone())
    }

    pub fn input_snapshot(&self) -> Input {
        self.with(|sim| sim.input().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Codec, MemoryStorage};
    use sim_core::World;
    use std::thread;

    #[test]
    fn ticks_from_many_threads_all_land() {
        let sim = Simulation::open(World::factory(), MemoryStorage::new(), Codec::Json).unwrap();
        let shared = SharedSimulation::new(sim);
        thread::scope(|scope| {
            for _ in 0..4 {
                let handle = shared.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        handle.tick();
                    }
                });
            }
        });
        assert_eq!(shared.state_snapshot().elapsed_days, 100);
        assert_eq!(shared.input_snapshot(), shared.with(|sim| sim.input().clone()));
    }
}
