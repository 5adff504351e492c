#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawning system: spawn gates and the manager that throttles them.
//!
//! A wave limits zombies twice. The spawn budget caps how many zombies are
//! ever created during the wave, while the alive cap limits how many exist at
//! the same time. A spawn attempt has to satisfy both.

use std::{collections::BTreeSet, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use wizard_defence_core::{
    duration_from_secs, EntityFactory, GateId, Scheduler, Timer, TimerHandle, ZombieId,
};

mod gate;

pub use gate::{GateVolume, SpawnGate, DEFAULT_MAX_ACTIVE_PER_GATE};

/// Configuration parameters required to construct the spawn manager.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global cap on concurrently alive zombies.
    pub max_total_zombies: usize,
    /// Cap on concurrently alive zombies per gate.
    pub max_active_zombies_per_gate: usize,
    /// Seconds between spawn attempts.
    pub spawn_interval_secs: f32,
    /// Seed driving gate selection and spawn placement.
    pub rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_total_zombies: 20,
            max_active_zombies_per_gate: DEFAULT_MAX_ACTIVE_PER_GATE,
            spawn_interval_secs: 2.0,
            rng_seed: 0x5eed_0f_7a11,
        }
    }
}

impl Config {
    /// Creates a new configuration using the provided caps, cadence and seed.
    #[must_use]
    pub fn new(max_total_zombies: usize, spawn_interval: Duration, rng_seed: u64) -> Self {
        Self {
            max_total_zombies,
            spawn_interval_secs: spawn_interval.as_secs_f32(),
            rng_seed,
            ..Self::default()
        }
    }

    /// Interval between spawn attempts.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        duration_from_secs(self.spawn_interval_secs)
    }
}

/// Aggregates spawn gates and throttles spawning for the current wave.
#[derive(Debug)]
pub struct SpawnManager {
    config: Config,
    gates: Vec<SpawnGate>,
    active: BTreeSet<ZombieId>,
    total_to_spawn: u32,
    total_spawned: u32,
    health_override: f32,
    spawn_timer: Option<TimerHandle>,
    rng: ChaCha8Rng,
    available: Vec<usize>,
}

impl SpawnManager {
    /// Creates a manager with no gates and an unlimited spawn budget.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            gates: Vec::new(),
            active: BTreeSet::new(),
            total_to_spawn: 0,
            total_spawned: 0,
            health_override: 0.0,
            spawn_timer: None,
            available: Vec::new(),
        }
    }

    /// Configuration the manager was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates a gate capped at `max_active` alive zombies, or at the
    /// configured per-gate cap when no override is given.
    #[must_use]
    pub fn new_gate(
        &self,
        id: GateId,
        volume: GateVolume,
        max_active: Option<usize>,
    ) -> SpawnGate {
        SpawnGate::new(
            id,
            volume,
            max_active.unwrap_or(self.config.max_active_zombies_per_gate),
        )
    }

    /// Registers a gate the manager may spawn from.
    pub fn register_gate(&mut self, gate: SpawnGate) {
        tracing::debug!(gate = gate.id().get(), "spawn gate registered");
        self.gates.push(gate);
    }

    /// Gates registered with the manager, in registration order.
    #[must_use]
    pub fn gates(&self) -> &[SpawnGate] {
        &self.gates
    }

    /// Looks up a registered gate.
    #[must_use]
    pub fn gate(&self, id: GateId) -> Option<&SpawnGate> {
        self.gates.iter().find(|gate| gate.id() == id)
    }

    /// Sets how many zombies the current wave may create. Zero means unlimited.
    pub fn set_spawn_budget(&mut self, count: u32) {
        self.total_to_spawn = count;
    }

    /// Zombies the current wave may create. Zero means unlimited.
    #[must_use]
    pub const fn spawn_budget(&self) -> u32 {
        self.total_to_spawn
    }

    /// Zombies created since spawning last started.
    #[must_use]
    pub const fn total_spawned(&self) -> u32 {
        self.total_spawned
    }

    /// Sets the health applied to new zombies. Non-positive values keep the template health.
    pub fn set_health_override(&mut self, health: f32) {
        self.health_override = health;
    }

    /// Health applied to new zombies, if positive.
    #[must_use]
    pub const fn health_override(&self) -> f32 {
        self.health_override
    }

    /// Number of zombies spawned by this manager that are still alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.active.len()
    }

    /// Reports whether the manager spawned the zombie and still tracks it.
    #[must_use]
    pub fn tracks(&self, zombie: ZombieId) -> bool {
        self.active.contains(&zombie)
    }

    /// Reports whether the periodic spawn trigger is running.
    #[must_use]
    pub const fn is_spawning(&self) -> bool {
        self.spawn_timer.is_some()
    }

    /// Resets the per-wave counter and starts the periodic spawn trigger.
    ///
    /// Calling this while already spawning does nothing.
    pub fn start_spawning<S: Scheduler<Timer> + ?Sized>(&mut self, scheduler: &mut S) {
        if self.spawn_timer.is_some() {
            return;
        }

        self.total_spawned = 0;
        let interval = self.config.spawn_interval();
        self.spawn_timer = Some(scheduler.schedule_repeating(interval, Timer::SpawnTick));
        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            budget = self.total_to_spawn,
            "spawning started"
        );
    }

    /// Cancels the periodic spawn trigger. Calling this while stopped does nothing.
    pub fn stop_spawning<S: Scheduler<Timer> + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.spawn_timer.take() {
            let _ = scheduler.cancel(handle);
            tracing::debug!(spawned = self.total_spawned, "spawning stopped");
        }
    }

    /// Attempts a single spawn. Invoked on every spawn interval.
    ///
    /// Returns `None` without side effects beyond pruning when the budget is
    /// spent, the alive cap is reached, or no gate has room.
    pub fn try_spawn_zombie<F: EntityFactory + ?Sized>(
        &mut self,
        factory: &mut F,
    ) -> Option<ZombieId> {
        self.active.retain(|zombie| factory.is_zombie_alive(*zombie));

        if self.total_to_spawn > 0 && self.total_spawned >= self.total_to_spawn {
            return None;
        }

        if self.active.len() >= self.config.max_total_zombies {
            return None;
        }

        if self.gates.is_empty() {
            tracing::warn!("spawn manager has no spawn gates");
            return None;
        }

        self.available.clear();
        for (index, gate) in self.gates.iter_mut().enumerate() {
            if gate.can_spawn(&*factory) {
                self.available.push(index);
            }
        }

        if self.available.is_empty() {
            return None;
        }

        let pick = self.rng.gen_range(0..self.available.len());
        let gate = &mut self.gates[self.available[pick]];
        let zombie = gate.spawn_zombie(factory, &mut self.rng)?;

        if self.health_override > 0.0 {
            factory.set_zombie_health(zombie, self.health_override);
        }
        let _ = self.active.insert(zombie);
        self.total_spawned = self.total_spawned.saturating_add(1);

        tracing::debug!(
            zombie = zombie.get(),
            gate = gate.id().get(),
            alive = self.active.len(),
            max = self.config.max_total_zombies,
            "zombie spawned"
        );
        Some(zombie)
    }

    /// Death notification for a zombie.
    ///
    /// Every gate forgets the zombie and the global set drops it. Returns
    /// whether this manager spawned it, so the owner can count the kill.
    pub fn on_zombie_died(&mut self, zombie: ZombieId) -> bool {
        for gate in &mut self.gates {
            if gate.on_zombie_died(zombie) {
                break;
            }
        }
        self.active.remove(&zombie)
    }
}
