#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave lifecycle and economy.
//!
//! The [`WaveManager`] moves through `Idle -> WaveActive -> Break -> WaveActive`
//! and never drives itself. Its owner calls [`WaveManager::update`] every frame
//! to poll for completion, forwards zombie deaths through
//! [`WaveManager::handle_zombie_death`] and hands the
//! [`Timer::WaveBreakElapsed`] payload back through
//! [`WaveManager::on_break_elapsed`] once the build break is over.

use std::time::Duration;

use serde::Deserialize;
use wizard_defence_core::{
    duration_from_secs, Event, PlayerVitals, Round, Scheduler, Timer, TimerHandle, TurretKind,
    WavePhase, ZombieId,
};
use wizard_defence_system_round_scaling::RoundScaling;
use wizard_defence_system_spawning::SpawnManager;

/// Price of each turret kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TurretPrices {
    /// Price of a fire turret.
    pub fire: u32,
    /// Price of an ice turret.
    pub ice: u32,
    /// Price of a lightning turret.
    pub lightning: u32,
    /// Price of an air turret.
    pub air: u32,
}

impl Default for TurretPrices {
    fn default() -> Self {
        Self {
            fire: 100,
            ice: 150,
            lightning: 200,
            air: 125,
        }
    }
}

/// Economy and pacing parameters of the wave manager.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Money the player starts the run with.
    pub starting_money: u32,
    /// Length of the build break between waves, in seconds.
    pub time_between_waves_secs: f32,
    /// Price of each turret kind.
    pub turret_prices: TurretPrices,
    /// Whether the first wave starts as soon as the game does.
    pub auto_start_first_wave: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_money: 500,
            time_between_waves_secs: 10.0,
            turret_prices: TurretPrices::default(),
            auto_start_first_wave: true,
        }
    }
}

impl EconomyConfig {
    /// Length of the build break between waves.
    #[must_use]
    pub fn time_between_waves(&self) -> Duration {
        duration_from_secs(self.time_between_waves_secs)
    }

    /// Price of a turret of the given kind.
    #[must_use]
    pub fn turret_cost(&self, kind: TurretKind) -> u32 {
        match kind {
            TurretKind::Fire => self.turret_prices.fire,
            TurretKind::Ice => self.turret_prices.ice,
            TurretKind::Lightning => self.turret_prices.lightning,
            TurretKind::Air => self.turret_prices.air,
        }
    }
}

/// Orchestrates the round lifecycle, kill accounting and the player's wallet.
#[derive(Debug)]
pub struct WaveManager {
    config: EconomyConfig,
    scaling: RoundScaling,
    spawn_manager: Option<SpawnManager>,
    phase: WavePhase,
    current_wave: Round,
    money: u32,
    killed_this_wave: u32,
    total_this_wave: u32,
    build_mode_started_at: Duration,
    break_timer: Option<TimerHandle>,
}

impl WaveManager {
    /// Creates an idle manager holding the starting money.
    #[must_use]
    pub fn new(config: EconomyConfig, scaling: RoundScaling) -> Self {
        Self {
            money: config.starting_money,
            config,
            scaling,
            spawn_manager: None,
            phase: WavePhase::Idle,
            current_wave: Round::ZERO,
            killed_this_wave: 0,
            total_this_wave: 0,
            build_mode_started_at: Duration::ZERO,
            break_timer: None,
        }
    }

    /// Hands the spawn manager to this wave manager. Replaces any previous one.
    pub fn attach_spawn_manager(&mut self, spawn_manager: SpawnManager) {
        self.spawn_manager = Some(spawn_manager);
    }

    /// Attached spawn manager, if any.
    #[must_use]
    pub fn spawn_manager(&self) -> Option<&SpawnManager> {
        self.spawn_manager.as_ref()
    }

    /// Mutable access to the attached spawn manager, used to dispatch spawn ticks.
    pub fn spawn_manager_mut(&mut self) -> Option<&mut SpawnManager> {
        self.spawn_manager.as_mut()
    }

    /// Starts the next wave.
    ///
    /// Does nothing when no spawn manager is attached. Otherwise advances the
    /// round, recomputes its size and toughness, pushes both into the spawn
    /// manager, heals the player and restarts spawning.
    pub fn start_next_wave<P, S>(&mut self, player: &mut P, scheduler: &mut S, out: &mut Vec<Event>)
    where
        P: PlayerVitals + ?Sized,
        S: Scheduler<Timer> + ?Sized,
    {
        let Some(spawn_manager) = self.spawn_manager.as_mut() else {
            tracing::warn!("cannot start wave: no spawn manager attached");
            return;
        };

        if let Some(handle) = self.break_timer.take() {
            let _ = scheduler.cancel(handle);
        }

        self.current_wave = self.current_wave.next();
        self.total_this_wave = self.scaling.zombie_count(self.current_wave);
        self.killed_this_wave = 0;
        self.phase = WavePhase::WaveActive;

        let zombie_health = self.scaling.zombie_health(self.current_wave);
        spawn_manager.set_spawn_budget(self.total_this_wave);
        spawn_manager.set_health_override(zombie_health);
        player.restore_player_health();
        // Restarting resets the per-wave counter even when a wave is cut short.
        spawn_manager.stop_spawning(scheduler);
        spawn_manager.start_spawning(scheduler);

        tracing::info!(
            wave = self.current_wave.get(),
            zombies = self.total_this_wave,
            health = zombie_health,
            "wave started"
        );
        out.push(Event::WaveStarted {
            wave: self.current_wave,
            total_zombies: self.total_this_wave,
            zombie_health,
        });
    }

    /// Counts a kill and credits its reward. Ignored outside an active wave.
    pub fn on_zombie_died(&mut self, out: &mut Vec<Event>) {
        if self.phase != WavePhase::WaveActive {
            return;
        }

        self.killed_this_wave = self
            .killed_this_wave
            .saturating_add(1)
            .min(self.total_this_wave);

        let reward = self.scaling.money_per_kill(self.current_wave);
        self.money = self.money.saturating_add(reward);
        tracing::debug!(
            killed = self.killed_this_wave,
            total = self.total_this_wave,
            reward,
            balance = self.money,
            "zombie killed"
        );
        out.push(Event::MoneyCredited {
            amount: reward,
            balance: self.money,
        });
    }

    /// Routes a death through the attached spawn manager.
    ///
    /// The kill counts only if the spawn manager created the zombie. Returns
    /// whether it did.
    pub fn handle_zombie_death(&mut self, zombie: ZombieId, out: &mut Vec<Event>) -> bool {
        let tracked = self
            .spawn_manager
            .as_mut()
            .is_some_and(|spawn_manager| spawn_manager.on_zombie_died(zombie));
        if tracked {
            self.on_zombie_died(out);
        }
        tracked
    }

    /// Reports whether the active wave has been cleared.
    ///
    /// Both conditions are required: every zombie of the wave was killed and
    /// none spawned by the manager is still alive.
    #[must_use]
    pub fn is_wave_complete(&self) -> bool {
        self.phase == WavePhase::WaveActive
            && self.killed_this_wave >= self.total_this_wave
            && self.alive_count() == 0
    }

    /// Per-frame poll. Completes the wave once it has been cleared.
    pub fn update<P, S>(&mut self, player: &mut P, scheduler: &mut S, out: &mut Vec<Event>)
    where
        P: PlayerVitals + ?Sized,
        S: Scheduler<Timer> + ?Sized,
    {
        if self.is_wave_complete() {
            self.on_wave_complete(player, scheduler, out);
        }
    }

    /// Ends the active wave, heals the player and opens the build break.
    pub fn on_wave_complete<P, S>(
        &mut self,
        player: &mut P,
        scheduler: &mut S,
        out: &mut Vec<Event>,
    ) where
        P: PlayerVitals + ?Sized,
        S: Scheduler<Timer> + ?Sized,
    {
        if self.phase != WavePhase::WaveActive {
            return;
        }

        if let Some(spawn_manager) = self.spawn_manager.as_mut() {
            spawn_manager.stop_spawning(scheduler);
        }
        player.restore_player_health();

        tracing::info!(
            wave = self.current_wave.get(),
            balance = self.money,
            "wave complete"
        );
        out.push(Event::WaveCompleted {
            wave: self.current_wave,
        });
        self.start_wave_break(scheduler, out);
    }

    /// Enters build mode and schedules the next wave.
    pub fn start_wave_break<S: Scheduler<Timer> + ?Sized>(
        &mut self,
        scheduler: &mut S,
        out: &mut Vec<Event>,
    ) {
        if let Some(handle) = self.break_timer.take() {
            let _ = scheduler.cancel(handle);
        }

        let duration = self.config.time_between_waves();
        self.phase = WavePhase::Break;
        self.build_mode_started_at = scheduler.now();
        self.break_timer = Some(scheduler.schedule_once(duration, Timer::WaveBreakElapsed));

        tracing::info!(
            wave = self.current_wave.get(),
            seconds = duration.as_secs_f32(),
            "build mode started"
        );
        out.push(Event::BuildModeStarted {
            wave: self.current_wave,
            duration,
        });
    }

    /// Delivery of [`Timer::WaveBreakElapsed`]. Starts the next wave.
    pub fn on_break_elapsed<P, S>(&mut self, player: &mut P, scheduler: &mut S, out: &mut Vec<Event>)
    where
        P: PlayerVitals + ?Sized,
        S: Scheduler<Timer> + ?Sized,
    {
        self.break_timer = None;
        if self.phase == WavePhase::Break {
            self.start_next_wave(player, scheduler, out);
        }
    }

    /// Deducts `amount` if the player can afford it.
    pub fn spend_money(&mut self, amount: u32) -> bool {
        match self.money.checked_sub(amount) {
            Some(balance) => {
                self.money = balance;
                true
            }
            None => false,
        }
    }

    /// Seconds of build mode left at `now`, or zero outside build mode.
    #[must_use]
    pub fn build_mode_time_remaining(&self, now: Duration) -> f32 {
        if self.phase != WavePhase::Break {
            return 0.0;
        }

        let elapsed = now.saturating_sub(self.build_mode_started_at);
        self.config
            .time_between_waves()
            .saturating_sub(elapsed)
            .as_secs_f32()
    }

    /// Build mode time left rounded up to whole seconds, as shown to the player.
    #[must_use]
    pub fn build_mode_seconds_display(&self, now: Duration) -> u32 {
        self.build_mode_time_remaining(now).ceil() as u32
    }

    /// Economy and pacing parameters.
    #[must_use]
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Round scaling rules in use.
    #[must_use]
    pub fn scaling(&self) -> &RoundScaling {
        &self.scaling
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Whether zombies of a wave are being fought.
    #[must_use]
    pub fn is_wave_active(&self) -> bool {
        self.phase == WavePhase::WaveActive
    }

    /// Whether the build break is running.
    #[must_use]
    pub fn is_in_build_mode(&self) -> bool {
        self.phase == WavePhase::Break
    }

    /// Number of the latest wave. Zero before the first one.
    #[must_use]
    pub const fn current_wave(&self) -> Round {
        self.current_wave
    }

    /// Money the player holds.
    #[must_use]
    pub const fn money(&self) -> u32 {
        self.money
    }

    /// Kills counted during the current wave.
    #[must_use]
    pub const fn zombies_killed(&self) -> u32 {
        self.killed_this_wave
    }

    /// Zombies the current wave consists of.
    #[must_use]
    pub const fn total_zombies(&self) -> u32 {
        self.total_this_wave
    }

    /// Kills still required to clear the current wave.
    #[must_use]
    pub const fn zombies_remaining(&self) -> u32 {
        self.total_this_wave.saturating_sub(self.killed_this_wave)
    }

    /// Live zombies spawned by the attached spawn manager.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.spawn_manager
            .as_ref()
            .map_or(0, SpawnManager::alive_count)
    }
}
