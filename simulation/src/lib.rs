#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Composition root of the Wizard Defence simulation.
//!
//! [`Simulation`] owns the authoritative world, the timer queue and every
//! gameplay system. Each call to [`Simulation::step`] dispatches due timers,
//! advances the world, runs the turrets and polls the wave manager. World
//! events are routed synchronously: a zombie death reaches the wave manager
//! (and through it the spawn manager and its gates) before the zombie AI
//! stops that zombie's decision cycle.

use std::time::Duration;

use glam::Vec3;
use thiserror::Error;
use wizard_defence_core::{
    AttackTarget, Command, Event, GateId, Round, StructureId, StructureKind, Timer, TimerQueue,
    TurretKind, WavePhase, ZombieId,
};
use wizard_defence_system_round_scaling::RoundScaling;
use wizard_defence_system_spawning::SpawnManager;
use wizard_defence_system_turret_combat::TurretCombat;
use wizard_defence_system_waves::WaveManager;
use wizard_defence_system_zombie_ai::ZombieAi;
use wizard_defence_world::{self as world, query, World};

mod config;

pub use config::{
    ConfigError, GameConfig, GateConfig, LayoutConfig, BUILTIN_GAME_CONFIG, CONFIG_PATH_ENV,
};

/// Ground distance within which an existing structure blocks a purchase.
pub const STRUCTURE_CLEARANCE: f32 = 100.0;

/// Why a run was lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefeatCause {
    /// The main tower was destroyed.
    TowerLost,
    /// The player's health reached zero.
    PlayerDied,
}

/// State of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The run continues.
    Running,
    /// The run is over.
    Defeat(DefeatCause),
}

/// Reasons a turret purchase is refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// Structures can only be bought before the first wave or during build mode.
    #[error("structures can only be bought between waves")]
    NotInBuildMode,
    /// The player cannot afford the structure.
    #[error("turret costs {cost} but only {balance} is available")]
    InsufficientFunds {
        /// Price of the structure.
        cost: u32,
        /// Money the player holds.
        balance: u32,
    },
    /// The location is outside the map or not walkable.
    #[error("cannot build at the requested location")]
    InvalidPlacement,
    /// Another structure already stands at the location.
    #[error("structure {0:?} already stands at the requested location")]
    Occupied(StructureId),
    /// The run has ended.
    #[error("the run is over")]
    GameOver,
}

/// Headless Wizard Defence game.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    timers: TimerQueue<Timer>,
    waves: WaveManager,
    ai: ZombieAi,
    turrets: TurretCombat,
    layout: LayoutConfig,
    outcome: Outcome,
    events: Vec<Event>,
}

impl Simulation {
    /// Builds the world and systems described by the configuration.
    ///
    /// The tower is placed immediately and, unless disabled, the first wave
    /// starts right away.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let GameConfig {
            scaling,
            economy,
            spawning,
            ai,
            combat,
            world: world_config,
            layout,
        } = config;

        let auto_start = economy.auto_start_first_wave;
        let tower_position = Vec3::from(layout.tower_position);
        let mut spawn_manager = SpawnManager::new(spawning);
        for (index, gate) in layout.gates.iter().enumerate() {
            let id = GateId::new(u32::try_from(index).unwrap_or(u32::MAX));
            let spawn_gate = spawn_manager
                .new_gate(id, gate.volume(), gate.max_active)
                .with_template(layout.zombie.clone());
            spawn_manager.register_gate(spawn_gate);
        }

        let mut waves = WaveManager::new(economy, RoundScaling::new(scaling));
        waves.attach_spawn_manager(spawn_manager);

        let mut simulation = Self {
            world: World::with_config(world_config),
            timers: TimerQueue::new(),
            waves,
            ai: ZombieAi::new(ai),
            turrets: TurretCombat::new(combat),
            outcome: Outcome::Running,
            events: Vec::new(),
            layout,
        };

        tracing::info!(banner = query::welcome_banner(&simulation.world), "simulation ready");
        simulation.apply(Command::PlaceStructure {
            kind: StructureKind::Tower,
            position: tower_position,
        });
        if auto_start {
            simulation.start_next_wave();
        }
        simulation
    }

    /// Starts the next wave immediately, skipping any remaining build time.
    pub fn start_next_wave(&mut self) {
        if self.outcome != Outcome::Running {
            return;
        }
        self.waves
            .start_next_wave(&mut self.world, &mut self.timers, &mut self.events);
    }

    /// Advances the game by `dt` and reports the state of the run.
    pub fn step(&mut self, dt: Duration) -> Outcome {
        if self.outcome != Outcome::Running {
            return self.outcome;
        }

        self.timers.advance(dt);
        while let Some(timer) = self.timers.pop_due() {
            self.dispatch(timer);
            if self.outcome != Outcome::Running {
                return self.outcome;
            }
        }

        self.apply(Command::Tick { dt });

        let turrets = query::turret_view(&self.world);
        let zombies = query::zombie_view(&self.world).into_vec();
        let mut commands = Vec::new();
        self.turrets
            .handle(dt, &turrets, &zombies, &mut self.timers, &mut commands);
        for command in commands {
            self.apply(command);
        }

        if self.outcome == Outcome::Running {
            self.waves
                .update(&mut self.world, &mut self.timers, &mut self.events);
        }
        self.outcome
    }

    /// Buys a turret of the given kind at `position`.
    ///
    /// Nothing is charged unless the turret is placed.
    pub fn purchase_turret(
        &mut self,
        kind: TurretKind,
        position: Vec3,
    ) -> Result<StructureId, PurchaseError> {
        if self.outcome != Outcome::Running {
            return Err(PurchaseError::GameOver);
        }
        if self.waves.phase() == WavePhase::WaveActive {
            return Err(PurchaseError::NotInBuildMode);
        }

        let grid = query::navigation(&self.world);
        let walkable = grid
            .cell_of(position)
            .is_some_and(|(column, row)| grid.is_walkable(column, row));
        if !walkable {
            return Err(PurchaseError::InvalidPlacement);
        }
        if let Some(existing) = query::structure_near(&self.world, position, STRUCTURE_CLEARANCE) {
            return Err(PurchaseError::Occupied(existing));
        }

        let cost = self.turret_cost(kind);
        if !self.waves.spend_money(cost) {
            return Err(PurchaseError::InsufficientFunds {
                cost,
                balance: self.waves.money(),
            });
        }
        self.events.push(Event::MoneySpent {
            amount: cost,
            balance: self.waves.money(),
        });

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::PlaceStructure {
                kind: StructureKind::Turret(kind),
                position,
            },
            &mut events,
        );
        let placed = events.iter().find_map(|event| match event {
            Event::StructurePlaced { structure, .. } => Some(*structure),
            _ => None,
        });
        self.route(events);
        placed.ok_or(PurchaseError::InvalidPlacement)
    }

    /// Buys turrets on every free build spot the wallet can cover.
    ///
    /// Spot `i` gets `kinds[i % kinds.len()]`. Spots that already hold a
    /// structure are skipped, as are spots whose turret is too expensive right
    /// now. Returns how many turrets were bought.
    pub fn buy_free_spots(&mut self, kinds: &[TurretKind]) -> usize {
        if kinds.is_empty() {
            return 0;
        }

        let spots: Vec<Vec3> = self.build_spots().collect();
        let mut bought = 0;
        for (index, spot) in spots.into_iter().enumerate() {
            let kind = kinds[index % kinds.len()];
            if query::structure_near(&self.world, spot, STRUCTURE_CLEARANCE).is_some()
                || self.money() < self.turret_cost(kind)
            {
                continue;
            }
            match self.purchase_turret(kind, spot) {
                Ok(_) => bought += 1,
                Err(err) => tracing::debug!(error = %err, ?spot, ?kind, "turret purchase refused"),
            }
        }
        bought
    }

    /// Removes and returns every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// State of the run.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Simulated time since the game started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        query::elapsed(&self.world)
    }

    /// Number of the latest wave.
    #[must_use]
    pub fn current_wave(&self) -> Round {
        self.waves.current_wave()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.waves.phase()
    }

    /// Money the player holds.
    #[must_use]
    pub fn money(&self) -> u32 {
        self.waves.money()
    }

    /// Kills counted during the current wave.
    #[must_use]
    pub fn zombies_killed(&self) -> u32 {
        self.waves.zombies_killed()
    }

    /// Zombies the current wave consists of.
    #[must_use]
    pub fn total_zombies(&self) -> u32 {
        self.waves.total_zombies()
    }

    /// Kills still required to clear the current wave.
    #[must_use]
    pub fn zombies_remaining(&self) -> u32 {
        self.waves.zombies_remaining()
    }

    /// Build mode time left, in seconds.
    #[must_use]
    pub fn build_mode_time_remaining(&self) -> f32 {
        self.waves.build_mode_time_remaining(self.elapsed())
    }

    /// Build mode time left rounded up to whole seconds.
    #[must_use]
    pub fn build_mode_seconds_display(&self) -> u32 {
        self.waves.build_mode_seconds_display(self.elapsed())
    }

    /// Price of a turret of the given kind.
    #[must_use]
    pub fn turret_cost(&self, kind: TurretKind) -> u32 {
        self.waves.config().turret_cost(kind)
    }

    /// Spots where turrets may be bought.
    pub fn build_spots(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.layout.build_spots.iter().copied().map(Vec3::from)
    }

    /// Read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the wave manager.
    #[must_use]
    pub fn waves(&self) -> &WaveManager {
        &self.waves
    }

    fn dispatch(&mut self, timer: Timer) {
        match timer {
            Timer::SpawnTick => {
                let spawned = self
                    .waves
                    .spawn_manager_mut()
                    .and_then(|spawn_manager| spawn_manager.try_spawn_zombie(&mut self.world));
                if let Some(zombie) = spawned {
                    self.ai.possess(zombie, &mut self.timers);
                }
            }
            Timer::WaveBreakElapsed => {
                self.waves
                    .on_break_elapsed(&mut self.world, &mut self.timers, &mut self.events);
            }
            Timer::ZombieDecision(zombie) => self.run_decision(zombie),
            Timer::FreezeExpired(zombie) => {
                let mut commands = Vec::new();
                self.turrets.on_freeze_expired(zombie, &mut commands);
                for command in commands {
                    self.apply(command);
                }
            }
        }
    }

    fn run_decision(&mut self, zombie: ZombieId) {
        let Some(snapshot) = query::zombie(&self.world, zombie) else {
            let _ = self.ai.on_zombie_died(zombie, &mut self.timers);
            return;
        };

        let targets = query::target_view(&self.world);
        let mut commands = Vec::new();
        let world = &self.world;
        self.ai.decide(
            &snapshot,
            &targets,
            world,
            |target| match target {
                AttackTarget::Structure { id, .. } => query::overlaps_structure(world, zombie, id),
                AttackTarget::Player => false,
            },
            &mut commands,
        );

        for command in commands {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.route(events);
    }

    fn route(&mut self, events: Vec<Event>) {
        for event in events {
            match event {
                Event::ZombieDied { zombie } => {
                    let _ = self.waves.handle_zombie_death(zombie, &mut self.events);
                    let _ = self.ai.on_zombie_died(zombie, &mut self.timers);
                    let _ = self.turrets.on_zombie_died(zombie, &mut self.timers);
                }
                Event::TowerLost { .. } => self.defeat(DefeatCause::TowerLost),
                Event::PlayerDied => self.defeat(DefeatCause::PlayerDied),
                _ => {}
            }
            self.events.push(event);
        }
    }

    fn defeat(&mut self, cause: DefeatCause) {
        if self.outcome != Outcome::Running {
            return;
        }
        tracing::info!(
            ?cause,
            wave = self.waves.current_wave().get(),
            "run lost"
        );
        self.outcome = Outcome::Defeat(cause);
        if let Some(spawn_manager) = self.waves.spawn_manager_mut() {
            spawn_manager.stop_spawning(&mut self.timers);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.economy.auto_start_first_wave = false;
        config
    }

    #[test]
    fn tower_is_placed_on_construction() {
        let simulation = Simulation::new(quiet_config());
        assert!(query::tower_standing(simulation.world()));
        assert_eq!(simulation.phase(), WavePhase::Idle);
    }

    #[test]
    fn auto_start_opens_the_first_wave() {
        let simulation = Simulation::new(GameConfig::default());
        assert_eq!(simulation.phase(), WavePhase::WaveActive);
        assert_eq!(simulation.current_wave(), Round::new(1));
        assert_eq!(simulation.total_zombies(), 5);
    }

    #[test]
    fn turrets_cannot_be_bought_during_a_wave() {
        let mut simulation = Simulation::new(GameConfig::default());
        assert_eq!(
            simulation.purchase_turret(TurretKind::Fire, Vec3::new(400.0, 400.0, 0.0)),
            Err(PurchaseError::NotInBuildMode)
        );
        assert_eq!(simulation.money(), 500);
    }

    #[test]
    fn purchases_spend_money_until_funds_run_out() {
        let mut simulation = Simulation::new(quiet_config());
        for index in 1..=5 {
            let spot = Vec3::new(400.0 * index as f32, 400.0, 0.0);
            assert!(simulation.purchase_turret(TurretKind::Fire, spot).is_ok());
        }
        assert_eq!(simulation.money(), 0);
        assert_eq!(
            simulation.purchase_turret(TurretKind::Fire, Vec3::new(-400.0, -400.0, 0.0)),
            Err(PurchaseError::InsufficientFunds {
                cost: 100,
                balance: 0,
            })
        );
        assert_eq!(query::turret_view(simulation.world()).len(), 5);
    }

    #[test]
    fn prices_follow_the_turret_kind() {
        let mut simulation = Simulation::new(quiet_config());
        let placed = simulation
            .purchase_turret(TurretKind::Lightning, Vec3::new(400.0, 400.0, 0.0))
            .expect("affordable");
        assert_eq!(simulation.money(), 300);
        assert_eq!(simulation.turret_cost(TurretKind::Ice), 150);

        let turrets = query::turret_view(simulation.world());
        assert_eq!(turrets.len(), 1);
        assert_eq!(turrets[0].id, placed);
        assert_eq!(turrets[0].kind, TurretKind::Lightning);
    }

    #[test]
    fn occupied_spots_are_rejected_without_charge() {
        let mut simulation = Simulation::new(quiet_config());
        let spot = Vec3::new(400.0, 400.0, 0.0);
        let first = simulation
            .purchase_turret(TurretKind::Fire, spot)
            .expect("free spot");

        assert_eq!(
            simulation.purchase_turret(TurretKind::Ice, spot + Vec3::new(30.0, 0.0, 0.0)),
            Err(PurchaseError::Occupied(first))
        );
        assert!(matches!(
            simulation.purchase_turret(TurretKind::Fire, Vec3::ZERO),
            Err(PurchaseError::Occupied(_))
        ));
        assert_eq!(simulation.money(), 400);
        assert_eq!(query::turret_view(simulation.world()).len(), 1);
    }

    #[test]
    fn purchases_outside_the_map_are_rejected_without_charge() {
        let mut simulation = Simulation::new(quiet_config());
        assert_eq!(
            simulation.purchase_turret(TurretKind::Air, Vec3::new(90_000.0, 0.0, 0.0)),
            Err(PurchaseError::InvalidPlacement)
        );
        assert_eq!(simulation.money(), 500);
    }
}
