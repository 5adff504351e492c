#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wizard Defence simulation.
//!
//! This crate defines the message surface that connects the authoritative
//! world, the pure gameplay systems and the adapters that drive them. The world
//! executes [`Command`] values through its `apply` entry point and broadcasts
//! [`Event`] values. Systems never reach into the world directly: they talk to
//! it through the collaborator traits declared here ([`EntityFactory`],
//! [`PlayerVitals`], [`Navigation`]) and defer work through a [`Scheduler`].

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

mod timers;

pub use timers::{Scheduler, Timer, TimerHandle, TimerQueue, MIN_REPEAT_INTERVAL};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Wizard Defence.";

/// Converts configured seconds into a [`Duration`].
///
/// Negative and NaN values become zero. Values too large to represent,
/// infinity included, saturate at [`Duration::MAX`].
#[must_use]
pub fn duration_from_secs(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
}

/// Unique identifier assigned to a zombie by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZombieId(u32);

impl ZombieId {
    /// Creates a new zombie identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a spawn gate registered with a spawn manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(u32);

impl GateId {
    /// Creates a new gate identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a structure (tower or turret) by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a new structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Wave number. Round zero means no wave has started yet.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Round(u32);

impl Round {
    /// Round before the first wave starts.
    pub const ZERO: Self = Self(0);

    /// Creates a round from its number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the round number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the round that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Lifecycle phase of the wave state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// No wave has started yet.
    #[default]
    Idle,
    /// Zombies are spawning and kills earn money.
    WaveActive,
    /// Build mode between waves.
    Break,
}

/// Turret variants the player can buy.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TurretKind {
    /// Single-target projectile.
    #[default]
    Fire,
    /// Cone blast that damages and slows every zombie inside it.
    Ice,
    /// Heavy strike on one zombie that splashes onto its neighbours.
    Lightning,
    /// Blast that damages and pushes back zombies around the target.
    Air,
}

impl TurretKind {
    /// Every turret variant, in shop order.
    pub const ALL: [Self; 4] = [Self::Fire, Self::Ice, Self::Lightning, Self::Air];
}

/// Kinds of structure the player can own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// The objective the zombies try to destroy. Losing it ends the run.
    Tower,
    /// Automated defence that shoots zombies.
    Turret(TurretKind),
}

/// Tag describing what kind of thing a zombie is attacking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// The player character.
    Player,
    /// The main tower objective.
    Tower,
    /// A player-built turret.
    Turret,
}

impl From<StructureKind> for TargetKind {
    fn from(kind: StructureKind) -> Self {
        match kind {
            StructureKind::Tower => Self::Tower,
            StructureKind::Turret(_) => Self::Turret,
        }
    }
}

/// Handle of something a zombie can attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackTarget {
    /// The player character.
    Player,
    /// A structure owned by the player.
    Structure {
        /// Identifier of the structure.
        id: StructureId,
        /// Kind of the structure.
        kind: StructureKind,
    },
}

impl AttackTarget {
    /// Tag used for weighting and range lookups.
    #[must_use]
    pub fn kind(self) -> TargetKind {
        match self {
            Self::Player => TargetKind::Player,
            Self::Structure { kind, .. } => TargetKind::from(kind),
        }
    }
}

/// Blueprint used when a spawn gate creates a zombie.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZombieTemplate {
    /// Health a freshly created zombie starts with.
    pub max_health: f32,
    /// Damage applied by a single attack.
    pub attack_damage: f32,
    /// Distance within which an attack connects.
    pub attack_range: f32,
    /// How long an attack keeps the zombie busy, in seconds.
    pub attack_duration_secs: f32,
    /// Movement speed in world units per second.
    pub move_speed: f32,
}

impl Default for ZombieTemplate {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            attack_damage: 20.0,
            attack_range: 150.0,
            attack_duration_secs: 1.0,
            move_speed: 300.0,
        }
    }
}

impl ZombieTemplate {
    /// Attack duration as a [`Duration`], clamped to be non-negative.
    #[must_use]
    pub fn attack_duration(&self) -> Duration {
        duration_from_secs(self.attack_duration_secs)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a zombie walk toward a destination.
    MoveZombie {
        /// Zombie that should move.
        zombie: ZombieId,
        /// Point the zombie walks toward.
        destination: Vec3,
        /// Distance from the destination at which the zombie stops.
        acceptance_radius: f32,
    },
    /// Requests that a zombie stop moving.
    StopZombie {
        /// Zombie that should stop.
        zombie: ZombieId,
    },
    /// Turns a zombie to face along the provided horizontal direction.
    FaceZombie {
        /// Zombie that should turn.
        zombie: ZombieId,
        /// Direction to face. Vertical components are ignored.
        direction: Vec3,
    },
    /// Requests that a zombie attack a target.
    ZombieAttack {
        /// Attacking zombie.
        zombie: ZombieId,
        /// Target of the attack.
        target: AttackTarget,
    },
    /// Applies damage to a zombie.
    DamageZombie {
        /// Zombie receiving the damage.
        zombie: ZombieId,
        /// Amount of health to remove.
        amount: f32,
    },
    /// Scales a zombie's movement speed until it is restored.
    SlowZombie {
        /// Zombie to slow down.
        zombie: ZombieId,
        /// Factor applied to the zombie's base speed.
        multiplier: f32,
    },
    /// Returns a zombie to its base movement speed.
    RestoreZombieSpeed {
        /// Zombie to restore.
        zombie: ZombieId,
    },
    /// Shoves a zombie horizontally.
    KnockBackZombie {
        /// Zombie to push.
        zombie: ZombieId,
        /// Offset applied to the zombie's position. Vertical components are ignored.
        displacement: Vec3,
    },
    /// Places a structure at the provided location.
    PlaceStructure {
        /// Kind of structure to build.
        kind: StructureKind,
        /// World-space location of the structure.
        position: Vec3,
    },
    /// Restores the player's health to full.
    RestorePlayerHealth,
}

/// Events broadcast by the world and by gameplay systems.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A zombie's health reached zero. Emitted exactly once per zombie.
    ZombieDied {
        /// Zombie that died.
        zombie: ZombieId,
    },
    /// A corpse was removed from the world.
    ZombieRemoved {
        /// Zombie that no longer exists.
        zombie: ZombieId,
    },
    /// A zombie started an attack.
    ZombieAttacked {
        /// Attacking zombie.
        zombie: ZombieId,
        /// Target of the attack.
        target: AttackTarget,
        /// Whether the attack connected.
        hit: bool,
    },
    /// The player took damage.
    PlayerDamaged {
        /// Damage applied.
        amount: f32,
        /// Health left after the hit.
        remaining: f32,
    },
    /// The player's health reached zero.
    PlayerDied,
    /// The player's health was restored to full.
    PlayerHealthRestored,
    /// A structure was placed into the world.
    StructurePlaced {
        /// Identifier assigned to the structure.
        structure: StructureId,
        /// Kind of the structure.
        kind: StructureKind,
    },
    /// A structure was destroyed.
    StructureDestroyed {
        /// Identifier of the destroyed structure.
        structure: StructureId,
        /// Kind of the destroyed structure.
        kind: StructureKind,
    },
    /// The main tower fell. The run is lost.
    TowerLost {
        /// Identifier of the tower.
        structure: StructureId,
    },
    /// A new wave began.
    WaveStarted {
        /// Number of the wave.
        wave: Round,
        /// Zombies that must die to clear the wave.
        total_zombies: u32,
        /// Health applied to zombies spawned this wave.
        zombie_health: f32,
    },
    /// Every zombie of the wave is dead.
    WaveCompleted {
        /// Number of the completed wave.
        wave: Round,
    },
    /// The build break between waves started.
    BuildModeStarted {
        /// Wave that just completed.
        wave: Round,
        /// Length of the break.
        duration: Duration,
    },
    /// Kill rewards were credited.
    MoneyCredited {
        /// Amount credited.
        amount: u32,
        /// Balance after crediting.
        balance: u32,
    },
    /// Money was spent.
    MoneySpent {
        /// Amount spent.
        amount: u32,
        /// Balance after spending.
        balance: u32,
    },
}

/// Result of a navigation query between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathQuery {
    /// Whether a route exists.
    pub success: bool,
    /// Route length in world units. Zero when `success` is false.
    pub length: f32,
}

impl PathQuery {
    /// Query result for an unreachable destination.
    pub const UNREACHABLE: Self = Self {
        success: false,
        length: 0.0,
    };

    /// Query result for a reachable destination.
    #[must_use]
    pub const fn reachable(length: f32) -> Self {
        Self {
            success: true,
            length,
        }
    }
}

/// Route-finding service consulted by zombie target selection.
pub trait Navigation {
    /// Finds a route between two points.
    fn find_path(&self, from: Vec3, to: Vec3) -> PathQuery;
}

/// Creates zombies and exposes their liveness to spawn bookkeeping.
pub trait EntityFactory {
    /// Creates a zombie from the template, returning `None` if creation failed.
    fn create_zombie(
        &mut self,
        template: &ZombieTemplate,
        position: Vec3,
        rotation: glam::Quat,
    ) -> Option<ZombieId>;

    /// Overrides both the maximum and current health of a zombie.
    fn set_zombie_health(&mut self, zombie: ZombieId, health: f32);

    /// Reports whether the zombie still exists and is not dead.
    fn is_zombie_alive(&self, zombie: ZombieId) -> bool;
}

/// Access to the player's vitals.
pub trait PlayerVitals {
    /// Restores the player's health to full.
    fn restore_player_health(&mut self);
}

/// Immutable representation of a zombie used by the decision systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZombieSnapshot {
    /// Identifier of the zombie.
    pub id: ZombieId,
    /// World-space location.
    pub position: Vec3,
    /// Whether the zombie is dead.
    pub dead: bool,
    /// Whether an attack is in progress.
    pub attacking: bool,
}

/// Immutable representation of an attackable target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSnapshot {
    /// Handle of the target.
    pub target: AttackTarget,
    /// World-space location.
    pub position: Vec3,
    /// Whether the target can still be attacked.
    pub alive: bool,
}

/// Immutable representation of a turret used by the combat system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurretSnapshot {
    /// Identifier of the turret.
    pub id: StructureId,
    /// Variant of the turret.
    pub kind: TurretKind,
    /// World-space location.
    pub position: Vec3,
}
