#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that lets turrets shoot the nearest zombie on a fixed cadence.
//!
//! Every turret locks onto the nearest living zombie in detection range and
//! fires once per interval. What a shot does depends on the turret's kind:
//! fire turrets hit the target, ice turrets chill everything inside a cone,
//! lightning arcs to zombies around the target and air turrets blast zombies
//! away.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use serde::Deserialize;
use wizard_defence_core::{
    duration_from_secs, Command, Scheduler, StructureId, Timer, TimerHandle, TurretKind,
    TurretSnapshot, ZombieId, ZombieSnapshot,
};

/// Fire turret tuning.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    /// Seconds between two shots while a target stays in range.
    pub fire_rate_secs: f32,
    /// Damage dealt to the target.
    pub damage: f32,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            fire_rate_secs: 1.0,
            damage: 25.0,
        }
    }
}

/// Ice turret tuning.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct IceConfig {
    /// Seconds between two shots.
    pub fire_rate_secs: f32,
    /// Damage dealt to every zombie in the cone.
    pub damage: f32,
    /// Reach of the cone, measured in three dimensions.
    pub cone_range: f32,
    /// Half-angle of the cone in degrees, around the flat heading to the target.
    pub cone_angle_degrees: f32,
    /// Seconds a chilled zombie stays slowed.
    pub freeze_secs: f32,
    /// Speed multiplier applied while chilled.
    pub freeze_speed_multiplier: f32,
}

impl Default for IceConfig {
    fn default() -> Self {
        Self {
            fire_rate_secs: 2.0,
            damage: 15.0,
            cone_range: 500.0,
            cone_angle_degrees: 45.0,
            freeze_secs: 3.0,
            freeze_speed_multiplier: 0.2,
        }
    }
}

/// Lightning turret tuning.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightningConfig {
    /// Seconds between two strikes.
    pub fire_rate_secs: f32,
    /// Damage dealt to the struck zombie.
    pub damage: f32,
    /// Radius around the struck zombie that the arc reaches.
    pub aoe_radius: f32,
    /// Fraction of `damage` dealt to the other zombies in the radius.
    pub aoe_damage_multiplier: f32,
}

impl Default for LightningConfig {
    fn default() -> Self {
        Self {
            fire_rate_secs: 3.0,
            damage: 50.0,
            aoe_radius: 300.0,
            aoe_damage_multiplier: 0.5,
        }
    }
}

/// Air turret tuning.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirConfig {
    /// Seconds between two blasts.
    pub fire_rate_secs: f32,
    /// Damage dealt to every zombie caught in the blast.
    pub damage: f32,
    /// Radius of the blast around the target.
    pub blast_radius: f32,
    /// Ground distance a caught zombie is pushed away from the turret.
    pub knockback_distance: f32,
}

impl Default for AirConfig {
    fn default() -> Self {
        Self {
            fire_rate_secs: 1.5,
            damage: 10.0,
            blast_radius: 400.0,
            knockback_distance: 200.0,
        }
    }
}

/// Turret tuning.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Zombies must be strictly closer than this to be engaged.
    pub detection_range: f32,
    /// Fire turret tuning.
    pub fire: FireConfig,
    /// Ice turret tuning.
    pub ice: IceConfig,
    /// Lightning turret tuning.
    pub lightning: LightningConfig,
    /// Air turret tuning.
    pub air: AirConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detection_range: 2_000.0,
            fire: FireConfig::default(),
            ice: IceConfig::default(),
            lightning: LightningConfig::default(),
            air: AirConfig::default(),
        }
    }
}

impl Config {
    /// Interval between two shots of a turret kind.
    #[must_use]
    pub fn fire_interval(&self, kind: TurretKind) -> Duration {
        let secs = match kind {
            TurretKind::Fire => self.fire.fire_rate_secs,
            TurretKind::Ice => self.ice.fire_rate_secs,
            TurretKind::Lightning => self.lightning.fire_rate_secs,
            TurretKind::Air => self.air.fire_rate_secs,
        };
        duration_from_secs(secs)
    }

    /// Damage a turret kind deals to its primary target.
    #[must_use]
    pub fn damage(&self, kind: TurretKind) -> f32 {
        match kind {
            TurretKind::Fire => self.fire.damage,
            TurretKind::Ice => self.ice.damage,
            TurretKind::Lightning => self.lightning.damage,
            TurretKind::Air => self.air.damage,
        }
    }
}

/// Turret combat system that queues commands for turrets ready to fire.
#[derive(Debug)]
pub struct TurretCombat {
    config: Config,
    fire_timers: BTreeMap<StructureId, Duration>,
    freezes: BTreeMap<ZombieId, TimerHandle>,
    scratch: Vec<Command>,
}

impl TurretCombat {
    /// Creates a combat system with no armed turrets.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            fire_timers: BTreeMap::new(),
            freezes: BTreeMap::new(),
            scratch: Vec::new(),
        }
    }

    /// Turret tuning in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reports whether a zombie is currently chilled by an ice turret.
    #[must_use]
    pub fn is_frozen(&self, zombie: ZombieId) -> bool {
        self.freezes.contains_key(&zombie)
    }

    /// Advances every turret by `dt` and emits the commands of each shot.
    ///
    /// A turret without a target re-arms its full fire interval, so it never
    /// fires the instant a zombie walks into range. Chilled zombies get a
    /// [`Timer::FreezeExpired`] through `scheduler`; chilling them again
    /// restarts that timer instead of stacking the slow.
    pub fn handle<S: Scheduler<Timer> + ?Sized>(
        &mut self,
        dt: Duration,
        turrets: &[TurretSnapshot],
        zombies: &[ZombieSnapshot],
        scheduler: &mut S,
        out: &mut Vec<Command>,
    ) {
        self.fire_timers
            .retain(|id, _| turrets.iter().any(|turret| turret.id == *id));

        self.scratch.clear();
        let mut chilled = Vec::new();

        for turret in turrets {
            let interval = self.config.fire_interval(turret.kind);
            let timer = self.fire_timers.entry(turret.id).or_insert(interval);
            let Some(target) = nearest_zombie(turret, zombies, self.config.detection_range) else {
                *timer = interval;
                continue;
            };

            *timer = timer.saturating_sub(dt);
            if !timer.is_zero() {
                continue;
            }
            *timer = interval;

            match turret.kind {
                TurretKind::Fire => self.scratch.push(Command::DamageZombie {
                    zombie: target.id,
                    amount: self.config.fire.damage,
                }),
                TurretKind::Ice => {
                    let hit = cone_hits(&self.config.ice, turret.position, target, zombies);
                    for zombie in hit {
                        self.scratch.push(Command::DamageZombie {
                            zombie,
                            amount: self.config.ice.damage,
                        });
                        self.scratch.push(Command::SlowZombie {
                            zombie,
                            multiplier: self.config.ice.freeze_speed_multiplier,
                        });
                        chilled.push(zombie);
                    }
                }
                TurretKind::Lightning => {
                    strike(&self.config.lightning, target, zombies, &mut self.scratch);
                }
                TurretKind::Air => {
                    blast(&self.config.air, turret.position, target, zombies, &mut self.scratch);
                }
            }
        }

        let freeze = duration_from_secs(self.config.ice.freeze_secs);
        for zombie in chilled {
            if let Some(previous) = self.freezes.remove(&zombie) {
                let _ = scheduler.cancel(previous);
            }
            let handle = scheduler.schedule_once(freeze, Timer::FreezeExpired(zombie));
            let _ = self.freezes.insert(zombie, handle);
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    /// Freeze timer callback. Restores the zombie's normal speed.
    pub fn on_freeze_expired(&mut self, zombie: ZombieId, out: &mut Vec<Command>) {
        if self.freezes.remove(&zombie).is_some() {
            out.push(Command::RestoreZombieSpeed { zombie });
        }
    }

    /// Death notification. Cancels a pending freeze timer.
    pub fn on_zombie_died<S: Scheduler<Timer> + ?Sized>(
        &mut self,
        zombie: ZombieId,
        scheduler: &mut S,
    ) -> bool {
        match self.freezes.remove(&zombie) {
            Some(handle) => scheduler.cancel(handle),
            None => false,
        }
    }
}

fn nearest_zombie<'a>(
    turret: &TurretSnapshot,
    zombies: &'a [ZombieSnapshot],
    detection_range: f32,
) -> Option<&'a ZombieSnapshot> {
    zombies
        .iter()
        .filter(|zombie| !zombie.dead)
        .map(|zombie| (zombie, turret.position.distance(zombie.position)))
        .filter(|(_, distance)| *distance < detection_range)
        .fold(None, |best: Option<(&ZombieSnapshot, f32)>, candidate| match best {
            Some((_, closest)) if closest <= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(zombie, _)| zombie)
}

/// Living zombies inside the ice cone aimed at `target`.
fn cone_hits(
    config: &IceConfig,
    origin: Vec3,
    target: &ZombieSnapshot,
    zombies: &[ZombieSnapshot],
) -> Vec<ZombieId> {
    let Some(forward) = (target.position - origin).truncate().try_normalize() else {
        return Vec::new();
    };
    let half_angle = config.cone_angle_degrees.to_radians();

    zombies
        .iter()
        .filter(|zombie| !zombie.dead)
        .filter(|zombie| zombie.position.distance(origin) <= config.cone_range)
        .filter(|zombie| {
            (zombie.position - origin)
                .truncate()
                .try_normalize()
                .is_some_and(|heading| forward.dot(heading).clamp(-1.0, 1.0).acos() <= half_angle)
        })
        .map(|zombie| zombie.id)
        .collect()
}

fn strike(
    config: &LightningConfig,
    target: &ZombieSnapshot,
    zombies: &[ZombieSnapshot],
    out: &mut Vec<Command>,
) {
    out.push(Command::DamageZombie {
        zombie: target.id,
        amount: config.damage,
    });

    let splash = config.damage * config.aoe_damage_multiplier;
    for zombie in zombies {
        if zombie.dead || zombie.id == target.id {
            continue;
        }
        if zombie.position.distance(target.position) <= config.aoe_radius {
            out.push(Command::DamageZombie {
                zombie: zombie.id,
                amount: splash,
            });
        }
    }
}

fn blast(
    config: &AirConfig,
    origin: Vec3,
    target: &ZombieSnapshot,
    zombies: &[ZombieSnapshot],
    out: &mut Vec<Command>,
) {
    for zombie in zombies {
        if zombie.dead || zombie.position.distance(target.position) > config.blast_radius {
            continue;
        }

        out.push(Command::DamageZombie {
            zombie: zombie.id,
            amount: config.damage,
        });
        if let Some(away) = (zombie.position - origin).truncate().try_normalize() {
            out.push(Command::KnockBackZombie {
                zombie: zombie.id,
                displacement: (away * config.knockback_distance).extend(0.0),
            });
        }
    }
}
