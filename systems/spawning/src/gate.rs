//! Spawn gates: bounded origination points for new zombies.

use std::collections::BTreeSet;

use glam::{Quat, Vec3};
use rand::Rng;
use wizard_defence_core::{EntityFactory, GateId, ZombieId, ZombieTemplate};

/// Default number of zombies a single gate may keep alive at once.
pub const DEFAULT_MAX_ACTIVE_PER_GATE: usize = 5;

/// Oriented box inside which a gate places new zombies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateVolume {
    /// World-space centre of the box.
    pub center: Vec3,
    /// Half-size of the box along each local axis.
    pub extent: Vec3,
    /// Orientation of the box, also used as the facing of spawned zombies.
    pub rotation: Quat,
}

impl GateVolume {
    /// Creates a volume from its centre, half-extent and orientation.
    #[must_use]
    pub const fn new(center: Vec3, extent: Vec3, rotation: Quat) -> Self {
        Self {
            center,
            extent,
            rotation,
        }
    }

    /// Samples a uniformly random point inside the box.
    ///
    /// Each local axis is sampled independently before the offset is rotated
    /// into world space.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec3 {
        let extent = self.extent.abs();
        let local = Vec3::new(
            rng.gen_range(-extent.x..=extent.x),
            rng.gen_range(-extent.y..=extent.y),
            rng.gen_range(-extent.z..=extent.z),
        );
        self.center + self.rotation * local
    }

    /// Reports whether a world-space point lies inside the box.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        let local = self.rotation.inverse() * (point - self.center);
        let extent = self.extent.abs() + Vec3::splat(1e-3);
        local.abs().cmple(extent).all()
    }
}

/// Spawn point that tracks the zombies it created.
///
/// The gate only keeps bookkeeping: the world owns zombie lifetime, and the
/// gate forgets a zombie once its death is reported or the world no longer
/// considers it alive.
#[derive(Clone, Debug)]
pub struct SpawnGate {
    id: GateId,
    volume: GateVolume,
    template: Option<ZombieTemplate>,
    max_active: usize,
    active: BTreeSet<ZombieId>,
}

impl SpawnGate {
    /// Creates a gate without a zombie template.
    #[must_use]
    pub fn new(id: GateId, volume: GateVolume, max_active: usize) -> Self {
        Self {
            id,
            volume,
            template: None,
            max_active,
            active: BTreeSet::new(),
        }
    }

    /// Attaches the template used for new zombies.
    #[must_use]
    pub fn with_template(mut self, template: ZombieTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Replaces or clears the zombie template.
    pub fn set_template(&mut self, template: Option<ZombieTemplate>) {
        self.template = template;
    }

    /// Identifier of the gate.
    #[must_use]
    pub const fn id(&self) -> GateId {
        self.id
    }

    /// Volume new zombies appear in.
    #[must_use]
    pub const fn volume(&self) -> &GateVolume {
        &self.volume
    }

    /// Maximum number of live zombies this gate is responsible for.
    #[must_use]
    pub const fn max_active(&self) -> usize {
        self.max_active
    }

    /// Zombies the gate currently tracks, without pruning.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Reports whether the gate tracks the zombie.
    #[must_use]
    pub fn tracks(&self, zombie: ZombieId) -> bool {
        self.active.contains(&zombie)
    }

    /// Reports whether another zombie may be spawned here.
    ///
    /// Zombies that are dead or no longer exist are pruned first.
    pub fn can_spawn<F: EntityFactory + ?Sized>(&mut self, entities: &F) -> bool {
        self.prune(entities);
        self.active.len() < self.max_active
    }

    /// Creates one zombie at a random point inside the gate volume.
    ///
    /// Returns `None` when the gate is at capacity, has no template, or the
    /// factory refused to create the zombie.
    pub fn spawn_zombie<F, R>(&mut self, factory: &mut F, rng: &mut R) -> Option<ZombieId>
    where
        F: EntityFactory + ?Sized,
        R: Rng,
    {
        if !self.can_spawn(&*factory) {
            return None;
        }

        let Some(template) = self.template.as_ref() else {
            tracing::warn!(gate = self.id.get(), "spawn gate has no zombie template");
            return None;
        };

        let position = self.volume.sample(rng);
        let zombie = factory.create_zombie(template, position, self.volume.rotation)?;
        let _ = self.active.insert(zombie);
        Some(zombie)
    }

    /// Death notification. Returns whether the zombie belonged to this gate.
    pub fn on_zombie_died(&mut self, zombie: ZombieId) -> bool {
        self.active.remove(&zombie)
    }

    fn prune<F: EntityFactory + ?Sized>(&mut self, entities: &F) {
        self.active.retain(|zombie| entities.is_zombie_alive(*zombie));
    }
}
