#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Wizard Defence.
//!
//! The world owns every zombie, the player and the player's structures. It is
//! mutated exclusively through [`apply`] and observed through the [`query`]
//! module. It also serves as the collaborator the gameplay systems talk to:
//! it creates zombies for spawn gates, restores the player's health for the
//! wave manager and answers route queries for the zombie AI.

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use glam::{Quat, Vec2, Vec3};
use serde::Deserialize;
use wizard_defence_core::{
    duration_from_secs, AttackTarget, Command, EntityFactory, Event, Navigation, PathQuery,
    PlayerVitals, StructureKind, ZombieId, ZombieTemplate, WELCOME_BANNER,
};

mod navigation;
mod structures;

pub use navigation::{NavGrid, NavGridConfig};

use structures::{DamageOutcome, StructureRegistry};

/// Tunable parameters of the world.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Where the player stands.
    pub player_position: [f32; 3],
    /// Health the player starts with and is restored to.
    pub player_max_health: f32,
    /// Health of the main tower.
    pub tower_max_health: f32,
    /// Half-size of the box around the tower inside which zombies can hit it.
    pub tower_attack_extent: [f32; 3],
    /// Health of a turret.
    pub turret_max_health: f32,
    /// Collision radius of a zombie.
    pub zombie_radius: f32,
    /// Seconds a corpse stays in the world before it is removed.
    pub corpse_lifetime_secs: f32,
    /// Walkable grid used for route queries.
    pub navigation: NavGridConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            player_position: [0.0, 0.0, 0.0],
            player_max_health: 100.0,
            tower_max_health: 1_000.0,
            tower_attack_extent: [200.0, 200.0, 400.0],
            turret_max_health: 300.0,
            zombie_radius: 40.0,
            corpse_lifetime_secs: 5.0,
            navigation: NavGridConfig::default(),
        }
    }
}

impl WorldConfig {
    fn corpse_lifetime(&self) -> Duration {
        duration_from_secs(self.corpse_lifetime_secs)
    }

    fn max_health_for(&self, kind: StructureKind) -> f32 {
        match kind {
            StructureKind::Tower => self.tower_max_health,
            StructureKind::Turret(_) => self.turret_max_health,
        }
    }
}

#[derive(Clone, Debug)]
struct Player {
    position: Vec3,
    health: f32,
    max_health: f32,
}

impl Player {
    fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Slack absorbed when comparing against the acceptance radius.
const ARRIVAL_SLACK: f32 = 1e-3;

#[derive(Clone, Debug)]
struct MoveOrder {
    destination: Vec3,
    acceptance_radius: f32,
    waypoints: VecDeque<Vec2>,
}

#[derive(Clone, Debug)]
struct Zombie {
    id: ZombieId,
    position: Vec3,
    rotation: Quat,
    health: f32,
    max_health: f32,
    attack_damage: f32,
    attack_range: f32,
    attack_duration: Duration,
    move_speed: f32,
    speed_multiplier: f32,
    order: Option<MoveOrder>,
    attack_remaining: Duration,
    corpse_remaining: Option<Duration>,
}

impl Zombie {
    fn from_template(id: ZombieId, template: &ZombieTemplate, position: Vec3, rotation: Quat) -> Self {
        Self {
            id,
            position,
            rotation,
            health: template.max_health,
            max_health: template.max_health,
            attack_damage: template.attack_damage,
            attack_range: template.attack_range,
            attack_duration: template.attack_duration(),
            move_speed: template.move_speed.max(0.0),
            speed_multiplier: 1.0,
            order: None,
            attack_remaining: Duration::ZERO,
            corpse_remaining: None,
        }
    }

    fn is_dead(&self) -> bool {
        self.corpse_remaining.is_some()
    }

    fn is_attacking(&self) -> bool {
        !self.attack_remaining.is_zero()
    }

    fn face(&mut self, direction: Vec3) {
        let flat = direction.truncate();
        if flat.length_squared() > f32::EPSILON {
            self.rotation = Quat::from_rotation_z(flat.y.atan2(flat.x));
        }
    }

    /// Walks along the current route, never entering a blocked cell.
    ///
    /// A zombie whose way is blocked drops its order and waits for the next one.
    fn advance(&mut self, dt: Duration, navigation: &NavGrid) {
        self.attack_remaining = self.attack_remaining.saturating_sub(dt);

        let mut budget = self.move_speed * self.speed_multiplier * dt.as_secs_f32();
        let Some(order) = self.order.as_mut() else {
            return;
        };

        let goal = order.destination.truncate();
        let mut position = self.position.truncate();
        let mut heading = None;
        let mut finished = false;
        loop {
            if position.distance(goal) <= order.acceptance_radius + ARRIVAL_SLACK {
                finished = true;
                break;
            }
            if budget <= 0.0 {
                break;
            }
            let Some(&waypoint) = order.waypoints.front() else {
                finished = true;
                break;
            };

            let offset = waypoint - position;
            let distance = offset.length();
            if distance <= f32::EPSILON {
                let _ = order.waypoints.pop_front();
                continue;
            }

            let reach = if order.waypoints.len() == 1 {
                distance - order.acceptance_radius
            } else {
                distance
            };
            let step = budget.min(reach).max(0.0);
            let direction = offset / distance;
            let wanted = position + direction * step;
            let reached = navigation.walkable_extent(position, wanted);
            heading = Some(direction);
            budget -= step;
            position = reached;

            if reached.distance(wanted) > f32::EPSILON {
                finished = true;
                break;
            }
            if step >= distance {
                let _ = order.waypoints.pop_front();
            }
        }

        self.position = position.extend(self.position.z);
        if let Some(direction) = heading {
            self.face(direction.extend(0.0));
        }
        if finished {
            self.order = None;
        }
    }
}

/// Represents the authoritative Wizard Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: WorldConfig,
    navigation: NavGrid,
    player: Player,
    zombies: BTreeMap<ZombieId, Zombie>,
    next_zombie_id: ZombieId,
    structures: StructureRegistry,
    elapsed: Duration,
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world from the provided configuration.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let max_health = config.player_max_health.max(0.0);
        Self {
            banner: WELCOME_BANNER,
            navigation: NavGrid::new(&config.navigation),
            player: Player {
                position: Vec3::from(config.player_position),
                health: max_health,
                max_health,
            },
            zombies: BTreeMap::new(),
            next_zombie_id: ZombieId::new(0),
            structures: StructureRegistry::new(),
            elapsed: Duration::ZERO,
            config,
        }
    }

    fn living_zombie_mut(&mut self, zombie: ZombieId) -> Option<&mut Zombie> {
        self.zombies
            .get_mut(&zombie)
            .filter(|zombie| !zombie.is_dead())
    }

    fn advance_zombies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut expired = Vec::new();
        for zombie in self.zombies.values_mut() {
            match zombie.corpse_remaining {
                Some(remaining) => {
                    let remaining = remaining.saturating_sub(dt);
                    zombie.corpse_remaining = Some(remaining);
                    if remaining.is_zero() {
                        expired.push(zombie.id);
                    }
                }
                None => zombie.advance(dt, &self.navigation),
            }
        }

        for zombie in expired {
            if self.zombies.remove(&zombie).is_some() {
                out_events.push(Event::ZombieRemoved { zombie });
            }
        }
    }

    fn damage_zombie(&mut self, zombie: ZombieId, amount: f32, out_events: &mut Vec<Event>) {
        if amount <= 0.0 {
            return;
        }

        let corpse_lifetime = self.config.corpse_lifetime();
        let Some(state) = self.living_zombie_mut(zombie) else {
            return;
        };

        state.health = (state.health - amount).max(0.0);
        if state.health > 0.0 {
            return;
        }

        state.order = None;
        state.attack_remaining = Duration::ZERO;
        state.speed_multiplier = 1.0;
        state.corpse_remaining = Some(corpse_lifetime);
        out_events.push(Event::ZombieDied { zombie });
    }

    fn zombie_attack(&mut self, zombie: ZombieId, target: AttackTarget, out_events: &mut Vec<Event>) {
        let Some(attacker) = self.zombies.get(&zombie) else {
            return;
        };
        if attacker.is_dead() || attacker.is_attacking() {
            return;
        }

        let (position, range, damage, duration) = (
            attacker.position,
            attacker.attack_range,
            attacker.attack_damage,
            attacker.attack_duration,
        );

        let hit = match target {
            AttackTarget::Player => {
                self.player.is_alive() && self.player.position.distance(position) <= range
            }
            AttackTarget::Structure { id, kind } => {
                self.structures.get(id).is_some_and(|state| {
                    state.position.distance(position) <= range
                        || (kind == StructureKind::Tower && query::overlaps_structure(self, zombie, id))
                })
            }
        };

        if let Some(attacker) = self.zombies.get_mut(&zombie) {
            attacker.attack_remaining = duration;
            attacker.order = None;
        }
        out_events.push(Event::ZombieAttacked {
            zombie,
            target,
            hit,
        });

        if hit {
            self.damage_target(target, damage, out_events);
        }
    }

    fn damage_target(&mut self, target: AttackTarget, amount: f32, out_events: &mut Vec<Event>) {
        match target {
            AttackTarget::Player => {
                if !self.player.is_alive() {
                    return;
                }
                self.player.health = (self.player.health - amount.max(0.0)).max(0.0);
                out_events.push(Event::PlayerDamaged {
                    amount,
                    remaining: self.player.health,
                });
                if !self.player.is_alive() {
                    tracing::info!("player died");
                    out_events.push(Event::PlayerDied);
                }
            }
            AttackTarget::Structure { id, .. } => {
                if let Some(DamageOutcome::Destroyed(kind)) = self.structures.damage(id, amount) {
                    tracing::info!(structure = id.get(), ?kind, "structure destroyed");
                    out_events.push(Event::StructureDestroyed {
                        structure: id,
                        kind,
                    });
                    if kind == StructureKind::Tower {
                        out_events.push(Event::TowerLost { structure: id });
                    }
                }
            }
        }
    }

    fn order_move(&mut self, zombie: ZombieId, destination: Vec3, acceptance_radius: f32) {
        let Some(from) = self
            .zombies
            .get(&zombie)
            .filter(|state| !state.is_dead())
            .map(|state| state.position)
        else {
            return;
        };

        let waypoints = self
            .navigation
            .find_route(from, destination)
            .unwrap_or_else(|| vec![destination.truncate()]);
        if let Some(state) = self.living_zombie_mut(zombie) {
            state.order = Some(MoveOrder {
                destination,
                acceptance_radius: acceptance_radius.max(0.0),
                waypoints: waypoints.into(),
            });
        }
    }

    fn knock_back(&mut self, zombie: ZombieId, displacement: Vec3) {
        let Some(state) = self
            .zombies
            .get_mut(&zombie)
            .filter(|state| !state.is_dead())
        else {
            return;
        };

        let from = state.position.truncate();
        let landed = self
            .navigation
            .walkable_extent(from, from + displacement.truncate());
        if landed.is_finite() {
            state.position = landed.extend(state.position.z);
        }
    }

    fn restore_player(&mut self) {
        self.player.health = self.player.max_health;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityFactory for World {
    fn create_zombie(
        &mut self,
        template: &ZombieTemplate,
        position: Vec3,
        rotation: Quat,
    ) -> Option<ZombieId> {
        if !position.is_finite() || template.max_health <= 0.0 {
            return None;
        }

        let id = self.next_zombie_id;
        self.next_zombie_id = ZombieId::new(id.get().checked_add(1)?);
        let _ = self
            .zombies
            .insert(id, Zombie::from_template(id, template, position, rotation));
        Some(id)
    }

    fn set_zombie_health(&mut self, zombie: ZombieId, health: f32) {
        if health <= 0.0 {
            return;
        }
        if let Some(state) = self.living_zombie_mut(zombie) {
            state.max_health = health;
            state.health = health;
        }
    }

    fn is_zombie_alive(&self, zombie: ZombieId) -> bool {
        self.zombies
            .get(&zombie)
            .is_some_and(|state| !state.is_dead())
    }
}

impl PlayerVitals for World {
    fn restore_player_health(&mut self) {
        self.restore_player();
    }
}

impl Navigation for World {
    fn find_path(&self, from: Vec3, to: Vec3) -> PathQuery {
        self.navigation.find_path(from, to)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_zombies(dt, out_events);
        }
        Command::MoveZombie {
            zombie,
            destination,
            acceptance_radius,
        } => world.order_move(zombie, destination, acceptance_radius),
        Command::StopZombie { zombie } => {
            if let Some(state) = world.living_zombie_mut(zombie) {
                state.order = None;
            }
        }
        Command::FaceZombie { zombie, direction } => {
            if let Some(state) = world.living_zombie_mut(zombie) {
                state.face(direction);
            }
        }
        Command::ZombieAttack { zombie, target } => world.zombie_attack(zombie, target, out_events),
        Command::DamageZombie { zombie, amount } => world.damage_zombie(zombie, amount, out_events),
        Command::SlowZombie { zombie, multiplier } => {
            if let Some(state) = world.living_zombie_mut(zombie) {
                state.speed_multiplier = if multiplier.is_finite() {
                    multiplier.clamp(0.0, 1.0)
                } else {
                    1.0
                };
            }
        }
        Command::RestoreZombieSpeed { zombie } => {
            if let Some(state) = world.living_zombie_mut(zombie) {
                state.speed_multiplier = 1.0;
            }
        }
        Command::KnockBackZombie {
            zombie,
            displacement,
        } => world.knock_back(zombie, displacement),
        Command::PlaceStructure { kind, position } => {
            let health = world.config.max_health_for(kind);
            let structure = world.structures.insert(kind, position, health);
            tracing::debug!(structure = structure.get(), ?kind, "structure placed");
            out_events.push(Event::StructurePlaced { structure, kind });
        }
        Command::RestorePlayerHealth => {
            world.restore_player();
            out_events.push(Event::PlayerHealthRestored);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::{Quat, Vec3};
    use wizard_defence_core::{
        AttackTarget, StructureId, StructureKind, TargetSnapshot, TurretSnapshot, ZombieId,
        ZombieSnapshot,
    };

    use super::{NavGrid, World, Zombie};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Total simulated time applied to the world.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Provides read-only access to the navigation grid.
    #[must_use]
    pub fn navigation(world: &World) -> &NavGrid {
        &world.navigation
    }

    /// Captures a read-only view of every zombie, corpses included.
    #[must_use]
    pub fn zombie_view(world: &World) -> ZombieView {
        ZombieView {
            snapshots: world.zombies.values().map(snapshot).collect(),
        }
    }

    /// Snapshot of a single zombie, if it still exists.
    #[must_use]
    pub fn zombie(world: &World, zombie: ZombieId) -> Option<ZombieSnapshot> {
        world.zombies.get(&zombie).map(snapshot)
    }

    /// Current health of a zombie, if it still exists.
    #[must_use]
    pub fn zombie_health(world: &World, zombie: ZombieId) -> Option<f32> {
        world.zombies.get(&zombie).map(|state| state.health)
    }

    /// Maximum health of a zombie, if it still exists.
    #[must_use]
    pub fn zombie_max_health(world: &World, zombie: ZombieId) -> Option<f32> {
        world.zombies.get(&zombie).map(|state| state.max_health)
    }

    /// Orientation of a zombie, if it still exists.
    #[must_use]
    pub fn zombie_rotation(world: &World, zombie: ZombieId) -> Option<Quat> {
        world.zombies.get(&zombie).map(|state| state.rotation)
    }

    /// Movement speed multiplier of a zombie; `1.0` unless it is slowed.
    #[must_use]
    pub fn zombie_speed_multiplier(world: &World, zombie: ZombieId) -> Option<f32> {
        world.zombies.get(&zombie).map(|state| state.speed_multiplier)
    }

    /// Number of zombies that are alive.
    #[must_use]
    pub fn living_zombie_count(world: &World) -> usize {
        world.zombies.values().filter(|state| !state.is_dead()).count()
    }

    /// Enumerates every attackable target: the player first, then structures.
    #[must_use]
    pub fn target_view(world: &World) -> Vec<TargetSnapshot> {
        let player = TargetSnapshot {
            target: AttackTarget::Player,
            position: world.player.position,
            alive: world.player.is_alive(),
        };

        std::iter::once(player)
            .chain(world.structures.iter().map(|state| TargetSnapshot {
                target: AttackTarget::Structure {
                    id: state.id,
                    kind: state.kind,
                },
                position: state.position,
                alive: state.health > 0.0,
            }))
            .collect()
    }

    /// Enumerates turrets in identifier order.
    #[must_use]
    pub fn turret_view(world: &World) -> Vec<TurretSnapshot> {
        world
            .structures
            .iter()
            .filter_map(|state| match state.kind {
                StructureKind::Turret(kind) => Some(TurretSnapshot {
                    id: state.id,
                    kind,
                    position: state.position,
                }),
                StructureKind::Tower => None,
            })
            .collect()
    }

    /// First structure standing within `radius` of the position on the ground plane.
    #[must_use]
    pub fn structure_near(world: &World, position: Vec3, radius: f32) -> Option<StructureId> {
        world
            .structures
            .iter()
            .find(|state| state.position.truncate().distance(position.truncate()) <= radius)
            .map(|state| state.id)
    }

    /// Reports whether a zombie touches the attack volume of a tower.
    ///
    /// Turrets have no attack volume and never overlap.
    #[must_use]
    pub fn overlaps_structure(world: &World, zombie: ZombieId, structure: StructureId) -> bool {
        let (Some(zombie), Some(structure)) =
            (world.zombies.get(&zombie), world.structures.get(structure))
        else {
            return false;
        };
        if structure.kind != StructureKind::Tower {
            return false;
        }

        let extent = Vec3::from(world.config.tower_attack_extent).abs();
        let closest = zombie
            .position
            .clamp(structure.position - extent, structure.position + extent);
        closest.distance(zombie.position) <= world.config.zombie_radius.max(0.0)
    }

    /// Current health of the player.
    #[must_use]
    pub fn player_health(world: &World) -> f32 {
        world.player.health
    }

    /// Maximum health of the player.
    #[must_use]
    pub fn player_max_health(world: &World) -> f32 {
        world.player.max_health
    }

    /// Where the player stands.
    #[must_use]
    pub fn player_position(world: &World) -> Vec3 {
        world.player.position
    }

    /// Current health of a structure, if it still stands.
    #[must_use]
    pub fn structure_health(world: &World, structure: StructureId) -> Option<f32> {
        world.structures.get(structure).map(|state| state.health)
    }

    /// Reports whether at least one tower still stands.
    #[must_use]
    pub fn tower_standing(world: &World) -> bool {
        world
            .structures
            .iter()
            .any(|state| state.kind == StructureKind::Tower)
    }

    fn snapshot(zombie: &Zombie) -> ZombieSnapshot {
        ZombieSnapshot {
            id: zombie.id,
            position: zombie.position,
            dead: zombie.is_dead(),
            attacking: zombie.is_attacking(),
        }
    }

    /// Read-only snapshot describing all zombies in identifier order.
    #[derive(Clone, Debug)]
    pub struct ZombieView {
        snapshots: Vec<ZombieSnapshot>,
    }

    impl ZombieView {
        /// Iterator over the captured zombie snapshots.
        pub fn iter(&self) -> impl Iterator<Item = &ZombieSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ZombieSnapshot> {
            self.snapshots
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizard_defence_core::{StructureId, TurretKind};

    /// Five by five grid of 100-unit cells with its lower corner at the origin.
    fn walled_world(blocked: Vec<[u32; 2]>) -> World {
        World::with_config(WorldConfig {
            navigation: NavGridConfig {
                origin: [0.0, 0.0],
                cell_size: 100.0,
                columns: 5,
                rows: 5,
                blocked,
            },
            ..WorldConfig::default()
        })
    }

    fn order(world: &mut World, zombie: ZombieId, destination: Vec3) {
        let mut events = Vec::new();
        apply(
            world,
            Command::MoveZombie {
                zombie,
                destination,
                acceptance_radius: 10.0,
            },
            &mut events,
        );
    }

    fn tick(world: &mut World, dt: Duration) {
        let mut events = Vec::new();
        apply(world, Command::Tick { dt }, &mut events);
    }

    fn spawn(world: &mut World, position: Vec3) -> ZombieId {
        world
            .create_zombie(&ZombieTemplate::default(), position, Quat::IDENTITY)
            .expect("zombie created")
    }

    fn place(world: &mut World, kind: StructureKind, position: Vec3) -> StructureId {
        let mut events = Vec::new();
        apply(world, Command::PlaceStructure { kind, position }, &mut events);
        match events.as_slice() {
            [Event::StructurePlaced { structure, .. }] => *structure,
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn lethal_damage_emits_single_death() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::ZERO);
        let mut events = Vec::new();

        apply(&mut world, Command::DamageZombie { zombie, amount: 60.0 }, &mut events);
        assert!(events.is_empty());
        apply(&mut world, Command::DamageZombie { zombie, amount: 60.0 }, &mut events);
        apply(&mut world, Command::DamageZombie { zombie, amount: 60.0 }, &mut events);

        assert_eq!(events, vec![Event::ZombieDied { zombie }]);
        assert!(!world.is_zombie_alive(zombie));
        assert!(query::zombie(&world, zombie).is_some_and(|snapshot| snapshot.dead));
    }

    #[test]
    fn corpses_are_removed_after_their_lifetime() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::ZERO);
        let mut events = Vec::new();
        apply(&mut world, Command::DamageZombie { zombie, amount: 500.0 }, &mut events);
        events.clear();

        apply(&mut world, Command::Tick { dt: Duration::from_secs(4) }, &mut events);
        assert!(query::zombie(&world, zombie).is_some());
        apply(&mut world, Command::Tick { dt: Duration::from_secs(1) }, &mut events);

        assert!(events.contains(&Event::ZombieRemoved { zombie }));
        assert!(query::zombie(&world, zombie).is_none());
    }

    #[test]
    fn health_override_replaces_template_health() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::ZERO);
        world.set_zombie_health(zombie, 750.0);
        assert_eq!(query::zombie_health(&world, zombie), Some(750.0));
        assert_eq!(query::zombie_max_health(&world, zombie), Some(750.0));
    }

    #[test]
    fn facing_ignores_vertical_component() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::ZERO);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::FaceZombie {
                zombie,
                direction: Vec3::new(0.0, 5.0, 9.0),
            },
            &mut events,
        );

        let rotation = query::zombie_rotation(&world, zombie).expect("exists");
        let forward = rotation * Vec3::X;
        assert!(forward.abs_diff_eq(Vec3::Y, 1e-5), "facing {forward:?}");
    }

    #[test]
    fn zombies_walk_until_inside_acceptance_radius() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::ZERO);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveZombie {
                zombie,
                destination: Vec3::new(1_000.0, 0.0, 0.0),
                acceptance_radius: 50.0,
            },
            &mut events,
        );

        for _ in 0..10 {
            apply(&mut world, Command::Tick { dt: Duration::from_secs(1) }, &mut events);
        }

        let position = query::zombie(&world, zombie).expect("alive").position;
        assert!((position.x - 950.0).abs() < 1e-3, "stopped at {position:?}");
    }

    #[test]
    fn attack_out_of_range_misses() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::new(1_000.0, 0.0, 0.0));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ZombieAttack {
                zombie,
                target: AttackTarget::Player,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::ZombieAttacked {
                zombie,
                target: AttackTarget::Player,
                hit: false,
            }]
        );
        assert_eq!(query::player_health(&world), 100.0);
    }

    #[test]
    fn player_dies_after_repeated_hits_and_can_be_restored() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::new(100.0, 0.0, 0.0));
        let mut events = Vec::new();

        for _ in 0..5 {
            apply(
                &mut world,
                Command::ZombieAttack {
                    zombie,
                    target: AttackTarget::Player,
                },
                &mut events,
            );
            apply(&mut world, Command::Tick { dt: Duration::from_secs(1) }, &mut events);
        }

        assert_eq!(query::player_health(&world), 0.0);
        assert_eq!(
            events.iter().filter(|event| **event == Event::PlayerDied).count(),
            1
        );

        apply(&mut world, Command::RestorePlayerHealth, &mut events);
        assert_eq!(query::player_health(&world), 100.0);
    }

    #[test]
    fn attacks_do_not_overlap_while_busy() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::new(100.0, 0.0, 0.0));
        let mut events = Vec::new();
        let attack = Command::ZombieAttack {
            zombie,
            target: AttackTarget::Player,
        };

        apply(&mut world, attack.clone(), &mut events);
        apply(&mut world, attack, &mut events);

        assert_eq!(query::player_health(&world), 80.0);
    }

    #[test]
    fn tower_overlap_counts_as_in_range() {
        let mut world = World::new();
        let tower = place(&mut world, StructureKind::Tower, Vec3::ZERO);
        let zombie = spawn(&mut world, Vec3::new(230.0, 0.0, 0.0));
        let far = spawn(&mut world, Vec3::new(600.0, 0.0, 0.0));

        assert!(query::overlaps_structure(&world, zombie, tower));
        assert!(!query::overlaps_structure(&world, far, tower));
    }

    #[test]
    fn destroying_tower_reports_loss() {
        let mut world = World::with_config(WorldConfig {
            tower_max_health: 20.0,
            ..WorldConfig::default()
        });
        let tower = place(&mut world, StructureKind::Tower, Vec3::ZERO);
        let zombie = spawn(&mut world, Vec3::new(100.0, 0.0, 0.0));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ZombieAttack {
                zombie,
                target: AttackTarget::Structure {
                    id: tower,
                    kind: StructureKind::Tower,
                },
            },
            &mut events,
        );

        assert!(events.contains(&Event::StructureDestroyed {
            structure: tower,
            kind: StructureKind::Tower,
        }));
        assert!(events.contains(&Event::TowerLost { structure: tower }));
        assert!(!query::tower_standing(&world));
    }

    #[test]
    fn target_view_lists_player_then_structures() {
        let mut world = World::new();
        let turret = place(
            &mut world,
            StructureKind::Turret(TurretKind::Ice),
            Vec3::new(300.0, 0.0, 0.0),
        );

        let targets = query::target_view(&world);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].target, AttackTarget::Player);
        assert_eq!(
            targets[1].target,
            AttackTarget::Structure {
                id: turret,
                kind: StructureKind::Turret(TurretKind::Ice),
            }
        );
        let turrets = query::turret_view(&world);
        assert_eq!(turrets.len(), 1);
        assert_eq!(turrets[0].kind, TurretKind::Ice);
        assert_eq!(
            query::structure_near(&world, Vec3::new(300.0, 0.5, 80.0), 1.0),
            Some(turret)
        );
        assert_eq!(query::structure_near(&world, Vec3::new(310.0, 0.0, 0.0), 1.0), None);
    }

    #[test]
    fn sealed_wall_holds_zombie_on_its_side() {
        let mut world = walled_world(vec![[2, 0], [2, 1], [2, 2], [2, 3], [2, 4]]);
        let zombie = spawn(&mut world, Vec3::new(50.0, 250.0, 0.0));
        order(&mut world, zombie, Vec3::new(450.0, 250.0, 0.0));

        for _ in 0..20 {
            tick(&mut world, Duration::from_secs(1));
            let position = query::zombie(&world, zombie).expect("alive").position;
            assert!(position.x < 200.0, "walked through the wall to {position:?}");
        }
    }

    #[test]
    fn zombies_route_through_gap_in_wall() {
        let mut world = walled_world(vec![[2, 0], [2, 1], [2, 2], [2, 3]]);
        let zombie = spawn(&mut world, Vec3::new(50.0, 50.0, 0.0));
        let destination = Vec3::new(450.0, 50.0, 0.0);
        order(&mut world, zombie, destination);

        for _ in 0..200 {
            tick(&mut world, Duration::from_millis(50));
            let position = query::zombie(&world, zombie).expect("alive").position;
            assert!(
                !query::navigation(&world).is_blocked_at(position),
                "stood inside the wall at {position:?}"
            );
        }

        let position = query::zombie(&world, zombie).expect("alive").position;
        assert!(position.distance(destination) <= 10.0 + 1e-2, "ended at {position:?}");
    }

    #[test]
    fn slowed_zombies_cover_less_ground_until_restored() {
        let mut world = World::new();
        let zombie = spawn(&mut world, Vec3::ZERO);
        let mut events = Vec::new();
        apply(&mut world, Command::SlowZombie { zombie, multiplier: 0.2 }, &mut events);
        order(&mut world, zombie, Vec3::new(2_000.0, 0.0, 0.0));

        tick(&mut world, Duration::from_secs(1));
        let slowed = query::zombie(&world, zombie).expect("alive").position.x;
        assert!((slowed - 60.0).abs() < 1e-3, "moved {slowed}");
        assert_eq!(query::zombie_speed_multiplier(&world, zombie), Some(0.2));

        apply(&mut world, Command::RestoreZombieSpeed { zombie }, &mut events);
        tick(&mut world, Duration::from_secs(1));
        let restored = query::zombie(&world, zombie).expect("alive").position.x;
        assert!((restored - 360.0).abs() < 1e-3, "moved {restored}");
    }

    #[test]
    fn knock_back_is_planar_and_stops_at_walls() {
        let mut world = walled_world(vec![[0, 2], [1, 2], [2, 2], [3, 2], [4, 2]]);
        let zombie = spawn(&mut world, Vec3::new(250.0, 50.0, 30.0));
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::KnockBackZombie {
                zombie,
                displacement: Vec3::new(0.0, 100.0, 500.0),
            },
            &mut events,
        );
        let position = query::zombie(&world, zombie).expect("alive").position;
        assert!((position.y - 150.0).abs() < 1e-3);
        assert_eq!(position.z, 30.0);

        apply(
            &mut world,
            Command::KnockBackZombie {
                zombie,
                displacement: Vec3::new(0.0, 400.0, 0.0),
            },
            &mut events,
        );
        let position = query::zombie(&world, zombie).expect("alive").position;
        assert!(position.y < 200.0, "pushed into the wall at {position:?}");
    }
}
