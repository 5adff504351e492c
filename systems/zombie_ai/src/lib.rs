#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Zombie decision making.
//!
//! Every controlled zombie re-evaluates its target on a fixed cadence. A
//! candidate scores `weight / (path_length + 1)`, so objectives win when
//! routes are comparable while a much closer player still draws attention.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec3;
use serde::Deserialize;
use wizard_defence_core::{
    duration_from_secs, AttackTarget, Command, Navigation, Scheduler, TargetKind, TargetSnapshot,
    Timer, TimerHandle, ZombieId, ZombieSnapshot,
};

/// Tuning of the zombie decision cycle.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between two decisions of the same zombie.
    pub decision_interval_secs: f32,
    /// Distance from the target at which walking zombies stop.
    pub acceptance_radius: f32,
    /// Engagement distance against the player.
    pub player_attack_range: f32,
    /// Engagement distance against the tower. Overlapping the tower also counts.
    pub tower_attack_range: f32,
    /// Engagement distance against turrets.
    pub turret_attack_range: f32,
    /// Priority of the player.
    pub player_weight: f32,
    /// Priority of the tower.
    pub tower_weight: f32,
    /// Priority of turrets.
    pub turret_weight: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decision_interval_secs: 0.25,
            acceptance_radius: 50.0,
            player_attack_range: 150.0,
            tower_attack_range: 150.0,
            turret_attack_range: 150.0,
            player_weight: 1.0,
            tower_weight: 2.0,
            turret_weight: 1.5,
        }
    }
}

impl Config {
    /// Interval between two decisions of the same zombie.
    #[must_use]
    pub fn decision_interval(&self) -> Duration {
        duration_from_secs(self.decision_interval_secs)
    }

    /// Priority applied to a kind of target.
    #[must_use]
    pub fn weight(&self, kind: TargetKind) -> f32 {
        match kind {
            TargetKind::Player => self.player_weight,
            TargetKind::Tower => self.tower_weight,
            TargetKind::Turret => self.turret_weight,
        }
    }

    /// Engagement distance for a kind of target.
    #[must_use]
    pub fn attack_range(&self, kind: TargetKind) -> f32 {
        match kind {
            TargetKind::Player => self.player_attack_range,
            TargetKind::Tower => self.tower_attack_range,
            TargetKind::Turret => self.turret_attack_range,
        }
    }
}

/// Picks the best target for a zombie standing at `from`.
///
/// Only living candidates are considered. The highest path score wins, with
/// earlier candidates kept on ties. When no candidate is reachable the nearest
/// one in a straight line is returned instead.
#[must_use]
pub fn select_target<N: Navigation + ?Sized>(
    config: &Config,
    from: Vec3,
    candidates: &[TargetSnapshot],
    navigation: &N,
) -> Option<TargetSnapshot> {
    let mut best: Option<(TargetSnapshot, f32)> = None;
    for candidate in candidates.iter().filter(|candidate| candidate.alive) {
        let route = navigation.find_path(from, candidate.position);
        if !route.success {
            continue;
        }

        let score = config.weight(candidate.target.kind()) / (route.length.max(0.0) + 1.0);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((*candidate, score));
        }
    }

    if let Some((target, _)) = best {
        return Some(target);
    }

    let mut nearest: Option<(TargetSnapshot, f32)> = None;
    for candidate in candidates.iter().filter(|candidate| candidate.alive) {
        let distance = from.distance(candidate.position);
        if nearest.map_or(true, |(_, closest)| distance < closest) {
            nearest = Some((*candidate, distance));
        }
    }
    nearest.map(|(target, _)| target)
}

/// Drives the decision cycles of every controlled zombie.
#[derive(Debug)]
pub struct ZombieAi {
    config: Config,
    timers: BTreeMap<ZombieId, TimerHandle>,
}

impl ZombieAi {
    /// Creates a controller with no zombies.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            timers: BTreeMap::new(),
        }
    }

    /// Configuration of the controller.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Takes control of a zombie and starts its decision cycle.
    ///
    /// Possessing a zombie twice keeps the original cycle.
    pub fn possess<S: Scheduler<Timer> + ?Sized>(&mut self, zombie: ZombieId, scheduler: &mut S) {
        if self.timers.contains_key(&zombie) {
            return;
        }

        let handle = scheduler.schedule_repeating(
            self.config.decision_interval(),
            Timer::ZombieDecision(zombie),
        );
        let _ = self.timers.insert(zombie, handle);
    }

    /// Reports whether the zombie's decision cycle is running.
    #[must_use]
    pub fn controls(&self, zombie: ZombieId) -> bool {
        self.timers.contains_key(&zombie)
    }

    /// Number of zombies under control.
    #[must_use]
    pub fn controlled_count(&self) -> usize {
        self.timers.len()
    }

    /// Death notification. Stops the zombie's decision cycle.
    pub fn on_zombie_died<S: Scheduler<Timer> + ?Sized>(
        &mut self,
        zombie: ZombieId,
        scheduler: &mut S,
    ) -> bool {
        match self.timers.remove(&zombie) {
            Some(handle) => scheduler.cancel(handle),
            None => false,
        }
    }

    /// Runs one decision cycle for a zombie and emits the resulting commands.
    ///
    /// `overlaps` reports whether the zombie touches a target's body, which
    /// puts towers in range regardless of distance. Dead zombies and empty
    /// candidate lists produce no commands.
    pub fn decide<N, O>(
        &self,
        zombie: &ZombieSnapshot,
        candidates: &[TargetSnapshot],
        navigation: &N,
        overlaps: O,
        out: &mut Vec<Command>,
    ) where
        N: Navigation + ?Sized,
        O: Fn(AttackTarget) -> bool,
    {
        if zombie.dead {
            return;
        }

        let Some(target) = select_target(&self.config, zombie.position, candidates, navigation)
        else {
            return;
        };

        let kind = target.target.kind();
        let distance = zombie.position.distance(target.position);
        let in_range = distance <= self.config.attack_range(kind)
            || (kind == TargetKind::Tower && overlaps(target.target));

        if in_range {
            out.push(Command::StopZombie { zombie: zombie.id });
            out.push(Command::FaceZombie {
                zombie: zombie.id,
                direction: target.position - zombie.position,
            });
            if !zombie.attacking {
                tracing::debug!(zombie = zombie.id.get(), ?kind, "zombie attacks");
                out.push(Command::ZombieAttack {
                    zombie: zombie.id,
                    target: target.target,
                });
            }
        } else {
            out.push(Command::MoveZombie {
                zombie: zombie.id,
                destination: target.position,
                acceptance_radius: self.config.acceptance_radius,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizard_defence_core::{PathQuery, StructureId, StructureKind, TurretKind};

    struct StraightLine;

    impl Navigation for StraightLine {
        fn find_path(&self, from: Vec3, to: Vec3) -> PathQuery {
            PathQuery::reachable(from.distance(to))
        }
    }

    struct Nowhere;

    impl Navigation for Nowhere {
        fn find_path(&self, _from: Vec3, _to: Vec3) -> PathQuery {
            PathQuery::UNREACHABLE
        }
    }

    fn player(position: Vec3) -> TargetSnapshot {
        TargetSnapshot {
            target: AttackTarget::Player,
            position,
            alive: true,
        }
    }

    fn structure(id: u32, kind: StructureKind, position: Vec3) -> TargetSnapshot {
        TargetSnapshot {
            target: AttackTarget::Structure {
                id: StructureId::new(id),
                kind,
            },
            position,
            alive: true,
        }
    }

    #[test]
    fn objectives_win_when_routes_are_comparable() {
        let candidates = [
            player(Vec3::new(100.0, 0.0, 0.0)),
            structure(0, StructureKind::Tower, Vec3::new(150.0, 0.0, 0.0)),
        ];
        let chosen = select_target(&Config::default(), Vec3::ZERO, &candidates, &StraightLine);
        assert_eq!(chosen, Some(candidates[1]));
    }

    #[test]
    fn close_player_beats_distant_tower() {
        let candidates = [
            player(Vec3::new(100.0, 0.0, 0.0)),
            structure(0, StructureKind::Tower, Vec3::new(1_000.0, 0.0, 0.0)),
        ];
        let chosen = select_target(&Config::default(), Vec3::ZERO, &candidates, &StraightLine);
        assert_eq!(chosen, Some(candidates[0]));
    }

    #[test]
    fn turrets_rank_between_player_and_tower() {
        let config = Config::default();
        assert!(config.weight(TargetKind::Turret) > config.weight(TargetKind::Player));
        assert!(config.weight(TargetKind::Turret) < config.weight(TargetKind::Tower));
    }

    #[test]
    fn unreachable_candidates_fall_back_to_nearest() {
        let candidates = [
            structure(0, StructureKind::Tower, Vec3::new(900.0, 0.0, 0.0)),
            player(Vec3::new(0.0, 300.0, 0.0)),
        ];
        let chosen = select_target(&Config::default(), Vec3::ZERO, &candidates, &Nowhere);
        assert_eq!(chosen, Some(candidates[1]));
    }

    #[test]
    fn dead_candidates_are_ignored() {
        let mut fallen = player(Vec3::new(10.0, 0.0, 0.0));
        fallen.alive = false;
        assert_eq!(
            select_target(&Config::default(), Vec3::ZERO, &[fallen], &StraightLine),
            None
        );
        assert_eq!(
            select_target(&Config::default(), Vec3::ZERO, &[fallen], &Nowhere),
            None
        );
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        let candidates = [
            structure(3, StructureKind::Turret(TurretKind::Fire), Vec3::new(200.0, 0.0, 0.0)),
            structure(4, StructureKind::Turret(TurretKind::Fire), Vec3::new(-200.0, 0.0, 0.0)),
        ];
        let chosen = select_target(&Config::default(), Vec3::ZERO, &candidates, &StraightLine);
        assert_eq!(chosen, Some(candidates[0]));
    }
}
