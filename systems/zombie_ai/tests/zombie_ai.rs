use std::time::Duration;

use glam::{Quat, Vec3};
use wizard_defence_core::{
    AttackTarget, Command, EntityFactory, Event, Scheduler, StructureId, StructureKind, Timer,
    TimerQueue, ZombieId, ZombieTemplate,
};
use wizard_defence_system_zombie_ai::{Config, ZombieAi};
use wizard_defence_world::{self as world, query, NavGridConfig, World, WorldConfig};

fn open_world() -> World {
    World::with_config(WorldConfig {
        navigation: NavGridConfig {
            origin: [-2_000.0, -2_000.0],
            cell_size: 100.0,
            columns: 40,
            rows: 40,
            blocked: Vec::new(),
        },
        ..WorldConfig::default()
    })
}

fn spawn(world: &mut World, position: Vec3) -> ZombieId {
    world
        .create_zombie(&ZombieTemplate::default(), position, Quat::IDENTITY)
        .expect("zombie")
}

fn place_tower(world: &mut World, position: Vec3) -> StructureId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::PlaceStructure {
            kind: StructureKind::Tower,
            position,
        },
        &mut events,
    );
    match events.as_slice() {
        [Event::StructurePlaced { structure, .. }] => *structure,
        other => panic!("unexpected events {other:?}"),
    }
}

fn decide(ai: &ZombieAi, world: &World, zombie: ZombieId) -> Vec<Command> {
    let snapshot = query::zombie(world, zombie).expect("zombie exists");
    let targets = query::target_view(world);
    let mut commands = Vec::new();
    ai.decide(
        &snapshot,
        &targets,
        world,
        |target| match target {
            AttackTarget::Structure { id, .. } => query::overlaps_structure(world, zombie, id),
            AttackTarget::Player => false,
        },
        &mut commands,
    );
    commands
}

#[test]
fn distant_zombie_walks_toward_its_target() {
    let world = {
        let mut world = open_world();
        let _ = spawn(&mut world, Vec3::new(1_000.0, 0.0, 0.0));
        world
    };
    let ai = ZombieAi::new(Config::default());

    let commands = decide(&ai, &world, ZombieId::new(0));
    assert_eq!(
        commands,
        vec![Command::MoveZombie {
            zombie: ZombieId::new(0),
            destination: query::player_position(&world),
            acceptance_radius: 50.0,
        }]
    );
}

#[test]
fn zombie_in_range_stops_faces_and_attacks() {
    let mut world = open_world();
    let zombie = spawn(&mut world, Vec3::new(120.0, 0.0, 0.0));
    let ai = ZombieAi::new(Config::default());

    let commands = decide(&ai, &world, zombie);
    assert_eq!(
        commands,
        vec![
            Command::StopZombie { zombie },
            Command::FaceZombie {
                zombie,
                direction: Vec3::new(-120.0, 0.0, 0.0),
            },
            Command::ZombieAttack {
                zombie,
                target: AttackTarget::Player,
            },
        ]
    );

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    assert_eq!(query::player_health(&world), 80.0);

    let again = decide(&ai, &world, zombie);
    assert!(
        !again
            .iter()
            .any(|command| matches!(command, Command::ZombieAttack { .. })),
        "attacked again while mid-attack"
    );
}

#[test]
fn zombie_touching_tower_attacks_it_beyond_range() {
    let mut world = World::with_config(WorldConfig {
        player_position: [-1_900.0, -1_900.0, 0.0],
        ..WorldConfig::default()
    });
    let tower = place_tower(&mut world, Vec3::new(1_000.0, 0.0, 0.0));
    let zombie = spawn(&mut world, Vec3::new(1_230.0, 0.0, 0.0));
    let ai = ZombieAi::new(Config::default());

    let commands = decide(&ai, &world, zombie);
    assert!(commands.contains(&Command::ZombieAttack {
        zombie,
        target: AttackTarget::Structure {
            id: tower,
            kind: StructureKind::Tower,
        },
    }));
}

#[test]
fn blocked_routes_fall_back_to_straight_line() {
    let mut blocked = Vec::new();
    for row in 0..40 {
        blocked.push([20, row]);
    }
    let mut world = World::with_config(WorldConfig {
        navigation: NavGridConfig {
            origin: [-2_000.0, -2_000.0],
            cell_size: 100.0,
            columns: 40,
            rows: 40,
            blocked,
        },
        player_position: [-1_000.0, 0.0, 0.0],
        ..WorldConfig::default()
    });
    let zombie = spawn(&mut world, Vec3::new(1_000.0, 0.0, 0.0));
    let ai = ZombieAi::new(Config::default());

    let commands = decide(&ai, &world, zombie);
    assert_eq!(
        commands,
        vec![Command::MoveZombie {
            zombie,
            destination: Vec3::new(-1_000.0, 0.0, 0.0),
            acceptance_radius: 50.0,
        }]
    );
}

#[test]
fn dead_zombies_take_no_decisions() {
    let mut world = open_world();
    let zombie = spawn(&mut world, Vec3::new(120.0, 0.0, 0.0));
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::DamageZombie {
            zombie,
            amount: 1_000.0,
        },
        &mut events,
    );

    let ai = ZombieAi::new(Config::default());
    assert!(decide(&ai, &world, zombie).is_empty());
}

#[test]
fn decision_cycles_run_until_death() {
    let mut timers = TimerQueue::new();
    let mut ai = ZombieAi::new(Config::default());
    let zombie = ZombieId::new(9);

    ai.possess(zombie, &mut timers);
    ai.possess(zombie, &mut timers);
    assert_eq!(timers.len(), 1);

    timers.advance(Duration::from_secs(1));
    let mut fired = 0;
    while let Some(timer) = timers.pop_due() {
        assert_eq!(timer, Timer::ZombieDecision(zombie));
        fired += 1;
    }
    assert_eq!(fired, 4);

    assert!(ai.on_zombie_died(zombie, &mut timers));
    assert!(!ai.on_zombie_died(zombie, &mut timers));
    assert!(!ai.controls(zombie));

    timers.advance(Duration::from_secs(1));
    assert_eq!(timers.pop_due(), None);
    assert_eq!(timers.now(), Duration::from_secs(2));
}
