use wizard_defence_core::Round;
use wizard_defence_system_round_scaling::{RoundScaling, ScalingConfig};

fn approx_eq(left: f32, right: f32) -> bool {
    (left - right).abs() <= right.abs() * 1e-5
}

#[test]
fn zombie_count_compounds_per_round() {
    let scaling = RoundScaling::new(ScalingConfig {
        base_zombies_per_wave: 5,
        zombies_increase_multiplier: 0.15,
        ..ScalingConfig::default()
    });

    assert_eq!(scaling.zombie_count(Round::new(1)), 5);
    assert_eq!(scaling.zombie_count(Round::new(5)), 9);
}

#[test]
fn zombie_count_never_decreases_with_non_negative_growth() {
    for multiplier in [0.0, 0.05, 0.15, 0.5] {
        let scaling = RoundScaling::new(ScalingConfig {
            zombies_increase_multiplier: multiplier,
            ..ScalingConfig::default()
        });

        let mut previous = scaling.zombie_count(Round::new(1));
        for round in 2..=40 {
            let current = scaling.zombie_count(Round::new(round));
            assert!(
                current >= previous,
                "count dropped at round {round} for multiplier {multiplier}",
            );
            previous = current;
        }
    }
}

#[test]
fn zombie_health_is_linear_through_round_ten() {
    let scaling = RoundScaling::new(ScalingConfig {
        base_zombie_health: 150.0,
        health_increase_per_round: 100.0,
        ..ScalingConfig::default()
    });

    assert_eq!(scaling.zombie_health(Round::new(1)), 150.0);
    assert_eq!(scaling.zombie_health(Round::new(10)), 1050.0);
    for round in 1..=10u32 {
        let expected = 150.0 + (round - 1) as f32 * 100.0;
        assert_eq!(scaling.zombie_health(Round::new(round)), expected);
    }
}

#[test]
fn zombie_health_compounds_after_round_ten() {
    let scaling = RoundScaling::default();
    let plateau = scaling.zombie_health(Round::new(10));

    assert!(approx_eq(scaling.zombie_health(Round::new(11)), 1155.0));
    for round in 11..=30u32 {
        let expected = plateau * 1.1f32.powi((round - 10) as i32);
        assert!(
            approx_eq(scaling.zombie_health(Round::new(round)), expected),
            "round {round} health diverged",
        );
    }
}

#[test]
fn money_per_kill_is_flat_then_compounds() {
    let scaling = RoundScaling::new(ScalingConfig {
        base_money_per_kill: 10,
        money_multiplier_after_round_10: 1.1,
        ..ScalingConfig::default()
    });

    for round in 1..=10 {
        assert_eq!(scaling.money_per_kill(Round::new(round)), 10);
    }
    assert_eq!(scaling.money_per_kill(Round::new(11)), 11);
    assert_eq!(scaling.money_per_kill(Round::new(15)), 16);
}
