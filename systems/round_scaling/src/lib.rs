#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure round scaling rules mapping a wave number to its size, toughness and
//! kill reward.

use serde::Deserialize;
use wizard_defence_core::Round;

/// Last round that uses the linear health curve and the flat kill reward.
pub const LINEAR_ROUND_LIMIT: u32 = 10;

/// Tuning knobs for the round scaling curves.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Zombies in round one.
    pub base_zombies_per_wave: u32,
    /// Compound growth applied to the zombie count per round.
    pub zombies_increase_multiplier: f32,
    /// Zombie health in round one.
    pub base_zombie_health: f32,
    /// Health added per round up to round ten.
    pub health_increase_per_round: f32,
    /// Per-round health multiplier after round ten.
    pub health_multiplier_after_round_10: f32,
    /// Money awarded per kill up to round ten.
    pub base_money_per_kill: u32,
    /// Per-round reward multiplier after round ten.
    pub money_multiplier_after_round_10: f32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            base_zombies_per_wave: 5,
            zombies_increase_multiplier: 0.15,
            base_zombie_health: 150.0,
            health_increase_per_round: 100.0,
            health_multiplier_after_round_10: 1.1,
            base_money_per_kill: 10,
            money_multiplier_after_round_10: 1.1,
        }
    }
}

/// Stateless calculator for round-derived values.
///
/// Values are recomputed on demand; nothing is cached between waves.
#[derive(Clone, Debug, Default)]
pub struct RoundScaling {
    config: ScalingConfig,
}

impl RoundScaling {
    /// Creates a calculator from the provided tuning.
    #[must_use]
    pub fn new(config: ScalingConfig) -> Self {
        Self { config }
    }

    /// Tuning used by the calculator.
    #[must_use]
    pub fn config(&self) -> &ScalingConfig {
        &self.config
    }

    /// Number of zombies that make up the wave.
    #[must_use]
    pub fn zombie_count(&self, round: Round) -> u32 {
        let base = self.config.base_zombies_per_wave;
        let Some(exponent) = exponent_since(round, 1) else {
            return base;
        };

        let growth = (1.0 + self.config.zombies_increase_multiplier).powi(exponent);
        round_to_u32(base as f32 * growth)
    }

    /// Health of every zombie spawned during the wave.
    #[must_use]
    pub fn zombie_health(&self, round: Round) -> f32 {
        let config = &self.config;
        let value = round.get();
        if value == 0 {
            return config.base_zombie_health;
        }

        if value <= LINEAR_ROUND_LIMIT {
            return config.base_zombie_health
                + (value - 1) as f32 * config.health_increase_per_round;
        }

        let plateau = config.base_zombie_health
            + (LINEAR_ROUND_LIMIT - 1) as f32 * config.health_increase_per_round;
        let exponent = exponent_since(round, LINEAR_ROUND_LIMIT).unwrap_or(0);
        plateau * config.health_multiplier_after_round_10.powi(exponent)
    }

    /// Money credited for each kill during the wave.
    #[must_use]
    pub fn money_per_kill(&self, round: Round) -> u32 {
        let base = self.config.base_money_per_kill;
        if round.get() <= LINEAR_ROUND_LIMIT {
            return base;
        }

        let exponent = exponent_since(round, LINEAR_ROUND_LIMIT).unwrap_or(0);
        round_to_u32(base as f32 * self.config.money_multiplier_after_round_10.powi(exponent))
    }
}

fn exponent_since(round: Round, pivot: u32) -> Option<i32> {
    let value = round.get();
    if value < pivot.max(1) {
        return None;
    }
    Some(i32::try_from(value - pivot).unwrap_or(i32::MAX))
}

// `f32::round` rounds half away from zero; the cast saturates out-of-range values.
fn round_to_u32(value: f32) -> u32 {
    value.round() as u32
}
