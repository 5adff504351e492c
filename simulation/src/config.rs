//! Game configuration loaded from TOML.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use glam::{Quat, Vec3};
use serde::Deserialize;
use thiserror::Error;
use wizard_defence_core::ZombieTemplate;
use wizard_defence_system_round_scaling::ScalingConfig;
use wizard_defence_system_spawning::GateVolume;
use wizard_defence_system_waves::EconomyConfig;
use wizard_defence_world::WorldConfig;

/// Configuration document compiled into the binary.
pub const BUILTIN_GAME_CONFIG: &str = include_str!("data/default_config.toml");

/// Environment variable naming a configuration file that replaces the builtin one.
pub const CONFIG_PATH_ENV: &str = "WIZARD_DEFENCE_CONFIG";

/// Errors raised while loading a game configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read game config from {path:?}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The document is not valid TOML or does not match the expected shape.
    #[error("failed to parse game config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Spawn gate placement.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Centre of the gate volume.
    pub center: [f32; 3],
    /// Half-size of the gate volume along its local axes.
    pub extent: [f32; 3],
    /// Rotation around the vertical axis, in degrees.
    pub yaw_degrees: f32,
    /// Per-gate alive cap. Falls back to the spawning section when absent.
    pub max_active: Option<usize>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0, 0.0],
            extent: [10.0, 200.0, 200.0],
            yaw_degrees: 0.0,
            max_active: None,
        }
    }
}

impl GateConfig {
    /// Oriented volume zombies appear in.
    #[must_use]
    pub fn volume(&self) -> GateVolume {
        GateVolume::new(
            Vec3::from(self.center),
            Vec3::from(self.extent),
            Quat::from_rotation_z(self.yaw_degrees.to_radians()),
        )
    }
}

/// Where things stand on the map.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Position of the main tower.
    pub tower_position: [f32; 3],
    /// Spawn gates, in registration order.
    pub gates: Vec<GateConfig>,
    /// Spots where turrets may be bought.
    pub build_spots: Vec<[f32; 3]>,
    /// Blueprint of every spawned zombie.
    pub zombie: ZombieTemplate,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tower_position: [0.0, 0.0, 0.0],
            gates: vec![
                GateConfig {
                    center: [2_500.0, 0.0, 0.0],
                    yaw_degrees: 180.0,
                    ..GateConfig::default()
                },
                GateConfig {
                    center: [-2_500.0, 0.0, 0.0],
                    ..GateConfig::default()
                },
                GateConfig {
                    center: [0.0, 2_500.0, 0.0],
                    yaw_degrees: -90.0,
                    ..GateConfig::default()
                },
            ],
            build_spots: vec![
                [400.0, 400.0, 0.0],
                [-400.0, 400.0, 0.0],
                [400.0, -400.0, 0.0],
                [-400.0, -400.0, 0.0],
            ],
            zombie: ZombieTemplate::default(),
        }
    }
}

/// Aggregated configuration of every system.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Round scaling curves.
    pub scaling: ScalingConfig,
    /// Wallet and pacing.
    pub economy: EconomyConfig,
    /// Spawn throttling.
    pub spawning: wizard_defence_system_spawning::Config,
    /// Zombie decision making.
    pub ai: wizard_defence_system_zombie_ai::Config,
    /// Turret tuning.
    pub combat: wizard_defence_system_turret_combat::Config,
    /// World parameters.
    pub world: WorldConfig,
    /// Map layout.
    pub layout: LayoutConfig,
}

impl GameConfig {
    /// Parses a configuration document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Configuration compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_GAME_CONFIG).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "builtin game config is invalid; using defaults");
            Self::default()
        })
    }

    /// Loads the file named by [`CONFIG_PATH_ENV`], or the builtin configuration.
    ///
    /// A file that fails to load is reported and replaced by the builtin one.
    #[must_use]
    pub fn from_env() -> Self {
        let Some(path) = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) else {
            return Self::builtin();
        };

        match Self::load(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "game config loaded from file");
                config
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to load game config; using builtin"
                );
                Self::builtin()
            }
        }
    }
}
