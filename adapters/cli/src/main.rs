#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Wizard Defence headless.

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wizard_defence_core::{Event, TurretKind, WavePhase};
use wizard_defence_simulation::{GameConfig, Outcome, Simulation};
use wizard_defence_world::query;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Wizard Defence runner", long_about = None)]
struct Args {
    /// TOML file replacing the builtin game configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of waves to clear before stopping
    #[arg(long, default_value_t = 5)]
    waves: u32,

    /// Override for the spawn random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated milliseconds per step
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Simulated minutes before giving up
    #[arg(long, default_value_t = 30)]
    max_minutes: u64,
}

/// Entry point for the Wizard Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let args = Args::parse();
    if args.tick_ms == 0 {
        bail!("--tick-ms must be at least 1");
    }

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load game config at {}", path.display()))?,
        None => GameConfig::from_env(),
    };
    if let Some(seed) = args.seed {
        config.spawning.rng_seed = seed;
    }

    let mut simulation = Simulation::new(config);
    println!("{}", query::welcome_banner(simulation.world()));

    let tick = Duration::from_millis(args.tick_ms);
    let limit = Duration::from_secs(args.max_minutes.saturating_mul(60));
    let mut cleared = 0;

    while cleared < args.waves && simulation.elapsed() < limit {
        if matches!(simulation.phase(), WavePhase::Idle | WavePhase::Break) {
            let bought = simulation.buy_free_spots(&TurretKind::ALL);
            if bought > 0 {
                tracing::info!(bought, money = simulation.money(), "turrets purchased");
            }
            if simulation.phase() == WavePhase::Idle {
                simulation.start_next_wave();
            }
        }

        let outcome = simulation.step(tick);
        for event in simulation.drain_events() {
            match event {
                Event::WaveStarted {
                    wave,
                    total_zombies,
                    zombie_health,
                } => tracing::info!(
                    wave = wave.get(),
                    total_zombies,
                    zombie_health,
                    "wave started"
                ),
                Event::WaveCompleted { wave } => {
                    cleared += 1;
                    println!(
                        "wave {:>3} cleared at {:>7.1}s  money {:>6}  turrets {}",
                        wave.get(),
                        simulation.elapsed().as_secs_f32(),
                        simulation.money(),
                        query::turret_view(simulation.world()).len(),
                    );
                }
                Event::StructureDestroyed { structure, kind } => {
                    tracing::info!(?structure, ?kind, "structure destroyed");
                }
                _ => {}
            }
        }

        if let Outcome::Defeat(cause) = outcome {
            println!(
                "defeat ({cause:?}) during wave {} after {:.1}s",
                simulation.current_wave().get(),
                simulation.elapsed().as_secs_f32(),
            );
            return Ok(());
        }
    }

    if cleared >= args.waves {
        println!(
            "survived {cleared} waves in {:.1}s with {} money left",
            simulation.elapsed().as_secs_f32(),
            simulation.money(),
        );
    } else {
        println!(
            "stopped after {:.1}s with {cleared} of {} waves cleared",
            simulation.elapsed().as_secs_f32(),
            args.waves,
        );
    }
    Ok(())
}
