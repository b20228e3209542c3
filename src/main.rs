//! Barter Grid - headless runner
//!
//! Builds a simulation from a TOML config (or the defaults), runs it for a
//! number of ticks and prints a summary or the final JSON snapshot.

use std::path::PathBuf;

use barter_grid::core::config::SimConfig;
use barter_grid::core::error::Result;
use barter_grid::core::types::Good;
use barter_grid::simulation::{build, SimulationEvent};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Headless Barter Grid runner
#[derive(Parser, Debug)]
#[command(name = "barter-grid")]
#[command(about = "Run a forage and barter grid simulation")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the agent count (positions are generated)
    #[arg(long)]
    agents: Option<usize>,

    /// Enable foraging
    #[arg(long, conflicts_with = "no_forage")]
    forage: bool,

    /// Disable foraging
    #[arg(long)]
    no_forage: bool,

    /// Enable trade drafting and execution
    #[arg(long, conflicts_with = "no_trade")]
    trade: bool,

    /// Disable trading entirely
    #[arg(long)]
    no_trade: bool,

    /// Print the final world snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barter_grid=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => demo_config(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(agents) = args.agents {
        config.agent_count = agents;
    }
    if args.forage {
        config.features.forage = true;
    }
    if args.no_forage {
        config.features.forage = false;
    }
    if args.trade {
        config.features.trade_draft = true;
        config.features.trade_execution = true;
    }
    if args.no_trade {
        config.features.trade_draft = false;
        config.features.trade_execution = false;
    }

    let mut sim = build(config, None)?;

    let mut collected = 0usize;
    let mut trades = 0usize;
    let mut respawned = 0usize;
    for _ in 0..args.ticks {
        for event in sim.step()? {
            match event {
                SimulationEvent::ResourceCollected { .. } => collected += 1,
                SimulationEvent::TradeExecuted { .. } => trades += 1,
                SimulationEvent::ResourcesRespawned { count, .. } => respawned += count,
                SimulationEvent::Paired { .. } | SimulationEvent::Unpaired { .. } => {}
            }
        }
    }

    let totals = sim.total_goods();
    tracing::info!(
        ticks = sim.tick(),
        collected,
        trades,
        respawned,
        goods_a = totals.get(Good::A),
        goods_b = totals.get(Good::B),
        resources_left = sim.grid().resource_count(),
        "run complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sim.snapshot())?);
    } else {
        println!("=== BARTER GRID ===");
        println!(
            "Ticks: {}  Agents: {}  Resources on grid: {}",
            sim.tick(),
            sim.agents().len(),
            sim.grid().resource_count()
        );
        println!("Collected: {collected}  Trades: {trades}  Respawned: {respawned}");
        println!();
        for agent in sim.agents() {
            println!(
                "  {} at {} [{:?}] carrying {} / home {} utility {:.3}",
                agent.id(),
                agent.position,
                agent.mode,
                agent.carried(),
                agent.home_inventory.total(),
                agent.total_utility()
            );
        }
        println!();
        println!("Digest: {:016x}", sim.state_digest()?);
    }
    Ok(())
}

fn demo_config() -> SimConfig {
    SimConfig {
        grid_width: 20,
        grid_height: 20,
        agent_count: 10,
        ..SimConfig::default()
    }
}
