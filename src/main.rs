use std::io::{self, BufWriter};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skirmish_engine::config::EngineConfig;
use skirmish_engine::game::engine::Engine;
use skirmish_engine::protocol::{write_actions, TurnReader};

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // stdout carries the protocol, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    info!("Skirmish engine v{}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::load_or_default().validated_or_default();

    let stdin = io::stdin();
    let mut reader = TurnReader::new(stdin.lock());
    let mut out = BufWriter::new(io::stdout().lock());

    let init = reader.read_init().context("reading match setup")?;
    info!(
        base_x = init.base.x,
        base_y = init.base.y,
        units = init.units_per_player,
        "Match started"
    );

    let mut engine = Engine::new(config, init.base);
    while let Some(input) = reader
        .read_turn()
        .with_context(|| format!("reading turn {}", engine.turn()))?
    {
        let actions = engine.play_turn(input);
        write_actions(&mut out, &actions).context("writing actions")?;
    }

    let stats = engine.stats();
    info!(
        turns = engine.turn(),
        avg_us = stats.average().as_micros() as u64,
        max_us = stats.max().as_micros() as u64,
        overruns = stats.overruns(),
        "Input closed, shutting down"
    );
    Ok(())
}
