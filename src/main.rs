use anyhow::{anyhow, bail};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arena_duelist::sim::{MatchSummary, ScriptedHost};
use arena_duelist::stats::StatsSnapshot;
use arena_duelist::{Agent, AgentConfig};

#[derive(Serialize)]
struct Report {
    scenario: String,
    rounds: Vec<MatchSummary>,
    stats: StatsSnapshot,
    opponents_learned: usize,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Arena Duelist v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AgentConfig::load_or_default();
    config.validate().map_err(|e| anyhow!("invalid configuration: {}", e))?;
    info!(
        "Configuration loaded: mode={:?}, arena={}x{}, seed={}",
        config.nav_mode, config.arena.width, config.arena.height, config.rng_seed
    );

    // Match settings (MATCH_ROUNDS, MATCH_TICKS, MATCH_SCENARIO)
    let rounds: u64 = std::env::var("MATCH_ROUNDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);
    let max_ticks: u64 = std::env::var("MATCH_TICKS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);
    let scenario = std::env::var("MATCH_SCENARIO").unwrap_or_else(|_| "duel".to_string());
    if scenario != "duel" && scenario != "melee" {
        bail!("unknown scenario '{}', expected duel or melee", scenario);
    }

    // One agent across all rounds so learning carries over
    let mut agent = Agent::new(config.clone());
    let mut summaries = Vec::with_capacity(rounds as usize);
    for round in 0..rounds {
        let seed = config.rng_seed.wrapping_add(round);
        let mut host = match scenario.as_str() {
            "melee" => ScriptedHost::melee(config.arena, seed),
            _ => ScriptedHost::duel(config.arena, seed),
        };
        let summary = host.run(&mut agent, max_ticks);
        info!(
            "Round {}: {} ticks, hit rate {:.2}, survived={}",
            round + 1,
            summary.ticks,
            summary.hit_rate(),
            summary.survived
        );
        summaries.push(summary);
    }

    let report = Report {
        scenario,
        rounds: summaries,
        stats: agent.stats().snapshot(),
        opponents_learned: agent.context().len(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
