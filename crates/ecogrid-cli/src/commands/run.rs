//! `ecogrid run` — load a scenario, simulate, report.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::info;

use ecogrid_metrics::{JsonLinesSink, MemorySink, RunSummary, render_summary};
use ecogrid_model::{Objective, Scenario, SimConfig, StrategyKind};
use ecogrid_sim::Simulation;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario JSON file
    #[arg(short, long)]
    pub scenario: String,
    /// TOML run configuration (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<String>,
    /// Last simulated hour
    #[arg(long)]
    pub timesteps: Option<usize>,
    /// Routing ticks per hour
    #[arg(long)]
    pub ticks: Option<u32>,
    #[arg(long)]
    pub max_servers: Option<u64>,
    /// Latency bound for the carbon objective
    #[arg(long)]
    pub max_latency: Option<f64>,
    /// Request units per server
    #[arg(long)]
    pub capacity: Option<u64>,
    /// carbon or latency
    #[arg(long)]
    pub objective: Option<String>,
    /// lp, latency-greedy, carbon-greedy, carbon-aware-naive or replay
    #[arg(long)]
    pub strategy: Option<String>,
    /// Fixed hourly request rate for every region
    #[arg(long)]
    pub rate: Option<u64>,
    /// First hour of the scenario to simulate
    #[arg(long)]
    pub start_offset: Option<usize>,
    /// Write the interval log here as JSON lines
    #[arg(short, long)]
    pub output: Option<String>,
    /// Summary format: text or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let scenario_path = Path::new(&args.scenario);
    let scenario = Scenario::from_file(scenario_path)
        .with_context(|| format!("failed to load scenario {}", scenario_path.display()))?;

    let (summary, names) = execute(config, scenario, args.output.as_deref().map(Path::new))?;

    match args.format.as_str() {
        "json" => {
            let report = serde_json::json!({
                "summary": summary,
                "drop_rate": summary.drop_rate(),
                "regions": names,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print!("{}", render_summary(&summary, &names)),
    }
    Ok(())
}

/// Load the config file (or defaults) and apply flag overrides.
pub fn resolve_config(args: &RunArgs) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(Path::new(path))
            .with_context(|| format!("failed to load config {path}"))?,
        None => SimConfig::default(),
    };

    if let Some(v) = args.timesteps {
        config.timesteps = v;
    }
    if let Some(v) = args.ticks {
        config.sub_intervals_per_hour = v;
    }
    if let Some(v) = args.max_servers {
        config.max_servers = v;
    }
    if let Some(v) = args.max_latency {
        config.max_latency = Some(v);
    }
    if let Some(v) = args.capacity {
        config.server_capacity = v;
    }
    if let Some(v) = &args.objective {
        config.objective = v.parse::<Objective>()?;
    }
    if let Some(v) = &args.strategy {
        config.strategy = v.parse::<StrategyKind>()?;
    }
    if let Some(v) = args.rate {
        config.constant_request_rate = Some(v);
    }
    if let Some(v) = args.start_offset {
        config.start_offset = v;
    }
    if !matches!(args.format.as_str(), "text" | "json") {
        bail!("unknown format '{}', expected text or json", args.format);
    }

    config.validate()?;
    Ok(config)
}

/// Run the simulation, optionally logging every interval to `output`.
pub fn execute(
    config: SimConfig,
    scenario: Scenario,
    output: Option<&Path>,
) -> Result<(RunSummary, Vec<String>)> {
    let mut sim = Simulation::from_scenario(config, scenario)?;
    let names = sim.region_names().to_vec();

    let summary = match output {
        Some(path) => {
            let mut sink = JsonLinesSink::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let summary = sim.run(&mut sink)?;
            info!(path = %path.display(), records = sink.written(), "interval log written");
            summary
        }
        None => sim.run(&mut MemorySink::new())?,
    };
    Ok((summary, names))
}
