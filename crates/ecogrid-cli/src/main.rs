use clap::{Parser, Subcommand};

mod commands;

use commands::run::RunArgs;

#[derive(Parser)]
#[command(
    name = "ecogrid",
    about = "ecogrid — carbon- and latency-aware fleet simulator",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Log per-tick decisions and per-hour reports
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation over a scenario file.
    ///
    /// Settings come from --config (or the defaults) and are then
    /// overridden by any flag given here.
    Run(RunArgs),
    /// Write a default ecogrid.toml
    InitConfig {
        #[arg(short, long, default_value = "ecogrid.toml")]
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "ecogrid=debug" } else { "ecogrid=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.parse()?)
        )
        .init();

    match cli.command {
        Commands::Run(args) => commands::run::run(&args),
        Commands::InitConfig { path } => commands::init::init_config(&path),
    }
}
