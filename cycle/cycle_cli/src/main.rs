use clap::{Parser, Subcommand};

mod commands;
mod sprite;

use commands::config::ConfigArgs;
use commands::run::RunArgs;

/// Cycle Command Line Interface
///
/// Drives a resource pool under a multi-threaded workload and reports what
/// the pool did.
#[derive(Parser)]
#[clap(name = "cycle", author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workload against a pool and print its statistics
    Run(RunArgs),

    /// Print the default pool configuration as TOML
    Config(ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::execute(&args),
        Commands::Config(args) => commands::config::execute(&args),
    }
}
