//! The `config` command.

use anyhow::Result;
use clap::Args;
use cycle_pool::PoolConfig;

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Start from a growable pool instead of a fixed one
    #[clap(long)]
    growable: bool,
}

/// Print a pool configuration that `run --config` accepts
pub fn execute(args: &ConfigArgs) -> Result<()> {
    let config = PoolConfig {
        growable: args.growable,
        ..Default::default()
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}
