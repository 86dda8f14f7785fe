//! EDV CLI - consolidate and analyze energy demand scenarios.

use clap::Parser;
use edv_cmd::service::{ServiceConfig, DEFAULT_CONFIG_DIR, DEFAULT_SCENARIOS_DIR};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "edv-cli",
    version,
    about = "Energy demand scenario consolidation toolkit"
)]
struct Cli {
    /// Directory holding one sub-directory per scenario
    #[arg(long, global = true, default_value = DEFAULT_SCENARIOS_DIR)]
    scenarios_dir: PathBuf,

    /// Directory for stored selections, schedules and results
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: edv_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!(
        "Scenarios in {}, configuration in {}",
        cli.scenarios_dir.display(),
        cli.config_dir.display()
    );
    let config = ServiceConfig {
        scenarios_dir: cli.scenarios_dir,
        config_dir: cli.config_dir,
        ..Default::default()
    };
    edv_cmd::run(cli.command, config)
}
