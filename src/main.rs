use clap::Parser;
use restlaunch::cli::{run_cli, Cli};
use restlaunch::telemetry::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&LogConfig::from_env())?;
    run_cli(cli)
}
