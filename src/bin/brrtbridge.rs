use brrtbridge::cli::{run_cli, Cli};
use brrtbridge::logging::init_logging;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = init_logging() {
        eprintln!("logging disabled: {e:#}");
    }
    run_cli(cli)
}
