use anyhow::Result;
use clap::Parser;
use xbench::{commands, logging, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    commands::run(cli)
}
