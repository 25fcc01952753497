//! CLI entry point for soil mixture estimation

use clap::Parser;
use soilmix::io::cli::{Cli, CommandRunner};
use soilmix::io::logging::init_logging;

fn main() -> soilmix::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);
    let mut runner = CommandRunner::new(cli);
    runner.run(&mut std::io::stdout().lock())
}
