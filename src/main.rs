use anyhow::Result;
use clap::Parser;

use framevote::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
