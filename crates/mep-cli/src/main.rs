mod cli;
mod logging;
mod run;

use clap::Parser;

use cli::Cli;

fn main() -> color_eyre::eyre::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.stat_dir.as_deref());

    run::run(&cli)?;
    Ok(())
}
