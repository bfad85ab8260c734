use crate::opts::{Gantry, GantrySubcommand};
use clap::Parser;
use eyre::Result;

/// Run the `gantry` command line interface.
pub fn run() -> Result<()> {
    setup()?;

    let args = Gantry::parse();
    run_command(args)
}

/// Setup the global tracing subscriber.
pub fn setup() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

/// Run the subcommand.
pub fn run_command(args: Gantry) -> Result<()> {
    match args.cmd {
        GantrySubcommand::Create(cmd) => {
            let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
            runtime.block_on(cmd.run())
        }
        GantrySubcommand::Networks(cmd) => cmd.run(),
    }
}
