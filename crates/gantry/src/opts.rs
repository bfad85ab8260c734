use crate::cmd::{create::CreateArgs, networks::NetworksArgs};
use clap::{Parser, Subcommand};

/// Deploy contracts across configured networks.
#[derive(Debug, Parser)]
#[command(
    name = "gantry",
    version,
    after_help = "Find more information in the README: https://github.com/gantry-rs/gantry",
    next_display_order = None
)]
pub struct Gantry {
    #[command(subcommand)]
    pub cmd: GantrySubcommand,
}

#[derive(Debug, Subcommand)]
pub enum GantrySubcommand {
    /// Deploy a compiled contract to a configured network.
    #[command(visible_alias = "c")]
    Create(CreateArgs),

    /// List the configured networks.
    Networks(NetworksArgs),
}
