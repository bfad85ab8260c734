//! The `gantry networks` subcommand.

use clap::Parser;
use eyre::Result;
use gantry_config::Config;
use serde_json::json;

/// CLI arguments for `gantry networks`.
#[derive(Clone, Debug, Parser)]
pub struct NetworksArgs {
    /// Print the network table as JSON.
    #[arg(long)]
    json: bool,
}

impl NetworksArgs {
    pub fn run(self) -> Result<()> {
        let config = Config::load()?;
        if self.json {
            let entries: Vec<_> = config
                .networks
                .iter()
                .map(|(name, network)| {
                    json!({
                        "name": name,
                        "url": network.url,
                        "chainId": network.chain_id,
                        "credential": network.private_key.is_some(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            for (name, network) in &config.networks {
                let credential = if network.private_key.is_some() { "" } else { " (no credential)" };
                println!("{name}: chain id {}, {}{credential}", network.chain_id, network.url);
            }
        }
        Ok(())
    }
}
