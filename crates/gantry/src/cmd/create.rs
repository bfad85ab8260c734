//! The `gantry create` subcommand.

use crate::orchestrator::{DeploymentRequest, Orchestrator};
use clap::{Parser, ValueHint};
use eyre::{Result, WrapErr};
use gantry_config::Config;
use gantry_verify::{EtherscanVerifier, VerificationProvider, VerificationRequest};
use serde_json::json;
use std::path::{Path, PathBuf};

/// CLI arguments for `gantry create`.
#[derive(Clone, Debug, Parser)]
pub struct CreateArgs {
    /// The name of the contract artifact to deploy.
    contract: String,

    /// The target network, as configured in `gantry.toml`.
    #[arg(long, short = 'n', env = "GANTRY_NETWORK", value_name = "NETWORK")]
    network: String,

    /// The constructor arguments.
    #[arg(
        long,
        num_args(1..),
        conflicts_with = "constructor_args_path",
        value_name = "ARGS",
        allow_hyphen_values = true,
    )]
    constructor_args: Vec<String>,

    /// The path to a file containing the constructor arguments.
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        value_name = "PATH",
    )]
    constructor_args_path: Option<PathBuf>,

    /// The directory containing compiled contract artifacts.
    #[arg(long, value_hint = ValueHint::DirPath, value_name = "DIR")]
    artifacts: Option<PathBuf>,

    /// Timeout to use for waiting on confirmation, in seconds.
    #[arg(long, env = "GANTRY_TIMEOUT", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the deployment information as JSON.
    #[arg(long, help_heading = "Display options")]
    json: bool,

    /// Submit the deployment for source verification after confirmation.
    #[arg(long)]
    verify: bool,

    /// The block explorer API key to use for verification.
    #[arg(long, env = "ETHERSCAN_API_KEY", value_name = "KEY", hide_env_values = true)]
    etherscan_api_key: Option<String>,
}

impl CreateArgs {
    /// Executes the command to create a contract.
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        if let Some(artifacts) = &self.artifacts {
            config.artifacts = artifacts.clone();
        }
        if let Some(timeout) = self.timeout {
            config.transaction_timeout = timeout;
        }

        let constructor_args = match &self.constructor_args_path {
            Some(path) => read_constructor_args_file(path)?,
            None => self.constructor_args.clone(),
        };

        let request = DeploymentRequest {
            contract: self.contract.clone(),
            network: self.network.clone(),
            constructor_args,
        };
        let orchestrator = Orchestrator::new(&config);
        let result = orchestrator.deploy(request).await?;

        if self.json {
            let output = json!({
                "deployer": result.deployer.to_string(),
                "deployedTo": result.contract_address.to_string(),
                "transactionHash": result.transaction_hash,
                "network": result.network,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Deployer: {}", result.deployer);
            println!("Deployed to: {}", result.contract_address);
            println!("Transaction hash: {:?}", result.transaction_hash);
        }

        if !self.verify {
            return Ok(());
        }

        println!("Starting contract verification...");
        let verifier =
            EtherscanVerifier::for_network(&result.network, self.etherscan_api_key.clone())?;
        let request = VerificationRequest {
            contract_address: result.contract_address,
            contract_name: self.contract.clone(),
            constructor_args: result.constructor_args_encoded.clone(),
            network: result.network.clone(),
            chain_id: result.chain_id,
        };
        let guid = verifier.submit(&request).await?;
        println!("Verification submitted with GUID `{guid}`");
        Ok(())
    }
}

/// Reads the constructor arguments from the given file: a JSON array, or
/// whitespace-separated values.
fn read_constructor_args_file(path: &Path) -> Result<Vec<String>> {
    eyre::ensure!(path.exists(), "constructor args file \"{}\" not found", path.display());
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read constructor args file at {}", path.display()))?;
    let args = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&contents).wrap_err_with(|| {
            format!("constructor args file \"{}\" must encode a JSON array", path.display())
        })?
    } else {
        contents.split_whitespace().map(str::to_string).collect()
    };
    Ok(args)
}
