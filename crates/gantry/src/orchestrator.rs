//! The deployment orchestrator.
//!
//! Deployment is a one-shot, linear pipeline: resolve the network, load the
//! artifact, bind constructor arguments, submit, await inclusion. There are
//! no loops back to earlier states: redeploying after a failure always
//! produces a new contract address, so every retry is a brand-new
//! [`DeploymentRequest`].

use crate::{
    factory::{ConfirmError, DeploymentTxFactory, wait_for_inclusion},
    nonce::NonceLocks,
    transport::{HttpTransportFactory, TransportFactory},
};
use alloy_dyn_abi::JsonAbiExt;
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, TxHash, hex};
use alloy_signer_local::PrivateKeySigner;
use gantry_artifacts::ArtifactStore;
use gantry_config::{Config, NetworkRegistry};
use serde::Serialize;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, info};

/// Type-erased cause of a stage failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The pipeline stage a deployment failure occurred in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Stage {
    NetworkResolution,
    ArgumentValidation,
    Submission,
    Confirmation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NetworkResolution => "network resolution",
            Self::ArgumentValidation => "argument validation",
            Self::Submission => "submission",
            Self::Confirmation => "confirmation",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a deployment request, tagged with the stage it died
/// in.
///
/// Nothing here is retried in place. Network-resolution and
/// argument-validation failures are pure functions of the input and static
/// configuration; submission failures may be transient but a new attempt is a
/// new request; confirmation failures are ambiguous, since the transaction
/// may still be mined after the caller stops waiting.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Unknown network, missing credential, missing artifact, or a bad
    /// signing key. Configuration-class: fatal, never retried.
    #[error("network resolution failed: {0}")]
    NetworkResolution(BoxError),
    /// Constructor argument count or type mismatch. Caller error, fatal.
    #[error("constructor argument validation failed: {0}")]
    ArgumentValidation(BoxError),
    /// RPC failure while connecting, fetching the nonce, or broadcasting.
    #[error("transaction submission failed: {0}")]
    Submission(BoxError),
    /// Timed out waiting for inclusion, or the transaction reverted
    /// on-chain. Distinct from submission: gas and a nonce were consumed.
    #[error("confirmation failed: {0}")]
    Confirmation(BoxError),
}

impl DeployError {
    /// The stage this failure is tagged with.
    pub fn stage(&self) -> Stage {
        match self {
            Self::NetworkResolution(_) => Stage::NetworkResolution,
            Self::ArgumentValidation(_) => Stage::ArgumentValidation,
            Self::Submission(_) => Stage::Submission,
            Self::Confirmation(_) => Stage::Confirmation,
        }
    }

    fn network_resolution(cause: impl Into<BoxError>) -> Self {
        Self::NetworkResolution(cause.into())
    }

    fn argument_validation(cause: impl Into<BoxError>) -> Self {
        Self::ArgumentValidation(cause.into())
    }

    fn submission(cause: impl Into<BoxError>) -> Self {
        Self::Submission(cause.into())
    }

    fn confirmation(cause: impl Into<BoxError>) -> Self {
        Self::Confirmation(cause.into())
    }
}

/// A single deployment to perform: which contract, where, with what
/// constructor arguments. Consumed exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub contract: String,
    pub network: String,
    pub constructor_args: Vec<String>,
}

/// Terminal artifact of a successful deployment, produced only after the
/// transaction was observed included in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub contract_address: Address,
    pub transaction_hash: TxHash,
    pub network: String,
    pub chain_id: u64,
    pub deployer: Address,
    /// The constructor arguments, echoed as supplied.
    pub constructor_args: Vec<String>,
    /// ABI-encoded constructor arguments (hex, no `0x`), as source
    /// verification consumes them.
    pub constructor_args_encoded: Option<String>,
}

/// Drives [`DeploymentRequest`]s to their terminal state.
///
/// Holds only read-only state plus the nonce locks, so independent requests
/// may run concurrently on one orchestrator.
pub struct Orchestrator {
    registry: NetworkRegistry,
    artifacts: ArtifactStore,
    transports: Arc<dyn TransportFactory>,
    nonces: NonceLocks,
    transaction_timeout: Duration,
    poll_interval: Duration,
}

impl Orchestrator {
    /// Orchestrator over live HTTP transports.
    pub fn new(config: &Config) -> Self {
        Self::with_transport_factory(config, Arc::new(HttpTransportFactory))
    }

    /// Orchestrator with a custom transport factory; tests inject scripted
    /// transports here.
    pub fn with_transport_factory(config: &Config, transports: Arc<dyn TransportFactory>) -> Self {
        Self {
            registry: config.registry(),
            artifacts: ArtifactStore::new(&config.artifacts),
            transports,
            nonces: NonceLocks::default(),
            transaction_timeout: Duration::from_secs(config.transaction_timeout),
            poll_interval: Duration::from_secs(config.poll_interval),
        }
    }

    /// Runs one deployment to completion.
    ///
    /// Everything up to and including argument validation is local: no
    /// transport exists before the submission stage, so configuration and
    /// caller errors are reported without any network I/O.
    pub async fn deploy(
        &self,
        request: DeploymentRequest,
    ) -> Result<DeploymentResult, DeployError> {
        // Idle -> NetworkResolved
        let network =
            self.registry.resolve(&request.network).map_err(DeployError::network_resolution)?;
        debug!(network = %network.name, chain_id = network.chain_id, "resolved deployment target");

        // NetworkResolved -> ArtifactLoaded. A missing artifact is
        // configuration, not a runtime condition.
        let artifact =
            self.artifacts.load(&request.contract).map_err(DeployError::network_resolution)?;
        let signer: PrivateKeySigner =
            network.private_key.parse().map_err(DeployError::network_resolution)?;
        let deployer_address = signer.address();

        // ArtifactLoaded -> Validated
        let factory = DeploymentTxFactory::new(artifact.abi.clone(), artifact.bytecode.clone());
        let params = factory
            .parse_constructor_args(&request.constructor_args)
            .map_err(DeployError::argument_validation)?;
        let constructor_args_encoded = artifact
            .constructor()
            .filter(|_| !params.is_empty())
            .map(|constructor| constructor.abi_encode_input(&params))
            .transpose()
            .map_err(DeployError::argument_validation)?
            .map(hex::encode);
        let mut deployer =
            factory.deploy_tokens(params).map_err(DeployError::argument_validation)?;

        // Validated -> Submitted
        let transport = self.transports.connect(&network).map_err(DeployError::submission)?;
        let chain_id = transport.chain_id().await.map_err(DeployError::submission)?;
        if chain_id != network.chain_id {
            return Err(DeployError::submission(format!(
                "endpoint for `{}` reports chain id {chain_id}, expected {}",
                network.name, network.chain_id
            )));
        }

        deployer.tx.set_from(deployer_address);
        deployer.tx.set_chain_id(network.chain_id);
        if deployer.tx.to.is_none() {
            deployer.tx.set_create();
        }

        // Nonce assignment and broadcast are serialized per
        // (deployer, network); everything else runs in parallel.
        let tx_hash = {
            let _guard = self.nonces.acquire(deployer_address, &network.name).await;
            let nonce = transport
                .transaction_count(deployer_address)
                .await
                .map_err(DeployError::submission)?;
            deployer.tx.set_nonce(nonce);
            info!(
                contract = %request.contract,
                network = %network.name,
                deployer = %deployer_address,
                nonce,
                "submitting deployment transaction"
            );
            deployer.send(transport.as_ref()).await.map_err(DeployError::submission)?
        };

        // Submitted -> Confirmed
        let receipt = wait_for_inclusion(
            transport.as_ref(),
            tx_hash,
            self.transaction_timeout,
            self.poll_interval,
        )
        .await
        .map_err(DeployError::confirmation)?;
        let contract_address = receipt
            .contract_address
            .ok_or(ConfirmError::ContractNotDeployed { tx_hash })
            .map_err(DeployError::confirmation)?;
        info!(%contract_address, %tx_hash, "deployment confirmed");

        Ok(DeploymentResult {
            contract_address,
            transaction_hash: tx_hash,
            network: network.name,
            chain_id: network.chain_id,
            deployer: deployer_address,
            constructor_args: request.constructor_args,
            constructor_args_encoded,
        })
    }
}
