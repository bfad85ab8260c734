//! The RPC seam deployments are driven through.
//!
//! The orchestrator never talks to a node directly; it goes through
//! [`Transport`], a deliberately narrow surface that a test double can
//! implement in a few lines. [`HttpTransportFactory`] is the production
//! implementation: an alloy provider with a local wallet, built per resolved
//! network.

use alloy_network::{AnyNetwork, EthereumWallet, ReceiptResponse};
use alloy_primitives::{Address, TxHash};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_serde::WithOtherFields;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use gantry_config::ResolvedNetwork;
use std::sync::Arc;

/// Errors surfaced by a [`Transport`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid RPC endpoint `{url}`: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid signing key configured for network `{0}`")]
    InvalidKey(String),
    #[error(transparent)]
    Rpc(#[from] alloy_transport::TransportError),
}

/// The slice of a transaction receipt deployment cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
    /// `true` if execution succeeded, `false` if the transaction reverted.
    pub status: bool,
}

/// Narrow RPC surface for submitting one deployment and watching it land.
///
/// Implementations sign with the network credential; callers never handle
/// raw transaction bytes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, TransportError>;

    /// Next transaction sequence number for `from`.
    async fn transaction_count(&self, from: Address) -> Result<u64, TransportError>;

    /// Signs and broadcasts the transaction, returning its hash.
    async fn send_transaction(
        &self,
        tx: WithOtherFields<TransactionRequest>,
    ) -> Result<TxHash, TransportError>;

    /// Receipt for `hash`, or `None` while the transaction is pending.
    async fn receipt(&self, hash: TxHash) -> Result<Option<DeploymentReceipt>, TransportError>;
}

/// Builds a [`Transport`] for a resolved network.
pub trait TransportFactory: Send + Sync {
    fn connect(&self, network: &ResolvedNetwork) -> Result<Arc<dyn Transport>, TransportError>;
}

/// [`Transport`] over any alloy provider.
pub struct HttpTransport<P> {
    provider: P,
}

#[async_trait]
impl<P: Provider<AnyNetwork>> Transport for HttpTransport<P> {
    async fn chain_id(&self) -> Result<u64, TransportError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn transaction_count(&self, from: Address) -> Result<u64, TransportError> {
        Ok(self.provider.get_transaction_count(from).await?)
    }

    async fn send_transaction(
        &self,
        tx: WithOtherFields<TransactionRequest>,
    ) -> Result<TxHash, TransportError> {
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<DeploymentReceipt>, TransportError> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(|receipt| DeploymentReceipt {
            transaction_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            contract_address: receipt.contract_address(),
            status: receipt.status(),
        }))
    }
}

/// Production transport factory: HTTP provider with the network's wallet and
/// the standard gas/fee fillers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpTransportFactory;

impl TransportFactory for HttpTransportFactory {
    fn connect(&self, network: &ResolvedNetwork) -> Result<Arc<dyn Transport>, TransportError> {
        let url: url::Url = network.url.parse().map_err(|source| {
            TransportError::InvalidEndpoint { url: network.url.clone(), source }
        })?;
        let signer: PrivateKeySigner = network
            .private_key
            .parse()
            .map_err(|_| TransportError::InvalidKey(network.name.clone()))?;
        let provider = ProviderBuilder::new()
            .network::<AnyNetwork>()
            .wallet(EthereumWallet::new(signer))
            .connect_http(url);
        Ok(Arc::new(HttpTransport { provider }))
    }
}
