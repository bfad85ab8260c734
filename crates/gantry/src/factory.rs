//! Binding of a contract artifact to a deployment transaction.
//!
//! [`DeploymentTxFactory`] validates constructor arguments against the ABI
//! and packs bytecode plus encoded arguments into a create payload. The
//! resulting [`Deployer`] is the pending-deployment handle: a fully-encoded
//! transaction that has not touched the network yet.

use crate::transport::{DeploymentReceipt, Transport, TransportError};
use alloy_dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Bytes, TxHash};
use alloy_rpc_types::TransactionRequest;
use alloy_serde::WithOtherFields;
use std::time::Duration;
use tracing::trace;

/// Errors produced while binding constructor arguments to an artifact.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("constructor is not defined in the ABI, but {0} argument(s) were provided")]
    UnexpectedArguments(usize),
    #[error("constructor expects {expected} argument(s), but {given} were provided")]
    ArgumentCount { expected: usize, given: usize },
    #[error("could not resolve type of constructor parameter `{param}`: {source}")]
    UnresolvedParameter {
        param: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },
    #[error("invalid value for constructor parameter `{param}` of type `{ty}`: {source}")]
    InvalidArgument {
        param: String,
        ty: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },
    #[error(
        "value for constructor parameter `{param}` must be exactly {expected} bytes, got {got}"
    )]
    FixedBytesLength { param: String, expected: usize, got: usize },
    #[error("failed to encode constructor arguments: {0}")]
    Encode(#[source] alloy_dyn_abi::Error),
}

/// Manages the deployment transaction of a smart contract: the contract
/// bytecode and ABI, usually read from the build output.
#[derive(Clone, Debug)]
pub struct DeploymentTxFactory {
    abi: JsonAbi,
    bytecode: Bytes,
}

impl DeploymentTxFactory {
    /// Creates a factory for deployment of the contract with `bytecode` and
    /// the constructor defined in `abi`.
    pub fn new(abi: JsonAbi, bytecode: Bytes) -> Self {
        Self { abi, bytecode }
    }

    /// Parses string arguments against the constructor's parameter list.
    ///
    /// The count is checked before any value is coerced: a mismatch is a hard
    /// error, not a truncation. Each value must coerce to its declared type,
    /// which for fixed-length byte parameters includes an exact length check.
    pub fn parse_constructor_args(
        &self,
        args: &[String],
    ) -> Result<Vec<DynSolValue>, FactoryError> {
        let Some(constructor) = self.abi.constructor() else {
            return if args.is_empty() {
                Ok(Vec::new())
            } else {
                Err(FactoryError::UnexpectedArguments(args.len()))
            };
        };

        let expected = constructor.inputs.len();
        if args.len() != expected {
            return Err(FactoryError::ArgumentCount { expected, given: args.len() });
        }

        let mut params = Vec::with_capacity(expected);
        for (input, arg) in constructor.inputs.iter().zip(args) {
            let ty = input.resolve().map_err(|source| FactoryError::UnresolvedParameter {
                param: input.name.clone(),
                source,
            })?;
            // Coercion zero-pads short `bytesN` literals; a deployment must
            // not silently reinterpret a truncated hash, so the length is
            // checked against the declared width first.
            if let DynSolType::FixedBytes(expected) = ty {
                let digits = arg.strip_prefix("0x").unwrap_or(arg);
                if digits.len() != expected * 2 {
                    return Err(FactoryError::FixedBytesLength {
                        param: input.name.clone(),
                        expected,
                        got: digits.len() / 2,
                    });
                }
            }
            let value = ty.coerce_str(arg).map_err(|source| FactoryError::InvalidArgument {
                param: input.name.clone(),
                ty: ty.to_string(),
                source,
            })?;
            params.push(value);
        }
        Ok(params)
    }

    /// Create a deployment tx using the provided tokens as constructor
    /// arguments.
    pub fn deploy_tokens(self, params: Vec<DynSolValue>) -> Result<Deployer, FactoryError> {
        // Encode the constructor args & concatenate with the bytecode if necessary
        let data: Bytes = match (self.abi.constructor(), params.is_empty()) {
            (None, false) => return Err(FactoryError::UnexpectedArguments(params.len())),
            (None, true) => self.bytecode.clone(),
            (Some(constructor), _) => {
                let input: Bytes =
                    constructor.abi_encode_input(&params).map_err(FactoryError::Encode)?.into();
                // Concatenate the bytecode and abi-encoded constructor call.
                self.bytecode.iter().copied().chain(input).collect()
            }
        };

        // Since we're deploying a contract, `to` is left unset here; the
        // orchestrator marks the transaction as a create before submission.
        let tx = WithOtherFields::new(TransactionRequest::default().input(data.into()));
        Ok(Deployer { tx })
    }
}

/// Helper which manages the deployment transaction of a smart contract:
/// submitted through a [`Transport`], confirmed via [`wait_for_inclusion`].
#[derive(Clone, Debug)]
#[must_use = "Deployer does nothing unless you `send` it"]
pub struct Deployer {
    /// The deployer's transaction, exposed for overriding the defaults.
    pub tx: WithOtherFields<TransactionRequest>,
}

impl Deployer {
    /// Broadcasts the deployment transaction, returning its hash.
    pub async fn send(self, transport: &dyn Transport) -> Result<TxHash, TransportError> {
        transport.send_transaction(self.tx).await
    }
}

/// Errors produced while waiting for a submitted deployment to land.
#[derive(Debug, thiserror::Error)]
pub enum ConfirmError {
    #[error("timed out after {timeout_secs}s waiting for transaction {tx_hash} to be included")]
    Timeout { tx_hash: TxHash, timeout_secs: u64 },
    #[error("transaction {tx_hash} was included but reverted")]
    Reverted { tx_hash: TxHash },
    #[error("transaction {tx_hash} was included but reported no contract address")]
    ContractNotDeployed { tx_hash: TxHash },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Polls the transport until the transaction is observed in a block.
///
/// One inclusion counts as confirmed: a receipt with a block number and a
/// success status. Hitting the timeout stops the wait but cannot withdraw the
/// transaction, which may still be mined later.
pub async fn wait_for_inclusion(
    transport: &dyn Transport,
    tx_hash: TxHash,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<DeploymentReceipt, ConfirmError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(receipt) = transport.receipt(tx_hash).await? {
            if receipt.block_number.is_some() {
                if !receipt.status {
                    return Err(ConfirmError::Reverted { tx_hash });
                }
                return Ok(receipt);
            }
            trace!(%tx_hash, "receipt present but not yet included");
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ConfirmError::Timeout { tx_hash, timeout_secs: timeout.as_secs() });
        }
        tokio::time::sleep(poll_interval).await;
    }
}
