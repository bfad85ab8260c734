//! Block-explorer source verification.
//!
//! Verification is a downstream step with its own external API: gantry only
//! guarantees the shape of what it hands over. [`VerificationRequest`] is
//! that shape; [`EtherscanVerifier`] is a thin submitter for
//! Etherscan-compatible explorers.

mod etherscan;

pub use etherscan::EtherscanVerifier;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::Serialize;

/// Errors produced while handing a deployment to a block explorer.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// No explorer endpoint is known for the network.
    #[error("no block explorer configured for network `{0}`")]
    UnsupportedNetwork(String),
    /// The explorer API key is neither supplied nor present in the
    /// environment.
    #[error("missing explorer API key for network `{network}`; set `{var}`")]
    MissingApiKey { network: String, var: &'static str },
    /// The HTTP round-trip failed.
    #[error("verification request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The explorer answered, but refused the submission.
    #[error("explorer rejected the submission: {message}: {result}")]
    Rejected { message: String, result: String },
}

/// Everything an external verification step consumes about a deployment.
///
/// This shape is the contract between gantry and downstream tooling; fields
/// serialize in camelCase and must stay stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub contract_address: Address,
    pub contract_name: String,
    /// ABI-encoded constructor arguments, hex without the `0x` prefix.
    pub constructor_args: Option<String>,
    pub network: String,
    pub chain_id: u64,
}

/// A source verification backend.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Submits the request and returns the explorer's submission identifier.
    async fn submit(&self, request: &VerificationRequest) -> Result<String, VerifyError>;

    /// Polls the status of a prior submission.
    async fn check(&self, guid: &str) -> Result<String, VerifyError>;
}
