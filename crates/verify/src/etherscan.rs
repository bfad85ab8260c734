//! Etherscan-compatible verification submitter.

use crate::{VerificationProvider, VerificationRequest, VerifyError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Explorer endpoint and API key variable per network.
///
/// Polygon networks use Polygonscan with its own key; everything else goes
/// through Etherscan.
const EXPLORERS: &[(&str, &str, &str)] = &[
    ("mainnet", "https://api.etherscan.io/api", "ETHERSCAN_API_KEY"),
    ("goerli", "https://api-goerli.etherscan.io/api", "ETHERSCAN_API_KEY"),
    ("sepolia", "https://api-sepolia.etherscan.io/api", "ETHERSCAN_API_KEY"),
    ("polygon", "https://api.polygonscan.com/api", "POLYGONSCAN_API_KEY"),
    ("mumbai", "https://api-testnet.polygonscan.com/api", "POLYGONSCAN_API_KEY"),
];

/// Every Etherscan-family response wraps its payload the same way.
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    status: String,
    message: String,
    result: String,
}

impl ResponseEnvelope {
    fn into_result(self) -> Result<String, VerifyError> {
        if self.status == "1" {
            Ok(self.result)
        } else {
            Err(VerifyError::Rejected { message: self.message, result: self.result })
        }
    }
}

/// Thin client for the Etherscan-compatible verification API.
#[derive(Clone, Debug)]
pub struct EtherscanVerifier {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl EtherscanVerifier {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Picks the explorer endpoint and API key for a configured network.
    ///
    /// Without an explicit key the per-explorer environment variable is
    /// consulted, matching how the deployment targets have always been set
    /// up.
    pub fn for_network(network: &str, api_key: Option<String>) -> Result<Self, VerifyError> {
        let entry = EXPLORERS
            .iter()
            .find(|entry| entry.0 == network)
            .ok_or_else(|| VerifyError::UnsupportedNetwork(network.to_string()))?;
        let (api_url, key_var) = (entry.1, entry.2);
        let api_key = match api_key {
            Some(key) => key,
            None => std::env::var(key_var).map_err(|_| VerifyError::MissingApiKey {
                network: network.to_string(),
                var: key_var,
            })?,
        };
        Ok(Self::new(api_url, api_key))
    }
}

#[async_trait]
impl VerificationProvider for EtherscanVerifier {
    async fn submit(&self, request: &VerificationRequest) -> Result<String, VerifyError> {
        let mut form = vec![
            ("apikey", self.api_key.clone()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("chainid", request.chain_id.to_string()),
            ("contractaddress", request.contract_address.to_string()),
            ("contractname", request.contract_name.clone()),
        ];
        if let Some(args) = &request.constructor_args {
            // Etherscan spells this field `constructorArguements`.
            form.push(("constructorArguements", args.clone()));
        }
        debug!(contract = %request.contract_name, network = %request.network, "submitting verification");
        let response: ResponseEnvelope =
            self.client.post(&self.api_url).form(&form).send().await?.json().await?;
        response.into_result()
    }

    async fn check(&self, guid: &str) -> Result<String, VerifyError> {
        let query = [
            ("apikey", self.api_key.as_str()),
            ("module", "contract"),
            ("action", "checkverifystatus"),
            ("guid", guid),
        ];
        let response: ResponseEnvelope =
            self.client.get(&self.api_url).query(&query).send().await?.json().await?;
        response.into_result()
    }
}
