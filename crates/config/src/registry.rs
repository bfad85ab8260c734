//! The network registry: logical network name to endpoint, chain id and
//! signing credential.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// The canonical Anvil/Hardhat development key #0. Funded on every stock
/// local node, worthless everywhere else.
pub const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// A single network table entry.
///
/// `url` may reference environment variables as `${VAR}`; placeholders are
/// interpolated when the network is resolved, so an unset variable only
/// matters for the network actually selected.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// RPC endpoint URL, possibly containing `${VAR}` placeholders.
    pub url: String,
    /// Chain id the endpoint is expected to serve.
    pub chain_id: u64,
    /// Hex-encoded signing key authorizing transactions on this network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("url", &self.url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A fully-populated deployment target: every field present, every
/// placeholder interpolated.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedNetwork {
    pub name: String,
    pub url: String,
    pub chain_id: u64,
    pub private_key: String,
}

impl fmt::Debug for ResolvedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedNetwork")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Immutable mapping from logical network name to [`NetworkConfig`].
///
/// Populated once at startup and passed explicitly to whoever needs it; it
/// performs no mutation and holds no time-varying state.
#[derive(Clone, Debug, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, NetworkConfig>,
}

impl NetworkRegistry {
    pub fn new(networks: BTreeMap<String, NetworkConfig>) -> Self {
        Self { networks }
    }

    /// Known network names, in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    /// Raw table entry for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks.get(name)
    }

    /// Resolves `name` into a fully-populated deployment target.
    ///
    /// Lookup is exact-match only; there is no fuzzy matching and no default
    /// fallback. A missing credential or an unset `${VAR}` in the endpoint is
    /// a configuration error, reported before any network I/O happens.
    pub fn resolve(&self, name: &str) -> Result<ResolvedNetwork, ConfigError> {
        let network = self.networks.get(name).ok_or_else(|| ConfigError::UnknownNetwork {
            name: name.to_string(),
            known: self.names().collect::<Vec<_>>().join(", "),
        })?;
        let private_key = network
            .private_key
            .clone()
            .ok_or_else(|| ConfigError::MissingCredential(name.to_string()))?;
        let url = interpolate_env(&network.url, name)?;
        Ok(ResolvedNetwork { name: name.to_string(), url, chain_id: network.chain_id, private_key })
    }
}

/// Replaces every `${VAR}` in `template` with the value of the environment
/// variable `VAR`.
fn interpolate_env(template: &str, network: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(ConfigError::UnterminatedPlaceholder(network.to_string()));
        };
        let var = &after[..end];
        let value = std::env::var(var).map_err(|_| ConfigError::MissingEnv {
            network: network.to_string(),
            var: var.to_string(),
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// The built-in network table.
///
/// Mirrors the deployment targets this tool has historically served:
/// Alchemy-fronted public networks sharing one deployer key, a plain public
/// RPC for Astar zkEVM, and a local development node.
pub(crate) fn default_networks() -> BTreeMap<String, NetworkConfig> {
    let table: [(&str, &str, u64, Option<&str>); 7] = [
        ("localhost", "http://127.0.0.1:8545", 31337, Some(DEV_PRIVATE_KEY)),
        ("mainnet", "https://eth-mainnet.alchemyapi.io/v2/${ALCHEMY_API_KEY_MAINNET}", 1, None),
        ("goerli", "https://eth-goerli.alchemyapi.io/v2/${ALCHEMY_API_KEY_GOERLI}", 5, None),
        (
            "sepolia",
            "https://eth-sepolia.g.alchemy.com/v2/${ALCHEMY_API_KEY_SEPOLIA}",
            11155111,
            None,
        ),
        (
            "polygon",
            "https://polygon-mainnet.g.alchemyapi.io/v2/${ALCHEMY_API_KEY_POLYGON}",
            137,
            None,
        ),
        (
            "mumbai",
            "https://polygon-mumbai.alchemyapi.io/v2/${ALCHEMY_API_KEY_MUMBAI}",
            80001,
            None,
        ),
        ("astar-zkevm", "https://rpc.startale.com/astar-zkevm", 3776, None),
    ];
    table
        .into_iter()
        .map(|(name, url, chain_id, private_key)| {
            (
                name.to_string(),
                NetworkConfig {
                    url: url.to_string(),
                    chain_id,
                    private_key: private_key.map(str::to_string),
                },
            )
        })
        .collect()
}
