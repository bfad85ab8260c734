//! Gantry configuration.
//!
//! Configuration is layered the same way for every invocation: built-in
//! defaults, then `gantry.toml` in the working directory, then `GANTRY_*`
//! environment variables. Signing credentials are never stored in the file
//! layer by convention; they are hydrated from the process environment once,
//! at load time.

mod registry;

pub use registry::{DEV_PRIVATE_KEY, NetworkConfig, NetworkRegistry, ResolvedNetwork};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};
use tracing::debug;

/// Errors produced while loading or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested network is not present in the registry.
    #[error("unknown network `{name}` (known networks: {known})")]
    UnknownNetwork { name: String, known: String },
    /// The selected network has no signing credential.
    #[error(
        "no signing credential configured for network `{0}`; set `PRIVATE_KEY` or `networks.{0}.private_key`"
    )]
    MissingCredential(String),
    /// The selected network's endpoint references an unset environment variable.
    #[error("environment variable `{var}` referenced by network `{network}` is not set")]
    MissingEnv { network: String, var: String },
    /// The selected network's endpoint has an unterminated `${` placeholder.
    #[error("unterminated `${{` placeholder in endpoint for network `{0}`")]
    UnterminatedPlaceholder(String),
    /// The layered configuration could not be extracted.
    #[error(transparent)]
    Extract(#[from] figment::Error),
}

/// Top-level gantry configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding compiled contract artifacts (build output).
    pub artifacts: PathBuf,
    /// Seconds to wait for a submitted transaction to be included.
    pub transaction_timeout: u64,
    /// Seconds between receipt polls while waiting for inclusion.
    pub poll_interval: u64,
    /// The network table, keyed by logical network name.
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifacts: PathBuf::from("artifacts"),
            transaction_timeout: 120,
            poll_interval: 3,
            networks: registry::default_networks(),
        }
    }
}

impl Config {
    /// Default configuration file name, looked up in the working directory.
    pub const FILE_NAME: &'static str = "gantry.toml";

    /// Environment variable holding the shared deployer key.
    pub const PRIVATE_KEY_ENV: &'static str = "PRIVATE_KEY";

    /// Returns the figment layering used by [`Config::load`].
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(Self::FILE_NAME))
            .merge(Env::prefixed("GANTRY_"))
    }

    /// Loads the layered configuration and hydrates credentials from the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config: Self = Self::figment().extract()?;
        config.hydrate_credentials();
        debug!(networks = config.networks.len(), "configuration loaded");
        Ok(config)
    }

    /// Networks without an explicit key inherit the process-wide
    /// `PRIVATE_KEY`, the single deployer key shared across remote networks.
    fn hydrate_credentials(&mut self) {
        if let Ok(key) = std::env::var(Self::PRIVATE_KEY_ENV) {
            for network in self.networks.values_mut() {
                if network.private_key.is_none() {
                    network.private_key = Some(key.clone());
                }
            }
        }
    }

    /// Builds the immutable network registry for this configuration.
    pub fn registry(&self) -> NetworkRegistry {
        NetworkRegistry::new(self.networks.clone())
    }
}
