//! Loading of compiled contract artifacts.
//!
//! Artifacts are the build step's output and immutable here: an ABI plus the
//! deployable creation bytecode, stored as Hardhat-style JSON
//! (`{ "contractName": ..., "abi": [...], "bytecode": "0x..." }`). Gantry
//! never compiles anything itself.

use alloy_json_abi::{Constructor, JsonAbi};
use alloy_primitives::Bytes;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Errors produced while locating or decoding an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// No `<name>.json` anywhere under the artifact root.
    #[error("no artifact named `{name}` under {}", root.display())]
    NotFound { name: String, root: PathBuf },
    /// The artifact file could not be read.
    #[error("failed to read artifact at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The artifact file is not valid artifact JSON.
    #[error("malformed artifact at {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The artifact carries no creation bytecode, so there is nothing to
    /// deploy (abstract contract or interface).
    #[error("artifact `{0}` has no deployable bytecode")]
    MissingBytecode(String),
}

/// A compiled contract: the callable interface plus creation bytecode.
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// The constructor entry point, if the contract declares one.
    pub fn constructor(&self) -> Option<&Constructor> {
        self.abi.constructor()
    }
}

/// The subset of the Hardhat artifact format gantry consumes.
#[derive(Deserialize)]
struct RawArtifact {
    #[serde(default, rename = "contractName")]
    contract_name: Option<String>,
    abi: JsonAbi,
    #[serde(default)]
    bytecode: Option<Bytes>,
}

/// Read-only view over a build output directory.
///
/// Lookup tries `<root>/<Name>.json` first, then walks the tree: Hardhat
/// nests its output as `contracts/<File>.sol/<Name>.json`.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads the artifact for the contract `name`.
    pub fn load(&self, name: &str) -> Result<ContractArtifact, ArtifactError> {
        let path = self.locate(name)?;
        let contents = fs::read_to_string(&path)
            .map_err(|source| ArtifactError::Io { path: path.clone(), source })?;
        let raw: RawArtifact = serde_json::from_str(&contents)
            .map_err(|source| ArtifactError::Invalid { path: path.clone(), source })?;
        let bytecode = raw.bytecode.unwrap_or_default();
        if bytecode.is_empty() {
            return Err(ArtifactError::MissingBytecode(name.to_string()));
        }
        Ok(ContractArtifact {
            name: raw.contract_name.unwrap_or_else(|| name.to_string()),
            abi: raw.abi,
            bytecode,
        })
    }

    fn locate(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{name}.json");
        let direct = self.root.join(&file_name);
        if direct.is_file() {
            return Ok(direct);
        }
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name.as_str())
            .map(walkdir::DirEntry::into_path)
            .ok_or_else(|| ArtifactError::NotFound {
                name: name.to_string(),
                root: self.root.clone(),
            })
    }
}
