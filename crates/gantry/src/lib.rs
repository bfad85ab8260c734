//! Gantry: a configuration-driven contract deployment orchestrator.
//!
//! Given a contract name, a target network and constructor arguments, gantry
//! resolves the network's endpoint and signing credential, loads the compiled
//! artifact, validates and encodes the constructor arguments, submits the
//! deployment transaction and waits for it to be included, then reports the
//! contract address and transaction hash.

pub mod args;
pub mod cmd;
pub mod factory;
pub mod nonce;
pub mod opts;
pub mod orchestrator;
pub mod transport;

pub use orchestrator::{
    DeployError, DeploymentRequest, DeploymentResult, Orchestrator, Stage,
};
