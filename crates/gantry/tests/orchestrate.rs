//! Orchestrator state machine tests over scripted transports.

use alloy_primitives::{Address, B256, TxKind, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_serde::WithOtherFields;
use alloy_transport::TransportErrorKind;
use async_trait::async_trait;
use gantry::{
    DeploymentRequest, Orchestrator, Stage,
    transport::{DeploymentReceipt, Transport, TransportError, TransportFactory},
};
use gantry_config::{Config, DEV_PRIVATE_KEY, NetworkConfig, ResolvedNetwork};
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use tempfile::TempDir;

/// Anvil dev account #0, the address behind [`DEV_PRIVATE_KEY`].
const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

const COUNTER_ARTIFACT: &str = r#"{
    "contractName": "Counter",
    "abi": [
        { "type": "function", "name": "count", "inputs": [], "outputs": [{ "name": "", "type": "uint256" }], "stateMutability": "view" }
    ],
    "bytecode": "0x6080604052348015600e575f5ffd5b50603e80601a5f395ff3fe"
}"#;

const NFT404_ARTIFACT: &str = r#"{
    "contractName": "TESTDN404",
    "abi": [
        {
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "name_", "type": "string" },
                { "name": "symbol_", "type": "string" },
                { "name": "allowlistRoot_", "type": "bytes32" },
                { "name": "publicPrice_", "type": "uint96" },
                { "name": "allowlistPrice_", "type": "uint96" },
                { "name": "initialTokenSupply_", "type": "uint96" },
                { "name": "initialSupplyOwner_", "type": "address" },
                { "name": "mirror_", "type": "address" }
            ]
        }
    ],
    "bytecode": "0x60806040523480156100105760006000fd5b50"
}"#;

/// What the scripted transport does after a transaction is submitted.
#[derive(Clone, Copy, Debug)]
enum Behavior {
    Confirm { contract_address: Address },
    NeverConfirm,
    Revert,
    RejectSend,
}

struct MockTransport {
    chain_id: u64,
    behavior: Behavior,
    calls: AtomicUsize,
    next_nonce: AtomicU64,
    sent: Mutex<Vec<WithOtherFields<TransactionRequest>>>,
}

impl MockTransport {
    fn new(chain_id: u64, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            behavior,
            calls: AtomicUsize::new(0),
            next_nonce: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn sent(&self) -> Vec<WithOtherFields<TransactionRequest>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn chain_id(&self) -> Result<u64, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain_id)
    }

    async fn transaction_count(&self, _from: Address) -> Result<u64, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Yield like a real RPC round-trip would, so unserialized callers
        // would interleave here and read the same count.
        tokio::task::yield_now().await;
        Ok(self.next_nonce.load(Ordering::SeqCst))
    }

    async fn send_transaction(
        &self,
        tx: WithOtherFields<TransactionRequest>,
    ) -> Result<B256, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if matches!(self.behavior, Behavior::RejectSend) {
            return Err(TransportErrorKind::custom_str("insufficient funds for gas").into());
        }
        tokio::task::yield_now().await;
        let nonce = self.next_nonce.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(tx);
        Ok(B256::from(U256::from(0xbeef_0000_u64 + nonce)))
    }

    async fn receipt(&self, hash: B256) -> Result<Option<DeploymentReceipt>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let receipt = match self.behavior {
            Behavior::Confirm { contract_address } => Some(DeploymentReceipt {
                transaction_hash: hash,
                block_number: Some(1),
                contract_address: Some(contract_address),
                status: true,
            }),
            Behavior::Revert => Some(DeploymentReceipt {
                transaction_hash: hash,
                block_number: Some(1),
                contract_address: None,
                status: false,
            }),
            Behavior::NeverConfirm => None,
            Behavior::RejectSend => None,
        };
        Ok(receipt)
    }
}

struct MockFactory {
    transport: Arc<MockTransport>,
    connects: AtomicUsize,
}

impl MockFactory {
    fn new(transport: Arc<MockTransport>) -> Arc<Self> {
        Arc::new(Self { transport, connects: AtomicUsize::new(0) })
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl TransportFactory for MockFactory {
    fn connect(&self, _network: &ResolvedNetwork) -> Result<Arc<dyn Transport>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.transport.clone())
    }
}

/// Artifact dir with the two fixture contracts plus a registry holding a
/// funded localhost and a credential-less mumbai.
fn test_setup() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Counter.json"), COUNTER_ARTIFACT).unwrap();
    std::fs::write(dir.path().join("TESTDN404.json"), NFT404_ARTIFACT).unwrap();

    let networks = BTreeMap::from([
        (
            "localhost".to_string(),
            NetworkConfig {
                url: "http://127.0.0.1:8545".to_string(),
                chain_id: 31337,
                private_key: Some(DEV_PRIVATE_KEY.to_string()),
            },
        ),
        (
            "mumbai".to_string(),
            NetworkConfig {
                url: "https://polygon-mumbai.alchemyapi.io/v2/${ALCHEMY_API_KEY_MUMBAI}"
                    .to_string(),
                chain_id: 80001,
                private_key: None,
            },
        ),
    ]);
    let config = Config {
        artifacts: dir.path().to_path_buf(),
        transaction_timeout: 12,
        poll_interval: 1,
        networks,
    };
    (dir, config)
}

fn request(contract: &str, network: &str, args: &[&str]) -> DeploymentRequest {
    DeploymentRequest {
        contract: contract.to_string(),
        network: network.to_string(),
        constructor_args: args.iter().map(|arg| arg.to_string()).collect(),
    }
}

fn nft404_args() -> Vec<&'static str> {
    vec![
        "TESTDN404",
        "TEST404",
        "0x0000000000000000000000000000000000000000000000000000000000000000",
        "0",
        "0",
        "1",
        DEV_ADDRESS,
        "0xdbaa28cBe70aF04EbFB166b1A3E8F8034e5B9FC7",
    ]
}

#[tokio::test]
async fn unknown_network_fails_without_any_network_io() {
    let (_dir, config) = test_setup();
    let transport = MockTransport::new(31337, Behavior::NeverConfirm);
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory.clone());

    let err = orchestrator.deploy(request("Counter", "base", &[])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::NetworkResolution);
    assert_eq!(factory.connects(), 0);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn missing_credential_fails_before_transport_construction() {
    let (_dir, config) = test_setup();
    let transport = MockTransport::new(80001, Behavior::NeverConfirm);
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory.clone());

    let err = orchestrator.deploy(request("Counter", "mumbai", &[])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::NetworkResolution);
    assert!(err.to_string().contains("no signing credential"), "{err}");
    assert_eq!(factory.connects(), 0);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn missing_artifact_is_a_configuration_failure() {
    let (_dir, config) = test_setup();
    let transport = MockTransport::new(31337, Behavior::NeverConfirm);
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory.clone());

    let err = orchestrator.deploy(request("Unknown", "localhost", &[])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::NetworkResolution);
    assert_eq!(factory.connects(), 0);
}

#[tokio::test]
async fn argument_count_mismatch_fails_before_any_transaction() {
    let (_dir, config) = test_setup();
    let transport = MockTransport::new(31337, Behavior::NeverConfirm);
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory.clone());

    // Counter has no constructor; TESTDN404 wants eight arguments.
    let err = orchestrator.deploy(request("Counter", "localhost", &["1"])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::ArgumentValidation);

    let err =
        orchestrator.deploy(request("TESTDN404", "localhost", &["only-one"])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::ArgumentValidation);

    assert_eq!(factory.connects(), 0);
    assert_eq!(transport.calls(), 0);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failure_stages_are_idempotent() {
    let (_dir, config) = test_setup();
    let factory = MockFactory::new(MockTransport::new(31337, Behavior::NeverConfirm));
    let orchestrator = Orchestrator::with_transport_factory(&config, factory);

    for _ in 0..2 {
        let err = orchestrator.deploy(request("Counter", "base", &[])).await.unwrap_err();
        assert_eq!(err.stage(), Stage::NetworkResolution);
        let err = orchestrator.deploy(request("Counter", "localhost", &["1"])).await.unwrap_err();
        assert_eq!(err.stage(), Stage::ArgumentValidation);
    }
}

#[tokio::test]
async fn deploys_contract_without_constructor() {
    let (_dir, config) = test_setup();
    let contract_address = Address::repeat_byte(0x42);
    let transport = MockTransport::new(31337, Behavior::Confirm { contract_address });
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory);

    let result = orchestrator.deploy(request("Counter", "localhost", &[])).await.unwrap();
    assert_eq!(result.contract_address, contract_address);
    assert_eq!(result.network, "localhost");
    assert_eq!(result.chain_id, 31337);
    assert_eq!(result.deployer, DEV_ADDRESS.parse::<Address>().unwrap());
    assert!(result.constructor_args.is_empty());
    assert_eq!(result.constructor_args_encoded, None);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert_eq!(tx.to, Some(TxKind::Create));
    assert_eq!(tx.from, Some(result.deployer));
    assert_eq!(tx.chain_id, Some(31337));
    assert_eq!(tx.nonce, Some(0));
}

#[tokio::test]
async fn deploys_contract_with_constructor_args() {
    let (_dir, config) = test_setup();
    let contract_address = Address::repeat_byte(0x42);
    let transport = MockTransport::new(31337, Behavior::Confirm { contract_address });
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory);

    let result =
        orchestrator.deploy(request("TESTDN404", "localhost", &nft404_args())).await.unwrap();
    assert_eq!(result.constructor_args.len(), 8);
    let encoded = result.constructor_args_encoded.expect("constructor args were encoded");
    // The all-zero allowlist root survives encoding as 32 zero bytes.
    assert!(encoded.contains(&"00".repeat(32)));

    // The submitted payload is the creation bytecode followed by the
    // encoded arguments.
    let sent = transport.sent();
    let input = sent[0].input.input().unwrap();
    assert!(input.len() > encoded.len() / 2);
    assert!(input.ends_with(&alloy_primitives::hex::decode(&encoded).unwrap()));
}

#[tokio::test]
async fn rpc_rejection_is_a_submission_failure() {
    let (_dir, config) = test_setup();
    let transport = MockTransport::new(31337, Behavior::RejectSend);
    let factory = MockFactory::new(transport);
    let orchestrator = Orchestrator::with_transport_factory(&config, factory);

    let err = orchestrator.deploy(request("Counter", "localhost", &[])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Submission);
    assert!(err.to_string().contains("insufficient funds"), "{err}");
}

#[tokio::test]
async fn chain_id_mismatch_is_a_submission_failure() {
    let (_dir, config) = test_setup();
    // The localhost entry expects 31337, the node reports mainnet.
    let transport = MockTransport::new(1, Behavior::NeverConfirm);
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory);

    let err = orchestrator.deploy(request("Counter", "localhost", &[])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Submission);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn reverted_transaction_is_a_confirmation_failure() {
    let (_dir, config) = test_setup();
    let transport = MockTransport::new(31337, Behavior::Revert);
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory);

    let err = orchestrator.deploy(request("Counter", "localhost", &[])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Confirmation);
    assert!(err.to_string().contains("reverted"), "{err}");
    // The transaction was broadcast; the failure is distinctly post-submission.
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn never_confirming_transport_yields_no_result() {
    let (_dir, config) = test_setup();
    let transport = MockTransport::new(31337, Behavior::NeverConfirm);
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Orchestrator::with_transport_factory(&config, factory);

    let err = orchestrator.deploy(request("Counter", "localhost", &[])).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Confirmation);
    assert!(err.to_string().contains("timed out"), "{err}");
}

#[tokio::test]
async fn concurrent_deployments_get_distinct_nonces() {
    let (_dir, config) = test_setup();
    let transport =
        MockTransport::new(31337, Behavior::Confirm { contract_address: Address::repeat_byte(7) });
    let factory = MockFactory::new(transport.clone());
    let orchestrator = Arc::new(Orchestrator::with_transport_factory(&config, factory));

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let orchestrator = orchestrator.clone();
        tasks.push(tokio::spawn(async move {
            orchestrator.deploy(request("Counter", "localhost", &[])).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut nonces: Vec<u64> = transport.sent().iter().map(|tx| tx.nonce.unwrap()).collect();
    nonces.sort_unstable();
    assert_eq!(nonces, (0..5).collect::<Vec<u64>>());
}
