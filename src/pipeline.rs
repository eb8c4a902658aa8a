//! Resolve, deploy, record, then optionally verify.

use async_trait::async_trait;

use crate::config::{Credential, RuntimeConfig};
use crate::contracts::{ArtifactStore, DeployedContract, DeploymentJournal, Executor};
use crate::error::DeployError;
use crate::modules::{ModuleCatalog, Overrides, ResolvedPlan};
use crate::network::{NetworkDescriptor, NetworkRegistry};
use crate::verify::{Registrar, VerificationResult};

/// Anything that can put a resolved plan on-chain
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    async fn deploy(
        &self,
        plan: &ResolvedPlan,
        network: &NetworkDescriptor,
        credential: &Credential,
    ) -> Result<DeployedContract, DeployError>;
}

/// Anything that can verify a deployed contract's source
#[async_trait]
pub trait SourceVerifier: Send + Sync {
    async fn verify(&self, deployed: &DeployedContract) -> Result<VerificationResult, DeployError>;
}

#[async_trait]
impl ContractDeployer for Executor {
    async fn deploy(
        &self,
        plan: &ResolvedPlan,
        network: &NetworkDescriptor,
        credential: &Credential,
    ) -> Result<DeployedContract, DeployError> {
        Executor::deploy(self, plan, network, credential).await
    }
}

/// Registrar paired with the artifacts the contracts were compiled into
pub struct ArtifactVerifier {
    registrar: Registrar,
    artifacts: ArtifactStore,
}

impl ArtifactVerifier {
    pub fn new(registrar: Registrar, artifacts: ArtifactStore) -> Self {
        Self {
            registrar,
            artifacts,
        }
    }
}

#[async_trait]
impl SourceVerifier for ArtifactVerifier {
    async fn verify(&self, deployed: &DeployedContract) -> Result<VerificationResult, DeployError> {
        let source = self.artifacts.source_metadata(&deployed.contract)?;
        self.registrar.verify(deployed, &source).await
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub module: String,
    pub network: String,
    pub overrides: Overrides,
    pub verify: bool,
}

#[derive(Debug)]
pub struct DeploymentOutcome {
    pub deployed: DeployedContract,
    /// `None` when verification was not requested. A verification error
    /// never undoes the deployment.
    pub verification: Option<Result<VerificationResult, DeployError>>,
}

pub struct Pipeline<D, V> {
    catalog: ModuleCatalog,
    registry: NetworkRegistry,
    config: RuntimeConfig,
    deployer: D,
    verifier: V,
    journal: Option<DeploymentJournal>,
}

impl<D: ContractDeployer, V: SourceVerifier> Pipeline<D, V> {
    pub fn new(
        catalog: ModuleCatalog,
        registry: NetworkRegistry,
        config: RuntimeConfig,
        deployer: D,
        verifier: V,
    ) -> Self {
        Self {
            catalog,
            registry,
            config,
            deployer,
            verifier,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: DeploymentJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Resolve network and module without touching any RPC
    pub fn plan(
        &self,
        request: &DeploymentRequest,
    ) -> Result<(&NetworkDescriptor, ResolvedPlan), DeployError> {
        let network = self.registry.resolve(&request.network)?;
        let plan = self.catalog.module(&request.module)?.build(&request.overrides)?;
        Ok((network, plan))
    }

    pub async fn run(&self, request: &DeploymentRequest) -> Result<DeploymentOutcome, DeployError> {
        let (network, plan) = self.plan(request)?;
        let credential = self
            .config
            .credentials()
            .resolve_credential(&network.credential);

        let deployed = self.deployer.deploy(&plan, network, &credential).await?;

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record(&deployed) {
                tracing::warn!("Deployment succeeded but could not be recorded: {:#}", e);
            }
        }

        let verification = if request.verify {
            Some(self.verify(&deployed).await)
        } else {
            None
        };

        Ok(DeploymentOutcome {
            deployed,
            verification,
        })
    }

    /// Verify an existing deployment. Errors are logged and returned as is.
    pub async fn verify(&self, deployed: &DeployedContract) -> Result<VerificationResult, DeployError> {
        let result = self.verifier.verify(deployed).await;
        if let Err(e) = &result {
            tracing::warn!(
                address = %deployed.address,
                network = %deployed.network.name,
                "Verification failed: {}",
                e
            );
        }
        result
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy::primitives::{Address, Bytes, TxHash};

    use super::*;
    use crate::modules::ParamValue;

    #[derive(Default)]
    struct FakeDeployer {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ContractDeployer for FakeDeployer {
        async fn deploy(
            &self,
            plan: &ResolvedPlan,
            network: &NetworkDescriptor,
            _credential: &Credential,
        ) -> Result<DeployedContract, DeployError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DeployError::Broadcast("insufficient funds".to_string()));
            }

            Ok(DeployedContract {
                module: plan.module.clone(),
                contract: plan.contract.clone(),
                address: Address::repeat_byte(0x11),
                network: network.clone(),
                tx_hash: TxHash::repeat_byte(0x22),
                deployer: Address::repeat_byte(0x33),
                block_number: Some(1),
                constructor_args: Bytes::new(),
            })
        }
    }

    struct FakeVerifier {
        calls: AtomicUsize,
        result: fn() -> Result<VerificationResult, DeployError>,
    }

    impl FakeVerifier {
        fn returning(result: fn() -> Result<VerificationResult, DeployError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result,
            }
        }
    }

    #[async_trait]
    impl SourceVerifier for FakeVerifier {
        async fn verify(&self, _deployed: &DeployedContract) -> Result<VerificationResult, DeployError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn rejected() -> Result<VerificationResult, DeployError> {
        Err(DeployError::VerificationRejected("Invalid API Key".to_string()))
    }

    fn pipeline(deployer: FakeDeployer, verifier: FakeVerifier) -> Pipeline<FakeDeployer, FakeVerifier> {
        let config = RuntimeConfig::default();
        let registry = NetworkRegistry::new(&config).unwrap();
        Pipeline::new(ModuleCatalog::builtin(), registry, config, deployer, verifier)
    }

    fn request(module: &str, network: &str, verify: bool) -> DeploymentRequest {
        DeploymentRequest {
            module: module.to_string(),
            network: network.to_string(),
            overrides: Overrides::new(),
            verify,
        }
    }

    #[tokio::test]
    async fn test_verification_failure_keeps_deployment() {
        let pipeline = pipeline(FakeDeployer::default(), FakeVerifier::returning(rejected));

        let outcome = pipeline
            .run(&request("AIstronaut", "liskSepolia", true))
            .await
            .unwrap();

        assert_eq!(outcome.deployed.address, Address::repeat_byte(0x11));
        assert_eq!(outcome.deployed.network.chain_id, 4202);
        assert!(matches!(
            outcome.verification,
            Some(Err(DeployError::VerificationRejected(_)))
        ));
        assert_eq!(pipeline.verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_network_fails_before_deploying() {
        let pipeline = pipeline(FakeDeployer::default(), FakeVerifier::returning(rejected));

        let err = pipeline
            .run(&request("AIstronaut", "mainnet-typo", true))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::UnknownNetwork(name) if name == "mainnet-typo"));
        assert_eq!(pipeline.deployer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_module_fails_before_deploying() {
        let pipeline = pipeline(FakeDeployer::default(), FakeVerifier::returning(rejected));

        let err = pipeline.run(&request("Nope", "hardhat", false)).await.unwrap_err();

        assert!(matches!(err, DeployError::UnknownModule(_)));
        assert_eq!(pipeline.deployer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_deploy_skips_verification() {
        let deployer = FakeDeployer {
            fail: true,
            ..Default::default()
        };
        let pipeline = pipeline(deployer, FakeVerifier::returning(rejected));

        let err = pipeline
            .run(&request("AIstronaut", "mantle", true))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Broadcast(_)));
        assert_eq!(pipeline.verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verification_not_requested() {
        let pipeline = pipeline(
            FakeDeployer::default(),
            FakeVerifier::returning(|| {
                Ok(VerificationResult::AlreadyVerified {
                    url: String::new(),
                })
            }),
        );

        let outcome = pipeline.run(&request("AIstronaut", "hardhat", false)).await.unwrap();

        assert!(outcome.verification.is_none());
        assert_eq!(pipeline.verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_journal_records_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(FakeDeployer::default(), FakeVerifier::returning(rejected))
            .with_journal(DeploymentJournal::from_dir(dir.path()));

        pipeline.run(&request("AIstronaut", "mantle", false)).await.unwrap();

        assert!(dir.path().join("mantle/AIstronaut.json").exists());
    }

    #[test]
    fn test_plan_applies_overrides() {
        let pipeline = pipeline(FakeDeployer::default(), FakeVerifier::returning(rejected));
        let mut req = request("AIstronaut", "sepolia", false);
        req.overrides
            .insert("unlockTime".to_string(), ParamValue::Integer(1_900_000_000));

        let (network, plan) = pipeline.plan(&req).unwrap();

        assert_eq!(network.chain_id, 11155111);
        assert_eq!(plan.parameters["unlockTime"], ParamValue::Integer(1_900_000_000));
        assert_eq!(pipeline.deployer.calls.load(Ordering::SeqCst), 0);
    }
}
