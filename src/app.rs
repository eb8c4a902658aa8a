use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr, eyre};

use crate::config::{AppConfig, Environment, RuntimeConfig};
use crate::contracts::{ArtifactStore, DeploymentJournal, Executor};
use crate::modules::{ModuleCatalog, Overrides, ParamValue, load_parameter_file};
use crate::network::NetworkRegistry;
use crate::pipeline::{ArtifactVerifier, DeploymentRequest, Pipeline};
use crate::project::Project;
use crate::verify::{Registrar, VerificationResult};

/// Module, network and parameter selection shared by `deploy` and `plan`
pub struct Target {
    pub module: String,
    pub network: Option<String>,
    pub parameters: Option<PathBuf>,
    pub params: Vec<(String, ParamValue)>,
}

/// Everything a command needs, built once at startup
pub struct App {
    project: Project,
    pipeline: Pipeline<Executor, ArtifactVerifier>,
    catalog: ModuleCatalog,
    settings: AppConfig,
}

impl App {
    pub fn new(project: Project, config_path: Option<&Path>) -> Result<Self> {
        let settings = AppConfig::discover(&project.root, config_path)?;
        let config = RuntimeConfig::new(settings.clone(), Environment::capture());

        tracing::info!(
            project = %project.name,
            kind = %project.project_type,
            "Using project at {:?}",
            project.root
        );

        let registry = NetworkRegistry::new(&config).wrap_err("Invalid network configuration")?;
        let catalog = ModuleCatalog::load(&project.modules_dir)?;
        let artifacts = ArtifactStore::new(&project);

        let registrar = Registrar::new(registry.clone(), &config)?;
        let verifier = ArtifactVerifier::new(registrar, artifacts.clone());

        let pipeline = Pipeline::new(
            catalog.clone(),
            registry,
            config,
            Executor::new(artifacts),
            verifier,
        )
        .with_journal(DeploymentJournal::new(&project));

        Ok(Self {
            project,
            pipeline,
            catalog,
            settings,
        })
    }

    fn network_name(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .or_else(|| self.settings.default_network().map(str::to_string))
            .ok_or_else(|| eyre!("No network given; pass --network or set defaults.network"))
    }

    fn request(&self, target: Target, verify: bool) -> Result<DeploymentRequest> {
        let network = self.network_name(target.network)?;

        let mut overrides = match &target.parameters {
            Some(path) => load_parameter_file(path, &target.module)?,
            None => Overrides::new(),
        };
        // Command-line values win over the parameter file
        overrides.extend(target.params);

        Ok(DeploymentRequest {
            module: target.module,
            network,
            overrides,
            verify,
        })
    }

    pub async fn deploy(&self, target: Target, verify: bool) -> Result<()> {
        let request = self.request(target, verify)?;

        let outcome = self.pipeline.run(&request).await.map_err(|e| {
            if e.is_local() {
                tracing::info!("Nothing was sent to {}", request.network);
            }
            eyre::Report::new(e)
        })?;

        let deployed = &outcome.deployed;
        println!("{} deployed to: {}", deployed.contract, deployed.address);
        println!("Transaction: {}", deployed.tx_hash);

        // Verification problems are reported but do not fail the command
        match outcome.verification {
            Some(Ok(result)) => print_verification(&result),
            Some(Err(e)) if e.is_verification() => eprintln!("Verification failed: {}", e),
            Some(Err(e)) => eprintln!("Verification could not be prepared: {}", e),
            None => {}
        }

        Ok(())
    }

    pub fn plan(&self, target: Target) -> Result<()> {
        let request = self.request(target, false)?;
        let (network, plan) = self.pipeline.plan(&request)?;

        println!("Network: {} (chain {}, {})", network.name, network.chain_id, network.rpc_url);
        println!("Signer:  {}", network.credential);
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).wrap_err("Failed to render plan")?
        );
        Ok(())
    }

    /// Re-verify a deployment recorded in the journal
    pub async fn verify(&self, module: &str, network: Option<String>) -> Result<()> {
        let network = self.network_name(network)?;
        let journal = DeploymentJournal::new(&self.project);

        let record = journal.load(&network, module)?.ok_or_else(|| {
            eyre!(
                "No recorded deployment of {} on {} in {:?}",
                module,
                network,
                self.project.deployments_dir
            )
        })?;

        let descriptor = self.pipeline.registry().resolve(&network)?.clone();
        let deployed = record.into_deployed(descriptor);

        let result = self.pipeline.verify(&deployed).await?;
        print_verification(&result);
        Ok(())
    }

    pub fn networks(&self) -> Result<()> {
        if let Some(path) = self.settings.config_path() {
            println!("Config: {}", path.display());
        }

        let journal = DeploymentJournal::new(&self.project);
        let deployments = journal.scan()?;
        let registry = self.pipeline.registry();

        for network in registry.networks() {
            let explorer = registry
                .resolve_explorer_endpoint(network.chain_id)
                .map(|e| e.browser_url)
                .unwrap_or_else(|| "-".to_string());
            let count = deployments.iter().filter(|d| d.network == network.name).count();

            println!(
                "{:<14} {:>10}  {:<45} {:<40} {} deployed",
                network.name, network.chain_id, network.rpc_url, explorer, count
            );
        }
        Ok(())
    }

    pub fn modules(&self) -> Result<()> {
        for module in self.catalog.modules() {
            let params: Vec<String> = module
                .parameters
                .iter()
                .map(|p| match &p.default {
                    Some(default) => format!("{}={}", p.name, default),
                    None => p.name.clone(),
                })
                .collect();

            println!("{:<20} {:<16} [{}]", module.name, module.contract, params.join(", "));
        }
        Ok(())
    }
}

fn print_verification(result: &VerificationResult) {
    match result {
        VerificationResult::Verified { url, .. } => println!("Verified: {}", url),
        VerificationResult::AlreadyVerified { url } => println!("Already verified: {}", url),
        VerificationResult::Pending { guid } => {
            eprintln!("Verification still pending (guid {})", guid)
        }
    }
}
