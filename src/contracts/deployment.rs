use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::{Address, Bytes, TxHash};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::network::NetworkDescriptor;
use crate::project::Project;

/// A contract confirmed on-chain. Only produced after the deployment
/// transaction has been included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub module: String,
    pub contract: String,
    pub address: Address,
    pub network: NetworkDescriptor,
    pub tx_hash: TxHash,
    pub deployer: Address,
    pub block_number: Option<u64>,
    /// ABI-encoded constructor arguments, needed again for verification
    pub constructor_args: Bytes,
}

/// On-disk form of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub module: String,
    pub contract: String,
    pub network: String,
    pub chain_id: u64,
    pub address: Address,
    pub tx_hash: TxHash,
    pub deployer: Address,
    pub block_number: Option<u64>,
    pub constructor_args: Bytes,
}

impl From<&DeployedContract> for DeploymentRecord {
    fn from(deployed: &DeployedContract) -> Self {
        Self {
            module: deployed.module.clone(),
            contract: deployed.contract.clone(),
            network: deployed.network.name.clone(),
            chain_id: deployed.network.chain_id,
            address: deployed.address,
            tx_hash: deployed.tx_hash,
            deployer: deployed.deployer,
            block_number: deployed.block_number,
            constructor_args: deployed.constructor_args.clone(),
        }
    }
}

impl DeploymentRecord {
    /// Rebind a journaled deployment to the network as currently configured
    pub fn into_deployed(self, network: NetworkDescriptor) -> DeployedContract {
        if network.chain_id != self.chain_id {
            tracing::warn!(
                "{} was deployed on chain {} but network {} is now chain {}",
                self.address,
                self.chain_id,
                network.name,
                network.chain_id
            );
        }

        DeployedContract {
            module: self.module,
            contract: self.contract,
            address: self.address,
            network,
            tx_hash: self.tx_hash,
            deployer: self.deployer,
            block_number: self.block_number,
            constructor_args: self.constructor_args,
        }
    }
}

/// Records confirmed deployments as `<dir>/<network>/<Module>.json`
pub struct DeploymentJournal {
    dir: PathBuf,
}

impl DeploymentJournal {
    pub fn new(project: &Project) -> Self {
        Self::from_dir(&project.deployments_dir)
    }

    pub fn from_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn record_path(&self, network: &str, module: &str) -> PathBuf {
        self.dir.join(network).join(format!("{}.json", module))
    }

    /// Write (or replace) the record for a deployment
    pub fn record(&self, deployed: &DeployedContract) -> Result<PathBuf> {
        let path = self.record_path(&deployed.network.name, &deployed.module);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create deployment directory: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(&DeploymentRecord::from(deployed))
            .wrap_err("Failed to serialize deployment record")?;

        fs::write(&path, content)
            .wrap_err_with(|| format!("Failed to write deployment record: {:?}", path))?;

        tracing::info!("Recorded deployment of {} in {:?}", deployed.module, path);
        Ok(path)
    }

    /// Load the record for `module` on `network`, if it was deployed there
    pub fn load(&self, network: &str, module: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(network, module);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read {:?}", path))?;
        let record = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse {:?}", path))?;

        Ok(Some(record))
    }

    /// Every journaled deployment, skipping unreadable records
    pub fn scan(&self) -> Result<Vec<DeploymentRecord>> {
        let mut records: Vec<DeploymentRecord> = Vec::new();

        if !self.dir.exists() {
            tracing::info!("Deployment directory does not exist: {:?}", self.dir);
            return Ok(records);
        }

        let networks = fs::read_dir(&self.dir)
            .wrap_err_with(|| format!("Failed to read {:?}", self.dir))?;

        for network_dir in networks.flatten().map(|e| e.path()).filter(|p| p.is_dir()) {
            let entries = fs::read_dir(&network_dir)
                .wrap_err_with(|| format!("Failed to read {:?}", network_dir))?;

            for path in entries.flatten().map(|e| e.path()) {
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }

                let parsed: Result<DeploymentRecord> = fs::read_to_string(&path)
                    .map_err(eyre::Report::from)
                    .and_then(|c| serde_json::from_str(&c).map_err(eyre::Report::from));

                match parsed {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!("Failed to parse {:?}: {}", path, e),
                }
            }
        }

        records.sort_by(|a, b| (&a.network, &a.module).cmp(&(&b.network, &b.module)));
        tracing::info!("Found {} deployments", records.len());
        Ok(records)
    }
}
