use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
};

use super::artifact::ArtifactStore;
use super::deployment::DeployedContract;
use super::encode::{deploy_code, encode_constructor_args};
use crate::config::Credential;
use crate::error::DeployError;
use crate::modules::ResolvedPlan;
use crate::network::NetworkDescriptor;

/// Broadcasts deployment transactions and waits for them to be mined
pub struct Executor {
    artifacts: ArtifactStore,
    confirmations: u64,
}

impl Executor {
    pub fn new(artifacts: ArtifactStore) -> Self {
        Self {
            artifacts,
            confirmations: 1,
        }
    }

    /// Deploy `plan` to `network`, signing with `credential`.
    ///
    /// Sends exactly one transaction and waits for it without a timeout of
    /// its own; only the transport can end the wait early. A failed
    /// broadcast is returned as is, never retried.
    pub async fn deploy(
        &self,
        plan: &ResolvedPlan,
        network: &NetworkDescriptor,
        credential: &Credential,
    ) -> Result<DeployedContract, DeployError> {
        if credential.is_placeholder() {
            tracing::warn!(
                network = %network.name,
                "Deploying with the placeholder credential; the transaction cannot be signed"
            );
        }
        let signer = credential.signer(network.chain_id)?;
        let deployer = signer.address();

        let artifact = self.artifacts.load(&plan.contract)?;
        tracing::debug!("Loaded artifact {:?}", artifact.path);
        let constructor_args = encode_constructor_args(&artifact, &plan.constructor_args)?;
        let code = deploy_code(&artifact, &constructor_args);

        tracing::info!(
            module = %plan.module,
            network = %network.name,
            chain_id = network.chain_id,
            "Deploying contracts with the account: {}",
            deployer
        );

        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(network.rpc_url.as_str())
            .await
            .map_err(|e| DeployError::Broadcast(format!("failed to connect to RPC: {}", e)))?;

        let mut tx = TransactionRequest::default().with_deploy_code(code);
        if let Some(gas_price) = network.gas_price_wei {
            tx = tx.with_gas_price(gas_price);
        }

        let pending_tx = provider
            .send_transaction(tx)
            .await
            .map_err(|e| DeployError::Broadcast(e.to_string()))?;

        let tx_hash = *pending_tx.tx_hash();
        tracing::info!(tx_hash = %tx_hash, "Deployment transaction sent, waiting for confirmation");

        let receipt = pending_tx
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| DeployError::ConfirmationTimeout(e.to_string()))?;

        if !receipt.status() {
            return Err(DeployError::Reverted { tx_hash });
        }

        let address = receipt.contract_address.ok_or_else(|| {
            DeployError::ConfirmationTimeout(format!("receipt for {} has no contract address", tx_hash))
        })?;

        tracing::info!(
            block = ?receipt.block_number,
            "Contract {} deployed to: {}",
            plan.contract,
            address
        );

        Ok(DeployedContract {
            module: plan.module.clone(),
            contract: plan.contract.clone(),
            address,
            network: network.clone(),
            tx_hash,
            deployer,
            block_number: receipt.block_number,
            constructor_args,
        })
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::config::CredentialSource;
    use crate::contracts::artifact::tests::write_hardhat_artifact;
    use crate::modules::{ModuleCatalog, Overrides};

    // Nothing listens here, so any test that reaches the network fails loudly
    fn unreachable_network() -> NetworkDescriptor {
        NetworkDescriptor {
            name: "liskSepolia".to_string(),
            rpc_url: Url::parse("http://127.0.0.1:1").unwrap(),
            chain_id: 4202,
            gas_price_wei: Some(20_000_000_000),
            credential: CredentialSource::default(),
        }
    }

    fn plan() -> ResolvedPlan {
        ModuleCatalog::builtin()
            .module("AIstronaut")
            .unwrap()
            .build(&Overrides::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_placeholder_credential_fails_with_broadcast_error() {
        let dir = tempfile::tempdir().unwrap();
        write_hardhat_artifact(dir.path());
        let executor = Executor::new(ArtifactStore::from_dir(dir.path()));

        let err = executor
            .deploy(&plan(), &unreachable_network(), &Credential::Placeholder)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Broadcast(_)));
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_before_rpc() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::new(ArtifactStore::from_dir(dir.path()));
        let credential = Credential::Key(zeroize::Zeroizing::new(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        ));

        let err = executor
            .deploy(&plan(), &unreachable_network(), &credential)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Artifact { .. }));
        assert!(err.is_local());
    }

    #[tokio::test]
    async fn test_unreachable_rpc_is_broadcast_error() {
        let dir = tempfile::tempdir().unwrap();
        write_hardhat_artifact(dir.path());
        let executor = Executor::new(ArtifactStore::from_dir(dir.path()));
        let credential = Credential::Key(zeroize::Zeroizing::new(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        ));

        let err = executor
            .deploy(&plan(), &unreachable_network(), &credential)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Broadcast(_)));
    }
}
