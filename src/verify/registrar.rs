use std::time::Duration;

use eyre::{Result, WrapErr};

use super::etherscan::{
    EtherscanResponse, StatusOutcome, SubmitOutcome, VerificationRequest, interpret_status,
    interpret_submission, status_query,
};
use crate::config::{RuntimeConfig, VerifySettings};
use crate::contracts::{DeployedContract, SourceMetadata};
use crate::error::DeployError;
use crate::network::NetworkRegistry;

/// Outcome of a successful verification request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Verified { guid: String, url: String },
    AlreadyVerified { url: String },
    /// Accepted by the explorer but not finished within the polling window
    Pending { guid: String },
}

/// Submits deployed contracts to block-explorer verification
pub struct Registrar {
    registry: NetworkRegistry,
    client: reqwest::Client,
    api_key: String,
    settings: VerifySettings,
}

impl Registrar {
    pub fn new(registry: NetworkRegistry, config: &RuntimeConfig) -> Result<Self> {
        let settings = config.settings.verify.clone();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        let api_key = config.explorer_api_key();

        Ok(Self {
            registry,
            client,
            api_key,
            settings,
        })
    }

    /// Verify `deployed` against `source`.
    ///
    /// Failure leaves the deployment untouched; the same address can be
    /// submitted again later.
    pub async fn verify(
        &self,
        deployed: &DeployedContract,
        source: &SourceMetadata,
    ) -> Result<VerificationResult, DeployError> {
        let chain_id = deployed.network.chain_id;
        let endpoint = self
            .registry
            .resolve_explorer_endpoint(chain_id)
            .ok_or(DeployError::VerificationUnsupported(chain_id))?;

        let request = VerificationRequest::new(deployed, source, endpoint);
        let url = request.endpoint.code_url(request.address);

        tracing::info!(
            address = %request.address,
            chain_id = request.chain_id,
            api = %request.endpoint.api_url,
            source = ?request.endpoint.source,
            "Submitting {} for verification",
            request.source.contract_name
        );
        if self.api_key.is_empty() {
            tracing::warn!("No explorer API key configured, submitting with an empty key");
        }

        let response: EtherscanResponse = self
            .client
            .post(&request.endpoint.api_url)
            .form(&request.form_fields(&self.api_key))
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        let guid = match interpret_submission(&response)? {
            SubmitOutcome::AlreadyVerified => {
                tracing::info!("{} is already verified", deployed.address);
                return Ok(VerificationResult::AlreadyVerified { url });
            }
            SubmitOutcome::Submitted { guid } => guid,
        };

        tracing::info!(guid = %guid, "Verification submitted, checking status");

        for attempt in 1..=self.settings.poll_attempts {
            tokio::time::sleep(Duration::from_secs(self.settings.poll_interval_secs)).await;

            let response: EtherscanResponse = self
                .client
                .get(&request.endpoint.api_url)
                .query(&status_query(&self.api_key, &guid))
                .send()
                .await
                .map_err(transport)?
                .json()
                .await
                .map_err(transport)?;

            match interpret_status(&response)? {
                StatusOutcome::Verified => {
                    tracing::info!("Successfully verified {} at {}", deployed.address, url);
                    return Ok(VerificationResult::Verified { guid, url });
                }
                StatusOutcome::AlreadyVerified => {
                    return Ok(VerificationResult::AlreadyVerified { url });
                }
                StatusOutcome::Pending => {
                    tracing::debug!(attempt, "Verification still pending");
                }
            }
        }

        tracing::warn!(guid = %guid, "Verification still pending after {} checks", self.settings.poll_attempts);
        Ok(VerificationResult::Pending { guid })
    }
}

fn transport(e: reqwest::Error) -> DeployError {
    DeployError::VerificationTransport(e.to_string())
}
