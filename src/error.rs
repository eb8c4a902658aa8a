use alloy::primitives::TxHash;
use thiserror::Error;

/// Errors produced by the deployment pipeline.
///
/// Resolution errors (`UnknownNetwork`, `MissingParameter`, `Artifact`,
/// `ConstructorArgs`) are raised before any RPC call is made. Verification
/// errors never invalidate a confirmed deployment.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("unknown network '{0}'")]
    UnknownNetwork(String),

    #[error("unknown deployment module '{0}'")]
    UnknownModule(String),

    #[error("module '{module}' has no value for parameter '{parameter}'")]
    MissingParameter { module: String, parameter: String },

    #[error("artifact error for '{contract}': {reason}")]
    Artifact { contract: String, reason: String },

    #[error("invalid constructor arguments for '{contract}': {reason}")]
    ConstructorArgs { contract: String, reason: String },

    #[error("deployment transaction rejected: {0}")]
    Broadcast(String),

    #[error("failed while awaiting confirmation: {0}")]
    ConfirmationTimeout(String),

    #[error("deployment transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },

    #[error("no verification endpoint known for chain {0}")]
    VerificationUnsupported(u64),

    #[error("explorer rejected verification: {0}")]
    VerificationRejected(String),

    #[error("explorer request failed: {0}")]
    VerificationTransport(String),
}

impl DeployError {
    /// Errors from the verification step, reported separately from deployment outcome.
    pub fn is_verification(&self) -> bool {
        matches!(
            self,
            DeployError::VerificationUnsupported(_)
                | DeployError::VerificationRejected(_)
                | DeployError::VerificationTransport(_)
        )
    }

    /// Errors that are detected locally, before anything reaches the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            DeployError::UnknownNetwork(_)
                | DeployError::UnknownModule(_)
                | DeployError::MissingParameter { .. }
                | DeployError::Artifact { .. }
                | DeployError::ConstructorArgs { .. }
        )
    }
}
