use std::collections::HashMap;
use std::fmt;

use alloy::signers::{Signer, local::PrivateKeySigner};
use zeroize::Zeroizing;

use super::{AppConfig, KeychainManager};
use crate::error::DeployError;

/// Environment variable read when no wallet is configured for a network
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Where the signing key for a network comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Env(String),
    Keychain(String),
}

impl Default for CredentialSource {
    fn default() -> Self {
        CredentialSource::Env(PRIVATE_KEY_ENV.to_string())
    }
}

impl CredentialSource {
    /// Source for `network`: its configured wallet, else the default wallet, else `PRIVATE_KEY`
    pub fn for_network(config: &AppConfig, network: &str) -> Self {
        match config.wallet_for(network) {
            Some((name, wallet)) => {
                tracing::debug!(
                    network,
                    wallet = %name,
                    label = wallet.label.as_deref().unwrap_or("-"),
                    "Using configured wallet"
                );
                if let Some(entry) = &wallet.keychain {
                    CredentialSource::Keychain(entry.clone())
                } else if let Some(var) = &wallet.env_var {
                    CredentialSource::Env(var.clone())
                } else {
                    CredentialSource::default()
                }
            }
            None => CredentialSource::default(),
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Env(var) => write!(f, "env:{}", var),
            CredentialSource::Keychain(entry) => write!(f, "keychain:{}", entry),
        }
    }
}

/// A signing credential.
///
/// `Placeholder` stands for the well-known all-zero key used when nothing is
/// configured. Resolution never fails on it; signing with it does, so a
/// deployment attempted with the placeholder ends in a broadcast error.
#[derive(Clone)]
pub enum Credential {
    Key(Zeroizing<String>),
    Placeholder,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Key(_) => f.write_str("Credential::Key(<redacted>)"),
            Credential::Placeholder => f.write_str("Credential::Placeholder"),
        }
    }
}

impl Credential {
    /// Wrap a configured secret, mapping an empty or all-zero key to the placeholder
    pub fn from_secret(secret: Zeroizing<String>) -> Self {
        let trimmed = secret.trim();
        let clean = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if clean.is_empty() || clean.chars().all(|c| c == '0') {
            Credential::Placeholder
        } else {
            Credential::Key(secret)
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Credential::Placeholder)
    }

    /// Derive the transaction signer bound to `chain_id`
    pub fn signer(&self, chain_id: u64) -> Result<PrivateKeySigner, DeployError> {
        let key = match self {
            Credential::Key(key) => key,
            Credential::Placeholder => {
                return Err(DeployError::Broadcast(format!(
                    "placeholder credential cannot sign transactions (set {} or configure a wallet)",
                    PRIVATE_KEY_ENV
                )));
            }
        };

        let key_str = key.trim();
        let clean_key = key_str.strip_prefix("0x").unwrap_or(key_str);

        // The parse error is dropped so no key material reaches the message
        let signer: PrivateKeySigner = clean_key
            .parse()
            .map_err(|_| DeployError::Broadcast("configured private key is malformed".into()))?;

        Ok(signer.with_chain_id(Some(chain_id)))
    }
}

/// Snapshot of the process environment taken once at startup
#[derive(Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn capture() -> Self {
        std::env::vars().collect()
    }

    /// Look up a variable; empty values count as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("vars", &self.vars.len())
            .finish()
    }
}

/// Turns a [`CredentialSource`] into a [`Credential`]
pub struct CredentialResolver<'a> {
    env: &'a Environment,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    /// Resolve a credential: the configured source, then `PRIVATE_KEY`, then
    /// the placeholder
    pub fn resolve_credential(&self, source: &CredentialSource) -> Credential {
        let fallback = CredentialSource::default();

        let secret = self.read(source).or_else(|| {
            if *source == fallback {
                return None;
            }
            let secret = self.read(&fallback);
            if secret.is_some() {
                tracing::info!(source = %source, "Configured wallet is empty, using {}", PRIVATE_KEY_ENV);
            }
            secret
        });

        let credential = secret
            .map(Credential::from_secret)
            .unwrap_or(Credential::Placeholder);

        if credential.is_placeholder() {
            tracing::warn!(
                source = %source,
                "No signing key configured, using placeholder credential; broadcasts will fail"
            );
        }

        credential
    }

    fn read(&self, source: &CredentialSource) -> Option<Zeroizing<String>> {
        match source {
            CredentialSource::Env(var) => self.env.get(var).map(|v| Zeroizing::new(v.to_string())),
            CredentialSource::Keychain(entry) => match KeychainManager::new().get_zeroizing(entry) {
                Ok(secret) => secret,
                Err(e) => {
                    tracing::warn!("Keychain lookup for {} failed: {}", entry, e);
                    None
                }
            },
        }
    }
}
