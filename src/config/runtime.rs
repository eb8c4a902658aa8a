use super::credentials::{CredentialResolver, Environment};
use super::AppConfig;

/// Environment variable holding the explorer API key
pub const EXPLORER_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Immutable process-wide configuration, built once at startup and passed
/// by reference to everything that needs it.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub settings: AppConfig,
    pub env: Environment,
}

impl RuntimeConfig {
    pub fn new(settings: AppConfig, env: Environment) -> Self {
        Self { settings, env }
    }

    pub fn credentials(&self) -> CredentialResolver<'_> {
        CredentialResolver::new(&self.env)
    }

    /// Explorer API key; empty when nothing is configured
    pub fn explorer_api_key(&self) -> String {
        if let Some(key) = self.env.get(EXPLORER_API_KEY_ENV) {
            return key.to_string();
        }

        match self.settings.resolve_api_key("etherscan") {
            Ok(Some(key)) => key,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!("Failed to resolve explorer API key: {}", e);
                String::new()
            }
        }
    }

    /// RPC URL override for `network` from its `<NETWORK>_RPC_URL` variable
    pub fn rpc_override(&self, network: &str) -> Option<&str> {
        self.env.get(&rpc_override_var(network))
    }
}

/// `liskSepolia` -> `LISK_SEPOLIA_RPC_URL`
pub fn rpc_override_var(network: &str) -> String {
    let mut var = String::with_capacity(network.len() + 8);
    let mut prev_lower = false;

    for c in network.chars() {
        if c == '-' || c == '.' || c == ' ' {
            var.push('_');
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower {
            var.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        var.push(c.to_ascii_uppercase());
    }

    var.push_str("_RPC_URL");
    var
}
