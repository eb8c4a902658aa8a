use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::network::CustomChain;

const CONFIG_DIR: &str = "liftoff";
const CONFIG_FILE: &str = "config.toml";
const PROJECT_CONFIG_FILE: &str = "liftoff.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    #[serde(default)]
    pub custom_chains: Vec<CustomChain>,

    #[serde(default)]
    pub wallets: HashMap<String, WalletConfig>,

    #[serde(default)]
    pub api_keys: HashMap<String, String>,

    #[serde(default)]
    pub defaults: Option<Defaults>,

    #[serde(default)]
    pub verify: VerifySettings,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

/// Network entry. For a built-in network every field is optional and only
/// replaces what it names; a new network needs `rpc_url` and `chain_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
    /// Fixed gas price in wei. TOML integers are 64-bit, which covers any
    /// realistic gas price.
    pub gas_price: Option<u64>,
    /// Name of a `[wallets.*]` entry used to sign on this network
    pub wallet: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Reference to keychain entry (e.g., "deployer_key")
    pub keychain: Option<String>,
    /// Environment variable containing private key
    pub env_var: Option<String>,
    /// Optional label for display
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    pub network: Option<String>,
    pub wallet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifySettings {
    /// How many times a submitted verification is checked before reporting it as pending
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_poll_attempts() -> u32 {
    5
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            poll_attempts: default_poll_attempts(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Locate and load configuration.
    ///
    /// An explicit path must exist. Otherwise `liftoff.toml` in the project
    /// root is preferred over the per-user config file; when neither exists
    /// the built-in defaults are used.
    pub fn discover(project_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let project_config = project_root.join(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            return Self::load_from(&project_config);
        }

        Self::load()
    }

    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {:?}", path))?;

        let mut config = Self::parse(&content)
            .wrap_err_with(|| format!("Failed to parse config file: {:?}", path))?;

        config.config_path = Some(path.to_path_buf());
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).wrap_err("Invalid configuration")
    }

    /// Get the config file path, if the configuration came from a file
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get the default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre::eyre!("Could not determine config directory"))?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Network to use when none is given on the command line
    pub fn default_network(&self) -> Option<&str> {
        self.defaults.as_ref()?.network.as_deref()
    }

    /// Wallet that signs for `network`: the network's own wallet, else the default wallet
    pub fn wallet_for(&self, network: &str) -> Option<(&String, &WalletConfig)> {
        let name = self
            .networks
            .get(network)
            .and_then(|n| n.wallet.as_deref())
            .or_else(|| self.defaults.as_ref()?.wallet.as_deref())?;

        self.wallets.get_key_value(name)
    }

    /// Resolve an API key value (handling keychain references)
    pub fn resolve_api_key(&self, name: &str) -> Result<Option<String>> {
        let value = match self.api_keys.get(name) {
            Some(v) => v,
            None => return Ok(None),
        };

        if let Some(keychain_ref) = value.strip_prefix("keychain:") {
            use super::KeychainManager;
            let km = KeychainManager::new();
            km.get(keychain_ref)
        } else {
            Ok(Some(value.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let content = r#"
[networks.mantle]
rpc_url = "https://rpc.sepolia.mantle.xyz"
chain_id = 5003
wallet = "deployer"

[networks.devnet]
rpc_url = "http://10.0.0.5:8545"
chain_id = 1337
gas_price = 1000000000

[[custom_chains]]
network = "devnet"
chain_id = 1337
urls = { api_url = "http://10.0.0.5:4000/api", browser_url = "http://10.0.0.5:4000" }

[wallets.deployer]
env_var = "MANTLE_KEY"

[defaults]
network = "mantle"

[api_keys]
etherscan = "keychain:etherscan_api"

[verify]
poll_attempts = 2
"#;

        let config = AppConfig::parse(content).unwrap();
        assert_eq!(config.networks.len(), 2);
        assert_eq!(config.networks["devnet"].gas_price, Some(1_000_000_000));
        assert_eq!(config.custom_chains.len(), 1);
        assert_eq!(config.custom_chains[0].chain_id, 1337);
        assert_eq!(config.default_network(), Some("mantle"));
        assert_eq!(config.verify.poll_attempts, 2);
        assert_eq!(config.verify.poll_interval_secs, 3);
    }

    #[test]
    fn test_wallet_for_prefers_network_wallet() {
        let content = r#"
[networks.mantle]
wallet = "mantle_wallet"

[wallets.mantle_wallet]
env_var = "MANTLE_KEY"

[wallets.main]
keychain = "main_key"

[defaults]
wallet = "main"
"#;
        let config = AppConfig::parse(content).unwrap();

        let (name, _) = config.wallet_for("mantle").unwrap();
        assert_eq!(name, "mantle_wallet");

        let (name, wallet) = config.wallet_for("sepolia").unwrap();
        assert_eq!(name, "main");
        assert_eq!(wallet.keychain.as_deref(), Some("main_key"));
    }

    #[test]
    fn test_discover_prefers_project_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[defaults]\nnetwork = \"liskSepolia\"\n",
        )
        .unwrap();

        let config = AppConfig::discover(dir.path(), None).unwrap();
        assert_eq!(config.default_network(), Some("liskSepolia"));
        assert_eq!(
            config.config_path(),
            Some(dir.path().join(PROJECT_CONFIG_FILE).as_path())
        );
    }

    #[test]
    fn test_discover_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AppConfig::discover(dir.path(), Some(&missing)).is_err());
    }
}
