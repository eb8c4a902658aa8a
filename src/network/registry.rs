use std::collections::BTreeMap;

use eyre::{Result, WrapErr, eyre};
use url::Url;

use super::explorer::{CustomChain, ExplorerEndpoint, builtin_custom_chains, builtin_endpoint};
use crate::config::{CredentialSource, RuntimeConfig};
use crate::error::DeployError;

/// Connection descriptor for one network.
///
/// `chain_id` is not checked against the remote chain here; a mismatch
/// surfaces when broadcasting or verifying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub name: String,
    pub rpc_url: Url,
    pub chain_id: u64,
    pub gas_price_wei: Option<u128>,
    pub credential: CredentialSource,
}

struct BuiltinNetwork {
    name: &'static str,
    rpc_url: &'static str,
    chain_id: u64,
    gas_price_wei: Option<u128>,
}

const BUILTIN_NETWORKS: &[BuiltinNetwork] = &[
    BuiltinNetwork {
        name: "hardhat",
        rpc_url: "http://127.0.0.1:8545",
        chain_id: 31337,
        gas_price_wei: None,
    },
    BuiltinNetwork {
        name: "localhost",
        rpc_url: "http://127.0.0.1:8545",
        chain_id: 31337,
        gas_price_wei: None,
    },
    BuiltinNetwork {
        name: "sepolia",
        rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
        chain_id: 11155111,
        gas_price_wei: None,
    },
    BuiltinNetwork {
        name: "liskSepolia",
        rpc_url: "https://rpc.sepolia-api.lisk.com",
        chain_id: 4202,
        gas_price_wei: Some(20_000_000_000),
    },
    BuiltinNetwork {
        name: "mantle",
        rpc_url: "https://rpc.sepolia.mantle.xyz",
        chain_id: 5003,
        gas_price_wei: None,
    },
];

/// All networks known to this process. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, NetworkDescriptor>,
    custom_chains: Vec<CustomChain>,
}

impl NetworkRegistry {
    /// Build the registry: built-in entries, then `[networks.*]` from the
    /// config file, then `<NETWORK>_RPC_URL` overrides.
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let settings = &config.settings;
        let mut networks = BTreeMap::new();

        for builtin in BUILTIN_NETWORKS {
            let rpc_url = Url::parse(builtin.rpc_url)
                .wrap_err_with(|| format!("Invalid built-in RPC URL for {}", builtin.name))?;

            networks.insert(
                builtin.name.to_string(),
                NetworkDescriptor {
                    name: builtin.name.to_string(),
                    rpc_url,
                    chain_id: builtin.chain_id,
                    gas_price_wei: builtin.gas_price_wei,
                    credential: CredentialSource::for_network(settings, builtin.name),
                },
            );
        }

        let mut configured: Vec<_> = settings.networks.iter().collect();
        configured.sort_by(|a, b| a.0.cmp(b.0));

        for (name, entry) in configured {
            let rpc_url = entry
                .rpc_url
                .as_deref()
                .map(|u| Url::parse(u).wrap_err_with(|| format!("Invalid RPC URL for network '{}'", name)))
                .transpose()?;

            match networks.get_mut(name) {
                Some(existing) => {
                    if let Some(url) = rpc_url {
                        existing.rpc_url = url;
                    }
                    if let Some(chain_id) = entry.chain_id {
                        existing.chain_id = chain_id;
                    }
                    if let Some(gas_price) = entry.gas_price {
                        existing.gas_price_wei = Some(u128::from(gas_price));
                    }
                }
                None => {
                    let (rpc_url, chain_id) = rpc_url.zip(entry.chain_id).ok_or_else(|| {
                        eyre!("Network '{}' needs both rpc_url and chain_id", name)
                    })?;

                    networks.insert(
                        name.clone(),
                        NetworkDescriptor {
                            name: name.clone(),
                            rpc_url,
                            chain_id,
                            gas_price_wei: entry.gas_price.map(u128::from),
                            credential: CredentialSource::for_network(settings, name),
                        },
                    );
                }
            }
        }

        for descriptor in networks.values_mut() {
            if let Some(url) = config.rpc_override(&descriptor.name) {
                descriptor.rpc_url = Url::parse(url).wrap_err_with(|| {
                    format!("Invalid RPC override for network '{}'", descriptor.name)
                })?;
                tracing::debug!("Using RPC override for {}", descriptor.name);
            }

            if descriptor.chain_id == 0 {
                return Err(eyre!("Network '{}' has chain id 0", descriptor.name));
            }
        }

        let mut custom_chains = builtin_custom_chains();
        for chain in &settings.custom_chains {
            Url::parse(&chain.urls.api_url).wrap_err_with(|| {
                format!("Invalid explorer API URL for custom chain {}", chain.chain_id)
            })?;
            custom_chains.retain(|c| c.chain_id != chain.chain_id);
            custom_chains.push(chain.clone());
        }

        Ok(Self {
            networks,
            custom_chains,
        })
    }

    /// Look up a network by name
    pub fn resolve(&self, name: &str) -> Result<&NetworkDescriptor, DeployError> {
        self.networks
            .get(name)
            .ok_or_else(|| DeployError::UnknownNetwork(name.to_string()))
    }

    /// Explorer endpoint for `chain_id`: custom chains first, then the built-in table
    pub fn resolve_explorer_endpoint(&self, chain_id: u64) -> Option<ExplorerEndpoint> {
        self.custom_chains
            .iter()
            .find(|c| c.chain_id == chain_id)
            .map(ExplorerEndpoint::from_custom)
            .or_else(|| builtin_endpoint(chain_id))
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkDescriptor> {
        self.networks.values()
    }
}
