use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Explorer endpoint for a chain the verification service does not know by
/// itself. Looked up by chain id before the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomChain {
    pub network: String,
    #[serde(alias = "chainId")]
    pub chain_id: u64,
    pub urls: ExplorerUrls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerUrls {
    #[serde(alias = "apiURL")]
    pub api_url: String,
    #[serde(alias = "browserURL")]
    pub browser_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Custom,
    BuiltIn,
}

/// Resolved verification endpoint for one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerEndpoint {
    pub api_url: String,
    pub browser_url: String,
    pub source: EndpointSource,
}

impl ExplorerEndpoint {
    pub fn from_custom(chain: &CustomChain) -> Self {
        Self {
            api_url: chain.urls.api_url.clone(),
            browser_url: chain.urls.browser_url.clone(),
            source: EndpointSource::Custom,
        }
    }

    /// Browser link to the verified source of `address`
    pub fn code_url(&self, address: Address) -> String {
        format!(
            "{}/address/{}#code",
            self.browser_url.trim_end_matches('/'),
            address
        )
    }
}

/// Etherscan-family explorers known without configuration: (chain id, api, browser)
const BUILTIN_EXPLORERS: &[(u64, &str, &str)] = &[
    (1, "https://api.etherscan.io/api", "https://etherscan.io"),
    (11155111, "https://api-sepolia.etherscan.io/api", "https://sepolia.etherscan.io"),
    (17000, "https://api-holesky.etherscan.io/api", "https://holesky.etherscan.io"),
    (10, "https://api-optimistic.etherscan.io/api", "https://optimistic.etherscan.io"),
    (42161, "https://api.arbiscan.io/api", "https://arbiscan.io"),
    (137, "https://api.polygonscan.com/api", "https://polygonscan.com"),
    (8453, "https://api.basescan.org/api", "https://basescan.org"),
];

/// Chains whose explorers need an explicit endpoint
pub(crate) fn builtin_custom_chains() -> Vec<CustomChain> {
    vec![
        CustomChain {
            network: "mantle".to_string(),
            chain_id: 5003,
            urls: ExplorerUrls {
                api_url: "https://explorer.sepolia.mantle.xyz:443/api".to_string(),
                browser_url: "https://explorer.sepolia.mantle.xyz".to_string(),
            },
        },
        CustomChain {
            network: "liskSepolia".to_string(),
            chain_id: 4202,
            urls: ExplorerUrls {
                api_url: "https://sepolia-blockscout.lisk.com/api".to_string(),
                browser_url: "https://sepolia-blockscout.lisk.com".to_string(),
            },
        },
    ]
}

pub fn builtin_endpoint(chain_id: u64) -> Option<ExplorerEndpoint> {
    BUILTIN_EXPLORERS
        .iter()
        .find(|(id, _, _)| *id == chain_id)
        .map(|(_, api, browser)| ExplorerEndpoint {
            api_url: api.to_string(),
            browser_url: browser.to_string(),
            source: EndpointSource::BuiltIn,
        })
}
