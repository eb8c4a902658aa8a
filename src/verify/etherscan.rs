//! Etherscan-compatible contract verification API, as also served by
//! Blockscout and most custom explorers.

use alloy::primitives::Address;
use serde::Deserialize;
use serde_json::Value;

use crate::contracts::{DeployedContract, SourceMetadata};
use crate::error::DeployError;
use crate::network::ExplorerEndpoint;

/// Everything submitted to the explorer for one contract
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub address: Address,
    pub chain_id: u64,
    pub source: SourceMetadata,
    /// Hex without `0x`, as the API expects
    pub constructor_args: String,
    pub endpoint: ExplorerEndpoint,
}

impl VerificationRequest {
    pub fn new(deployed: &DeployedContract, source: &SourceMetadata, endpoint: ExplorerEndpoint) -> Self {
        Self {
            address: deployed.address,
            chain_id: deployed.network.chain_id,
            source: source.clone(),
            constructor_args: hex::encode(&deployed.constructor_args),
            endpoint,
        }
    }

    /// Form body of the `verifysourcecode` call
    pub fn form_fields(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", api_key.to_string()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", self.address.to_string()),
            ("sourceCode", self.source.standard_json_input.to_string()),
            ("codeformat", "solidity-standard-json-input".to_string()),
            ("contractname", self.source.contract_name.clone()),
            ("compilerversion", self.source.compiler_version.clone()),
            // Misspelled in the API itself
            ("constructorArguements", self.constructor_args.clone()),
        ]
    }
}

/// Query of the `checkverifystatus` call
pub fn status_query(api_key: &str, guid: &str) -> Vec<(&'static str, String)> {
    vec![
        ("apikey", api_key.to_string()),
        ("module", "contract".to_string()),
        ("action", "checkverifystatus".to_string()),
        ("guid", guid.to_string()),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct EtherscanResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub result: Value,
}

impl EtherscanResponse {
    fn ok(&self) -> bool {
        self.status == "1"
    }

    fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            Value::Null => self.message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { guid: String },
    AlreadyVerified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Pending,
    Verified,
    AlreadyVerified,
}

fn is_already_verified(text: &str) -> bool {
    text.to_lowercase().contains("already verified")
}

pub fn interpret_submission(response: &EtherscanResponse) -> Result<SubmitOutcome, DeployError> {
    let text = response.result_text();

    if response.ok() {
        return Ok(SubmitOutcome::Submitted { guid: text });
    }
    if is_already_verified(&text) {
        return Ok(SubmitOutcome::AlreadyVerified);
    }

    Err(DeployError::VerificationRejected(text))
}

pub fn interpret_status(response: &EtherscanResponse) -> Result<StatusOutcome, DeployError> {
    let text = response.result_text();

    if is_already_verified(&text) {
        return Ok(StatusOutcome::AlreadyVerified);
    }
    if text.to_lowercase().contains("pending") {
        return Ok(StatusOutcome::Pending);
    }
    if response.ok() {
        return Ok(StatusOutcome::Verified);
    }

    Err(DeployError::VerificationRejected(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::deployment_fixtures::sample_deployed;
    use crate::network::EndpointSource;

    fn response(json: &str) -> EtherscanResponse {
        serde_json::from_str(json).unwrap()
    }

    fn request() -> VerificationRequest {
        let source = SourceMetadata {
            contract_name: "contracts/AIstronaut.sol:AIstronaut".to_string(),
            compiler_version: "v0.8.20+commit.a1b79de6".to_string(),
            standard_json_input: serde_json::json!({ "language": "Solidity" }),
        };
        let endpoint = ExplorerEndpoint {
            api_url: "https://explorer.sepolia.mantle.xyz:443/api".to_string(),
            browser_url: "https://explorer.sepolia.mantle.xyz".to_string(),
            source: EndpointSource::Custom,
        };
        VerificationRequest::new(&sample_deployed(), &source, endpoint)
    }

    #[test]
    fn test_form_fields() {
        let fields = request().form_fields("KEY");
        let get = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("apikey"), "KEY");
        assert_eq!(get("action"), "verifysourcecode");
        assert_eq!(get("contractname"), "contracts/AIstronaut.sol:AIstronaut");
        assert_eq!(get("constructorArguements"), "00".repeat(32));
        assert_eq!(get("sourceCode"), r#"{"language":"Solidity"}"#);
    }

    #[test]
    fn test_interpret_submission() {
        let ok = response(r#"{"status":"1","message":"OK","result":"ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn"}"#);
        assert_eq!(
            interpret_submission(&ok).unwrap(),
            SubmitOutcome::Submitted {
                guid: "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn".to_string()
            }
        );

        let already = response(r#"{"status":"0","message":"NOTOK","result":"Contract source code already verified"}"#);
        assert_eq!(interpret_submission(&already).unwrap(), SubmitOutcome::AlreadyVerified);

        let rejected = response(r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#);
        assert!(matches!(
            interpret_submission(&rejected),
            Err(DeployError::VerificationRejected(msg)) if msg == "Invalid API Key"
        ));
    }

    #[test]
    fn test_interpret_status() {
        let pending = response(r#"{"status":"0","message":"NOTOK","result":"Pending in queue"}"#);
        assert_eq!(interpret_status(&pending).unwrap(), StatusOutcome::Pending);

        let pass = response(r#"{"status":"1","message":"OK","result":"Pass - Verified"}"#);
        assert_eq!(interpret_status(&pass).unwrap(), StatusOutcome::Verified);

        let mismatch = response(
            r#"{"status":"0","message":"NOTOK","result":"Fail - Unable to verify. Compiled contract deployment bytecode does NOT match the transaction deployment bytecode."}"#,
        );
        assert!(matches!(
            interpret_status(&mismatch),
            Err(DeployError::VerificationRejected(_))
        ));
    }

    #[test]
    fn test_null_result_falls_back_to_message() {
        let blockscout = response(r#"{"status":"0","message":"Smart-contract already verified.","result":null}"#);
        assert_eq!(
            interpret_submission(&blockscout).unwrap(),
            SubmitOutcome::AlreadyVerified
        );
    }
}
