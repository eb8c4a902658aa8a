use std::fs;
use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::error::DeployError;
use crate::project::Project;

/// A compiled contract ready to deploy
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    /// Source file the contract was compiled from, e.g. `contracts/AIstronaut.sol`
    pub source_name: Option<String>,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
    pub path: PathBuf,
}

/// What an explorer needs to reproduce the compilation
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetadata {
    /// Fully qualified name, `contracts/AIstronaut.sol:AIstronaut`
    pub contract_name: String,
    /// `v0.8.20+commit.a1b79de6`
    pub compiler_version: String,
    /// Solidity standard JSON input
    pub standard_json_input: Value,
}

/// Hardhat and Foundry artifact JSON
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    source_name: Option<String>,
    abi: JsonAbi,
    bytecode: RawBytecode,
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat
    Hex(String),
    /// Foundry
    Object { object: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    solc_long_version: String,
    input: Value,
}

/// Locates compiled artifacts in a project's build output
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    out_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(project: &Project) -> Self {
        Self::from_dir(&project.out_dir)
    }

    pub fn from_dir(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
        }
    }

    /// Load the artifact for `contract` (`Name` or `path/File.sol:Name`)
    pub fn load(&self, contract: &str) -> Result<Artifact, DeployError> {
        let path = self.find(contract)?;
        let err = |reason: String| DeployError::Artifact {
            contract: contract.to_string(),
            reason,
        };

        let content = fs::read_to_string(&path)
            .map_err(|e| err(format!("failed to read {:?}: {}", path, e)))?;
        let raw: RawArtifact = serde_json::from_str(&content)
            .map_err(|e| err(format!("failed to parse {:?}: {}", path, e)))?;

        let hex_code = match &raw.bytecode {
            RawBytecode::Hex(code) => code.as_str(),
            RawBytecode::Object { object } => object.as_str(),
        };
        let code = hex_code.strip_prefix("0x").unwrap_or(hex_code);
        if code.is_empty() {
            return Err(err("artifact has no bytecode (abstract contract or interface?)".into()));
        }
        // Unlinked library placeholders are not valid hex
        let bytecode = hex::decode(code)
            .map_err(|e| err(format!("bytecode is not valid hex (unlinked libraries?): {}", e)))?;

        let (_, name) = split_contract_ref(contract);
        let source_name = raw
            .source_name
            .clone()
            .or_else(|| compilation_target(raw.metadata.as_ref()));

        Ok(Artifact {
            contract_name: raw.contract_name.unwrap_or_else(|| name.to_string()),
            source_name,
            abi: raw.abi,
            bytecode: Bytes::from(bytecode),
            path,
        })
    }

    /// Source metadata for verification, from the build-info the artifact was compiled in
    pub fn source_metadata(&self, contract: &str) -> Result<SourceMetadata, DeployError> {
        let artifact = self.load(contract)?;
        let err = |reason: String| DeployError::Artifact {
            contract: contract.to_string(),
            reason,
        };

        let source_name = artifact
            .source_name
            .clone()
            .ok_or_else(|| err("artifact does not name its source file".into()))?;

        let build_info = self
            .build_info_for(&artifact, &source_name)
            .ok_or_else(|| err("no build-info found; recompile with build info enabled".into()))?;

        Ok(SourceMetadata {
            contract_name: format!("{}:{}", source_name, artifact.contract_name),
            compiler_version: format!("v{}", build_info.solc_long_version),
            standard_json_input: build_info.input,
        })
    }

    fn find(&self, contract: &str) -> Result<PathBuf, DeployError> {
        let (source, name) = split_contract_ref(contract);
        let file_name = format!("{}.json", name);

        let mut candidates = Vec::new();
        if let Some(source) = source {
            // Hardhat keeps the full source path, Foundry only the file name
            candidates.push(self.out_dir.join(source).join(&file_name));
            if let Some(base) = Path::new(source).file_name() {
                candidates.push(self.out_dir.join(base).join(&file_name));
            }
        } else {
            candidates.push(
                self.out_dir
                    .join("contracts")
                    .join(format!("{}.sol", name))
                    .join(&file_name),
            );
            candidates.push(self.out_dir.join(format!("{}.sol", name)).join(&file_name));
        }

        if let Some(path) = candidates.into_iter().find(|p| p.exists()) {
            return Ok(path);
        }

        if source.is_none() {
            let mut found = Vec::new();
            search_dir(&self.out_dir, &file_name, &mut found);
            match found.len() {
                1 => return Ok(found.remove(0)),
                n if n > 1 => {
                    return Err(DeployError::Artifact {
                        contract: contract.to_string(),
                        reason: format!(
                            "{} artifacts named {}; use a fully qualified name (path/File.sol:{})",
                            n, name, name
                        ),
                    });
                }
                _ => {}
            }
        }

        Err(DeployError::Artifact {
            contract: contract.to_string(),
            reason: format!("no artifact found under {:?}; is the project compiled?", self.out_dir),
        })
    }

    fn build_info_for(&self, artifact: &Artifact, source_name: &str) -> Option<BuildInfo> {
        // Hardhat writes <Name>.dbg.json next to the artifact pointing at its build-info
        let dbg_path = artifact
            .path
            .with_file_name(format!("{}.dbg.json", artifact.contract_name));
        if let Some(info) = read_debug_build_info(&dbg_path) {
            return Some(info);
        }

        let build_info_dir = self.out_dir.join("build-info");
        let entries = fs::read_dir(&build_info_dir).ok()?;

        entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| {
                let content = fs::read_to_string(&p).ok()?;
                serde_json::from_str::<BuildInfo>(&content).ok()
            })
            .find(|info| {
                info.input
                    .get("sources")
                    .and_then(|s| s.get(source_name))
                    .is_some()
            })
    }
}

fn read_debug_build_info(dbg_path: &Path) -> Option<BuildInfo> {
    let content = fs::read_to_string(dbg_path).ok()?;
    let dbg: DebugFile = serde_json::from_str(&content).ok()?;
    let path = dbg_path.parent()?.join(dbg.build_info);

    let content = fs::read_to_string(&path)
        .map_err(|e| tracing::warn!("Failed to read build info {:?}: {}", path, e))
        .ok()?;
    serde_json::from_str(&content)
        .map_err(|e| tracing::warn!("Failed to parse build info {:?}: {}", path, e))
        .ok()
}

/// `contracts/A.sol:A` -> (Some("contracts/A.sol"), "A"); `A` -> (None, "A")
fn split_contract_ref(contract: &str) -> (Option<&str>, &str) {
    match contract.rsplit_once(':') {
        Some((source, name)) => (Some(source), name),
        None => (None, contract),
    }
}

/// Foundry artifacts carry the source path in `metadata.settings.compilationTarget`
fn compilation_target(metadata: Option<&Value>) -> Option<String> {
    metadata?
        .get("settings")?
        .get("compilationTarget")?
        .as_object()?
        .keys()
        .next()
        .cloned()
}

fn search_dir(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == "build-info") {
                continue;
            }
            search_dir(&path, file_name, found);
        } else if path.file_name().is_some_and(|n| n == file_name) {
            found.push(path);
        }
    }
}
