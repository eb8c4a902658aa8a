mod detector;
mod foundry;
mod hardhat;

pub use detector::detect;

use std::path::{Path, PathBuf};

use eyre::Result;
use serde::{Deserialize, Serialize};

/// Deployment modules live here, relative to the project root
const MODULES_DIR: &str = "ignition/modules";
/// Confirmed deployments are journaled here, relative to the project root
const DEPLOYMENTS_DIR: &str = "deployments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    Foundry,
    Hardhat,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Foundry => write!(f, "Foundry"),
            ProjectType::Hardhat => write!(f, "Hardhat"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    pub project_type: ProjectType,
    pub root: PathBuf,
    pub name: String,
    /// Compiled artifacts (`artifacts/` for Hardhat, `out/` for Foundry)
    pub out_dir: PathBuf,
    pub modules_dir: PathBuf,
    pub deployments_dir: PathBuf,
}

impl Project {
    pub fn new_foundry(path: &Path) -> Result<Self> {
        foundry::load_project(path)
    }

    pub fn new_hardhat(path: &Path) -> Result<Self> {
        hardhat::load_project(path)
    }

    fn with_layout(project_type: ProjectType, root: &Path, out: &str) -> Self {
        // Extract project name from directory name
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self {
            project_type,
            root: root.to_path_buf(),
            name,
            out_dir: root.join(out),
            modules_dir: root.join(MODULES_DIR),
            deployments_dir: root.join(DEPLOYMENTS_DIR),
        }
    }
}
