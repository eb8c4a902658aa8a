use std::collections::HashMap;
use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};

use super::{Project, ProjectType};

/// The parts of foundry.toml that locate build output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoundryConfig {
    #[serde(default)]
    pub profile: HashMap<String, ProfileConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub out: Option<String>,
}

impl FoundryConfig {
    pub fn default_profile(&self) -> Option<&ProfileConfig> {
        self.profile.get("default")
    }

    pub fn out_dir(&self) -> &str {
        self.default_profile()
            .and_then(|p| p.out.as_deref())
            .unwrap_or("out")
    }
}

/// Load a Foundry project from the given path
pub fn load_project(path: &Path) -> Result<Project> {
    let config_path = path.join("foundry.toml");

    if !config_path.exists() {
        return Err(eyre!("foundry.toml not found at {:?}", path));
    }

    let config_content = fs::read_to_string(&config_path)
        .wrap_err_with(|| format!("Failed to read {:?}", config_path))?;

    let config: FoundryConfig =
        toml::from_str(&config_content).wrap_err("Failed to parse foundry.toml")?;

    Ok(Project::with_layout(
        ProjectType::Foundry,
        path,
        config.out_dir(),
    ))
}
