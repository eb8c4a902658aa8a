use std::path::Path;

use eyre::{Result, eyre};

use super::{Project, ProjectType};

/// Load a Hardhat project from the given path.
///
/// The JS/TS config is not evaluated; Hardhat's conventional directories are used.
pub fn load_project(path: &Path) -> Result<Project> {
    let config_js = path.join("hardhat.config.js");
    let config_ts = path.join("hardhat.config.ts");

    if !config_js.exists() && !config_ts.exists() {
        return Err(eyre!(
            "hardhat.config.js or hardhat.config.ts not found at {:?}",
            path
        ));
    }

    Ok(Project::with_layout(
        ProjectType::Hardhat,
        path,
        "artifacts",
    ))
}
