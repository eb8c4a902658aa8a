use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};

use super::{ConstructorArg, DeploymentModule, DeploymentParameter, ParamValue};
use crate::error::DeployError;

/// 2030-01-01T00:00:00Z
const JAN_1ST_2030: i64 = 1_893_456_000;
const ONE_GWEI: i64 = 1_000_000_000;

/// Deployment modules by name
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, DeploymentModule>,
}

impl ModuleCatalog {
    /// Modules shipped with the tool
    pub fn builtin() -> Self {
        let aistronaut = DeploymentModule {
            name: "AIstronaut".to_string(),
            contract: "AIstronaut".to_string(),
            parameters: vec![
                DeploymentParameter {
                    name: "unlockTime".to_string(),
                    default: Some(ParamValue::Integer(JAN_1ST_2030)),
                },
                DeploymentParameter {
                    name: "lockedAmount".to_string(),
                    default: Some(ParamValue::Integer(ONE_GWEI)),
                },
            ],
            args: vec![ConstructorArg::Literal(
                "0x09D9a6EdfE066fc24F46bA8C2b21736468f2967D".into(),
            )],
        };

        // Same contract, deployed by the scripted flow with its own constructor address
        let aistronaut_script = DeploymentModule {
            name: "AIstronautScript".to_string(),
            contract: "AIstronaut".to_string(),
            parameters: Vec::new(),
            args: vec![ConstructorArg::Literal(
                "0xc886E3974Eb90B44AB91e13e5F46A085d8cF150D".into(),
            )],
        };

        let modules = [aistronaut, aistronaut_script]
            .into_iter()
            .map(|m| (m.name.clone(), m))
            .collect();

        Self { modules }
    }

    /// Built-in modules plus every `*.toml` module in `modules_dir`.
    /// A file module replaces a built-in one with the same name.
    pub fn load(modules_dir: &Path) -> Result<Self> {
        let mut catalog = Self::builtin();

        if !modules_dir.exists() {
            tracing::debug!("Module directory does not exist: {:?}", modules_dir);
            return Ok(catalog);
        }

        let entries = fs::read_dir(modules_dir)
            .wrap_err_with(|| format!("Failed to read {:?}", modules_dir))?;

        let mut paths: Vec<_> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path)
                .wrap_err_with(|| format!("Failed to read {:?}", path))?;
            let module: DeploymentModule = toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse module {:?}", path))?;

            if catalog.modules.contains_key(&module.name) {
                tracing::info!("Module {} from {:?} replaces built-in", module.name, path);
            }
            catalog.modules.insert(module.name.clone(), module);
        }

        tracing::info!("Loaded {} deployment modules", catalog.modules.len());
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&DeploymentModule> {
        self.modules.get(name)
    }

    pub fn module(&self, name: &str) -> Result<&DeploymentModule, DeployError> {
        self.get(name)
            .ok_or_else(|| DeployError::UnknownModule(name.to_string()))
    }

    pub fn modules(&self) -> impl Iterator<Item = &DeploymentModule> {
        self.modules.values()
    }
}
