//! Declarative deployment modules.
//!
//! A module names a contract, the parameters its deployment accepts and the
//! constructor arguments built from them. Modules are plain data: building a
//! plan from one performs no I/O.

mod catalog;
mod parameters;

pub use catalog::ModuleCatalog;
pub use parameters::{load_parameter_file, parse_param_override};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// Parameter overrides for one module, by parameter name
pub type Overrides = BTreeMap<String, ParamValue>;

/// A literal value. Addresses, large integers and strings are carried as text
/// and coerced against the constructor's ABI type at deploy time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Integer(n) => write!(f, "{}", n),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentParameter {
    pub name: String,
    #[serde(default)]
    pub default: Option<ParamValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorArg {
    Literal(ParamValue),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentModule {
    pub name: String,
    /// Contract name or fully qualified `path.sol:Name`
    pub contract: String,
    #[serde(default)]
    pub parameters: Vec<DeploymentParameter>,
    #[serde(default)]
    pub args: Vec<ConstructorArg>,
}

/// A module with every parameter and constructor argument bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPlan {
    pub module: String,
    pub contract: String,
    pub parameters: BTreeMap<String, ParamValue>,
    pub constructor_args: Vec<ParamValue>,
}

impl DeploymentModule {
    /// Bind parameters (override, else default) and resolve constructor
    /// arguments in declaration order.
    pub fn build(&self, overrides: &Overrides) -> Result<ResolvedPlan, DeployError> {
        let mut parameters = BTreeMap::new();

        for param in &self.parameters {
            if let Some(value) = overrides.get(&param.name).or(param.default.as_ref()) {
                parameters.insert(param.name.clone(), value.clone());
            }
        }

        for name in overrides.keys() {
            if !self.parameters.iter().any(|p| &p.name == name) {
                tracing::warn!("Module {} has no parameter '{}', override ignored", self.name, name);
            }
        }

        let constructor_args = self
            .args
            .iter()
            .map(|arg| match arg {
                ConstructorArg::Literal(value) => Ok(value.clone()),
                ConstructorArg::Param(name) => {
                    parameters
                        .get(name)
                        .cloned()
                        .ok_or_else(|| DeployError::MissingParameter {
                            module: self.name.clone(),
                            parameter: name.clone(),
                        })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedPlan {
            module: self.name.clone(),
            contract: self.contract.clone(),
            parameters,
            constructor_args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_ADDRESS: &str = "0x09D9a6EdfE066fc24F46bA8C2b21736468f2967D";

    fn aistronaut() -> DeploymentModule {
        ModuleCatalog::builtin().get("AIstronaut").unwrap().clone()
    }

    fn timelock() -> DeploymentModule {
        DeploymentModule {
            name: "Timelock".to_string(),
            contract: "Lock".to_string(),
            parameters: vec![
                DeploymentParameter {
                    name: "unlockTime".to_string(),
                    default: None,
                },
                DeploymentParameter {
                    name: "owner".to_string(),
                    default: Some(FIXED_ADDRESS.into()),
                },
            ],
            args: vec![
                ConstructorArg::Param("unlockTime".to_string()),
                ConstructorArg::Param("owner".to_string()),
                ConstructorArg::Literal(ParamValue::Bool(true)),
            ],
        }
    }

    #[test]
    fn test_defaults_resolve_every_parameter() {
        let plan = aistronaut().build(&Overrides::new()).unwrap();
        assert_eq!(plan.parameters.len(), 2);
        assert_eq!(plan.parameters["unlockTime"], ParamValue::Integer(1_893_456_000));
        assert_eq!(plan.parameters["lockedAmount"], ParamValue::Integer(1_000_000_000));
    }

    #[test]
    fn test_literal_argument_ignores_overrides() {
        let mut overrides = Overrides::new();
        overrides.insert("unlockTime".to_string(), ParamValue::Integer(42));
        overrides.insert("lockedAmount".to_string(), ParamValue::Integer(7));

        for overrides in [Overrides::new(), overrides] {
            let plan = aistronaut().build(&overrides).unwrap();
            assert_eq!(plan.constructor_args, vec![ParamValue::from(FIXED_ADDRESS)]);
        }
    }

    #[test]
    fn test_override_wins_over_default() {
        let mut overrides = Overrides::new();
        overrides.insert("unlockTime".to_string(), ParamValue::Integer(42));

        let plan = aistronaut().build(&overrides).unwrap();
        assert_eq!(plan.parameters["unlockTime"], ParamValue::Integer(42));
        assert_eq!(plan.parameters["lockedAmount"], ParamValue::Integer(1_000_000_000));
    }

    #[test]
    fn test_build_is_pure() {
        let mut overrides = Overrides::new();
        overrides.insert("unlockTime".to_string(), ParamValue::Integer(1_700_000_000));

        let module = timelock();
        assert_eq!(module.build(&overrides).unwrap(), module.build(&overrides).unwrap());
    }

    #[test]
    fn test_arguments_follow_declaration_order() {
        let mut overrides = Overrides::new();
        overrides.insert("unlockTime".to_string(), ParamValue::Integer(1_700_000_000));

        let plan = timelock().build(&overrides).unwrap();
        assert_eq!(
            plan.constructor_args,
            vec![
                ParamValue::Integer(1_700_000_000),
                ParamValue::from(FIXED_ADDRESS),
                ParamValue::Bool(true),
            ]
        );
    }

    #[test]
    fn test_missing_parameter() {
        let err = timelock().build(&Overrides::new()).unwrap_err();
        assert!(matches!(
            err,
            DeployError::MissingParameter { ref parameter, .. } if parameter == "unlockTime"
        ));
    }

    #[test]
    fn test_undeclared_parameter_reference_is_missing() {
        let mut module = timelock();
        module.args.push(ConstructorArg::Param("beneficiary".to_string()));

        let mut overrides = Overrides::new();
        overrides.insert("unlockTime".to_string(), ParamValue::Integer(1));
        overrides.insert("beneficiary".to_string(), FIXED_ADDRESS.into());

        assert!(matches!(
            module.build(&overrides),
            Err(DeployError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_module_from_toml() {
        let module: DeploymentModule = toml::from_str(
            r#"
name = "Timelock"
contract = "contracts/Lock.sol:Lock"
args = [{ param = "unlockTime" }, { literal = "0x09D9a6EdfE066fc24F46bA8C2b21736468f2967D" }, { literal = 5 }]

[[parameters]]
name = "unlockTime"
default = 1893456000
"#,
        )
        .unwrap();

        assert_eq!(module.contract, "contracts/Lock.sol:Lock");
        assert_eq!(
            module.args[2],
            ConstructorArg::Literal(ParamValue::Integer(5))
        );
        let plan = module.build(&Overrides::new()).unwrap();
        assert_eq!(plan.constructor_args[0], ParamValue::Integer(1_893_456_000));
    }
}
