use alloy::dyn_abi::{DynSolValue, Specifier};
use alloy::primitives::Bytes;

use super::artifact::Artifact;
use crate::error::DeployError;
use crate::modules::ParamValue;

/// ABI-encode constructor arguments against the artifact's constructor inputs
pub fn encode_constructor_args(artifact: &Artifact, args: &[ParamValue]) -> Result<Bytes, DeployError> {
    let err = |reason: String| DeployError::ConstructorArgs {
        contract: artifact.contract_name.clone(),
        reason,
    };

    let inputs = artifact
        .abi
        .constructor()
        .map(|c| c.inputs.as_slice())
        .unwrap_or_default();

    if inputs.len() != args.len() {
        return Err(err(format!(
            "constructor takes {} argument(s), plan has {}",
            inputs.len(),
            args.len()
        )));
    }

    let values = inputs
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (param, value))| {
            let ty = param
                .resolve()
                .map_err(|e| err(format!("argument {} has unsupported type {}: {}", i, param.ty, e)))?;

            ty.coerce_str(&value.to_string()).map_err(|e| {
                err(format!(
                    "argument {} ({} {}) cannot take '{}': {}",
                    i, param.ty, param.name, value, e
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.is_empty() {
        return Ok(Bytes::new());
    }

    Ok(DynSolValue::Tuple(values).abi_encode_params().into())
}

/// Creation code followed by the encoded constructor arguments
pub fn deploy_code(artifact: &Artifact, encoded_args: &Bytes) -> Bytes {
    let mut code = artifact.bytecode.to_vec();
    code.extend_from_slice(encoded_args);
    code.into()
}
