use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr, eyre};
use serde_json::Value;

use super::{Overrides, ParamValue};

/// Parse a `name=value` override from the command line
pub fn parse_param_override(raw: &str) -> Result<(String, ParamValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", raw));
    }

    Ok((name.to_string(), parse_literal(value.trim())))
}

/// Load the overrides for `module` from an Ignition-style parameter file:
/// `{ "<Module>": { "<param>": <value> } }`
pub fn load_parameter_file(path: &Path, module: &str) -> Result<Overrides> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read parameter file {:?}", path))?;

    let root: Value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse parameter file {:?}", path))?;

    let root = root
        .as_object()
        .ok_or_else(|| eyre!("Parameter file must be a JSON object keyed by module name"))?;

    let Some(section) = root.get(module) else {
        tracing::debug!("Parameter file {:?} has no entry for {}", path, module);
        return Ok(Overrides::new());
    };

    let section = section
        .as_object()
        .ok_or_else(|| eyre!("Parameters for module {} must be a JSON object", module))?;

    section
        .iter()
        .map(|(name, value)| {
            json_to_param(value)
                .map(|v| (name.clone(), v))
                .ok_or_else(|| eyre!("Unsupported value for parameter {}.{}: {}", module, name, value))
        })
        .collect()
}

fn json_to_param(value: &Value) -> Option<ParamValue> {
    match value {
        Value::Bool(b) => Some(ParamValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(ParamValue::Integer(i)),
            // Above i64::MAX but still integral
            None if n.is_u64() => Some(ParamValue::Text(n.to_string())),
            None => None,
        },
        Value::String(s) => Some(parse_literal(s)),
        _ => None,
    }
}

/// Literal from text: booleans, integers (Ignition's `123n` bigint form
/// included), everything else kept as text.
fn parse_literal(raw: &str) -> ParamValue {
    match raw {
        "true" => return ParamValue::Bool(true),
        "false" => return ParamValue::Bool(false),
        _ => {}
    }

    let digits = raw.strip_suffix('n').unwrap_or(raw);
    let is_integer = !digits.is_empty()
        && digits
            .strip_prefix('-')
            .unwrap_or(digits)
            .chars()
            .all(|c| c.is_ascii_digit());

    if is_integer {
        match digits.parse::<i64>() {
            Ok(n) => ParamValue::Integer(n),
            Err(_) => ParamValue::Text(digits.to_string()),
        }
    } else {
        ParamValue::Text(raw.to_string())
    }
}
