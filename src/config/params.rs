use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Runtime parameters passed to a config.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    /// Create empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Parse from CLI args like "key=value".
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut params = Self::new();
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid param '{}', expected key=value", arg))
            })?;
            params.values.insert(key.to_string(), value.to_string());
        }
        Ok(params)
    }
}

/// Parameter definition in config.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    /// Whether this parameter is required.
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided.
    pub default: Option<String>,

    /// Description for documentation.
    pub description: Option<String>,
}

/// Look a variable up: explicit params, then the environment, then the
/// config default.
fn resolve(
    name: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Option<String>> {
    if let Some(v) = params.get(name) {
        return Ok(Some(v.to_string()));
    }
    if let Some(v) = env(name) {
        return Ok(Some(v));
    }
    match defs.get(name) {
        Some(def) => match (&def.default, def.required) {
            (Some(default), _) => Ok(Some(default.clone())),
            (None, true) => Err(Error::Config(format!(
                "missing required parameter: {} (pass -P {}=... or set it in the environment)",
                name, name
            ))),
            (None, false) => Ok(Some(String::new())),
        },
        None => Ok(None),
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Substitute `${var}` patterns in a string.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    substitute_with_env(template, params, defs, &process_env)
}

fn substitute_with_env(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<String> {
    let mut result = template.to_string();
    let mut start = 0;

    while let Some(var_start) = result[start..].find("${") {
        let var_start = start + var_start;
        let Some(var_end) = result[var_start..].find('}') else {
            break;
        };
        let var_end = var_start + var_end;

        let var_name = &result[var_start + 2..var_end];

        let Some(value) = resolve(var_name, params, defs, env)? else {
            // Unknown and not in the environment - leave as-is
            start = var_end + 1;
            continue;
        };

        result.replace_range(var_start..=var_end, &value);
        start = var_start + value.len();
    }

    Ok(result)
}

/// Recursively substitute params in a serde_yaml::Value.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => {
            *s = substitute(s, params, defs)?;
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        _ => {}
    }
    Ok(())
}
