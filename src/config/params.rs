use crate::{Error, Result};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Values supplied on the command line for `${name}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse `-P key=value` arguments.
    pub fn from_args(args: &[String]) -> Result<Self> {
        args.iter().try_fold(Self::new(), |params, arg| {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid param '{}', expected key=value", arg))
            })?;
            if key.trim().is_empty() {
                return Err(Error::Config(format!("invalid param '{}', empty key", arg)));
            }
            Ok(params.set(key.trim(), value))
        })
    }
}

/// A `params:` entry in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    #[serde(default)]
    pub required: bool,

    pub default: Option<String>,

    /// Shown by `--check`.
    pub description: Option<String>,
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Replace `${name}` placeholders in `template`.
///
/// Supplied values win over defaults. A declared optional param with no
/// default becomes the empty string; an undeclared placeholder is left as-is.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    let mut missing = None;
    let out = placeholder().replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        if let Some(v) = params.get(name) {
            return v.to_string();
        }
        match defs.get(name) {
            Some(ParamDef {
                default: Some(d), ..
            }) => d.clone(),
            Some(def) if def.required => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
            Some(_) => String::new(),
            None => caps[0].to_string(),
        }
    });

    match missing {
        Some(name) => Err(Error::Config(format!(
            "missing required parameter: {}",
            name
        ))),
        None => Ok(out.into_owned()),
    }
}

/// Walk a YAML tree and substitute every string scalar.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => *s = substitute(s, params, defs)?,
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
