//! `action.yml` metadata.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::env::{input_env_name, Environment};
use crate::errors::{Result, ToolkitError};

/// A YAML scalar that the runner treats as a string (`default: 3`,
/// `required: "true"`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s,
        }
    }
}

fn de_opt_string<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(de)?.map(Scalar::into_string))
}

fn de_required<'de, D>(de: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(de)? {
        Some(Scalar::Bool(b)) => b,
        Some(Scalar::Str(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_required")]
    pub required: bool,
    #[serde(
        default,
        deserialize_with = "de_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Only composite actions map outputs to a step expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The `runs:` block. `steps` is kept as raw YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunsSpec {
    pub using: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<serde_yaml_ng::Value>,
}

impl RunsSpec {
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.using == "composite"
    }
}

/// Parsed `action.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputSpec>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputSpec>,
    pub runs: RunsSpec,
}

impl ActionManifest {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Manifest`] when the file is missing, an I/O
    /// error when it cannot be read, and a YAML error when it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ToolkitError::Manifest {
                message: format!("action manifest not found: {}", path.display()),
            });
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_str(&raw)
    }

    /// Parse manifest YAML.
    ///
    /// # Errors
    ///
    /// Returns a YAML error for malformed input and [`ToolkitError::Manifest`]
    /// when `name` or `runs.using` is empty.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(raw: &str) -> Result<Self> {
        let manifest: Self = serde_yaml_ng::from_str(raw)?;
        if manifest.name.trim().is_empty() {
            return Err(ToolkitError::Manifest {
                message: "`name` must not be empty".into(),
            });
        }
        if manifest.runs.using.trim().is_empty() {
            return Err(ToolkitError::Manifest {
                message: "`runs.using` must not be empty".into(),
            });
        }
        Ok(manifest)
    }

    #[must_use]
    pub fn input_default(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).and_then(|i| i.default.as_deref())
    }

    /// Required inputs with no default and no non-empty `INPUT_<NAME>`.
    #[must_use]
    pub fn missing_required_inputs<E: Environment + ?Sized>(&self, env: &E) -> Vec<String> {
        self.inputs
            .iter()
            .filter(|(_, spec)| spec.required && spec.default.is_none())
            .filter(|(name, _)| {
                env.var(&input_env_name(name))
                    .map_or(true, |v| v.trim().is_empty())
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}
