//! Inputs and version detection for the composite setup action.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::action::{Action, InputOptions};
use crate::env::Environment;
use crate::errors::{Result, ToolkitError};

pub const DEFAULT_UV_VERSION: &str = "0.7.12";
pub const DEFAULT_VERSION_FILE: &str = ".python-version";

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z]+[@-]?)?\d+(\.\d+){0,2}([a-z]+\d*)?(\+[0-9A-Za-z.]+)?$").expect("version regex")
});

/// Inputs of the setup action, with their `action.yml` defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupInputs {
    pub uv_version: String,
    pub enable_cache: bool,
    pub version_file: PathBuf,
}

impl Default for SetupInputs {
    fn default() -> Self {
        Self {
            uv_version: DEFAULT_UV_VERSION.to_string(),
            enable_cache: true,
            version_file: PathBuf::from(DEFAULT_VERSION_FILE),
        }
    }
}

impl SetupInputs {
    /// Read `uv-version`, `enable-cache` and `python-version-file`. Empty
    /// inputs fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Input`] when `enable-cache` is not a YAML
    /// boolean.
    pub fn from_action<E: Environment, W: Write>(action: &Action<E, W>) -> Result<Self> {
        let defaults = Self::default();
        let uv_version = action.get_input("uv-version", InputOptions::default())?;
        let enable_cache = if action
            .get_input("enable-cache", InputOptions::default())?
            .is_empty()
        {
            defaults.enable_cache
        } else {
            action.get_bool_input_strict("enable-cache", InputOptions::default())?
        };
        let version_file = action.get_input("python-version-file", InputOptions::default())?;

        Ok(Self {
            uv_version: if uv_version.is_empty() {
                defaults.uv_version
            } else {
                uv_version
            },
            enable_cache,
            version_file: if version_file.is_empty() {
                defaults.version_file
            } else {
                PathBuf::from(version_file)
            },
        })
    }
}

/// Runtime version pinned in `file`: the first line that is neither blank
/// nor a `#` comment.
///
/// # Errors
///
/// Returns [`ToolkitError::Input`] when the file is missing, has no version
/// line, or the line does not look like a version number.
pub fn detect_runtime_version(file: &Path) -> Result<String> {
    let input_err = |reason: String| ToolkitError::Input {
        name: "python-version-file".into(),
        reason,
    };
    if !file.is_file() {
        return Err(input_err(format!("version file not found: {}", file.display())));
    }
    let raw = std::fs::read_to_string(file)?;
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .ok_or_else(|| input_err(format!("no version found in {}", file.display())))?;

    if !VERSION_RE.is_match(line) {
        return Err(input_err(format!(
            "'{line}' in {} is not a version number",
            file.display()
        )));
    }
    tracing::debug!(file = %file.display(), version = line, "detected runtime version");
    Ok(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnv;
    use tempfile::tempdir;

    fn action(env: MemoryEnv) -> Action<MemoryEnv, Vec<u8>> {
        Action::new(env, Vec::new())
    }

    #[test]
    fn defaults_when_inputs_absent() {
        let inputs = SetupInputs::from_action(&action(MemoryEnv::new())).unwrap();
        assert_eq!(inputs, SetupInputs::default());
        assert_eq!(inputs.uv_version, "0.7.12");
        assert!(inputs.enable_cache);
    }

    #[test]
    fn reads_supplied_inputs() {
        let env = MemoryEnv::new()
            .with("INPUT_UV_VERSION", "0.8.0")
            .with("INPUT_ENABLE_CACHE", "false")
            .with("INPUT_PYTHON_VERSION_FILE", "ci/.python-version");
        let inputs = SetupInputs::from_action(&action(env)).unwrap();
        assert_eq!(inputs.uv_version, "0.8.0");
        assert!(!inputs.enable_cache);
        assert_eq!(inputs.version_file, PathBuf::from("ci/.python-version"));
    }

    #[test]
    fn rejects_non_boolean_cache_flag() {
        let env = MemoryEnv::new().with("INPUT_ENABLE_CACHE", "maybe");
        assert!(matches!(
            SetupInputs::from_action(&action(env)),
            Err(ToolkitError::Input { .. })
        ));
    }

    #[test]
    fn detects_first_version_line() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(".python-version");
        std::fs::write(&file, "# pinned\n\n  3.12.4  \n3.11\n").unwrap();
        assert_eq!(detect_runtime_version(&file).unwrap(), "3.12.4");
    }

    #[test]
    fn accepts_short_and_prerelease_versions() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(".python-version");
        for v in [
            "3",
            "3.13",
            "3.13t",
            "3.14.0a1",
            "3.13.1+freethreaded",
            "pypy3.10",
            "cpython-3.12",
            "pypy@3.10",
        ] {
            std::fs::write(&file, v).unwrap();
            assert_eq!(detect_runtime_version(&file).unwrap(), v);
        }
    }

    #[test]
    fn rejects_missing_empty_or_garbage_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(".python-version");
        assert!(detect_runtime_version(&file).is_err());
        std::fs::write(&file, "# only a comment\n\n").unwrap();
        assert!(detect_runtime_version(&file).is_err());
        std::fs::write(&file, "latest\n").unwrap();
        assert!(matches!(
            detect_runtime_version(&file),
            Err(ToolkitError::Input { .. })
        ));
    }
}
