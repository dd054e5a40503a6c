//! Access to the runner's environment.
//!
//! Everything the runner tells an action arrives through environment
//! variables: inputs (`INPUT_*`), saved state (`STATE_*`), the locations of
//! the file-command files, and the `GITHUB_*` / `RUNNER_*` context. The
//! [`Environment`] trait lets the rest of the crate read and update those
//! variables without binding to the process environment, so tests can run
//! against a [`MemoryEnv`].

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{Result, ToolkitError};

/// Well-known variables set by the Actions runner.
pub struct WorkflowEnv;

impl WorkflowEnv {
    pub const GITHUB_OUTPUT: &'static str = "GITHUB_OUTPUT";
    pub const GITHUB_STATE: &'static str = "GITHUB_STATE";
    pub const GITHUB_PATH: &'static str = "GITHUB_PATH";
    pub const GITHUB_ENV: &'static str = "GITHUB_ENV";
    pub const GITHUB_STEP_SUMMARY: &'static str = "GITHUB_STEP_SUMMARY";
    pub const RUNNER_DEBUG: &'static str = "RUNNER_DEBUG";
    pub const GITHUB_WORKSPACE: &'static str = "GITHUB_WORKSPACE";
    pub const GITHUB_ACTION: &'static str = "GITHUB_ACTION";
    pub const GITHUB_ACTION_PATH: &'static str = "GITHUB_ACTION_PATH";
    pub const GITHUB_ACTIONS: &'static str = "GITHUB_ACTIONS";
}

/// YAML 1.1 style truthy words accepted by [`parse_yaml_bool`].
pub const YAML_BOOLEAN_TRUE: [&str; 5] = ["true", "yes", "on", "y", "1"];
/// Falsy counterparts accepted by [`parse_bool_strict`].
pub const YAML_BOOLEAN_FALSE: [&str; 5] = ["false", "no", "off", "n", "0"];

/// Read/write view over a set of environment variables.
pub trait Environment {
    /// Value of `key`, or `None` when unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;
    fn set_var(&mut self, key: &str, value: &str);
    fn remove_var(&mut self, key: &str);
    /// Snapshot of every variable, sorted by name.
    fn vars(&self) -> BTreeMap<String, String>;

    /// Value of `key`, treating an empty string as unset.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set_var(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn remove_var(&mut self, key: &str) {
        std::env::remove_var(key);
    }

    fn vars(&self) -> BTreeMap<String, String> {
        std::env::vars().collect()
    }
}

/// An in-memory environment, detached from the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryEnv {
    vars: HashMap<String, String>,
}

impl MemoryEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Environment for MemoryEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn set_var(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    fn remove_var(&mut self, key: &str) {
        self.vars.remove(key);
    }

    fn vars(&self) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Environment variable name under which the runner exposes input `name`.
///
/// `my-input` and `my input` both map to `INPUT_MY_INPUT`.
#[must_use]
pub fn input_env_name(name: &str) -> String {
    let normalized = name.to_uppercase().replace([' ', '-'], "_");
    format!("INPUT_{normalized}")
}

/// Environment variable name under which saved state `name` is exposed.
#[must_use]
pub fn state_env_name(name: &str) -> String {
    format!("STATE_{name}")
}

/// Lenient boolean: `true yes on y 1` (any case) are true, everything else false.
#[must_use]
pub fn parse_yaml_bool(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    YAML_BOOLEAN_TRUE.contains(&lowered.as_str())
}

/// Strict boolean: only the known truthy/falsy words are accepted.
///
/// An empty or whitespace-only value is `false`.
///
/// # Errors
///
/// Returns [`ToolkitError::Env`] for any other word.
pub fn parse_bool_strict(key: &str, value: &str) -> Result<bool> {
    let lowered = value.trim().to_lowercase();
    if lowered.is_empty() || YAML_BOOLEAN_FALSE.contains(&lowered.as_str()) {
        return Ok(false);
    }
    if YAML_BOOLEAN_TRUE.contains(&lowered.as_str()) {
        return Ok(true);
    }
    Err(ToolkitError::Env {
        key: key.to_string(),
        reason: format!("invalid boolean value '{value}'"),
    })
}

/// Split on `\n`, optionally dropping blank lines. A trailing `\r` is kept
/// out of each line.
#[must_use]
pub fn split_lines(input: &str, skip_empty: bool) -> Vec<String> {
    input
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !skip_empty || !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Entries of `PATH`, in order, skipping empty segments.
#[must_use]
pub fn iter_env_path<E: Environment + ?Sized>(env: &E) -> Vec<PathBuf> {
    match env.var("PATH") {
        Some(path) => std::env::split_paths(&path)
            .filter(|p| !p.as_os_str().is_empty())
            .collect(),
        None => Vec::new(),
    }
}

/// Typed reader over variables sharing a prefix, e.g. `GITHUB_`.
#[derive(Debug)]
pub struct EnvReader<'a, E: Environment + ?Sized> {
    env: &'a E,
    prefix: String,
}

impl<'a, E: Environment + ?Sized> EnvReader<'a, E> {
    pub fn new(env: &'a E, prefix: impl Into<String>) -> Self {
        Self {
            env,
            prefix: prefix.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Non-empty value of `<prefix><name>`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.env.non_empty(&self.key(name))
    }

    #[must_use]
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// # Errors
    ///
    /// Returns [`ToolkitError::Env`] when the variable is unset or empty.
    pub fn require(&self, name: &str) -> Result<String> {
        let key = self.key(name);
        self.get(name).ok_or(ToolkitError::Env {
            key,
            reason: "required but not set".into(),
        })
    }

    /// Parse `<prefix><name>` with `FromStr`; unset is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Env`] when the value does not parse.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| ToolkitError::Env {
                key: self.key(name),
                reason: format!("cannot parse '{raw}': {e}"),
            }),
        }
    }

    /// Strict boolean parse; unset is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// See [`parse_bool_strict`].
    pub fn parse_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => parse_bool_strict(&self.key(name), &raw).map(Some),
        }
    }

    /// All variables with the prefix, keyed by the name without it.
    #[must_use]
    pub fn items(&self) -> BTreeMap<String, String> {
        self.env
            .vars()
            .into_iter()
            .filter_map(|(k, v)| k.strip_prefix(&self.prefix).map(|s| (s.to_string(), v)))
            .collect()
    }
}

/// Sets process variables for the guard's lifetime, restoring prior values on drop.
#[derive(Debug)]
pub struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    pub fn set<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut saved = Vec::new();
        for (k, v) in vars {
            let key: String = k.into();
            saved.push((key.clone(), std::env::var(&key).ok()));
            std::env::set_var(&key, v.into());
        }
        Self { saved }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
}
