//! Manually dispatched script runner.
//!
//! Checks that the requested script exists under the playground directory,
//! annotating the run with an error when it does not, and otherwise runs it
//! with the configured interpreter.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::action::{Action, InputOptions};
use crate::command::AnnotationProperties;
use crate::env::Environment;
use crate::errors::{Result, ToolkitError};
use crate::exec::{self, ExecOptions, OutputLine};
use crate::path_utils::to_posix_path;

pub const DEFAULT_SCRIPT: &str = "playground.py";
pub const DEFAULT_DIR: &str = "playground";
pub const DEFAULT_INTERPRETER: &str = "python";

/// The `yes`/`no` choice input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AsyncChoice {
    Yes,
    No,
}

impl FromStr for AsyncChoice {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(ToolkitError::Input {
                name: "run-async".into(),
                reason: format!("expected 'yes' or 'no', got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for AsyncChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "yes",
            Self::No => "no",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaygroundOptions {
    pub script: String,
    pub run_async: AsyncChoice,
    pub dir: PathBuf,
    pub interpreter: String,
}

impl PlaygroundOptions {
    #[must_use]
    pub fn new(run_async: AsyncChoice) -> Self {
        Self {
            script: DEFAULT_SCRIPT.to_string(),
            run_async,
            dir: PathBuf::from(DEFAULT_DIR),
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }

    /// Read the `script`, `run-async`, `directory` and `interpreter` inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Input`] when `run-async` is missing or not
    /// `yes`/`no`.
    pub fn from_action<E: Environment, W: Write>(action: &Action<E, W>) -> Result<Self> {
        let run_async = action
            .get_input("run-async", InputOptions::required())?
            .parse()?;
        let mut opts = Self::new(run_async);
        let script = action.get_input("script", InputOptions::default())?;
        if !script.is_empty() {
            opts.script = script;
        }
        let dir = action.get_input("directory", InputOptions::default())?;
        if !dir.is_empty() {
            opts.dir = PathBuf::from(dir);
        }
        let interpreter = action.get_input("interpreter", InputOptions::default())?;
        if !interpreter.is_empty() {
            opts.interpreter = interpreter;
        }
        Ok(opts)
    }

    #[must_use]
    pub fn script_path(&self) -> PathBuf {
        self.dir.join(&self.script)
    }

    /// `<interpreter> <dir>/<script> [--async]`
    #[must_use]
    pub fn command(&self) -> Vec<String> {
        let mut args = vec![
            self.interpreter.clone(),
            self.script_path().to_string_lossy().into_owned(),
        ];
        if self.run_async == AsyncChoice::Yes {
            args.push("--async".to_string());
        }
        args
    }
}

fn missing_script<E: Environment, W: Write>(action: &mut Action<E, W>, path: &Path) -> Result<i32> {
    let file = to_posix_path(&path.to_string_lossy());
    let props = AnnotationProperties {
        title: Some("Missing script".into()),
        file: Some(file.clone()),
        ..Default::default()
    };
    action.error(&format!("Script {file} not found"), Some(&props))?;
    Ok(1)
}

/// Run the playground script and return its exit code, or 1 after
/// annotating a missing script.
///
/// # Errors
///
/// Returns an error when the interpreter cannot be started or the
/// annotation cannot be written.
pub fn run<E, W, F>(action: &mut Action<E, W>, opts: &PlaygroundOptions, on_line: F) -> Result<i32>
where
    E: Environment,
    W: Write,
    F: FnMut(&OutputLine),
{
    let path = opts.script_path();
    if !path.is_file() {
        return missing_script(action, &path);
    }
    tracing::info!(script = %path.display(), run_async = %opts.run_async, "running playground script");
    let code = exec::stream(&opts.command(), ExecOptions::default(), on_line)?;
    if code != 0 {
        tracing::error!(exit_code = code, "playground script failed");
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnv;
    use tempfile::tempdir;

    fn action(env: MemoryEnv) -> Action<MemoryEnv, Vec<u8>> {
        Action::new(env, Vec::new())
    }

    fn output(a: Action<MemoryEnv, Vec<u8>>) -> String {
        String::from_utf8(a.into_parts().1).unwrap()
    }

    #[test]
    fn parses_choice() {
        assert_eq!("yes".parse::<AsyncChoice>().unwrap(), AsyncChoice::Yes);
        assert_eq!("no".parse::<AsyncChoice>().unwrap(), AsyncChoice::No);
        assert!("Yes!".parse::<AsyncChoice>().is_err());
    }

    #[test]
    fn options_from_inputs_with_defaults() {
        let a = action(MemoryEnv::new().with("INPUT_RUN_ASYNC", "no"));
        let opts = PlaygroundOptions::from_action(&a).unwrap();
        assert_eq!(opts.script, "playground.py");
        assert_eq!(opts.dir, PathBuf::from("playground"));
        assert_eq!(opts.script_path(), Path::new("playground").join("playground.py"));
    }

    #[test]
    fn run_async_is_required() {
        let a = action(MemoryEnv::new().with("INPUT_SCRIPT", "x.py"));
        assert!(matches!(
            PlaygroundOptions::from_action(&a),
            Err(ToolkitError::Input { .. })
        ));
    }

    #[test]
    fn async_flag_appended_only_for_yes() {
        let mut opts = PlaygroundOptions::new(AsyncChoice::Yes);
        assert_eq!(opts.command().last().map(String::as_str), Some("--async"));
        opts.run_async = AsyncChoice::No;
        assert_eq!(opts.command().len(), 2);
        assert_eq!(opts.command()[0], "python");
    }

    #[test]
    fn missing_script_emits_error_annotation() {
        let dir = tempdir().unwrap();
        let mut opts = PlaygroundOptions::new(AsyncChoice::No);
        opts.dir = dir.path().to_path_buf();
        opts.script = "absent.py".into();
        let mut a = action(MemoryEnv::new());
        let code = run(&mut a, &opts, |_| {}).unwrap();
        assert_eq!(code, 1);
        let out = output(a);
        assert!(out.starts_with("::error title=Missing script,file="));
        assert!(out.contains("absent.py not found"));
    }

    #[cfg(unix)]
    #[test]
    fn runs_script_and_forwards_exit_code() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("go.sh"), "echo \"args:$*\"\nexit 4\n").unwrap();
        let opts = PlaygroundOptions {
            script: "go.sh".into(),
            run_async: AsyncChoice::Yes,
            dir: dir.path().to_path_buf(),
            interpreter: "sh".into(),
        };
        let mut a = action(MemoryEnv::new());
        let mut lines = Vec::new();
        let code = run(&mut a, &opts, |l| lines.push(l.line.clone())).unwrap();
        assert_eq!(code, 4);
        assert_eq!(lines, vec!["args:--async"]);
        assert!(output(a).is_empty());
    }
}
