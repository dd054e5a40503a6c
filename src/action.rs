//! The action runtime: inputs, outputs, state, logging and groups.
//!
//! [`Action`] bundles an [`Environment`] with the writer the runner reads
//! workflow commands from. In a real job that is [`ProcessEnv`] and stdout
//! (see [`Action::from_process`]); tests substitute a [`MemoryEnv`] and a
//! `Vec<u8>`.
//!
//! [`MemoryEnv`]: crate::env::MemoryEnv

use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::command::{
    issue, issue_command, issue_file_command, prepare_key_value_message, to_command_value,
    AnnotationProperties, FileCommand, WorkflowCommand,
};
use crate::env::{input_env_name, parse_yaml_bool, split_lines, state_env_name, Environment, ProcessEnv, WorkflowEnv};
use crate::errors::{Result, ToolkitError};

/// Process exit codes understood by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Options for [`Action::get_input`].
#[derive(Debug, Clone, Copy)]
pub struct InputOptions {
    /// Fail when the input is missing or empty.
    pub required: bool,
    /// Trim surrounding whitespace (default `true`).
    pub trim_whitespace: bool,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            required: false,
            trim_whitespace: true,
        }
    }
}

impl InputOptions {
    #[must_use]
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }
}

/// Options for [`Action::get_multiline_input`].
#[derive(Debug, Clone, Copy)]
pub struct MultilineInputOptions {
    pub required: bool,
    pub trim_whitespace: bool,
    /// Drop blank lines (default `true`).
    pub skip_empty_lines: bool,
}

impl Default for MultilineInputOptions {
    fn default() -> Self {
        Self {
            required: false,
            trim_whitespace: true,
            skip_empty_lines: true,
        }
    }
}

/// Token returned by [`Action::stop_commands`]; pass it back to resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopToken(String);

impl StopToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Handle on the runner for one action invocation.
#[derive(Debug)]
pub struct Action<E: Environment, W: Write> {
    env: E,
    out: W,
}

impl Action<ProcessEnv, Stdout> {
    /// The real runner: process environment and stdout.
    #[must_use]
    pub fn from_process() -> Self {
        Self::new(ProcessEnv, io::stdout())
    }
}

impl<E: Environment, W: Write> Action<E, W> {
    pub fn new(env: E, out: W) -> Self {
        Self { env, out }
    }

    #[must_use]
    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Consume the action, returning its parts.
    pub fn into_parts(self) -> (E, W) {
        (self.env, self.out)
    }

    // ── Inputs ──────────────────────────────────────────────────────────

    /// Value of input `name` (`INPUT_<NAME>`), or `""` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Input`] when `required` and the input is
    /// missing or empty.
    pub fn get_input(&self, name: &str, options: InputOptions) -> Result<String> {
        let val = self.env.var(&input_env_name(name)).unwrap_or_default();
        if options.required && val.trim().is_empty() {
            return Err(ToolkitError::Input {
                name: name.to_string(),
                reason: format!("Input required and not supplied: {name}"),
            });
        }
        if options.trim_whitespace {
            Ok(val.trim().to_string())
        } else {
            Ok(val)
        }
    }

    /// Input `name` split into lines.
    ///
    /// # Errors
    ///
    /// See [`Action::get_input`].
    pub fn get_multiline_input(&self, name: &str, options: MultilineInputOptions) -> Result<Vec<String>> {
        let value = self.get_input(
            name,
            InputOptions {
                required: options.required,
                trim_whitespace: options.trim_whitespace,
            },
        )?;
        if value.is_empty() {
            return Ok(Vec::new());
        }
        let lines = split_lines(&value, options.skip_empty_lines);
        if options.trim_whitespace {
            Ok(lines.into_iter().map(|l| l.trim().to_string()).collect())
        } else {
            Ok(lines)
        }
    }

    /// Input `name` as a lenient boolean: `true yes on y 1` are true.
    ///
    /// # Errors
    ///
    /// See [`Action::get_input`].
    pub fn get_bool_input(&self, name: &str, options: InputOptions) -> Result<bool> {
        let value = self.get_input(name, options)?;
        Ok(parse_yaml_bool(&value))
    }

    /// Input `name` under the YAML 1.2 core schema (`true`/`True`/`TRUE`,
    /// `false`/`False`/`FALSE`).
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Input`] for any other value.
    pub fn get_bool_input_strict(&self, name: &str, options: InputOptions) -> Result<bool> {
        let value = self.get_input(name, options)?;
        match value.as_str() {
            "true" | "True" | "TRUE" => Ok(true),
            "false" | "False" | "FALSE" => Ok(false),
            _ => Err(ToolkitError::Input {
                name: name.to_string(),
                reason: format!(
                    "Input does not meet YAML 1.2 \"Core Schema\" specification: {name}\n\
                     Support boolean input list: `true | True | TRUE | false | False | FALSE`"
                ),
            }),
        }
    }

    // ── Outputs, env, state ─────────────────────────────────────────────

    fn file_command_path(&self, command: FileCommand) -> Option<PathBuf> {
        self.env.non_empty(command.env_var()).map(PathBuf::from)
    }

    fn key_value<T: Serialize + ?Sized>(
        &mut self,
        file: FileCommand,
        fallback: WorkflowCommand,
        name: &str,
        value: &T,
    ) -> Result<()> {
        match self.file_command_path(file) {
            Some(path) => {
                let message = prepare_key_value_message(name, value)?;
                issue_file_command(file, &path, &message)?;
                Ok(())
            }
            None => issue_command(
                &mut self.out,
                fallback,
                vec![("name".to_string(), name.to_string())],
                &to_command_value(value),
            ),
        }
    }

    /// Set step output `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn set_output<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        self.key_value(FileCommand::Output, WorkflowCommand::SetOutput, name, value)
    }

    /// Set `name` for this process and export it to later steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable cannot be exported.
    pub fn export_variable<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        let converted = to_command_value(value);
        self.env.set_var(name, &converted);
        self.key_value(FileCommand::Env, WorkflowCommand::SetEnv, name, value)
    }

    /// Mask `secret` in all later log output.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn set_secret<T: Serialize + ?Sized>(&mut self, secret: &T) -> Result<()> {
        issue(&mut self.out, WorkflowCommand::AddMask, &to_command_value(secret))
    }

    /// Prepend `dir` to `PATH` for this process and later steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be exported.
    pub fn add_path(&mut self, dir: &Path) -> Result<()> {
        let dir_str = dir.to_string_lossy().into_owned();
        let current = self.env.var("PATH").unwrap_or_default();
        if current.is_empty() {
            tracing::warn!("PATH is not set; executables may not be found");
            self.env.set_var("PATH", &dir_str);
        } else {
            let sep = if cfg!(windows) { ';' } else { ':' };
            self.env.set_var("PATH", &format!("{dir_str}{sep}{current}"));
        }

        match self.file_command_path(FileCommand::Path) {
            Some(path) => {
                issue_file_command(FileCommand::Path, &path, &dir_str)?;
                Ok(())
            }
            None => issue(&mut self.out, WorkflowCommand::AddPath, &dir_str),
        }
    }

    /// Save state for the action's `post` phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub fn save_state<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        self.key_value(FileCommand::State, WorkflowCommand::SaveState, name, value)
    }

    /// State saved by an earlier phase, or `""`.
    #[must_use]
    pub fn get_state(&self, name: &str) -> String {
        self.env.var(&state_env_name(name)).unwrap_or_default()
    }

    /// Toggle echoing of workflow commands in the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn set_command_echo(&mut self, enabled: bool) -> Result<()> {
        issue(&mut self.out, WorkflowCommand::Echo, if enabled { "on" } else { "off" })
    }

    /// Whether the runner has step debug logging enabled.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.env.var(WorkflowEnv::RUNNER_DEBUG).as_deref() == Some("1")
    }

    /// Log `message` as an error and return the failure exit code.
    ///
    /// The caller is expected to exit with the returned code.
    pub fn set_failed(&mut self, message: impl std::fmt::Display) -> ExitCode {
        if let Err(e) = self.error(&message.to_string(), None) {
            tracing::error!("failed to report failure: {e}");
        }
        ExitCode::Failure
    }

    /// Stop processing workflow commands until [`Action::resume_commands`].
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn stop_commands(&mut self) -> Result<StopToken> {
        let token = StopToken(uuid::Uuid::new_v4().simple().to_string());
        issue(&mut self.out, WorkflowCommand::StopCommands, token.as_str())?;
        Ok(token)
    }

    /// Resume workflow command processing.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn resume_commands(&mut self, token: StopToken) -> Result<()> {
        writeln!(self.out, "::{}::", token.0)?;
        self.out.flush()?;
        Ok(())
    }

    // ── Logging ─────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn debug(&mut self, message: &str) -> Result<()> {
        issue(&mut self.out, WorkflowCommand::Debug, message)
    }

    /// Plain log line.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn info(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}")?;
        self.out.flush()?;
        Ok(())
    }

    fn annotate(
        &mut self,
        command: WorkflowCommand,
        message: &str,
        properties: Option<&AnnotationProperties>,
    ) -> Result<()> {
        let props = match properties {
            Some(p) => p.to_command_properties()?,
            None => Vec::new(),
        };
        issue_command(&mut self.out, command, props, message)
    }

    /// # Errors
    ///
    /// Returns an error for invalid annotation properties or writer failure.
    pub fn notice(&mut self, message: &str, properties: Option<&AnnotationProperties>) -> Result<()> {
        self.annotate(WorkflowCommand::Notice, message, properties)
    }

    /// # Errors
    ///
    /// Returns an error for invalid annotation properties or writer failure.
    pub fn warning(&mut self, message: &str, properties: Option<&AnnotationProperties>) -> Result<()> {
        self.annotate(WorkflowCommand::Warning, message, properties)
    }

    /// # Errors
    ///
    /// Returns an error for invalid annotation properties or writer failure.
    pub fn error(&mut self, message: &str, properties: Option<&AnnotationProperties>) -> Result<()> {
        self.annotate(WorkflowCommand::Error, message, properties)
    }

    /// Open a collapsible log group.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn start_group(&mut self, name: &str) -> Result<()> {
        issue(&mut self.out, WorkflowCommand::Group, name)
    }

    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn end_group(&mut self) -> Result<()> {
        issue(&mut self.out, WorkflowCommand::EndGroup, "")
    }

    /// Run `f` inside a log group. The group is closed even when `f` fails.
    ///
    /// # Errors
    ///
    /// Returns `f`'s error, or an error if the group markers cannot be written.
    pub fn group<T, F>(&mut self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.start_group(name)?;
        let result = f(self);
        self.end_group()?;
        result
    }
}
