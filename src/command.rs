//! Workflow command encoding.
//!
//! The runner scans an action's stdout for lines of the form
//! `::name key=value,key=value::message` and reads key/value "file commands"
//! appended to the files it names in `GITHUB_OUTPUT`, `GITHUB_ENV`, etc.
//! This module renders both.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::env::WorkflowEnv;
use crate::errors::{Result, ToolkitError};

const CMD_STRING: &str = "::";

/// Commands understood by the runner on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowCommand {
    SetOutput,
    SetEnv,
    AddPath,
    Debug,
    Notice,
    Warning,
    Error,
    Group,
    EndGroup,
    SaveState,
    AddMask,
    Echo,
    StopCommands,
}

impl WorkflowCommand {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowCommand::SetOutput => "set-output",
            WorkflowCommand::SetEnv => "set-env",
            WorkflowCommand::AddPath => "add-path",
            WorkflowCommand::Debug => "debug",
            WorkflowCommand::Notice => "notice",
            WorkflowCommand::Warning => "warning",
            WorkflowCommand::Error => "error",
            WorkflowCommand::Group => "group",
            WorkflowCommand::EndGroup => "endgroup",
            WorkflowCommand::SaveState => "save-state",
            WorkflowCommand::AddMask => "add-mask",
            WorkflowCommand::Echo => "echo",
            WorkflowCommand::StopCommands => "stop-commands",
        }
    }
}

impl fmt::Display for WorkflowCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a value the way the runner expects it in a command.
///
/// Strings pass through unchanged, `null` becomes the empty string, and
/// everything else is compact JSON.
#[must_use]
pub fn to_command_value<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Null) => String::new(),
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

/// Escape a command message.
#[must_use]
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a command property value.
#[must_use]
pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// A single stdout workflow command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: WorkflowCommand,
    /// Properties in emission order; values are unescaped.
    pub properties: Vec<(String, String)>,
    pub message: String,
}

impl Command {
    pub fn new(name: WorkflowCommand, message: impl Into<String>) -> Self {
        Self {
            name,
            properties: Vec::new(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_properties(mut self, props: Vec<(String, String)>) -> Self {
        self.properties.extend(props);
        self
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CMD_STRING}{}", self.name)?;
        if !self.properties.is_empty() {
            let rendered: Vec<String> = self
                .properties
                .iter()
                .map(|(k, v)| format!("{k}={}", escape_property(v)))
                .collect();
            write!(f, " {}", rendered.join(","))?;
        }
        write!(f, "{CMD_STRING}{}", escape_data(&self.message))
    }
}

/// Location and title metadata attached to `notice`/`warning`/`error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationProperties {
    pub title: Option<String>,
    pub file: Option<String>,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub start_column: Option<u32>,
    pub end_column: Option<u32>,
}

impl AnnotationProperties {
    /// Columns are only meaningful for single-line annotations.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Annotation`] when columns are set on a
    /// multi-line range.
    pub fn validate(&self) -> Result<()> {
        let has_columns = self.start_column.is_some() || self.end_column.is_some();
        if has_columns {
            if let Some(end) = self.end_line {
                if self.start_line != Some(end) {
                    return Err(ToolkitError::Annotation {
                        message: "startColumn and endColumn cannot be sent when startLine and endLine are different values".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Map to command property names (`line`, `col`, `endLine`, ...).
    ///
    /// # Errors
    ///
    /// See [`AnnotationProperties::validate`].
    pub fn to_command_properties(&self) -> Result<Vec<(String, String)>> {
        self.validate()?;
        let mut props = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                props.push((key.to_string(), v));
            }
        };
        push("title", self.title.clone());
        push("file", self.file.clone());
        push("line", self.start_line.map(|n| n.to_string()));
        push("endLine", self.end_line.map(|n| n.to_string()));
        push("col", self.start_column.map(|n| n.to_string()));
        push("endColumn", self.end_column.map(|n| n.to_string()));
        Ok(props)
    }
}

/// Write `command` as one line and flush.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn issue_command<W: Write + ?Sized>(
    out: &mut W,
    command: WorkflowCommand,
    properties: Vec<(String, String)>,
    message: &str,
) -> Result<()> {
    let cmd = Command::new(command, message).with_properties(properties);
    writeln!(out, "{cmd}")?;
    out.flush()?;
    Ok(())
}

/// [`issue_command`] without properties.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn issue<W: Write + ?Sized>(out: &mut W, command: WorkflowCommand, message: &str) -> Result<()> {
    issue_command(out, command, Vec::new(), message)
}

/// Files the runner reads commands from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCommand {
    Output,
    Env,
    State,
    Path,
}

impl FileCommand {
    /// Environment variable holding this file's location.
    #[must_use]
    pub fn env_var(self) -> &'static str {
        match self {
            FileCommand::Output => WorkflowEnv::GITHUB_OUTPUT,
            FileCommand::Env => WorkflowEnv::GITHUB_ENV,
            FileCommand::State => WorkflowEnv::GITHUB_STATE,
            FileCommand::Path => WorkflowEnv::GITHUB_PATH,
        }
    }
}

impl fmt::Display for FileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileCommand::Output => "OUTPUT",
            FileCommand::Env => "ENV",
            FileCommand::State => "STATE",
            FileCommand::Path => "PATH",
        };
        f.write_str(name)
    }
}

/// Append `message` plus a newline to the file at `path`.
///
/// Returns the text written.
///
/// # Errors
///
/// Returns [`ToolkitError::FileCommand`] for an empty path, or an I/O error.
pub fn issue_file_command(command: FileCommand, path: &Path, message: &str) -> Result<String> {
    if path.as_os_str().is_empty() {
        return Err(ToolkitError::FileCommand {
            message: format!("unable to find file path for command {command}"),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let line = format!("{message}\n");
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    tracing::debug!(command = %command, path = %path.display(), "issued file command");
    Ok(line)
}

/// Heredoc-style `key<<delimiter` message for file commands.
///
/// # Errors
///
/// Returns [`ToolkitError::FileCommand`] if the key or value contains the
/// generated delimiter.
pub fn prepare_key_value_message<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4().simple());
    let converted = to_command_value(value);
    if key.contains(&delimiter) {
        return Err(ToolkitError::FileCommand {
            message: format!("unexpected input: name should not contain the delimiter \"{delimiter}\""),
        });
    }
    if converted.contains(&delimiter) {
        return Err(ToolkitError::FileCommand {
            message: format!("unexpected input: value should not contain the delimiter \"{delimiter}\""),
        });
    }
    Ok(format!("{key}<<{delimiter}\n{converted}\n{delimiter}"))
}
