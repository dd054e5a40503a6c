use thiserror::Error;

/// Errors that can occur while talking to the Actions runner.
#[derive(Error, Debug)]
pub enum ToolkitError {
    /// An action input was missing or could not be interpreted.
    #[error("input error: {name}: {reason}")]
    Input { name: String, reason: String },

    /// Annotation properties violate the runner's constraints.
    #[error("annotation error: {message}")]
    Annotation { message: String },

    /// A file command (`GITHUB_OUTPUT`, `GITHUB_ENV`, ...) could not be issued.
    #[error("file command error: {message}")]
    FileCommand { message: String },

    /// The job summary file is unavailable.
    #[error("summary error: {message}")]
    Summary { message: String },

    /// An environment variable was missing or malformed.
    #[error("environment error: {key}: {reason}")]
    Env { key: String, reason: String },

    /// `action.yml` metadata was malformed.
    #[error("manifest error: {message}")]
    Manifest { message: String },

    /// An empty or malformed command line was given to exec.
    #[error("invalid command: {command:?}")]
    InvalidCommand { command: String },

    /// A process exited with a non-zero status.
    #[error("command failed with exit code {exit_code}: {command}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The program could not be found.
    #[error("command not found: {command}")]
    CommandNotFound { command: String },

    /// A process exceeded its time limit and was killed.
    #[error("command timed out after {timeout_secs:.1}s: {command}")]
    CommandTimeout { command: String, timeout_secs: f64 },

    /// A filesystem helper refused to act.
    #[error("io error: {message}")]
    Fs { message: String },

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ToolkitError {
    /// Exit code a CLI should use for this error.
    ///
    /// Failed commands forward the child's code; everything else is `1`.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolkitError::CommandFailed { exit_code, .. } if *exit_code > 0 => *exit_code,
            _ => 1,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\nstderr: {trimmed}")
    }
}

/// Convenience alias for `Result<T, ToolkitError>`.
pub type Result<T> = std::result::Result<T, ToolkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_includes_trimmed_stderr() {
        let err = ToolkitError::CommandFailed {
            command: "false".into(),
            exit_code: 3,
            stdout: String::new(),
            stderr: "  boom\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "command failed with exit code 3: false\nstderr: boom"
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn command_failed_without_stderr_has_no_suffix() {
        let err = ToolkitError::CommandFailed {
            command: "false".into(),
            exit_code: 1,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "command failed with exit code 1: false");
    }

    #[test]
    fn other_errors_exit_with_one() {
        let err = ToolkitError::CommandNotFound {
            command: "nope".into(),
        };
        assert_eq!(err.exit_code(), 1);
    }
}
