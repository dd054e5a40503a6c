//! Process execution.
//!
//! The async API ([`run_async`], [`stream_async`]) runs on tokio; the
//! blocking wrappers ([`run`], [`stream`], and the helpers built on them)
//! drive it on a private current-thread runtime and so must not be called
//! from inside another tokio runtime.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::{Result, ToolkitError};

/// How to run a command.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory; inherits the caller's when `None`.
    pub cwd: Option<PathBuf>,
    /// Variables layered over the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Bytes written to the child's stdin.
    pub input: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
    /// Join the arguments and run them through the platform shell.
    pub shell: bool,
    /// Suppress debug logging of the command and its output.
    pub silent: bool,
    /// Turn a non-zero exit into [`ToolkitError::CommandFailed`].
    pub check: bool,
    /// Log the command and return success without running it.
    pub dry_run: bool,
}

impl ExecOptions {
    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    #[must_use]
    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Display form of what was run.
    pub command: String,
    /// Exit status; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        !self.success()
    }

    /// Stdout lines without the trailing newline.
    #[must_use]
    pub fn stdout_lines(&self) -> Vec<&str> {
        split_output(&self.stdout)
    }

    #[must_use]
    pub fn stderr_lines(&self) -> Vec<&str> {
        split_output(&self.stderr)
    }

    /// # Errors
    ///
    /// Returns [`ToolkitError::CommandFailed`] if the process failed.
    pub fn check(&self) -> Result<()> {
        if self.failed() {
            return Err(ToolkitError::CommandFailed {
                command: self.command.clone(),
                exit_code: self.exit_code,
                stdout: self.stdout.clone(),
                stderr: self.stderr.clone(),
            });
        }
        Ok(())
    }

    /// Run `args` with this result's stdout as its stdin.
    ///
    /// Any `input` already set on `opts` is replaced.
    ///
    /// # Errors
    ///
    /// See [`run`].
    pub fn pipe_to<S: AsRef<str>>(&self, args: &[S], opts: ExecOptions) -> Result<ProcessResult> {
        run(args, opts.input(self.stdout.clone()))
    }
}

fn split_output(s: &str) -> Vec<&str> {
    if s.is_empty() {
        return Vec::new();
    }
    s.strip_suffix('\n')
        .unwrap_or(s)
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

/// Shell-quoted display form of `args`, for logs.
#[must_use]
pub fn command_string<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|a| quote_arg(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}

fn build_command<S: AsRef<str>>(args: &[S], opts: &ExecOptions) -> Result<(Command, String)> {
    let parts: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
    if parts.first().map_or(true, |p| p.trim().is_empty()) {
        return Err(ToolkitError::InvalidCommand {
            command: command_string(&parts),
        });
    }

    let (mut cmd, shown) = if opts.shell {
        let joined = parts.join(" ");
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C");
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c");
            c
        };
        cmd.arg(&joined);
        (cmd, joined)
    } else {
        let mut cmd = Command::new(parts[0]);
        cmd.args(&parts[1..]);
        (cmd, command_string(&parts))
    };

    if let Some(dir) = &opts.cwd {
        cmd.current_dir(dir);
    }
    cmd.envs(&opts.env)
        .stdin(if opts.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    Ok((cmd, shown))
}

fn spawn(cmd: &mut Command, shown: &str) -> Result<Child> {
    cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ToolkitError::CommandNotFound {
            command: shown.to_string(),
        },
        _ => ToolkitError::Io(e),
    })
}

fn feed_stdin(child: &mut Child, input: Option<Vec<u8>>) {
    if let (Some(mut stdin), Some(bytes)) = (child.stdin.take(), input) {
        tokio::spawn(async move {
            // A child that exits without reading its input closes the pipe.
            let _ = stdin.write_all(&bytes).await;
        });
    }
}

fn timed_out(shown: &str, timeout: Duration) -> ToolkitError {
    ToolkitError::CommandTimeout {
        command: shown.to_string(),
        timeout_secs: timeout.as_secs_f64(),
    }
}

/// Run `args` to completion, capturing stdout and stderr.
///
/// # Errors
///
/// - [`ToolkitError::InvalidCommand`] for an empty command
/// - [`ToolkitError::CommandNotFound`] when the program does not exist
/// - [`ToolkitError::CommandTimeout`] when `timeout` elapses (the child is killed)
/// - [`ToolkitError::CommandFailed`] for a non-zero exit when `check` is set
pub async fn run_async<S: AsRef<str>>(args: &[S], opts: ExecOptions) -> Result<ProcessResult> {
    let (mut cmd, shown) = build_command(args, &opts)?;

    if opts.dry_run {
        tracing::info!("[dry run] would execute: {shown}");
        return Ok(ProcessResult {
            command: shown,
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        });
    }
    if !opts.silent {
        tracing::debug!("executing: {shown}");
    }

    let mut child = spawn(&mut cmd, &shown)?;
    feed_stdin(&mut child, opts.input.clone());

    let output = match opts.timeout {
        Some(t) => tokio::time::timeout(t, child.wait_with_output())
            .await
            .map_err(|_| timed_out(&shown, t))??,
        None => child.wait_with_output().await?,
    };

    let result = ProcessResult {
        command: shown,
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if !opts.silent {
        tracing::debug!(
            exit_code = result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "finished: {}",
            result.command
        );
    }
    if opts.check {
        result.check()?;
    }
    Ok(result)
}

fn block_on<F: std::future::Future>(fut: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(fut))
}

/// Blocking [`run_async`].
///
/// # Errors
///
/// See [`run_async`].
pub fn run<S: AsRef<str>>(args: &[S], opts: ExecOptions) -> Result<ProcessResult> {
    block_on(run_async(args, opts))?
}

/// Which pipe a streamed line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// One line of streamed output, without its newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub line: String,
}

/// A running process whose output is delivered line by line.
#[derive(Debug)]
pub struct StreamHandle {
    command: String,
    child: Child,
    lines: mpsc::UnboundedReceiver<OutputLine>,
    readers: Vec<JoinHandle<()>>,
    timeout: Option<Duration>,
}

impl StreamHandle {
    /// Next line from either pipe, or `None` once both are closed.
    pub async fn next_line(&mut self) -> Option<OutputLine> {
        self.lines.recv().await
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// Undelivered lines are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::CommandTimeout`] when the timeout elapses, or
    /// an I/O error.
    pub async fn wait(mut self) -> Result<i32> {
        let status = match self.timeout {
            Some(t) => match tokio::time::timeout(t, self.child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    let _ = self.child.kill().await;
                    return Err(timed_out(&self.command, t));
                }
            },
            None => self.child.wait().await?,
        };
        for reader in self.readers.drain(..) {
            let _ = reader.await;
        }
        Ok(status.code().unwrap_or(-1))
    }
}

fn forward_lines<R>(
    pipe: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<OutputLine>,
    silent: bool,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = decode_line(&buf);
            if !silent {
                tracing::debug!("[{stream}] {line}");
            }
            if tx.send(OutputLine { stream, line }).is_err() {
                break;
            }
        }
    })
}

/// Lossy UTF-8 text of one raw line, without its line ending.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Spawn `args` and stream stdout and stderr as they are produced.
///
/// `check` and `dry_run` do not apply to streams.
///
/// # Errors
///
/// Returns [`ToolkitError::InvalidCommand`] or
/// [`ToolkitError::CommandNotFound`] when the process cannot start.
pub async fn stream_async<S: AsRef<str>>(args: &[S], opts: ExecOptions) -> Result<StreamHandle> {
    let (mut cmd, shown) = build_command(args, &opts)?;
    if !opts.silent {
        tracing::debug!("streaming: {shown}");
    }
    let mut child = spawn(&mut cmd, &shown)?;
    feed_stdin(&mut child, opts.input.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    let mut readers = Vec::new();
    if let Some(out) = child.stdout.take() {
        readers.push(forward_lines(out, OutputStream::Stdout, tx.clone(), opts.silent));
    }
    if let Some(err) = child.stderr.take() {
        readers.push(forward_lines(err, OutputStream::Stderr, tx.clone(), opts.silent));
    }
    drop(tx);

    Ok(StreamHandle {
        command: shown,
        child,
        lines: rx,
        readers,
        timeout: opts.timeout,
    })
}

/// Blocking stream: call `on_line` for every line, then return the exit code.
///
/// # Errors
///
/// See [`stream_async`] and [`StreamHandle::wait`].
pub fn stream<S, F>(args: &[S], opts: ExecOptions, mut on_line: F) -> Result<i32>
where
    S: AsRef<str>,
    F: FnMut(&OutputLine),
{
    block_on(async move {
        let mut handle = stream_async(args, opts).await?;
        let command = handle.command.clone();
        let timeout = handle.timeout.take();
        let drive = async move {
            while let Some(line) = handle.next_line().await {
                on_line(&line);
            }
            handle.wait().await
        };
        // The timeout spans reading and waiting; dropping `drive` kills the child.
        match timeout {
            Some(t) => tokio::time::timeout(t, drive)
                .await
                .map_err(|_| timed_out(&command, t))?,
            None => drive.await,
        }
    })?
}

/// Run `command` through the shell, failing on a non-zero exit.
///
/// # Errors
///
/// See [`run`].
pub fn shell(command: &str, opts: ExecOptions) -> Result<ProcessResult> {
    run(&[command], opts.shell(true).check(true))
}

/// Stdout of a successful run, trimmed.
///
/// # Errors
///
/// See [`run`]; a non-zero exit is an error.
pub fn output<S: AsRef<str>>(args: &[S], opts: ExecOptions) -> Result<String> {
    Ok(run(args, opts.check(true))?.stdout.trim().to_string())
}

/// Stdout of a successful run, untouched.
///
/// # Errors
///
/// See [`run`]; a non-zero exit is an error.
pub fn check_output<S: AsRef<str>>(args: &[S], opts: ExecOptions) -> Result<String> {
    Ok(run(args, opts.check(true))?.stdout)
}

/// Run commands in sequence, feeding each one's stdout to the next.
///
/// # Errors
///
/// Returns [`ToolkitError::InvalidCommand`] for an empty pipeline, or the
/// first stage's error.
pub fn pipeline<S: AsRef<str>>(commands: &[Vec<S>], opts: ExecOptions) -> Result<ProcessResult> {
    let (first, rest) = commands.split_first().ok_or(ToolkitError::InvalidCommand {
        command: String::new(),
    })?;
    let mut result = run(first.as_slice(), opts.clone())?;
    for stage in rest {
        result = result.pipe_to(stage.as_slice(), opts.clone())?;
    }
    Ok(result)
}
