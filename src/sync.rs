//! Dependency sync driven by `SYNC_LOCKED`, `INSTALL_DEV`, `INSTALL_ALL`
//! and `SHOW_PACKAGES`.

use serde::Serialize;

use crate::env::Environment;
use crate::errors::Result;
use crate::exec::{self, command_string, ExecOptions, OutputLine};

pub const SYNC_LOCKED: &str = "SYNC_LOCKED";
pub const INSTALL_DEV: &str = "INSTALL_DEV";
pub const INSTALL_ALL: &str = "INSTALL_ALL";
pub const SHOW_PACKAGES: &str = "SHOW_PACKAGES";

/// Which flags to pass to `uv sync`. Each is set only by the exact string
/// `"true"`; `True`, `1` and `yes` all count as false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncFlags {
    pub locked: bool,
    pub dev: bool,
    pub all_extras: bool,
    pub show_packages: bool,
}

impl SyncFlags {
    #[must_use]
    pub fn from_env<E: Environment + ?Sized>(env: &E) -> Self {
        let flag = |key: &str| env.var(key).as_deref() == Some("true");
        Self {
            locked: flag(SYNC_LOCKED),
            dev: flag(INSTALL_DEV),
            all_extras: flag(INSTALL_ALL),
            show_packages: flag(SHOW_PACKAGES),
        }
    }

    /// Arguments after the `uv` binary.
    #[must_use]
    pub fn sync_args(&self) -> Vec<String> {
        let mut args = vec!["sync".to_string()];
        if self.locked {
            args.push("--locked".into());
        }
        args.push(if self.dev { "--dev" } else { "--no-dev" }.into());
        if self.all_extras {
            args.push("--all-extras".into());
        }
        args
    }

    /// Every command to run, in order, with `uv` as the first argument.
    #[must_use]
    pub fn commands(&self, uv: &str) -> Vec<Vec<String>> {
        let mut sync = vec![uv.to_string()];
        sync.extend(self.sync_args());
        let mut commands = vec![sync];
        if self.show_packages {
            commands.push(vec![uv.to_string(), "tree".to_string()]);
        }
        commands
    }
}

/// Run `commands` in order, streaming output to `on_line`.
///
/// Stops at the first non-zero exit and returns that code; returns 0 when
/// everything succeeds. With `dry_run` the commands are only logged.
///
/// # Errors
///
/// Returns an error when a command cannot be started.
pub fn execute<F>(commands: &[Vec<String>], dry_run: bool, mut on_line: F) -> Result<i32>
where
    F: FnMut(&OutputLine),
{
    for args in commands {
        if dry_run {
            tracing::info!("[dry run] would execute: {}", command_string(args));
            continue;
        }
        tracing::info!("running {}", command_string(args));
        let code = exec::stream(args, ExecOptions::default(), &mut on_line)?;
        if code != 0 {
            tracing::error!(exit_code = code, "{} failed", command_string(args));
            return Ok(code);
        }
    }
    Ok(0)
}
