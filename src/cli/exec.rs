use std::path::PathBuf;
use std::time::Duration;

use action_toolkit::exec::{self, OutputStream};
use action_toolkit::{ExecOptions, Result, ToolkitError};

pub(crate) struct ExecArgs {
    pub cwd: Option<PathBuf>,
    pub vars: Vec<String>,
    pub input: Option<String>,
    pub timeout: Option<f64>,
    pub shell: bool,
    pub dry_run: bool,
    pub args: Vec<String>,
}

fn options(args: &ExecArgs) -> Result<ExecOptions> {
    let mut opts = ExecOptions::default().shell(args.shell);
    if let Some(cwd) = &args.cwd {
        opts = opts.cwd(cwd);
    }
    for var in &args.vars {
        let (key, value) = var.split_once('=').ok_or_else(|| ToolkitError::Input {
            name: "env".into(),
            reason: format!("expected KEY=VALUE, got '{var}'"),
        })?;
        opts = opts.env(key, value);
    }
    if let Some(input) = &args.input {
        opts = opts.input(input.as_bytes());
    }
    if let Some(secs) = args.timeout {
        let timeout = Duration::try_from_secs_f64(secs).map_err(|_| ToolkitError::Input {
            name: "timeout".into(),
            reason: format!("invalid timeout: {secs}"),
        })?;
        opts = opts.timeout(timeout);
    }
    Ok(opts)
}

pub(crate) fn run(args: ExecArgs) -> Result<i32> {
    let opts = options(&args)?;
    if args.dry_run {
        let result = exec::run(&args.args, opts.dry_run(true))?;
        println!("{}", result.command);
        return Ok(0);
    }
    exec::stream(&args.args, opts, |line| match line.stream {
        OutputStream::Stdout => println!("{}", line.line),
        OutputStream::Stderr => eprintln!("{}", line.line),
    })
}
