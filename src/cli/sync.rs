use action_toolkit::exec::{command_string, OutputStream};
use action_toolkit::sync::{self as uv_sync, SyncFlags};
use action_toolkit::{ProcessEnv, Result};

pub(crate) fn run(dry_run: bool, uv: &str) -> Result<i32> {
    let flags = SyncFlags::from_env(&ProcessEnv);
    let commands = flags.commands(uv);
    if dry_run {
        for cmd in &commands {
            println!("{}", command_string(cmd));
        }
    }
    uv_sync::execute(&commands, dry_run, |line| match line.stream {
        OutputStream::Stdout => println!("{}", line.line),
        OutputStream::Stderr => eprintln!("{}", line.line),
    })
}
