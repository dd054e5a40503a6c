use std::path::PathBuf;

use action_toolkit::exec::OutputStream;
use action_toolkit::playground::{self as pg, AsyncChoice, PlaygroundOptions};
use action_toolkit::{Action, Result};

pub(crate) fn run(
    script: Option<String>,
    run_async: Option<AsyncChoice>,
    dir: Option<PathBuf>,
    interpreter: Option<String>,
) -> Result<i32> {
    let mut action = Action::from_process();
    let mut opts = match run_async {
        Some(choice) => PlaygroundOptions::new(choice),
        None => PlaygroundOptions::from_action(&action)?,
    };
    if let Some(script) = script {
        opts.script = script;
    }
    if let Some(dir) = dir {
        opts.dir = dir;
    }
    if let Some(interpreter) = interpreter {
        opts.interpreter = interpreter;
    }

    pg::run(&mut action, &opts, |line| match line.stream {
        OutputStream::Stdout => println!("{}", line.line),
        OutputStream::Stderr => eprintln!("{}", line.line),
    })
}
