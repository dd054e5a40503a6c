use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use action_toolkit::logging::{self, LoggingConfig};
use action_toolkit::playground::AsyncChoice;
use action_toolkit::{Action, Environment, ProcessEnv, ToolkitError};

mod annotate;
mod context;
mod exec;
mod input;
mod manifest;
mod outputs;
mod playground;
mod setup;
mod summary;
mod sync;
mod which;

#[derive(Parser)]
#[command(
    name = "action-toolkit",
    version,
    about = "Workflow commands, inputs, outputs and process helpers for GitHub Actions"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Show project information
    #[arg(long)]
    about: bool,

    /// Log level (trace, debug, info, warn, error); overrides ACTION_TOOLKIT_LOG_LEVEL
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

/// Output format for structured results.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Format {
    /// One `key: value` line per field (default)
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Annotation severity.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Level {
    Debug,
    Notice,
    Warning,
    Error,
}

#[derive(Subcommand)]
#[command(next_display_order = None)]
enum Commands {
    /// Print an action input (INPUT_<NAME>)
    Input {
        name: String,
        /// Fail when the input is missing or empty
        #[arg(long)]
        required: bool,
        /// Keep leading and trailing whitespace
        #[arg(long)]
        no_trim: bool,
        /// Print one line per non-empty input line
        #[arg(long, conflicts_with = "as_bool")]
        multiline: bool,
        /// Parse as a boolean and print `true` or `false`
        #[arg(long = "bool")]
        as_bool: bool,
        /// With --bool, accept only true|True|TRUE|false|False|FALSE
        #[arg(long, requires = "as_bool")]
        strict: bool,
    },
    /// Set a step output
    SetOutput { name: String, value: String },
    /// Export an environment variable to later steps
    Export { name: String, value: String },
    /// Prepend a directory to PATH for this and later steps
    AddPath { dir: PathBuf },
    /// Mask a value in the log
    Mask { value: String },
    /// Save state for the post step
    SaveState { name: String, value: String },
    /// Print state saved by the main step (STATE_<name>)
    GetState { name: String },
    /// Emit a debug, notice, warning or error annotation
    Annotate {
        #[arg(value_enum)]
        level: Level,
        message: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        line: Option<u32>,
        #[arg(long)]
        end_line: Option<u32>,
        #[arg(long)]
        col: Option<u32>,
        #[arg(long)]
        end_column: Option<u32>,
    },
    /// Open a collapsible log group
    Group { name: String },
    /// Close the current log group
    Endgroup,
    /// Append to the job summary (GITHUB_STEP_SUMMARY)
    Summary {
        /// Heading text
        #[arg(long)]
        heading: Option<String>,
        /// Heading level, 1-6
        #[arg(long, default_value_t = 1)]
        heading_level: u8,
        /// Raw text or HTML, one line each; repeatable
        #[arg(long)]
        text: Vec<String>,
        /// Code block content
        #[arg(long)]
        code: Option<String>,
        /// Language of --code
        #[arg(long, requires = "code")]
        lang: Option<String>,
        /// List item; repeatable
        #[arg(long = "list")]
        items: Vec<String>,
        /// Render --list as an ordered list
        #[arg(long)]
        ordered: bool,
        /// Table row as comma-separated cells; the first row is the header
        #[arg(long = "row")]
        rows: Vec<String>,
        /// Quoted text
        #[arg(long)]
        quote: Option<String>,
        /// Link as TEXT=HREF
        #[arg(long)]
        link: Option<String>,
        /// Append a horizontal rule
        #[arg(long)]
        separator: bool,
        /// Replace the summary file instead of appending
        #[arg(long)]
        overwrite: bool,
        /// Empty the summary file and exit
        #[arg(long)]
        clear: bool,
        /// Print the rendered HTML instead of writing it
        #[arg(long)]
        print: bool,
    },
    /// Print the github (or runner) context
    Context {
        /// Print the runner context instead
        #[arg(long)]
        runner: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the host platform
    Platform {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Locate an executable on PATH
    Which {
        tool: String,
        /// Report a missing tool as an error
        #[arg(long)]
        check: bool,
    },
    /// Run a command, streaming its output and forwarding its exit code
    Exec {
        /// Working directory
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Extra environment as KEY=VALUE; repeatable
        #[arg(long = "env", value_name = "KEY=VALUE")]
        vars: Vec<String>,
        /// Text written to stdin
        #[arg(long)]
        input: Option<String>,
        /// Kill the command after this many seconds
        #[arg(long)]
        timeout: Option<f64>,
        /// Run through the platform shell
        #[arg(long)]
        shell: bool,
        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run `uv sync` with flags from SYNC_LOCKED, INSTALL_DEV, INSTALL_ALL, SHOW_PACKAGES
    Sync {
        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
        /// uv binary
        #[arg(long, env = "ACTION_TOOLKIT_UV", default_value = "uv")]
        uv: String,
    },
    /// Read setup inputs and output the pinned runtime version
    Setup {
        /// Version pin file; defaults to the python-version-file input or .python-version
        #[arg(long)]
        version_file: Option<PathBuf>,
    },
    /// Run a script from the playground directory
    Playground {
        /// Script name; defaults to the `script` input or playground.py
        #[arg(long)]
        script: Option<String>,
        /// yes or no; defaults to the `run-async` input
        #[arg(long)]
        run_async: Option<AsyncChoice>,
        /// Directory holding the scripts
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Interpreter used to run the script
        #[arg(long)]
        interpreter: Option<String>,
    },
    /// Show an action.yml and check its required inputs
    Manifest {
        #[arg(default_value = "action.yml")]
        path: PathBuf,
        /// Fail when required inputs without defaults are unset
        #[arg(long)]
        check_inputs: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Input { .. } => "input",
            Commands::SetOutput { .. } => "set-output",
            Commands::Export { .. } => "export",
            Commands::AddPath { .. } => "add-path",
            Commands::Mask { .. } => "mask",
            Commands::SaveState { .. } => "save-state",
            Commands::GetState { .. } => "get-state",
            Commands::Annotate { .. } => "annotate",
            Commands::Group { .. } => "group",
            Commands::Endgroup => "endgroup",
            Commands::Summary { .. } => "summary",
            Commands::Context { .. } => "context",
            Commands::Platform { .. } => "platform",
            Commands::Which { .. } => "which",
            Commands::Exec { .. } => "exec",
            Commands::Sync { .. } => "sync",
            Commands::Setup { .. } => "setup",
            Commands::Playground { .. } => "playground",
            Commands::Manifest { .. } => "manifest",
        }
    }
}

pub fn run(cli: Cli) {
    if cli.about {
        print_about();
        return;
    }

    logging::init(LoggingConfig::resolve(
        &ProcessEnv,
        cli.log_level.as_deref(),
        cli.verbose,
        cli.quiet,
    ));

    let Some(command) = cli.command else {
        eprintln!("Usage: action-toolkit <command> [args]");
        eprintln!("Run `action-toolkit --help` for details.");
        std::process::exit(1);
    };
    let name = command.name();

    let outcome = match command {
        Commands::Input {
            name,
            required,
            no_trim,
            multiline,
            as_bool,
            strict,
        } => input::run(&name, required, no_trim, multiline, as_bool, strict),
        Commands::SetOutput { name, value } => outputs::set_output(&name, &value),
        Commands::Export { name, value } => outputs::export(&name, &value),
        Commands::AddPath { dir } => outputs::add_path(&dir),
        Commands::Mask { value } => outputs::mask(&value),
        Commands::SaveState { name, value } => outputs::save_state(&name, &value),
        Commands::GetState { name } => outputs::get_state(&name),
        Commands::Annotate {
            level,
            message,
            title,
            file,
            line,
            end_line,
            col,
            end_column,
        } => annotate::run(
            level,
            &message,
            action_toolkit::AnnotationProperties {
                title,
                file,
                start_line: line,
                end_line,
                start_column: col,
                end_column,
            },
        ),
        Commands::Group { name } => annotate::group(&name),
        Commands::Endgroup => annotate::endgroup(),
        Commands::Summary {
            heading,
            heading_level,
            text,
            code,
            lang,
            items,
            ordered,
            rows,
            quote,
            link,
            separator,
            overwrite,
            clear,
            print,
        } => summary::run(summary::SummaryArgs {
            heading,
            heading_level,
            text,
            code,
            lang,
            items,
            ordered,
            rows,
            quote,
            link,
            separator,
            overwrite,
            clear,
            print,
        }),
        Commands::Context { runner, format } => context::run(runner, format),
        Commands::Platform { format } => context::platform(format),
        Commands::Which { tool, check } => which::run(&tool, check),
        Commands::Exec {
            cwd,
            vars,
            input,
            timeout,
            shell,
            dry_run,
            args,
        } => exec::run(exec::ExecArgs {
            cwd,
            vars,
            input,
            timeout,
            shell,
            dry_run,
            args,
        }),
        Commands::Sync { dry_run, uv } => sync::run(dry_run, &uv),
        Commands::Setup { version_file } => setup::run(version_file),
        Commands::Playground {
            script,
            run_async,
            dir,
            interpreter,
        } => playground::run(script, run_async, dir, interpreter),
        Commands::Manifest {
            path,
            check_inputs,
            format,
        } => manifest::run(&path, check_inputs, format),
    };

    match outcome {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => fail(name, &e),
    }
}

fn fail(command: &str, e: &ToolkitError) -> ! {
    eprintln!("action-toolkit {command}: {e}");
    if ProcessEnv.var("GITHUB_ACTIONS").as_deref() == Some("true") {
        let _ = Action::from_process().set_failed(e);
    }
    std::process::exit(e.exit_code());
}

/// Print a JSON-serialisable value as `key: value` lines or pretty JSON.
fn print_structured<T: serde::Serialize>(value: &T, format: Format) -> action_toolkit::Result<()> {
    let json = serde_json::to_value(value)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&json)?),
        Format::Text => match json {
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        serde_json::Value::String(s) => println!("{key}: {s}"),
                        other => println!("{key}: {other}"),
                    }
                }
            }
            other => println!("{other}"),
        },
    }
    Ok(())
}

fn print_about() {
    println!(
        "action-toolkit: GitHub Actions toolkit\n\
         ├─ version:    {}\n\
         ├─ author:     {}\n\
         ├─ source:     {}\n\
         └─ licence:    {} https://www.apache.org/licenses/LICENSE-2.0",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS"),
        env!("CARGO_PKG_REPOSITORY"),
        env!("CARGO_PKG_LICENSE"),
    );
}
