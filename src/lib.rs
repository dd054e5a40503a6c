pub mod action;
pub mod command;
pub mod context;
pub mod env;
pub mod errors;
pub mod exec;
pub mod io;
pub mod logging;
pub mod manifest;
pub mod path_utils;
pub mod platform;
pub mod playground;
pub mod setup;
pub mod summary;
pub mod sync;

// Re-export key types at crate root for convenience.
pub use action::{Action, ExitCode, InputOptions, MultilineInputOptions};
pub use command::{AnnotationProperties, Command, FileCommand, WorkflowCommand};
pub use context::{GithubContext, RunnerContext};
pub use env::{Environment, MemoryEnv, ProcessEnv};
pub use errors::{Result, ToolkitError};
pub use exec::{ExecOptions, ProcessResult};
pub use io::{FileKind, FileStat};
pub use manifest::ActionManifest;
pub use platform::{get_platform, PlatformInfo};
pub use summary::{Summary, SummaryTableCell};
