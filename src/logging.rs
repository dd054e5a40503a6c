//! Diagnostics setup on top of `tracing`.
//!
//! Outside of Actions, events are formatted to stderr by `tracing_subscriber::fmt`.
//! When `GITHUB_ACTIONS=true`, [`WorkflowCommandLayer`] renders them as
//! workflow commands instead, so warnings and errors become annotations in
//! the run UI.
//!
//! Both paths write to stderr; stdout is reserved for command output such as
//! `action-toolkit input`.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Once;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::command::{Command, WorkflowCommand};
use crate::env::Environment;

static INIT: Once = Once::new();

pub const LOG_LEVEL_ENV: &str = "ACTION_TOOLKIT_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: Level,
    /// Emit `::error::`/`::warning::`/`::debug::` instead of formatted lines.
    pub workflow_commands: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            workflow_commands: false,
        }
    }
}

impl LoggingConfig {
    /// Resolve the level from, in order: `explicit`, `ACTION_TOOLKIT_LOG_LEVEL`,
    /// `quiet` (error), `verbose` (debug), `RUNNER_DEBUG=1` (debug), then info.
    #[must_use]
    pub fn resolve<E: Environment + ?Sized>(
        env: &E,
        explicit: Option<&str>,
        verbose: bool,
        quiet: bool,
    ) -> Self {
        let from_env = env.non_empty(LOG_LEVEL_ENV);
        let named = explicit.or(from_env.as_deref()).and_then(parse_level);
        let level = match named {
            Some(level) => level,
            None if quiet => Level::ERROR,
            None if verbose => Level::DEBUG,
            None if env.var("RUNNER_DEBUG").as_deref() == Some("1") => Level::DEBUG,
            None => Level::INFO,
        };
        Self {
            level,
            workflow_commands: env.var("GITHUB_ACTIONS").as_deref() == Some("true"),
        }
    }
}

/// Case-insensitive level name; `warning` is accepted for `warn`.
#[must_use]
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber. Later calls are no-ops.
///
/// `RUST_LOG`, when set, overrides `config.level`.
pub fn init(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(config.level).into())
            .from_env_lossy();

        let result = if config.workflow_commands {
            tracing_subscriber::registry()
                .with(filter)
                .with(WorkflowCommandLayer::new(std::io::stderr))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .compact(),
                )
                .try_init()
        };
        if let Err(e) = result {
            eprintln!("action-toolkit: logging already initialised: {e}");
        }
    });
}

/// Collects the `message` field and renders the rest as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

/// A [`Layer`] that writes each event as a workflow command line.
///
/// | level        | output             |
/// |--------------|--------------------|
/// | ERROR        | `::error::msg`     |
/// | WARN         | `::warning::msg`   |
/// | INFO         | `msg`              |
/// | DEBUG, TRACE | `::debug::msg`     |
pub struct WorkflowCommandLayer<M> {
    make_writer: M,
}

impl<M> WorkflowCommandLayer<M>
where
    M: for<'w> MakeWriter<'w> + 'static,
{
    pub fn new(make_writer: M) -> Self {
        Self { make_writer }
    }
}

/// Render one event for the runner.
#[must_use]
pub fn render_event(level: Level, text: &str) -> String {
    let command = match level {
        Level::ERROR => WorkflowCommand::Error,
        Level::WARN => WorkflowCommand::Warning,
        Level::INFO => return text.to_string(),
        _ => WorkflowCommand::Debug,
    };
    Command::new(command, text).to_string()
}

impl<S, M> Layer<S> for WorkflowCommandLayer<M>
where
    S: Subscriber,
    M: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let text = format!("{}{}", visitor.message, visitor.fields);
        let line = render_event(*event.metadata().level(), &text);
        let mut writer = self.make_writer.make_writer();
        let _ = writeln!(writer, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnv;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;
        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buf = Buffer::default();
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::TRACE)
            .with(WorkflowCommandLayer::new(buf.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn parse_level_names() {
        assert_eq!(parse_level("TRACE"), Some(Level::TRACE));
        assert_eq!(parse_level("Debug"), Some(Level::DEBUG));
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level(" error "), Some(Level::ERROR));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn resolve_precedence() {
        let env = MemoryEnv::new().with(LOG_LEVEL_ENV, "warn");
        assert_eq!(LoggingConfig::resolve(&env, Some("trace"), false, true).level, Level::TRACE);
        assert_eq!(LoggingConfig::resolve(&env, None, true, false).level, Level::WARN);

        let empty = MemoryEnv::new();
        assert_eq!(LoggingConfig::resolve(&empty, None, true, true).level, Level::ERROR);
        assert_eq!(LoggingConfig::resolve(&empty, None, true, false).level, Level::DEBUG);
        assert_eq!(LoggingConfig::resolve(&empty, None, false, false), LoggingConfig::default());
    }

    #[test]
    fn runner_debug_and_actions_detection() {
        let env = MemoryEnv::new()
            .with("RUNNER_DEBUG", "1")
            .with("GITHUB_ACTIONS", "true");
        let config = LoggingConfig::resolve(&env, None, false, false);
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.workflow_commands);
    }

    #[test]
    fn render_maps_levels() {
        assert_eq!(render_event(Level::ERROR, "bad"), "::error::bad");
        assert_eq!(render_event(Level::WARN, "hmm"), "::warning::hmm");
        assert_eq!(render_event(Level::INFO, "fine"), "fine");
        assert_eq!(render_event(Level::INFO, "100%"), "100%");
        assert_eq!(render_event(Level::TRACE, "x"), "::debug::x");
        assert_eq!(render_event(Level::ERROR, "a\nb"), "::error::a%0Ab");
    }

    #[test]
    fn layer_renders_events_with_fields() {
        let out = capture(|| {
            tracing::error!(exit_code = 3, "uv sync failed");
            tracing::info!("plain");
            tracing::debug!(path = %"a.txt", "looked");
        });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "::error::uv sync failed exit_code=3");
        assert_eq!(lines[1], "plain");
        assert_eq!(lines[2], "::debug::looked path=a.txt");
    }
}
