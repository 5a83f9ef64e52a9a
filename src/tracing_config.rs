//! Tracing subscriber setup for the command-line tool
//!
//! Library code only emits `tracing` spans and `log` records; this module
//! is where the binary decides how they are rendered.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Colored, compact console output (CLI default)
    Console,
    /// Plain console output without ANSI colors, for CI logs
    Compact,
    /// One JSON object per event
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TracingOutput {
    /// stderr
    Console,
    /// A single log file
    #[cfg(feature = "tracing-files")]
    File(std::path::PathBuf),
    /// stderr plus a daily-rolled log file
    #[cfg(feature = "tracing-files")]
    Both(std::path::PathBuf),
}

/// Keeps background log writers alive; drop it only at process exit
#[must_use = "dropping the guard stops file logging"]
#[derive(Default)]
pub struct TracingGuard {
    #[cfg(feature = "tracing-files")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Count of `-v` flags
    pub verbosity: u8,
    pub format: TracingFormat,
    pub output: TracingOutput,
    /// Explicit filter directives; replaces the verbosity mapping
    pub env_filter: Option<String>,
    /// Correlates all events of one CLI invocation
    pub session_id: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Console,
            output: TracingOutput::Console,
            env_filter: None,
            session_id: None,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Filter directives for the configured verbosity
    ///
    /// Our own crate gets the requested level; dependencies stay at warn
    /// so HTTP and image decoder internals do not flood the output.
    #[must_use]
    pub fn verbosity_to_filter(&self) -> String {
        let level = match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        format!("warn,designs4u={level}")
    }

    /// Install the global subscriber
    pub fn init(self) -> anyhow::Result<TracingGuard> {
        use tracing_subscriber::fmt;

        let directives = self
            .env_filter
            .clone()
            .unwrap_or_else(|| self.verbosity_to_filter());
        let filter = EnvFilter::try_new(&directives)?;
        let registry = Registry::default().with(filter);
        #[allow(unused_mut)]
        let mut guard = TracingGuard::default();

        match (&self.format, &self.output) {
            (TracingFormat::Console, TracingOutput::Console) => {
                registry
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stderr)
                            .with_target(false)
                            .compact(),
                    )
                    .try_init()?;
            },
            (TracingFormat::Compact, TracingOutput::Console) => {
                registry
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stderr)
                            .with_ansi(false)
                            .with_target(false)
                            .compact(),
                    )
                    .try_init()?;
            },
            #[cfg(feature = "tracing-json")]
            (TracingFormat::Json, TracingOutput::Console) => {
                registry
                    .with(
                        fmt::layer()
                            .json()
                            .with_writer(std::io::stderr)
                            .with_current_span(true),
                    )
                    .try_init()?;
            },
            #[cfg(feature = "tracing-files")]
            (_, TracingOutput::File(path)) => {
                let (writer, file_guard) = file_writer(path, false);
                guard._file_guard = Some(file_guard);
                registry
                    .with(fmt::layer().with_ansi(false).with_writer(writer).compact())
                    .try_init()?;
            },
            #[cfg(feature = "tracing-files")]
            (_, TracingOutput::Both(path)) => {
                let (writer, file_guard) = file_writer(path, true);
                guard._file_guard = Some(file_guard);
                registry
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stderr)
                            .with_target(false)
                            .compact(),
                    )
                    .with(fmt::layer().with_ansi(false).with_writer(writer).compact())
                    .try_init()?;
            },
        }

        if let Some(session_id) = &self.session_id {
            tracing::debug!(session_id = %session_id, "designs4u session started");
        }

        Ok(guard)
    }
}

#[cfg(feature = "tracing-files")]
fn file_writer(
    path: &std::path::Path,
    daily: bool,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    use tracing_appender::{non_blocking, rolling};

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let name = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("designs4u.log"));
    if daily {
        non_blocking(rolling::daily(dir, name))
    } else {
        non_blocking(rolling::never(dir, name))
    }
}

/// Subscriber with CLI defaults
///
/// `RUST_LOG`, when set, takes precedence over the `-v` count.
pub fn init_cli_tracing(verbosity: u8, session_id: &str) -> anyhow::Result<TracingGuard> {
    let mut config = TracingConfig::new()
        .with_verbosity(verbosity)
        .with_session_id(session_id);
    if let Ok(directives) = std::env::var(EnvFilter::DEFAULT_ENV) {
        if !directives.trim().is_empty() {
            config = config.with_env_filter(directives);
        }
    }
    config.init()
}

/// Span constructors shared by the CLI commands
pub mod spans {
    use tracing::{Level, Span};

    /// Whole CLI invocation
    pub fn session(session_id: &str, command: &str) -> Span {
        tracing::span!(
            Level::INFO,
            "session",
            session_id = %session_id,
            command = %command
        )
    }

    pub fn file_processing(source: &str, format: &str) -> Span {
        tracing::span!(Level::INFO, "file_processing", source = %source, format = %format)
    }

    pub fn batch_processing(file_count: usize) -> Span {
        tracing::span!(Level::INFO, "batch_processing", file_count = file_count)
    }

    /// Hand-off of one object to storage
    pub fn upload(bucket: &str, size_bytes: usize) -> Span {
        tracing::span!(Level::INFO, "upload", bucket = %bucket, size_bytes = size_bytes)
    }

    pub fn checkout(line_count: usize, total: &str) -> Span {
        tracing::span!(
            Level::INFO,
            "checkout",
            line_count = line_count,
            total = %total
        )
    }
}

/// Event helpers for recurring log shapes
pub mod events {
    use tracing::{debug, error, info, warn};

    pub fn progress(message: &str) {
        info!("{}", message);
    }

    pub fn error_with_context(error: &dyn std::error::Error, context: &str) {
        error!(error = %error, context = %context, "operation failed");
    }

    pub fn warning_with_recommendation(message: &str, recommendation: &str) {
        warn!(recommendation = %recommendation, "{}", message);
    }

    pub fn performance_metric(operation: &str, duration_ms: u64) {
        debug!(operation = %operation, duration_ms = duration_ms, "performance metric");
    }
}
