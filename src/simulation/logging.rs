//! Logging and tracing setup
//!
//! Logs go to stderr so that the report on stdout stays machine-readable.
//! File logging writes JSON lines through a non-blocking daily appender.

use crate::types::{CliArgs, ConfigError, OutputFormat};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Error returned when the global subscriber cannot be installed
pub type LoggingError = Box<dyn std::error::Error + Send + Sync>;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Maximum level for this crate when `RUST_LOG` is unset
    pub level: Level,
    /// Emit JSON lines on the console instead of pretty output
    pub json_format: bool,
    /// Directory for rolling log files, if file logging is on
    pub log_directory: Option<PathBuf>,
    /// File name prefix of rolling log files
    pub log_file_prefix: String,
    /// Log span open/close events
    pub enable_span_events: bool,
    /// Colored console output
    pub enable_ansi: bool,
    /// Explicit filter directive overriding `level` and `RUST_LOG`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            log_directory: None,
            log_file_prefix: "ed-queue-sim".to_string(),
            enable_span_events: false,
            enable_ansi: true,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create the default configuration (warnings only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a level from the command-line verbosity flags
    ///
    /// `debug` wins over `verbose`; with neither only warnings are shown.
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            Self::new().with_level(Level::DEBUG).with_span_events()
        } else if verbose {
            Self::new().with_level(Level::INFO)
        } else {
            Self::new()
        }
    }

    /// Build from the command line: verbosity flags, `--log-format`, and `--log-dir`
    pub fn from_cli_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::from_flags(args.verbose, args.debug);
        if let Some(format) = args.log_format.as_deref() {
            match OutputFormat::from_str(format).map_err(ConfigError::InvalidArgument)? {
                OutputFormat::Json => config = config.with_json_format(),
                OutputFormat::Text => {}
            }
        }
        if let Some(dir) = &args.log_dir {
            config = config.with_file_logging(dir);
        }
        Ok(config)
    }

    /// Set the log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Emit JSON lines on the console
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Also write JSON logs to daily files under `directory`
    pub fn with_file_logging(mut self, directory: impl Into<PathBuf>) -> Self {
        self.log_directory = Some(directory.into());
        self
    }

    /// Enable span events
    pub fn with_span_events(mut self) -> Self {
        self.enable_span_events = true;
        self
    }

    /// Disable ANSI colors
    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    /// Set custom filter directive
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Whether file logging is on
    pub fn logs_to_file(&self) -> bool {
        self.log_directory.is_some()
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Build the filter: explicit directive, then `RUST_LOG`, then `level` for this crate
    pub fn build_filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Some(filter) = &self.env_filter {
            return Ok(EnvFilter::try_new(filter)?);
        }
        Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), self.level))
        }))
    }

    /// Install the global subscriber
    ///
    /// The returned guard flushes the file writer on drop and must be held
    /// for as long as logging is needed.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let filter = self.build_filter()?;

        let (file_layer, guard) = match &self.log_directory {
            Some(directory) => {
                let appender = rolling::daily(directory, &self.log_file_prefix);
                let (writer, guard) = non_blocking(appender);
                let layer = fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_span_events(self.span_events());
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        let json_console = self.json_format.then(|| {
            fmt::layer().json().with_writer(io::stderr).with_span_events(self.span_events())
        });
        let pretty_console = (!self.json_format).then(|| {
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(self.enable_ansi)
                .with_target(false)
                .with_span_events(self.span_events())
        });

        Registry::default()
            .with(filter)
            .with(file_layer)
            .with(json_console)
            .with(pretty_console)
            .try_init()?;

        debug!(level = %self.level, to_file = guard.is_some(), "Logging initialized");
        Ok(guard)
    }
}

/// Structured log event tagged with the simulation component
#[macro_export]
macro_rules! sim_event {
    ($level:ident, $message:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
            $($key = $value,)*
        );
    };
    ($level:ident, $message:expr) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
        );
    };
}

/// Span for timing a phase of a run
#[macro_export]
macro_rules! perf_span {
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info_span!(
            $name,
            component = "performance",
            $($key = $value,)*
        )
    };
    ($name:expr) => {
        tracing::info_span!(
            $name,
            component = "performance",
        )
    };
}
