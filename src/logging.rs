// Logging setup. Instead of installing a process-wide subscriber, `install`
// returns a handle that keeps the subscriber active on the current thread
// for as long as it lives. The binary creates one at startup and holds it
// until it exits.

use std::fmt;
use std::str::FromStr;

use tracing::dispatcher::{self, DefaultGuard};
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
    /// Multi-line and colored; meant for a terminal.
    Pretty,
}

impl LogFormat {
    const ALL: [LogFormat; 3] = [LogFormat::Text, LogFormat::Json, LogFormat::Pretty];

    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogFormat::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown log format '{}' (expected text, json or pretty)", s))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

/// Keeps the configured subscriber active. Logging stops when dropped.
pub struct LogHandle {
    _guard: DefaultGuard,
}

impl LoggingConfig {
    /// * `level` - minimum level (error, warn, info, debug, trace) or any
    ///   `EnvFilter` directive
    /// * `verbose` - forces `debug`
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// `RUST_LOG` wins over the configured level.
    fn filter(&self) -> EnvFilter {
        let level = if self.verbose { "debug" } else { self.level.as_str() };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    }

    /// Build the subscriber for this configuration. Output goes to stderr
    /// so stdout stays free for command results.
    pub fn dispatch(&self) -> Dispatch {
        let filter = self.filter();
        match self.format {
            LogFormat::Json => Dispatch::new(
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .flatten_event(true)
                    .with_target(true)
                    .finish(),
            ),
            LogFormat::Pretty => Dispatch::new(
                tracing_subscriber::fmt()
                    .pretty()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .finish(),
            ),
            LogFormat::Text => Dispatch::new(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_level(true)
                    .finish(),
            ),
        }
    }

    /// Activate logging on the current thread.
    pub fn install(&self) -> LogHandle {
        let dispatch = self.dispatch();
        LogHandle {
            _guard: dispatcher::set_default(&dispatch),
        }
    }
}
