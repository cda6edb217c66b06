//! # Logging & Tracing Infrastructure
//!
//! Library crates only emit events through `tracing` macros. The host picks
//! the output once per process with [`init_logging`]:
//!
//! - `Pretty` for a terminal, `Json` for log collectors, `Compact` for cron
//!   output
//! - an `EnvFilter` that keeps the workspace crates at the chosen level and
//!   the HTTP and SQL stacks at `warn`
//! - stdout or stderr, so a job can print its report on stdout
//!
//! Settings can be taken from the environment with
//! [`LoggingConfig::from_env`] (`LOG_LEVEL`, `LOG_FORMAT`, `RUST_LOG`).
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LoggingConfig};
//!
//! #[tokio::main]
//! async fn main() -> core_runtime::Result<()> {
//!     init_logging(LoggingConfig::from_env()?.with_stderr(true))?;
//!     tracing::info!("Ingestion started");
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter::EnvFilter, Layer, Registry};

pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
/// Full filter override, same syntax as `EnvFilter`
pub const ENV_LOG_FILTER: &str = "RUST_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::Config(format!("Unknown log level '{other}'"))),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line, with colors
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(Error::Config(format!("Unknown log format '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for the workspace crates
    pub level: LogLevel,
    /// Replaces the generated filter entirely
    pub filter: Option<String>,
    /// Emit span close events (pretty) or span context (json)
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
    /// Write to stderr instead of stdout
    pub use_stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
            use_stderr: false,
        }
    }
}

impl LoggingConfig {
    /// Read `LOG_LEVEL`, `LOG_FORMAT` and `RUST_LOG` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_LOG_LEVEL) {
            config.level = raw.parse()?;
        }
        if let Some(raw) = get(ENV_LOG_FORMAT) {
            config.format = raw.parse()?;
        }
        config.filter = get(ENV_LOG_FILTER);

        Ok(config)
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }

    pub fn with_stderr(mut self, use_stderr: bool) -> Self {
        self.use_stderr = use_stderr;
        self
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// [`Error::Config`] for an invalid filter string, [`Error::Logging`] when a
/// subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    tracing_subscriber::registry()
        .with(fmt_layer(&config))
        .with(filter)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

const WORKSPACE_TARGETS: &[&str] = &[
    "core_runtime",
    "core_auth",
    "core_history",
    "core_analytics",
    "core_service",
    "provider_spotify",
    "bridge_desktop",
];

const QUIET_TARGETS: &[&str] = &["h2", "hyper", "reqwest", "rustls", "sqlx"];

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = config.level.as_str();
            std::iter::once(level.to_string())
                .chain(WORKSPACE_TARGETS.iter().map(|target| format!("{target}={level}")))
                .chain(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")))
                .collect::<Vec<_>>()
                .join(",")
        }
    };

    EnvFilter::try_new(&filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter '{filter_string}': {e}")))
}

fn fmt_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let writer = if config.use_stderr {
        BoxMakeWriter::new(io::stderr)
    } else {
        BoxMakeWriter::new(io::stdout)
    };

    let layer = tracing_subscriber::fmt::layer::<Registry>()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(writer);

    match config.format {
        LogFormat::Pretty => layer
            .pretty()
            .with_span_events(if config.enable_spans {
                FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            })
            .boxed(),
        LogFormat::Json => layer
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

const SENSITIVE_FIELDS: &[&str] = &[
    "token",
    "secret",
    "password",
    "authorization",
    "bearer",
    "api_key",
];

/// Mask a value before it goes into a log field.
///
/// Credentials are replaced entirely. E-mail addresses, which show up in user
/// profiles, keep their first character.
///
/// ```ignore
/// use tracing::info;
/// use core_runtime::logging::redact_if_sensitive;
///
/// info!(refresh_token = %redact_if_sensitive("refresh_token", &token), "Token rotated");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let field = field_name.to_ascii_lowercase();
    if SENSITIVE_FIELDS.iter().any(|marker| field.contains(marker)) {
        return "[REDACTED]".to_string();
    }

    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@[REDACTED]")
        }
        _ => value.to_string(),
    }
}

/// Last component of a path, for either separator.
///
/// Export files usually sit in a home directory; only the file name is logged.
pub fn strip_path(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level(LogLevel::Debug)
            .with_filter("provider_spotify=trace")
            .with_spans(true)
            .with_target(true)
            .with_thread_info(true)
            .with_stderr(true);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.filter, Some("provider_spotify=trace".to_string()));
        assert!(config.enable_spans);
        assert!(config.display_target);
        assert!(config.display_thread_info);
        assert!(config.use_stderr);
    }

    #[test]
    fn test_from_lookup() {
        let config = LoggingConfig::from_lookup(lookup(&[
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_LOG_FORMAT, "compact"),
        ]))
        .unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.filter.is_none());

        let config = LoggingConfig::from_lookup(lookup(&[(ENV_LOG_FILTER, "core_history=trace")])).unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.filter.as_deref(), Some("core_history=trace"));
    }

    #[test]
    fn test_from_lookup_rejects_unknown_values() {
        assert!(matches!(
            LoggingConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])),
            Err(Error::Config(_))
        ));
        assert!(LoggingConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])).is_err());
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert_eq!(
            redact_if_sensitive("access_token", "secret123"),
            "[REDACTED]"
        );
        assert_eq!(redact_if_sensitive("client_secret", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("Authorization", "Basic xyz"), "[REDACTED]");

        let redacted = redact_if_sensitive("email", "listener@example.com");
        assert_eq!(redacted, "l***@[REDACTED]");

        assert_eq!(redact_if_sensitive("track_id", "4uLU6hMCjMI75M1A2tKUQC"), "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(redact_if_sensitive("handle", "@listener"), "@listener");
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(
            strip_path("/home/user/export/Streaming_History_Audio_2023.json"),
            "Streaming_History_Audio_2023.json"
        );
        assert_eq!(strip_path("C:\\Users\\me\\history.json"), "history.json");
        assert_eq!(strip_path("history.json"), "history.json");
    }

    #[test]
    fn test_default_format() {
        #[cfg(debug_assertions)]
        assert_eq!(LogFormat::default(), LogFormat::Pretty);

        #[cfg(not(debug_assertions))]
        assert_eq!(LogFormat::default(), LogFormat::Json);
    }

    #[test]
    fn test_build_filter_covers_workspace_crates() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let filter = build_filter(&config).unwrap().to_string();

        assert!(filter.contains("provider_spotify=debug"));
        assert!(filter.contains("core_history=debug"));
        assert!(filter.contains("sqlx=warn"));
    }

    #[test]
    fn test_build_custom_filter() {
        let config = LoggingConfig::default().with_filter("core_service=trace,core_auth=debug");
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_service=trace"));
    }

    #[test]
    fn test_level_parsing_and_ordering() {
        assert_eq!(" Debug ".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::Error.to_string(), "error");
        assert!(LogLevel::Trace < LogLevel::Info);
        assert!(LogLevel::Error > LogLevel::Warn);
    }
}
