//! Log entries and their on-disk text form

use std::any::type_name;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

use chrono::{DateTime, Local};

use super::clock::format_timestamp;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Exception,
}

impl LogLevel {
    /// Get the name written into the log file
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Exception => "EXCEPTION",
        }
    }

    /// Check if this level should be surfaced as an alert
    pub fn is_alert(&self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error | LogLevel::Exception)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "d" | "debug" => Ok(LogLevel::Debug),
            "i" | "info" => Ok(LogLevel::Info),
            "w" | "warn" => Ok(LogLevel::Warn),
            "e" | "error" => Ok(LogLevel::Error),
            "exception" => Ok(LogLevel::Exception),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// One link of an error chain attached to an entry
///
/// The outermost error comes first; `source` points at what caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    type_name: Option<String>,
    message: String,
    frames: Vec<String>,
    source: Option<Box<Cause>>,
}

impl Cause {
    /// A cause with a known type name
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            message: message.into(),
            frames: Vec::new(),
            source: None,
        }
    }

    /// A cause whose concrete type is unknown (e.g. a `source()` link)
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            type_name: None,
            message: message.into(),
            frames: Vec::new(),
            source: None,
        }
    }

    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Append `source` at the end of this cause chain
    pub fn caused_by(mut self, source: Cause) -> Self {
        self.push_source(source);
        self
    }

    fn push_source(&mut self, source: Cause) {
        match &mut self.source {
            Some(next) => next.push_source(source),
            slot @ None => *slot = Some(Box::new(source)),
        }
    }

    /// Build a cause from a concrete error, walking its `source()` chain.
    ///
    /// Frames come from `Backtrace::capture()`, so they are only present when
    /// `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` enables capturing.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let cause = Cause::new(type_name::<E>(), err.to_string())
            .with_frames(backtrace_frames(&Backtrace::capture()));
        chain_sources(cause, err.source())
    }

    /// Build a cause from an `anyhow::Error`, including its captured backtrace
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let mut links = err.chain();
        let head = links
            .next()
            .map(|e| e.to_string())
            .unwrap_or_else(|| err.to_string());
        let mut cause =
            Cause::new("anyhow::Error", head).with_frames(backtrace_frames(err.backtrace()));
        for link in links {
            cause = cause.caused_by(Cause::message_only(link.to_string()));
        }
        cause
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn source(&self) -> Option<&Cause> {
        self.source.as_deref()
    }

    /// Stack-trace text: one headline per link, frames indented with `\tat`
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut link = Some(self);
        let mut first = true;
        while let Some(cause) = link {
            if !first {
                out.push('\n');
                out.push_str("Caused by: ");
            }
            match &cause.type_name {
                Some(name) => {
                    out.push_str(name);
                    out.push_str(": ");
                    out.push_str(&cause.message);
                }
                None => out.push_str(&cause.message),
            }
            for frame in &cause.frames {
                out.push_str("\n\tat ");
                out.push_str(frame);
            }
            first = false;
            link = cause.source.as_deref();
        }
        out
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn chain_sources(mut cause: Cause, mut source: Option<&(dyn Error + 'static)>) -> Cause {
    while let Some(err) = source {
        cause = cause.caused_by(Cause::message_only(err.to_string()));
        source = err.source();
    }
    cause
}

fn backtrace_frames(backtrace: &Backtrace) -> Vec<String> {
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    backtrace
        .to_string()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A single log entry, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    timestamp: DateTime<Local>,
    level: LogLevel,
    tag: String,
    message: String,
    cause: Option<Cause>,
}

impl LogEntry {
    pub fn new(
        timestamp: DateTime<Local>,
        level: LogLevel,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            tag: tag.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: Option<Cause>) -> Self {
        self.cause = cause;
        self
    }

    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// `[<timestamp>] <LEVEL>/<tag>: <message>`
    pub fn headline(&self) -> String {
        format!(
            "[{}] {}/{}: {}",
            format_timestamp(&self.timestamp),
            self.level,
            self.tag,
            self.message
        )
    }

    /// Text appended to the log file, always newline-terminated.
    ///
    /// An entry with a cause carries its stack trace on the following lines.
    pub fn render(&self) -> String {
        let mut out = self.headline();
        out.push('\n');
        if let Some(cause) = &self.cause {
            out.push_str(&cause.render());
            out.push('\n');
        }
        out
    }
}
