//! Process-wide logger facade
//!
//! Each call renders its entry on the caller's thread, echoes it to the
//! console sink synchronously, then hands the text to the write queue. If the
//! log directory or file cannot be set up the logger keeps running in
//! console-only mode.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::config::LoggerConfig;

use super::clock::Clock;
use super::console::{NullConsole, SharedConsole, StderrConsole};
use super::entry::{Cause, LogEntry, LogLevel};
use super::error::LogError;
use super::export;
use super::queue::WriteQueue;
use super::store::{LogPaths, LogStore};

static INSTANCE: OnceLock<Logger> = OnceLock::new();

/// Leveled, durable logger
pub struct Logger {
    paths: LogPaths,
    clock: Arc<Clock>,
    console: SharedConsole,
    /// `None` in console-only mode
    queue: Option<WriteQueue>,
}

impl Logger {
    /// Build a logger with the console sink implied by `config.console_mirror`
    pub fn new(config: LoggerConfig) -> Self {
        let console: SharedConsole = if config.console_mirror {
            Arc::new(StderrConsole)
        } else {
            Arc::new(NullConsole)
        };
        Self::with_console(config, console)
    }

    /// Build a logger that mirrors to (and reports errors on) `console`
    pub fn with_console(config: LoggerConfig, console: SharedConsole) -> Self {
        let clock = Arc::new(Clock::new());
        let paths = LogPaths::from_config(&config);

        let queue = match LogStore::open(&config, Arc::clone(&clock)) {
            Ok(store) => match WriteQueue::start(store, Arc::clone(&console)) {
                Ok(queue) => Some(queue),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to start log writer, logging to console only"
                    );
                    None
                }
            },
            Err(e) => {
                console.report_error("open", &e);
                tracing::warn!(
                    path = %paths.active.display(),
                    "Log file unavailable, logging to console only"
                );
                None
            }
        };

        if queue.is_some() {
            tracing::info!(path = %paths.active.display(), "Logging to file");
        }

        Self {
            paths,
            clock,
            console,
            queue,
        }
    }

    /// The process-wide logger, built from `init` on first access.
    ///
    /// Later calls return the same instance and never run their `init`.
    pub fn get_instance<F>(init: F) -> &'static Logger
    where
        F: FnOnce() -> LoggerConfig,
    {
        INSTANCE.get_or_init(|| Logger::new(init()))
    }

    /// The process-wide logger, if it has been created
    pub fn global() -> Option<&'static Logger> {
        INSTANCE.get()
    }

    /// Whether entries are being persisted (false in console-only mode)
    pub fn is_durable(&self) -> bool {
        self.queue.is_some()
    }

    pub fn paths(&self) -> &LogPaths {
        &self.paths
    }

    /// Log an entry at any level with an optional cause
    pub fn log(
        &self,
        level: LogLevel,
        tag: &str,
        message: impl Into<String>,
        cause: Option<Cause>,
    ) {
        let entry = LogEntry::new(self.clock.now(), level, tag, message).with_cause(cause);
        let text = entry.render();

        self.console.write_line(level, &text);

        if let Some(queue) = &self.queue {
            if let Err(LogError::QueueClosed) = queue.append(text) {
                tracing::trace!(tag = tag, "Logger shut down, entry not persisted");
            }
        }
    }

    pub fn debug(&self, tag: &str, message: impl Into<String>) {
        self.log(LogLevel::Debug, tag, message, None);
    }

    pub fn info(&self, tag: &str, message: impl Into<String>) {
        self.log(LogLevel::Info, tag, message, None);
    }

    pub fn warn(&self, tag: &str, message: impl Into<String>) {
        self.log(LogLevel::Warn, tag, message, None);
    }

    pub fn error(&self, tag: &str, message: impl Into<String>) {
        self.log(LogLevel::Error, tag, message, None);
    }

    pub fn debug_with_cause(&self, tag: &str, message: impl Into<String>, cause: Cause) {
        self.log(LogLevel::Debug, tag, message, Some(cause));
    }

    pub fn info_with_cause(&self, tag: &str, message: impl Into<String>, cause: Cause) {
        self.log(LogLevel::Info, tag, message, Some(cause));
    }

    pub fn warn_with_cause(&self, tag: &str, message: impl Into<String>, cause: Cause) {
        self.log(LogLevel::Warn, tag, message, Some(cause));
    }

    pub fn error_with_cause(&self, tag: &str, message: impl Into<String>, cause: Cause) {
        self.log(LogLevel::Error, tag, message, Some(cause));
    }

    /// Log a failure together with its full stack trace
    pub fn exception(&self, tag: &str, message: impl Into<String>, cause: Cause) {
        self.log(LogLevel::Exception, tag, message, Some(cause));
    }

    /// Queue a reset of the log to a fresh header, after all earlier writes
    pub fn clear_logs(&self) {
        if let Some(queue) = &self.queue {
            if queue.clear().is_err() {
                tracing::debug!("Logger shut down, clear ignored");
            }
        }
    }

    /// Current content of the active log, or an empty string if it cannot be read
    pub fn log_content(&self) -> String {
        self.read_or_empty(&self.paths.active)
    }

    /// Content of the rotated backup, or an empty string if there is none
    pub fn backup_content(&self) -> String {
        self.read_or_empty(&self.paths.backup)
    }

    /// Path of the active log for sharing, if the file exists
    pub fn log_file_for_export(&self) -> Option<PathBuf> {
        self.paths.active.exists().then(|| self.paths.active.clone())
    }

    /// Open the active log read-only for sharing
    pub fn open_log_for_export(&self) -> Option<File> {
        match export::open_for_export(&self.paths.active) {
            Ok(file) => Some(file),
            Err(e) => {
                self.report_read_error(&e);
                None
            }
        }
    }

    /// Size of the active log in bytes (0 if it cannot be observed)
    pub fn log_file_size(&self) -> u64 {
        match export::file_size(&self.paths.active) {
            Ok(size) => size,
            Err(e) => {
                self.report_read_error(&e);
                0
            }
        }
    }

    pub fn backup_file_path(&self) -> &Path {
        &self.paths.backup
    }

    /// Block until everything logged so far has reached the file.
    ///
    /// Returns `false` in console-only mode, after shutdown, or when called
    /// from inside an async runtime.
    pub fn flush(&self) -> bool {
        self.queue.as_ref().map(WriteQueue::flush).unwrap_or(false)
    }

    /// Await until everything logged so far has reached the file
    pub async fn flush_async(&self) -> bool {
        match &self.queue {
            Some(queue) => queue.flush_async().await,
            None => false,
        }
    }

    /// Stop accepting durable writes and wait for the queue to drain.
    ///
    /// The console mirror keeps working afterwards.
    pub fn shutdown(&self) {
        if let Some(queue) = &self.queue {
            queue.shutdown();
            tracing::debug!(path = %self.paths.active.display(), "Logger shut down");
        }
    }

    fn read_or_empty(&self, path: &Path) -> String {
        match export::read_content(path) {
            Ok(content) => content,
            Err(e) => {
                self.report_read_error(&e);
                String::new()
            }
        }
    }

    fn report_read_error(&self, err: &LogError) {
        if !export::is_missing(err) {
            self.console.report_error("read", err);
        }
    }
}
