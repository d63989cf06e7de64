//! Synchronous console mirror and error channel
//!
//! Every logging call is echoed here on the caller's thread before the durable
//! write is queued. The same sink receives reports for jobs the write queue had
//! to drop.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, RwLock};

use super::entry::LogLevel;
use super::error::LogError;

/// Destination for the live console mirror
pub trait ConsoleSink: Send + Sync {
    /// Write one rendered entry (may span several lines)
    fn write_line(&self, level: LogLevel, text: &str);

    /// Report a failure inside the logging subsystem
    fn report_error(&self, context: &str, error: &LogError) {
        tracing::error!(context = context, error = %error, "{}", error.friendly_message(context));
    }
}

/// Shared, type-erased console sink
pub type SharedConsole = Arc<dyn ConsoleSink>;

/// Writes to stderr, one locked write per entry
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrConsole;

impl ConsoleSink for StderrConsole {
    fn write_line(&self, _level: LogLevel, text: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(text.as_bytes());
        if !text.ends_with('\n') {
            let _ = stderr.write_all(b"\n");
        }
        let _ = stderr.flush();
    }
}

/// Discards the mirror; errors still go to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsole;

impl ConsoleSink for NullConsole {
    fn write_line(&self, _level: LogLevel, _text: &str) {}
}

/// A mirrored line or an error report kept by [`RecentLines`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: LogLevel,
    pub text: String,
}

/// Bounded in-memory mirror for live diagnostics views
///
/// Keeps the most recent lines plus a separate ring of alerts (warnings,
/// errors, exceptions and reported subsystem failures).
pub struct RecentLines {
    lines: RwLock<VecDeque<ConsoleLine>>,
    alerts: RwLock<VecDeque<ConsoleLine>>,
    max_lines: usize,
    max_alerts: usize,
}

impl RecentLines {
    pub fn new(max_lines: usize, max_alerts: usize) -> Self {
        Self {
            lines: RwLock::new(VecDeque::with_capacity(max_lines)),
            alerts: RwLock::new(VecDeque::with_capacity(max_alerts)),
            max_lines,
            max_alerts,
        }
    }

    fn push_alert(&self, line: ConsoleLine) {
        if let Ok(mut alerts) = self.alerts.write() {
            if alerts.len() >= self.max_alerts {
                alerts.pop_front();
            }
            alerts.push_back(line);
        }
    }

    /// Get all mirrored lines, oldest first
    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines
            .read()
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lines.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get pending alerts
    pub fn pending_alerts(&self) -> Vec<ConsoleLine> {
        self.alerts
            .read()
            .map(|a| a.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.read().map(|a| a.len()).unwrap_or(0)
    }

    /// Clear all alerts (after they've been acknowledged)
    pub fn clear_alerts(&self) {
        if let Ok(mut alerts) = self.alerts.write() {
            alerts.clear();
        }
    }
}

impl ConsoleSink for RecentLines {
    fn write_line(&self, level: LogLevel, text: &str) {
        let line = ConsoleLine {
            level,
            text: text.trim_end_matches('\n').to_string(),
        };

        if level.is_alert() {
            self.push_alert(line.clone());
        }

        if let Ok(mut lines) = self.lines.write() {
            if lines.len() >= self.max_lines {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    fn report_error(&self, context: &str, error: &LogError) {
        tracing::error!(context = context, error = %error, "{}", error.friendly_message(context));
        self.push_alert(ConsoleLine {
            level: LogLevel::Error,
            text: format!("{}: {}", context, error),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_lines_push_and_retrieve() {
        let recent = RecentLines::new(100, 10);

        recent.write_line(LogLevel::Info, "message 1\n");
        recent.write_line(LogLevel::Warn, "warning 1\n");
        recent.write_line(LogLevel::Exception, "boom\njava.lang.NullPointerException: x\n");

        assert_eq!(recent.len(), 3);
        assert_eq!(recent.alert_count(), 2);

        let lines = recent.lines();
        assert_eq!(lines[0].text, "message 1");
        assert_eq!(lines[1].text, "warning 1");
        assert_eq!(lines[2].text, "boom\njava.lang.NullPointerException: x");
    }

    #[test]
    fn test_recent_lines_capacity() {
        let recent = RecentLines::new(3, 2);

        for i in 0..5 {
            recent.write_line(LogLevel::Info, &format!("msg {}", i));
        }

        let lines = recent.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "msg 2");
        assert_eq!(lines[2].text, "msg 4");
    }

    #[test]
    fn test_report_error_is_an_alert() {
        let recent = RecentLines::new(10, 10);
        recent.report_error("append", &LogError::QueueClosed);

        assert!(recent.is_empty());
        let alerts = recent.pending_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].text, "append: write queue is shut down");

        recent.clear_alerts();
        assert_eq!(recent.alert_count(), 0);
    }

    #[test]
    fn test_stderr_and_null_console_do_not_panic() {
        StderrConsole.write_line(LogLevel::Debug, "stderr mirror");
        NullConsole.write_line(LogLevel::Error, "dropped");
        NullConsole.report_error("append", &LogError::QueueClosed);
    }
}
