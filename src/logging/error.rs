//! Errors produced by the log store and write queue
//!
//! None of these ever reach a logging caller: the write queue reports them on
//! the error channel and moves on.

use std::io::{self, ErrorKind};
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to create log directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to open log file {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to write log file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to rotate {} to {}: {source}", .from.display(), .to.display())]
    Rotate {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("failed to remove {}: {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to read log file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("write queue is shut down")]
    QueueClosed,
}

impl LogError {
    /// The underlying I/O error, if any
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            LogError::CreateDir { source, .. }
            | LogError::Open { source, .. }
            | LogError::Write { source, .. }
            | LogError::Rotate { source, .. }
            | LogError::Remove { source, .. }
            | LogError::Read { source, .. } => Some(source),
            LogError::QueueClosed => None,
        }
    }

    /// Short user-facing description prefixed with `context`
    pub fn friendly_message(&self, context: &str) -> String {
        match self.io_error().map(|e| (e, DiskFault::classify(e))) {
            Some((_, Some(fault))) => format!("{}: {}", context, fault.describe()),
            Some((e, None)) => format!("{}: {}", context, e),
            None => format!("{}: {}", context, self),
        }
    }
}

/// Storage conditions worth naming in a report instead of the raw OS text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiskFault {
    Full,
    PermissionDenied,
    Missing,
}

impl DiskFault {
    // ENOSPC, EDQUOT (Linux), EDQUOT (macOS)
    #[cfg(unix)]
    const FULL_ERRNOS: [i32; 3] = [28, 122, 69];

    fn classify(e: &io::Error) -> Option<Self> {
        match e.kind() {
            // Short writes are how a full disk often shows up
            ErrorKind::StorageFull | ErrorKind::WriteZero => Some(DiskFault::Full),
            ErrorKind::PermissionDenied => Some(DiskFault::PermissionDenied),
            ErrorKind::NotFound => Some(DiskFault::Missing),
            _ => Self::classify_errno(e),
        }
    }

    #[cfg(unix)]
    fn classify_errno(e: &io::Error) -> Option<Self> {
        e.raw_os_error()
            .filter(|code| Self::FULL_ERRNOS.contains(code))
            .map(|_| DiskFault::Full)
    }

    #[cfg(not(unix))]
    fn classify_errno(_e: &io::Error) -> Option<Self> {
        None
    }

    fn describe(self) -> &'static str {
        match self {
            DiskFault::Full => "disk full, log entries are being dropped",
            DiskFault::PermissionDenied => "permission denied on the log directory",
            DiskFault::Missing => "log file or directory not found",
        }
    }
}

/// Result alias for store and queue operations
pub type LogResult<T> = Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = LogError::Write {
            path: PathBuf::from("/data/yam_launcher.log"),
            source: io::Error::from(ErrorKind::PermissionDenied),
        };
        let text = err.to_string();
        assert!(text.contains("/data/yam_launcher.log"));
        assert!(text.starts_with("failed to write log file"));
    }

    #[test]
    fn test_classify_disk_faults() {
        assert_eq!(
            DiskFault::classify(&io::Error::from(ErrorKind::PermissionDenied)),
            Some(DiskFault::PermissionDenied)
        );
        assert_eq!(
            DiskFault::classify(&io::Error::from(ErrorKind::NotFound)),
            Some(DiskFault::Missing)
        );
        assert_eq!(
            DiskFault::classify(&io::Error::from(ErrorKind::WriteZero)),
            Some(DiskFault::Full)
        );
        assert_eq!(
            DiskFault::classify(&io::Error::new(ErrorKind::Other, "boom")),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_enospc() {
        assert_eq!(
            DiskFault::classify(&io::Error::from_raw_os_error(28)),
            Some(DiskFault::Full)
        );
    }

    #[test]
    fn test_friendly_message() {
        let err = LogError::Write {
            path: PathBuf::from("x"),
            source: io::Error::from(ErrorKind::PermissionDenied),
        };
        assert_eq!(
            err.friendly_message("append"),
            "append: permission denied on the log directory"
        );

        let err = LogError::Rotate {
            from: PathBuf::from("a"),
            to: PathBuf::from("b"),
            source: io::Error::new(ErrorKind::Other, "boom"),
        };
        assert_eq!(err.friendly_message("rotate"), "rotate: boom");
        assert_eq!(
            LogError::QueueClosed.friendly_message("append"),
            "append: write queue is shut down"
        );
    }
}
