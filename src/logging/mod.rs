//! Durable event log for the launcher
//!
//! One active file plus a single `.old` backup, written by a dedicated
//! worker thread fed through an unbounded queue, with a synchronous console
//! mirror on the caller's side.

mod clock;
mod console;
mod entry;
mod error;
mod export;
mod header;
mod logger;
mod queue;
mod store;

pub use clock::{format_timestamp, Clock, TIMESTAMP_FORMAT};
pub use console::{
    ConsoleLine, ConsoleSink, NullConsole, RecentLines, SharedConsole, StderrConsole,
};
pub use entry::{Cause, LogEntry, LogLevel};
pub use error::{LogError, LogResult};
pub use export::{file_size, open_for_export, read_content};
pub use header::SessionHeader;
pub use logger::Logger;
pub use queue::{Job, WriteQueue};
pub use store::{LogPaths, LogStore, RotationPolicy};
