//! Active log file plus its single `.old` backup
//!
//! A `LogStore` is owned by the write queue's worker thread; nothing else
//! mutates the files or the counters. The file handle is never kept open:
//! every write opens in append mode, writes, flushes and closes.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::LoggerConfig;

use super::clock::Clock;
use super::error::{LogError, LogResult};
use super::header::SessionHeader;

/// Where the active log and its backup live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    /// Directory holding both files
    pub dir: PathBuf,
    /// Full path to the active log file
    pub active: PathBuf,
    /// Full path to the rotated backup (`<active>.old`)
    pub backup: PathBuf,
}

impl LogPaths {
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self {
            dir: config.log_dir.clone(),
            active: config.log_file_path(),
            backup: config.backup_file_path(),
        }
    }
}

/// Thresholds that trigger a rotation before the next append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate when the active file is strictly larger than this
    pub max_file_size: u64,
    /// Rotate when strictly more entries than this were appended since rotation/open
    pub max_entries: usize,
}

impl RotationPolicy {
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            max_entries: config.max_entries,
        }
    }
}

/// The on-disk log and its bookkeeping
#[derive(Debug)]
pub struct LogStore {
    paths: LogPaths,
    header: SessionHeader,
    clock: Arc<Clock>,
    policy: RotationPolicy,
    /// Size of the active file as last observed by the owner
    size: u64,
    /// Entries appended since the last rotation/clear/open
    entry_count: usize,
}

impl LogStore {
    /// Open the log described by `config`, creating the directory and, for a
    /// brand new file, writing the session header.
    ///
    /// An existing active path must be a file this process can append to.
    pub fn open(config: &LoggerConfig, clock: Arc<Clock>) -> LogResult<Self> {
        let paths = LogPaths::from_config(config);
        fs::create_dir_all(&paths.dir).map_err(|source| LogError::CreateDir {
            path: paths.dir.clone(),
            source,
        })?;

        let mut store = Self {
            paths,
            header: SessionHeader::new(config.session.clone()),
            clock,
            policy: RotationPolicy::from_config(config),
            size: 0,
            entry_count: 0,
        };

        if store.paths.active.exists() {
            store.check_appendable()?;
            store.refresh_size();
        } else {
            store.write_header()?;
        }

        Ok(store)
    }

    pub fn paths(&self) -> &LogPaths {
        &self.paths
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Re-read the active file's size from disk (0 if it is missing).
    ///
    /// Picks up growth caused by anything outside this store, so the size
    /// threshold is checked against the real file.
    pub fn refresh_size(&mut self) {
        self.size = fs::metadata(&self.paths.active)
            .map(|m| m.len())
            .unwrap_or(0);
    }

    /// Check whether the next append must rotate first
    pub fn should_rotate(&self) -> bool {
        self.size > self.policy.max_file_size || self.entry_count > self.policy.max_entries
    }

    /// Move the active file to the backup slot and start a fresh one.
    ///
    /// Any previous backup is deleted first. If the rename fails the active
    /// file is left untouched and the counters keep their values, so the next
    /// qualifying append retries. If only the header write fails, the next
    /// [`append_entry`](Self::append_entry) recreates it.
    pub fn rotate(&mut self) -> LogResult<()> {
        remove_if_exists(&self.paths.backup)?;

        if self.paths.active.exists() {
            fs::rename(&self.paths.active, &self.paths.backup).map_err(|source| {
                LogError::Rotate {
                    from: self.paths.active.clone(),
                    to: self.paths.backup.clone(),
                    source,
                }
            })?;
        }

        let rotated_entries = self.entry_count;
        let rotated_size = self.size;
        self.entry_count = 0;
        self.size = 0;
        self.write_header()?;

        tracing::debug!(
            backup = %self.paths.backup.display(),
            entries = rotated_entries,
            bytes = rotated_size,
            "Rotated log file"
        );
        Ok(())
    }

    /// Delete and recreate the active file with a fresh header
    pub fn clear(&mut self) -> LogResult<()> {
        remove_if_exists(&self.paths.active)?;
        self.entry_count = 0;
        self.size = 0;
        self.write_header()
    }

    /// Append raw text to the active file (scoped open, write, flush, close)
    pub fn append(&mut self, text: &str) -> LogResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.paths.active)
            .map_err(|source| LogError::Open {
                path: self.paths.active.clone(),
                source,
            })?;

        file.write_all(text.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| LogError::Write {
                path: self.paths.active.clone(),
                source,
            })?;

        self.size += text.len() as u64;
        Ok(())
    }

    /// Append one rendered entry and count it.
    ///
    /// A missing active file (removed externally, or left behind by a rotation
    /// whose header write failed) is recreated with a header first.
    pub fn append_entry(&mut self, text: &str) -> LogResult<()> {
        if !self.paths.active.exists() {
            self.size = 0;
            self.write_header()?;
        }
        self.append(text)?;
        self.entry_count += 1;
        Ok(())
    }

    fn check_appendable(&self) -> LogResult<()> {
        let open_error = |source| LogError::Open {
            path: self.paths.active.clone(),
            source,
        };
        let metadata = fs::metadata(&self.paths.active).map_err(open_error)?;
        if !metadata.is_file() {
            return Err(open_error(io::Error::new(
                ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        OpenOptions::new()
            .append(true)
            .open(&self.paths.active)
            .map(drop)
            .map_err(open_error)
    }

    fn write_header(&mut self) -> LogResult<()> {
        let header = self.header.render(&self.clock.now());
        self.append(&header)
    }
}

fn remove_if_exists(path: &Path) -> LogResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LogError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
