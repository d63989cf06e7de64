//! Queue-bypassing reads for diagnostics and sharing
//!
//! These go straight to the filesystem. Because every write is a complete
//! open/append/close and rotation is a rename, a reader sees the file as of
//! some completed write, possibly without the newest queued entries.

use std::fs::{self, File};
use std::path::Path;

use super::error::{LogError, LogResult};

/// Read a log file as text (invalid UTF-8 is replaced, never rejected)
pub fn read_content(path: &Path) -> LogResult<String> {
    let bytes = fs::read(path).map_err(|source| LogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Current size of a log file in bytes
pub fn file_size(path: &Path) -> LogResult<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| LogError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Open a log file read-only, e.g. to hand it to a share sheet
pub fn open_for_export(path: &Path) -> LogResult<File> {
    File::open(path).map_err(|source| LogError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether a read error just means "no log yet"
pub(crate) fn is_missing(err: &LogError) -> bool {
    err.io_error()
        .map(|e| e.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_read_content_and_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("yam_launcher.log");
        fs::write(&path, "[t] INFO/X: hello\n").unwrap();

        assert_eq!(read_content(&path).unwrap(), "[t] INFO/X: hello\n");
        assert_eq!(file_size(&path).unwrap(), 18);
    }

    #[test]
    fn test_read_content_replaces_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("yam_launcher.log");
        fs::write(&path, b"ok \xff\n").unwrap();

        assert_eq!(read_content(&path).unwrap(), "ok \u{fffd}\n");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.log");

        let err = read_content(&path).unwrap_err();
        assert!(is_missing(&err));
        assert!(is_missing(&file_size(&path).unwrap_err()));
        assert!(open_for_export(&path).is_err());
    }

    #[test]
    fn test_open_for_export() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("yam_launcher.log");
        fs::write(&path, "exported\n").unwrap();

        let mut content = String::new();
        open_for_export(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "exported\n");
    }
}
