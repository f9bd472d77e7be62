//! Temporary upload payload
//!
//! The workflow uploads a small text file. The file lives in a
//! [`tempfile::NamedTempFile`], so it is removed from disk whenever the
//! [`PayloadFile`] is dropped, whichever way the run ends.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::Result;

/// Lines written to the payload file, each terminated by `\n`
pub const PAYLOAD_LINES: [&str; 2] = [
    "Demo object storage session ",
    "Uploaded from a temporary file ",
];

/// Total byte length of the payload written from `lines`
pub fn payload_len(lines: &[&str]) -> u64 {
    lines.iter().map(|l| l.len() as u64 + 1).sum()
}

/// Guess a content type from the file extension
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// A payload file on local disk; deleted on drop
#[derive(Debug)]
pub struct PayloadFile {
    file: NamedTempFile,
    bytes_written: u64,
}

impl PayloadFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Bytes written when the file was created
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// Creates payload files for upload
pub trait TempFileProvider: Send + Sync {
    /// Write `lines` to a fresh file and hand back its scoped handle
    fn create(&self, lines: &[&str]) -> Result<PayloadFile>;
}

/// Creates payload files in the system temp dir, or in a chosen directory
#[derive(Debug, Clone, Default)]
pub struct SystemTempFiles {
    dir: Option<PathBuf>,
}

impl SystemTempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place files under `dir` instead of the system temp dir
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl TempFileProvider for SystemTempFiles {
    fn create(&self, lines: &[&str]) -> Result<PayloadFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("file_demo").suffix(".txt");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        for line in lines {
            writeln!(file, "{line}")?;
        }
        file.flush()?;

        tracing::debug!(path = %file.path().display(), "Created payload file");

        Ok(PayloadFile {
            file,
            bytes_written: payload_len(lines),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_payload_written_and_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let provider = SystemTempFiles::in_dir(dir.path());

        let payload = provider.create(&PAYLOAD_LINES).unwrap();
        let path = payload.path().to_path_buf();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("file_demo"));
        assert!(name.ends_with(".txt"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Demo object storage session \nUploaded from a temporary file \n"
        );
        assert_eq!(payload.bytes_written(), content.len() as u64);

        drop(payload);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let provider = SystemTempFiles::in_dir(dir.path().join("missing"));
        let err = provider.create(&PAYLOAD_LINES).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a.txt")), "text/plain");
        assert_eq!(content_type_for(Path::new("a.json")), "application/json");
        assert_eq!(
            content_type_for(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_payload_len() {
        assert_eq!(payload_len(&["ab", "c"]), 5);
        assert_eq!(payload_len(&[]), 0);
    }
}
