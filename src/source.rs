//! Text sources: where stack files come from.
//!
//! The resolver never touches the filesystem directly. It asks a
//! [`TextSource`] for the whole content of a file, bounded by a size limit.
//! [`FsSource`] reads real files; [`MemorySource`] serves in-memory content,
//! which is handy for embedding default stacks and for tests.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Failure reported by a [`TextSource`].
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The file holds more than `limit` bytes.
    #[error("file is larger than {limit} bytes ({size} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

/// Whole-file reads with an upper size bound.
pub trait TextSource {
    /// Read the full content of `path`.
    ///
    /// Implementations must fail with [`ReadError::TooLarge`] rather than
    /// return more than `size_limit` bytes.
    fn read_text(&self, path: &Path, size_limit: u64) -> Result<String, ReadError>;
}

impl<T: TextSource + ?Sized> TextSource for &T {
    fn read_text(&self, path: &Path, size_limit: u64) -> Result<String, ReadError> {
        (**self).read_text(path, size_limit)
    }
}

/// Reads files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl TextSource for FsSource {
    fn read_text(&self, path: &Path, size_limit: u64) -> Result<String, ReadError> {
        let file = File::open(path)?;

        let size = file.metadata()?.len();
        if size > size_limit {
            return Err(ReadError::TooLarge { size, limit: size_limit });
        }

        // The file may grow between the metadata call and the read; read one
        // byte past the limit so that case is caught too.
        let mut content = String::new();
        file.take(size_limit.saturating_add(1)).read_to_string(&mut content)?;

        let read = content.len() as u64;
        if read > size_limit {
            return Err(ReadError::TooLarge { size: read, limit: size_limit });
        }

        Ok(content)
    }
}

/// Serves file content from memory, keyed by exact path.
///
/// Paths are compared as given: `MemorySource` performs no normalization, so
/// register files under the paths the resolver will ask for.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource { files: HashMap::new() }
    }

    /// Register `content` under `path`, replacing any previous content.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }
}

impl TextSource for MemorySource {
    fn read_text(&self, path: &Path, size_limit: u64) -> Result<String, ReadError> {
        let content = self.files.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path.display()))
        })?;

        let size = content.len() as u64;
        if size > size_limit {
            return Err(ReadError::TooLarge { size, limit: size_limit });
        }

        Ok(content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn fs_source_reads_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("system-auth");
        std::fs::write(&path, "auth required pam_env.so\n").unwrap();

        let content = FsSource.read_text(&path, 1024).unwrap();
        assert_eq!(content, "auth required pam_env.so\n");
    }

    #[test]
    fn fs_source_enforces_size_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[b'#'; 64]).unwrap();

        let err = FsSource.read_text(&path, 63).unwrap_err();
        assert!(matches!(err, ReadError::TooLarge { size: 64, limit: 63 }));

        assert!(FsSource.read_text(&path, 64).is_ok());
    }

    #[test]
    fn fs_source_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FsSource.read_text(&dir.path().join("missing"), 1024).unwrap_err();
        match err {
            ReadError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn memory_source_serves_registered_files() {
        let source = MemorySource::new().with_file("other", "account required pam_unix.so");

        assert_eq!(source.read_text(Path::new("other"), 1024).unwrap(), "account required pam_unix.so");
        assert!(matches!(source.read_text(Path::new("./other"), 1024), Err(ReadError::Io(_))));
        assert!(matches!(source.read_text(Path::new("other"), 4), Err(ReadError::TooLarge { .. })));
    }
}
