//! Filesystem seam for the mutation engine.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// The file operations a mutation attempt performs.
pub trait FileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Copy `from` to `to`, replacing `to`.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Replace `path` with `content` so that readers see either the old or
    /// the new file, never a partial one.
    fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    /// Tempfile in the same directory, fsync, rename.
    fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".neandoc")
            .suffix(".tmp")
            .tempfile_in(parent)?;

        temp.write_all(content)?;

        // tempfiles are created owner-only; keep the original's mode
        if let Ok(meta) = fs::metadata(path) {
            temp.as_file().set_permissions(meta.permissions())?;
        }

        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
