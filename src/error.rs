//! Error types for the staged writer.

use std::io;
use std::path::PathBuf;

/// Which filesystem operation a captured [`WriteError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorKind {
    /// Creating the staging file or its parent directories failed.
    Open,
    /// Flushing buffered bytes into the staging file failed.
    Write,
    /// Renaming the staging file to its final path failed. The fully
    /// written file is left at the staging path, not lost.
    Rename,
}

/// An I/O failure captured on the writer thread.
///
/// These are never propagated across the thread boundary as panics or
/// return values; the writer thread stores them on the owning handle and
/// keeps servicing other files. Producers discover them by polling
/// [`WriteHandle::error`](crate::WriteHandle::error).
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to open staging file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to staging file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to rename {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    /// The operation that failed.
    pub fn kind(&self) -> WriteErrorKind {
        match self {
            WriteError::Open { .. } => WriteErrorKind::Open,
            WriteError::Write { .. } => WriteErrorKind::Write,
            WriteError::Rename { .. } => WriteErrorKind::Rename,
        }
    }

    /// The path the failed operation was acting on.
    pub fn path(&self) -> &PathBuf {
        match self {
            WriteError::Open { path, .. } | WriteError::Write { path, .. } => path,
            WriteError::Rename { from, .. } => from,
        }
    }

    /// The underlying OS error.
    pub fn io_error(&self) -> &io::Error {
        match self {
            WriteError::Open { source, .. }
            | WriteError::Write { source, .. }
            | WriteError::Rename { source, .. } => source,
        }
    }
}

/// Rejected by [`FileWriter::begin`](crate::FileWriter::begin) before
/// anything is enqueued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path must be relative to the writer root: {0}")]
    Absolute(String),
    #[error("path contains a parent directory segment: {0}")]
    ParentTraversal(String),
}

/// Rejected by [`FileWriter::new`](crate::FileWriter::new).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("buffer capacity must be at least 2 bytes, got {0}")]
    CapacityTooSmall(usize),
    #[error("temporary postfix must be non-empty and free of path separators, got {0:?}")]
    InvalidPostfix(String),
    #[error("failed to spawn writer thread: {0}")]
    Spawn(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_context_accessors() {
        let err = WriteError::Rename {
            from: PathBuf::from("cache/a.bin.tmp"),
            to: PathBuf::from("cache/a.bin"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.kind(), WriteErrorKind::Rename);
        assert_eq!(err.path(), &PathBuf::from("cache/a.bin.tmp"));
        assert_eq!(err.io_error().kind(), io::ErrorKind::PermissionDenied);
        assert!(err.to_string().contains("a.bin.tmp"));
    }
}
