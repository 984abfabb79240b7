//! Configuration for the staged writer.

use std::path::PathBuf;

/// Smallest permitted ring buffer: one reserved slot plus one usable byte.
pub const MIN_BUFFER_CAPACITY: usize = 2;

/// Configuration for a [`FileWriter`](crate::FileWriter).
///
/// # Example
///
/// ```no_run
/// use stagewriter::{FileWriter, WriterConfig};
///
/// let writer = FileWriter::new(
///     WriterConfig::new("/var/cache/assets")
///         .temporary_postfix(".part")
///         .buffer_capacity(4 * 1024 * 1024),
/// )
/// .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Directory all relative paths resolve under.
    pub root: PathBuf,

    /// Postfix appended to the final file name to form the staging path.
    /// Default: ".tmp"
    pub temporary_postfix: String,

    /// Ring buffer capacity in bytes. One byte is reserved to tell a full
    /// buffer from an empty one, so at most `capacity - 1` bytes are ever
    /// in flight. Default: 1 MiB
    pub buffer_capacity: usize,
}

impl WriterConfig {
    /// Create a config writing under `root` with default buffering.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temporary_postfix: ".tmp".to_string(),
            buffer_capacity: 1024 * 1024,
        }
    }

    /// Set the staging-file postfix.
    pub fn temporary_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.temporary_postfix = postfix.into();
        self
    }

    /// Set the ring buffer capacity in bytes.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WriterConfig::new("/tmp/cache");
        assert_eq!(config.root, PathBuf::from("/tmp/cache"));
        assert_eq!(config.temporary_postfix, ".tmp");
        assert_eq!(config.buffer_capacity, 1024 * 1024);
    }

    #[test]
    fn setters_chain() {
        let config = WriterConfig::new("/tmp/cache")
            .temporary_postfix(".part")
            .buffer_capacity(64);
        assert_eq!(config.temporary_postfix, ".part");
        assert_eq!(config.buffer_capacity, 64);
    }
}
