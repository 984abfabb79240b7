//! The writer thread: sole owner of all filesystem I/O.
//!
//! The thread drains the request queue in FIFO order and dispatches each
//! record against the handle's state. Open file state lives in a registry
//! owned by this thread, so no file handle is ever shared across threads
//! and any session abandoned by its producer is still closed during the
//! shutdown sweep.
//!
//! A per-file I/O error is captured onto the owning handle and never
//! terminates the thread; only the shutdown record does that, after every
//! previously enqueued record has been serviced.

use crate::error::WriteError;
use crate::handle::HandleShared;
use crate::metrics::{
    BYTES_FLUSHED, FILES_ABANDONED, FILES_COMMITTED, FILES_OPENED, OPEN_ERRORS, OPEN_FILES,
    RENAME_ERRORS, WRITE_ERRORS,
};
use crate::request::Request;
use crate::ring::RingBuffer;
use ahash::AHashMap;
use crossbeam_channel::Receiver;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A file being written at its staging path.
///
/// Exists only inside the writer thread's registry. Dropping it closes the
/// descriptor and leaves the staging file on disk.
pub(crate) struct StagedFile {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
}

impl StagedFile {
    /// Create the staging file for `rel` under `root`, creating missing
    /// parent directories. An existing staging file is truncated.
    pub(crate) fn open(root: &Path, rel: &str, postfix: &str) -> Result<Self, WriteError> {
        let final_path = root.join(rel);
        let mut temp_name = final_path.clone().into_os_string();
        temp_name.push(postfix);
        let temp_path = PathBuf::from(temp_name);

        let created = (|| {
            if let Some(parent) = temp_path.parent() {
                fs::create_dir_all(parent)?;
            }
            File::create(&temp_path)
        })();

        match created {
            Ok(file) => Ok(Self {
                file,
                temp_path,
                final_path,
            }),
            Err(source) => Err(WriteError::Open {
                path: temp_path,
                source,
            }),
        }
    }

    pub(crate) fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub(crate) fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk)
    }

    /// Close the stream, then rename the staging file onto the final path.
    ///
    /// On rename failure the fully written file stays at the staging path.
    pub(crate) fn commit(self) -> Result<(), WriteError> {
        let Self {
            file,
            temp_path,
            final_path,
        } = self;
        drop(file);
        fs::rename(&temp_path, &final_path).map_err(|source| WriteError::Rename {
            from: temp_path,
            to: final_path,
            source,
        })
    }
}

pub(crate) struct Worker {
    rx: Receiver<Request>,
    ring: Arc<RingBuffer>,
    root: PathBuf,
    postfix: String,
    /// Open sessions keyed by handle id. Presence means the staging file
    /// was opened and the session has not failed or closed.
    open_files: AHashMap<u64, StagedFile>,
}

impl Worker {
    pub(crate) fn new(
        rx: Receiver<Request>,
        ring: Arc<RingBuffer>,
        root: PathBuf,
        postfix: String,
    ) -> Self {
        Self {
            rx,
            ring,
            root,
            postfix,
            open_files: AHashMap::new(),
        }
    }

    pub(crate) fn run(mut self) {
        debug!(root = %self.root.display(), "writer thread started");
        while let Ok(request) = self.rx.recv() {
            match request {
                Request::Open(handle) => self.open(&handle),
                Request::Flush {
                    handle,
                    offset,
                    len,
                } => self.flush(&handle, offset, len),
                Request::Close(handle) => self.close(&handle),
                Request::Shutdown => break,
            }
        }
        self.sweep();
        debug!("writer thread stopped");
    }

    fn open(&mut self, handle: &Arc<HandleShared>) {
        if handle.is_done() {
            return;
        }
        match StagedFile::open(&self.root, handle.path(), &self.postfix) {
            Ok(staged) => {
                debug!(
                    path = handle.path(),
                    staging = %staged.temp_path().display(),
                    "opened staging file"
                );
                FILES_OPENED.increment();
                OPEN_FILES.increment();
                self.open_files.insert(handle.id(), staged);
            }
            Err(err) => {
                error!(path = handle.path(), error = %err, "open failed");
                OPEN_ERRORS.increment();
                handle.fail(err);
            }
        }
    }

    fn flush(&mut self, handle: &Arc<HandleShared>, offset: usize, len: usize) {
        let ring = Arc::clone(&self.ring);

        let result = match self.open_files.get_mut(&handle.id()) {
            Some(staged) => ring.consume(offset, len, |first, rest| {
                staged.write(first)?;
                if rest.is_empty() {
                    Ok(())
                } else {
                    staged.write(rest)
                }
            }),
            None => {
                // The session already failed; the reserved region still
                // has to be retired or the buffer space is lost for good.
                ring.release(len);
                return;
            }
        };

        match result {
            Ok(()) => {
                BYTES_FLUSHED.add(len as u64);
            }
            Err(source) => {
                let staged = self
                    .open_files
                    .remove(&handle.id())
                    .expect("flush target present");
                let err = WriteError::Write {
                    path: staged.temp_path().to_path_buf(),
                    source,
                };
                error!(path = handle.path(), error = %err, "flush failed");
                WRITE_ERRORS.increment();
                OPEN_FILES.decrement();
                handle.fail(err);
            }
        }
    }

    fn close(&mut self, handle: &Arc<HandleShared>) {
        if handle.is_done() {
            return;
        }
        match self.open_files.remove(&handle.id()) {
            Some(staged) => {
                OPEN_FILES.decrement();
                match staged.commit() {
                    Ok(()) => {
                        debug!(path = handle.path(), "committed");
                        FILES_COMMITTED.increment();
                        handle.complete();
                    }
                    Err(err) => {
                        error!(path = handle.path(), error = %err, "commit failed");
                        RENAME_ERRORS.increment();
                        handle.fail(err);
                    }
                }
            }
            // Never opened: nothing on disk to commit, the session just
            // terminates.
            None => handle.complete(),
        }
    }

    /// Close any session left open at shutdown so no descriptor leaks.
    /// The staging files themselves stay on disk for the owner of the
    /// root directory to clean up.
    fn sweep(&mut self) {
        for (_, staged) in self.open_files.drain() {
            warn!(
                staging = %staged.temp_path().display(),
                "closing abandoned staging file"
            );
            FILES_ABANDONED.increment();
            OPEN_FILES.decrement();
        }
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::error::WriteErrorKind;
    use crossbeam_channel::unbounded;
    use tempfile::TempDir;

    fn test_worker(root: &Path) -> Worker {
        let (_tx, rx) = unbounded();
        Worker::new(
            rx,
            Arc::new(RingBuffer::new(64)),
            root.to_path_buf(),
            ".tmp".to_string(),
        )
    }

    fn handle(id: u64, path: &str) -> Arc<HandleShared> {
        Arc::new(HandleShared::new(id, path.to_string()))
    }

    #[test]
    fn staged_file_creates_parents_and_commits() {
        let dir = TempDir::new().unwrap();
        let mut staged = StagedFile::open(dir.path(), "a/b/c.bin", ".tmp").unwrap();
        staged.write(b"payload").unwrap();

        let temp = dir.path().join("a/b/c.bin.tmp");
        let fin = dir.path().join("a/b/c.bin");
        assert!(temp.exists());
        assert!(!fin.exists());

        staged.commit().unwrap();
        assert!(!temp.exists());
        assert_eq!(fs::read(&fin).unwrap(), b"payload");
    }

    #[test]
    fn commit_overwrites_existing_final_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f.bin"), b"old contents").unwrap();

        let mut staged = StagedFile::open(dir.path(), "f.bin", ".tmp").unwrap();
        staged.write(b"new").unwrap();
        staged.commit().unwrap();

        assert_eq!(fs::read(dir.path().join("f.bin")).unwrap(), b"new");
    }

    #[test]
    fn open_failure_fails_handle() {
        let dir = TempDir::new().unwrap();
        // A directory squatting on the staging path makes creation fail.
        fs::create_dir_all(dir.path().join("x.bin.tmp")).unwrap();

        let mut worker = test_worker(dir.path());
        let h = handle(1, "x.bin");
        worker.open(&h);

        assert!(h.is_done());
        assert_eq!(h.error().unwrap().kind(), WriteErrorKind::Open);
        assert!(worker.open_files.is_empty());
        assert!(!dir.path().join("x.bin").exists());
    }

    #[test]
    fn flush_failure_fails_handle_and_retires_bytes() {
        let dir = TempDir::new().unwrap();
        let mut worker = test_worker(dir.path());

        // Swap in a read-only descriptor so the write leg fails like a
        // full or faulted disk would.
        let temp_path = dir.path().join("y.bin.tmp");
        fs::write(&temp_path, b"").unwrap();
        worker.open_files.insert(
            2,
            StagedFile {
                file: File::open(&temp_path).unwrap(),
                temp_path: temp_path.clone(),
                final_path: dir.path().join("y.bin"),
            },
        );

        let h = handle(2, "y.bin");
        let (offset, len) = worker.ring.reserve_and_copy(b"data");
        assert_eq!(len, 4);
        worker.flush(&h, offset, len);

        assert!(h.is_done());
        assert_eq!(h.error().unwrap().kind(), WriteErrorKind::Write);
        assert!(worker.open_files.is_empty());
        // The region was retired even though the write failed.
        assert_eq!(worker.ring.pending(), 0);
        assert!(!dir.path().join("y.bin").exists());
    }

    #[test]
    fn flush_after_failure_releases_without_writing() {
        let dir = TempDir::new().unwrap();
        let mut worker = test_worker(dir.path());

        let h = handle(3, "z.bin");
        h.fail(WriteError::Open {
            path: dir.path().join("z.bin.tmp"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        });

        let (offset, len) = worker.ring.reserve_and_copy(b"dead bytes");
        worker.flush(&h, offset, len);
        assert_eq!(worker.ring.pending(), 0);
    }

    #[test]
    fn close_without_open_completes_handle() {
        let dir = TempDir::new().unwrap();
        let mut worker = test_worker(dir.path());
        let h = handle(4, "never-opened.bin");
        worker.close(&h);
        assert!(h.is_done());
        assert!(h.error().is_none());
    }

    #[test]
    fn sweep_drains_leaked_sessions() {
        let dir = TempDir::new().unwrap();
        let mut worker = test_worker(dir.path());

        let staged = StagedFile::open(dir.path(), "leaked.bin", ".tmp").unwrap();
        worker.open_files.insert(5, staged);
        worker.sweep();

        assert!(worker.open_files.is_empty());
        assert!(dir.path().join("leaked.bin.tmp").exists());
        assert!(!dir.path().join("leaked.bin").exists());
    }
}
