//! Public API: the `FileWriter` front end.

use crate::config::{MIN_BUFFER_CAPACITY, WriterConfig};
use crate::error::{BuildError, PathError};
use crate::handle::{HandleShared, WriteHandle};
use crate::metrics::{BYTES_ACCEPTED, BYTES_REJECTED};
use crate::request::Request;
use crate::ring::RingBuffer;
use crate::sync::{AtomicU64, Ordering};
use crate::worker::Worker;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Asynchronous staged file writer.
///
/// Producers copy bytes into a bounded ring buffer and enqueue small
/// control records; a single background thread performs all disk I/O and
/// commits each file by writing to a staging path and renaming it onto the
/// final path once complete. A file therefore only ever appears at its
/// final path fully written.
///
/// No producer call blocks on disk: [`write`](Self::write) accepts however
/// many bytes currently fit and returns immediately. A short write is
/// backpressure, not an error; retry the remainder once the writer thread
/// has drained some of the buffer:
///
/// ```no_run
/// use stagewriter::{FileWriter, WriterConfig};
///
/// let writer = FileWriter::new(WriterConfig::new("/var/cache/assets")).unwrap();
/// let handle = writer.begin("bundles/ui.bin").unwrap();
///
/// let payload = b"downloaded bytes...";
/// let mut written = 0;
/// while written < payload.len() && !handle.is_done() {
///     written += writer.write(&handle, &payload[written..]);
/// }
/// writer.end(&handle);
///
/// while !handle.is_done() {
///     std::thread::yield_now();
/// }
/// if let Some(error) = handle.error() {
///     eprintln!("write failed: {error}");
/// }
/// ```
///
/// Dropping the writer enqueues a shutdown record and joins the thread;
/// every request enqueued before the drop is serviced first, so drop
/// blocks until all outstanding work (including in-flight commits) is on
/// disk.
pub struct FileWriter {
    ring: Arc<RingBuffer>,
    tx: Sender<Request>,
    /// Serializes the reserve-then-enqueue step across producer threads:
    /// flush records must enter the queue in ring order.
    producer: Mutex<()>,
    next_id: AtomicU64,
    root: PathBuf,
    thread: Option<JoinHandle<()>>,
}

impl FileWriter {
    /// Spawn the writer thread for the given configuration.
    pub fn new(config: WriterConfig) -> Result<Self, BuildError> {
        if config.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(BuildError::CapacityTooSmall(config.buffer_capacity));
        }
        if config.temporary_postfix.is_empty() || config.temporary_postfix.contains(['/', '\\']) {
            return Err(BuildError::InvalidPostfix(config.temporary_postfix));
        }

        let ring = Arc::new(RingBuffer::new(config.buffer_capacity));
        let (tx, rx) = crossbeam_channel::unbounded();

        let worker = Worker::new(
            rx,
            Arc::clone(&ring),
            config.root.clone(),
            config.temporary_postfix,
        );
        let thread = std::thread::Builder::new()
            .name("stagewriter".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            ring,
            tx,
            producer: Mutex::new(()),
            next_id: AtomicU64::new(1),
            root: config.root,
            thread: Some(thread),
        })
    }

    /// Start a write session for `path`, resolved under the writer root.
    ///
    /// The path must be relative and free of parent-directory segments;
    /// missing parent directories are created when the staging file is
    /// opened.
    pub fn begin(&self, path: &str) -> Result<WriteHandle, PathError> {
        validate_path(path)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(HandleShared::new(id, path.to_string()));
        self.tx
            .send(Request::Open(Arc::clone(&shared)))
            .expect("writer thread alive");
        Ok(WriteHandle::new(shared))
    }

    /// Copy as much of `data` as currently fits into the buffer and queue
    /// it for flushing. Returns the number of bytes accepted.
    ///
    /// `data` is caller-owned and may be reused the moment this returns.
    /// A return value short of `data.len()` means the buffer is full;
    /// retry the remainder later. Returns 0 without side effects once the
    /// handle is done.
    pub fn write(&self, handle: &WriteHandle, data: &[u8]) -> usize {
        if data.is_empty() || handle.is_done() {
            return 0;
        }

        let accepted = {
            let _guard = self.producer.lock();
            let (offset, len) = self.ring.reserve_and_copy(data);
            if len > 0 {
                self.tx
                    .send(Request::Flush {
                        handle: Arc::clone(handle.shared()),
                        offset,
                        len,
                    })
                    .expect("writer thread alive");
            }
            len
        };

        BYTES_ACCEPTED.add(accepted as u64);
        if accepted < data.len() {
            BYTES_REJECTED.add((data.len() - accepted) as u64);
        }
        accepted
    }

    /// Signal that no more writes are coming; the writer thread will close
    /// the staging file and rename it onto the final path. No-op if the
    /// handle is already done.
    pub fn end(&self, handle: &WriteHandle) {
        if handle.is_done() {
            return;
        }
        self.tx
            .send(Request::Close(Arc::clone(handle.shared())))
            .expect("writer thread alive");
    }

    /// Number of queued requests the writer thread has not serviced yet.
    pub fn pending_requests(&self) -> usize {
        self.tx.len()
    }

    /// Bytes sitting in the ring buffer awaiting flush.
    pub fn pending_bytes(&self) -> usize {
        self.ring.pending()
    }

    /// Total ring buffer capacity in bytes. At most `capacity - 1` bytes
    /// are ever in flight.
    pub fn buffer_capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// The directory all session paths resolve under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for FileWriter {
    /// Cooperative drain: every request enqueued before the shutdown
    /// record is serviced before the thread exits.
    fn drop(&mut self) {
        let _ = self.tx.send(Request::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn validate_path(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    for component in Path::new(path).components() {
        match component {
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::Absolute(path.to_string()));
            }
            Component::ParentDir => {
                return Err(PathError::ParentTraversal(path.to_string()));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}
