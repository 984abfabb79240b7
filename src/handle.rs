//! Producer-visible write handles.
//!
//! A [`WriteHandle`] is the caller's token for one file-write session. It
//! exposes exactly two things across the thread boundary: a `done` flag
//! and the error captured by the writer thread, if any. Both fields are
//! written only by the writer thread and read by any producer thread;
//! everything else about the session (the open file, the staging path)
//! lives in the writer thread's own registry and never crosses over.

use crate::error::WriteError;
use crate::sync::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared half of a write session.
///
/// `done` flips false -> true exactly once, either on successful commit or
/// on the first captured I/O error, and never reverts. The error slot is
/// written (at most once) before `done` is published, so a producer that
/// observes `done == true` also observes the error that caused it.
pub(crate) struct HandleShared {
    id: u64,
    path: String,
    done: AtomicBool,
    error: OnceLock<WriteError>,
}

impl HandleShared {
    pub(crate) fn new(id: u64, path: String) -> Self {
        Self {
            id,
            path,
            done: AtomicBool::new(false),
            error: OnceLock::new(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Mark the session complete. Writer thread only.
    pub(crate) fn complete(&self) {
        debug_assert!(!self.is_done());
        self.done.store(true, Ordering::Release);
    }

    /// Record a captured error and mark the session done. Writer thread
    /// only.
    pub(crate) fn fail(&self, error: WriteError) {
        debug_assert!(!self.is_done());
        let _ = self.error.set(error);
        self.done.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn error(&self) -> Option<&WriteError> {
        self.error.get()
    }
}

/// Caller-visible token for one file-write session.
///
/// Cloning a handle is cheap and clones share the same session. Dropping
/// every clone before calling [`FileWriter::end`](crate::FileWriter::end)
/// abandons the session; the writer thread closes the staging file during
/// shutdown so no file descriptor leaks, but the file is never renamed to
/// its final path.
#[derive(Clone)]
pub struct WriteHandle {
    shared: Arc<HandleShared>,
}

impl WriteHandle {
    pub(crate) fn new(shared: Arc<HandleShared>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &Arc<HandleShared> {
        &self.shared
    }

    /// The relative path this session writes to, as passed to
    /// [`FileWriter::begin`](crate::FileWriter::begin).
    pub fn path(&self) -> &str {
        self.shared.path()
    }

    /// Whether the session has reached its terminal state, successfully
    /// or not. Once true, further writes are no-ops.
    pub fn is_done(&self) -> bool {
        self.shared.is_done()
    }

    /// The error that terminated the session, if it failed.
    ///
    /// Meaningful once [`is_done`](Self::is_done) returns true; a done
    /// session with no error committed successfully.
    pub fn error(&self) -> Option<&WriteError> {
        self.shared.error()
    }
}

impl std::fmt::Debug for WriteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteHandle")
            .field("path", &self.path())
            .field("done", &self.is_done())
            .finish()
    }
}
