//! Control records multiplexing handle operations onto the writer thread.
//!
//! Every producer intent is serialized into one FIFO stream of small
//! records. Ownership of a record transfers to the writer thread at
//! enqueue time, and records are serviced strictly in enqueue order, so
//! per-handle operation order is the producer's program order end-to-end.
//!
//! The channel doubles as the wakeup primitive: the writer thread blocks
//! on `recv` with zero CPU use when the queue is empty and wakes once per
//! enqueued record.

use crate::handle::HandleShared;
use std::sync::Arc;

pub(crate) enum Request {
    /// Create and open the staging file for this handle.
    Open(Arc<HandleShared>),

    /// Flush `len` bytes starting at `offset` in the ring buffer into the
    /// handle's staging file. `len` is always non-zero and never exceeds
    /// the region the producer published before enqueuing.
    Flush {
        handle: Arc<HandleShared>,
        offset: usize,
        len: usize,
    },

    /// Close the staging file and rename it to its final path.
    Close(Arc<HandleShared>),

    /// Terminate the writer thread once every prior record is serviced.
    Shutdown,
}
