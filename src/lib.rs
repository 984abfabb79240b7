//! stagewriter: asynchronous staged file writer.
//!
//! This crate decouples byte producers from blocking disk I/O:
//!
//! - **RingBuffer**: bounded byte buffer with two wrapping cursors shared
//!   between producers and the writer thread
//! - **WriteHandle**: caller-visible token for one write session, polled
//!   for completion and captured errors
//! - **Request queue**: FIFO stream of open/flush/close records that
//!   multiplexes interleaved sessions onto one thread
//! - **Writer thread**: the only code that touches the filesystem
//! - **Atomic commit**: each file is written to `path + postfix` and
//!   renamed onto `path` on close, so a partially written file is never
//!   visible at its final path
//!
//! # Architecture
//!
//! ```text
//!  producer threads                        writer thread
//!  ----------------                        -------------
//!  begin(path) ----------- Open ---------> create staging file
//!  write(h, bytes) -+                      |
//!                   |  +-------------+     |
//!                   +->| ring buffer |-- Flush --> write() to staging file
//!                      +-------------+     |
//!  end(h) -------------- Close ----------> close + rename to final path
//!                                          |
//!  h.is_done() / h.error()  <-- - - - - -  done flag + captured error
//! ```
//!
//! Producers never block on disk: `write` copies what fits into the ring
//! buffer and returns the accepted length; a shortfall is backpressure and
//! the caller retries the remainder later. All errors raised on the writer
//! thread are captured onto the owning handle; one failing file never
//! stops the writer from servicing others.

mod config;
mod error;
mod handle;
mod request;
mod ring;
mod sync;
mod worker;
mod writer;

pub mod metrics;

pub use config::{MIN_BUFFER_CAPACITY, WriterConfig};
pub use error::{BuildError, PathError, WriteError, WriteErrorKind};
pub use handle::WriteHandle;
pub use writer::FileWriter;
