//! Writer metrics.

use metriken::{Counter, Gauge, metric};

/// Bytes accepted into the ring buffer.
#[metric(name = "writer_bytes_accepted")]
pub static BYTES_ACCEPTED: Counter = Counter::new();

/// Bytes rejected because the ring buffer was full (backpressure).
#[metric(name = "writer_bytes_rejected")]
pub static BYTES_REJECTED: Counter = Counter::new();

/// Bytes flushed from the ring buffer into staging files.
#[metric(name = "writer_bytes_flushed")]
pub static BYTES_FLUSHED: Counter = Counter::new();

/// Staging files opened.
#[metric(name = "writer_files_opened")]
pub static FILES_OPENED: Counter = Counter::new();

/// Files committed to their final path.
#[metric(name = "writer_files_committed")]
pub static FILES_COMMITTED: Counter = Counter::new();

/// Staging files closed by the shutdown sweep because their handle was
/// abandoned.
#[metric(name = "writer_files_abandoned")]
pub static FILES_ABANDONED: Counter = Counter::new();

/// Staging files currently open on the writer thread.
#[metric(name = "writer_open_files")]
pub static OPEN_FILES: Gauge = Gauge::new();

/// Failures to create or open a staging file.
#[metric(name = "writer_open_errors")]
pub static OPEN_ERRORS: Counter = Counter::new();

/// Failures while flushing bytes into a staging file.
#[metric(name = "writer_write_errors")]
pub static WRITE_ERRORS: Counter = Counter::new();

/// Failures renaming a staging file onto its final path.
#[metric(name = "writer_rename_errors")]
pub static RENAME_ERRORS: Counter = Counter::new();
