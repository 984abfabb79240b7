//! Synchronization primitives with optional loom support.
//!
//! This module provides the atomic types shared across the producer/worker
//! boundary. With the `loom` feature enabled, the loom-instrumented
//! versions are substituted so the cursor protocol can be model checked;
//! in production the plain std atomics are used.

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
