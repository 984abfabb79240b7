//! Fuzz arbitrary write schedules against a reference model.
//!
//! The input bytes drive chunk boundaries across two interleaved
//! sessions; whatever the writer reports as accepted must be exactly what
//! lands in each final file, in order.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stagewriter::{FileWriter, WriterConfig};
use tempfile::TempDir;

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = TempDir::new() else { return };
    let writer = FileWriter::new(
        WriterConfig::new(dir.path()).buffer_capacity(16),
    )
    .expect("writer");

    let handles = [
        writer.begin("a.bin").expect("begin a"),
        writer.begin("b.bin").expect("begin b"),
    ];
    let mut expected: [Vec<u8>; 2] = [Vec::new(), Vec::new()];

    // Each input byte is one write call: low bit picks the session, the
    // rest sizes the chunk.
    for (i, &byte) in data.iter().enumerate().take(512) {
        let session = (byte & 1) as usize;
        let chunk = vec![byte ^ i as u8; (byte >> 1) as usize];
        let accepted = writer.write(&handles[session], &chunk);
        assert!(accepted <= chunk.len());
        assert!(writer.pending_bytes() < 16);
        expected[session].extend_from_slice(&chunk[..accepted]);
    }

    writer.end(&handles[0]);
    writer.end(&handles[1]);
    drop(writer);

    for (handle, expected) in handles.iter().zip(&expected) {
        assert!(handle.is_done());
        assert!(handle.error().is_none());
        let path = dir.path().join(handle.path());
        assert_eq!(std::fs::read(&path).expect("final file"), *expected);
    }
});
