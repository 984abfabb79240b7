//! Integration tests for the shutdown drain.
//!
//! Dropping the writer enqueues the shutdown record behind all previously
//! queued work, so everything submitted before the drop reaches disk.

use stagewriter::{FileWriter, WriterConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn drop_drains_all_queued_work() {
    let dir = TempDir::new().unwrap();
    let writer = FileWriter::new(WriterConfig::new(dir.path()).buffer_capacity(4096)).unwrap();

    let mut expected = Vec::new();
    for i in 0..16 {
        let payload = vec![i as u8; 128];
        let handle = writer.begin(&format!("batch/file-{i}.bin")).unwrap();
        let mut written = 0;
        while written < payload.len() {
            written += writer.write(&handle, &payload[written..]);
        }
        writer.end(&handle);
        expected.push((format!("batch/file-{i}.bin"), payload));
    }

    // No waiting on individual handles: the drop itself is the barrier.
    drop(writer);

    for (path, payload) in expected {
        assert_eq!(fs::read(dir.path().join(path)).unwrap(), payload);
    }
}

#[test]
fn drop_with_idle_queue_returns_promptly() {
    let dir = TempDir::new().unwrap();
    let writer = FileWriter::new(WriterConfig::new(dir.path())).unwrap();
    drop(writer);
}

#[test]
fn abandoned_session_closes_staging_file_without_commit() {
    let dir = TempDir::new().unwrap();
    let writer = FileWriter::new(WriterConfig::new(dir.path())).unwrap();

    let handle = writer.begin("orphan.bin").unwrap();
    writer.write(&handle, b"never finished");
    drop(handle);
    drop(writer);

    // The sweep closed the descriptor; the staging file stays behind for
    // the cache owner to clean up and the final path never appears.
    assert!(dir.path().join("orphan.bin.tmp").exists());
    assert!(!dir.path().join("orphan.bin").exists());
}

#[test]
fn sessions_spanning_drop_still_commit_prior_writes() {
    let dir = TempDir::new().unwrap();
    let writer = FileWriter::new(WriterConfig::new(dir.path()).buffer_capacity(64)).unwrap();

    let handle = writer.begin("partial.bin").unwrap();
    let accepted = writer.write(&handle, b"committed tail missing");
    writer.end(&handle);
    drop(writer);

    let content = fs::read(dir.path().join("partial.bin")).unwrap();
    assert_eq!(content.len(), accepted);
    assert_eq!(&content[..], &b"committed tail missing"[..accepted]);
}
