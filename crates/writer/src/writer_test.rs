//! Tests for the rotating writer

use crate::codec::Compression;
use crate::config::{OpenMode, RotationConfig};
use crate::error::WriterError;
use crate::writer::{RotatingWriter, discard_partial_write, restore_archive};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn base(dir: &TempDir) -> PathBuf {
    dir.path().join("app.log")
}

fn open(dir: &TempDir, max_size: u64) -> RotatingWriter {
    RotatingWriter::open(RotationConfig::new(base(dir)).with_max_size(max_size)).unwrap()
}

fn files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Open
// ============================================================================

#[test]
fn test_open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("app.log");

    let writer = RotatingWriter::open(RotationConfig::new(&path)).unwrap();

    assert!(path.exists());
    assert_eq!(writer.path(), path);
    assert_eq!(writer.current_size(), 0);
    assert_eq!(writer.sequence(), 1);
    assert!(!writer.is_closed());
}

#[test]
fn test_open_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let err = RotatingWriter::open(RotationConfig::new(base(&dir)).with_max_size(0)).unwrap_err();
    assert!(matches!(err, WriterError::InvalidConfig(_)));
    assert!(!base(&dir).exists());
}

#[test]
fn test_open_removes_stale_temp_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.log.0000000001.gz.tmp"), b"partial").unwrap();

    let _writer = open(&dir, 100);

    assert_eq!(files(&dir), vec!["app.log"]);
}

#[test]
fn test_open_compresses_leftover_archives() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.log.0000000001"), b"left over").unwrap();
    fs::write(dir.path().join("app.log.0000000002"), b"duplicate").unwrap();
    fs::write(dir.path().join("app.log.0000000002.gz"), b"finished").unwrap();

    let config = RotationConfig::new(base(&dir)).with_compression(Compression::Gzip);
    let writer = RotatingWriter::open(config).unwrap();

    assert_eq!(
        files(&dir),
        vec!["app.log", "app.log.0000000001.gz", "app.log.0000000002.gz"]
    );
    assert_eq!(writer.sequence(), 3);
    assert_eq!(writer.metrics().archives_compressed, 1);
}

#[test]
fn test_open_truncate_discards_content() {
    let dir = TempDir::new().unwrap();
    fs::write(base(&dir), b"previous run").unwrap();

    let config = RotationConfig::new(base(&dir)).with_open_mode(OpenMode::Truncate);
    let mut writer = RotatingWriter::open(config).unwrap();
    writer.write(b"fresh").unwrap();
    writer.close().unwrap();

    assert_eq!(fs::read(base(&dir)).unwrap(), b"fresh");
}

// ============================================================================
// Write
// ============================================================================

#[test]
fn test_write_accumulates_size() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 100);

    assert_eq!(writer.write(b"hello ").unwrap(), 6);
    assert_eq!(writer.write(b"world").unwrap(), 5);

    assert_eq!(writer.current_size(), 11);
    assert_eq!(fs::read(base(&dir)).unwrap(), b"hello world");

    let metrics = writer.metrics();
    assert_eq!(metrics.writes, 2);
    assert_eq!(metrics.bytes_written, 11);
    assert_eq!(metrics.rotations, 0);
}

#[test]
fn test_empty_write_is_noop() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 10);
    writer.write(b"0123456789").unwrap();

    assert_eq!(writer.write(b"").unwrap(), 0);

    assert_eq!(writer.metrics().rotations, 0);
    assert_eq!(writer.metrics().writes, 1);
}

#[test]
fn test_write_filling_exactly_does_not_rotate() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 10);

    writer.write(b"01234").unwrap();
    writer.write(b"56789").unwrap();

    assert_eq!(writer.current_size(), 10);
    assert_eq!(files(&dir), vec!["app.log"]);

    writer.write(b"x").unwrap();
    assert_eq!(writer.current_size(), 1);
    assert_eq!(files(&dir), vec!["app.log", "app.log.0000000001"]);
}

#[test]
fn test_write_too_large_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 8);
    writer.write(b"abc").unwrap();

    let err = writer.write(b"123456789").unwrap_err();

    assert!(matches!(err, WriterError::WriteTooLarge { len: 9, max: 8 }));
    assert_eq!(writer.current_size(), 3);
    assert_eq!(fs::read(base(&dir)).unwrap(), b"abc");
    assert_eq!(writer.metrics().write_errors, 1);
}

#[test]
fn test_failed_write_leaves_size_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 100);
    writer.write(b"kept").unwrap();

    // A read-only handle refuses every append
    writer.file = Some(File::open(base(&dir)).unwrap());
    let err = writer.write(b"lost").unwrap_err();

    assert!(matches!(err, WriterError::Write(_)));
    assert_eq!(writer.current_size(), 4);
    assert_eq!(fs::read(base(&dir)).unwrap(), b"kept");

    let metrics = writer.metrics();
    assert_eq!(metrics.writes, 1);
    assert_eq!(metrics.write_errors, 1);
    assert_eq!(metrics.bytes_written, 4);
}

#[test]
fn test_partial_append_is_truncated() {
    let dir = TempDir::new().unwrap();
    let path = base(&dir);
    fs::write(&path, vec![b'a'; 1024]).unwrap();
    let file = OpenOptions::new().append(true).open(&path).unwrap();

    assert_eq!(discard_partial_write(&file, &path, 1000), 1000);
    assert_eq!(fs::metadata(&path).unwrap().len(), 1000);
}

#[test]
fn test_untruncatable_partial_append_reports_file_length() {
    let dir = TempDir::new().unwrap();
    let path = base(&dir);
    fs::write(&path, vec![b'a'; 1024]).unwrap();
    let file = File::open(&path).unwrap();

    assert_eq!(discard_partial_write(&file, &path, 1000), 1024);
    assert_eq!(fs::metadata(&path).unwrap().len(), 1024);
}

#[test]
fn test_io_write_trait() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 1024);

    writeln!(writer, "line {}", 1).unwrap();
    Write::flush(&mut writer).unwrap();

    assert_eq!(fs::read_to_string(base(&dir)).unwrap(), "line 1\n");
}

// ============================================================================
// Rotate
// ============================================================================

#[test]
fn test_rotate_archives_and_reopens() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 100);
    writer.write(b"first").unwrap();

    writer.rotate().unwrap();

    assert_eq!(writer.current_size(), 0);
    assert_eq!(writer.sequence(), 2);
    assert_eq!(
        fs::read(dir.path().join("app.log.0000000001")).unwrap(),
        b"first"
    );
    assert_eq!(fs::read(base(&dir)).unwrap(), b"");

    let archives = writer.archives().unwrap();
    assert_eq!(archives.len(), 1);
    assert_eq!(archives[0].sequence, 1);
}

#[test]
fn test_rotate_when_active_file_vanished() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 100);
    writer.write(b"lost").unwrap();
    fs::remove_file(base(&dir)).unwrap();

    writer.rotate().unwrap();

    assert_eq!(files(&dir), vec!["app.log"]);
    assert_eq!(writer.sequence(), 1);
    writer.write(b"kept").unwrap();
    assert_eq!(fs::read(base(&dir)).unwrap(), b"kept");
}

#[test]
fn test_rename_failure_keeps_writer_usable() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 10);
    writer.write(b"12345678").unwrap();

    // A non-empty directory where the archive should go makes the rename fail
    let blocker = dir.path().join("app.log.0000000001");
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("occupied"), b"").unwrap();

    let err = writer.write(b"abcdef").unwrap_err();
    assert!(matches!(err, WriterError::Rotate { .. }));
    assert_eq!(writer.current_size(), 8);
    assert_eq!(writer.sequence(), 1);
    assert_eq!(writer.metrics().rotation_errors, 1);

    writer.write(b"90").unwrap();
    assert_eq!(fs::read(base(&dir)).unwrap(), b"1234567890");

    fs::remove_dir_all(&blocker).unwrap();
    writer.write(b"abcdef").unwrap();
    assert_eq!(
        fs::read(dir.path().join("app.log.0000000001")).unwrap(),
        b"1234567890"
    );
    assert_eq!(fs::read(base(&dir)).unwrap(), b"abcdef");
}

#[test]
fn test_restore_archive_moves_file_back() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("app.log.0000000001");
    fs::write(&archive, b"archived").unwrap();

    restore_archive(&archive, &base(&dir));

    assert_eq!(files(&dir), vec!["app.log"]);
    assert_eq!(fs::read(base(&dir)).unwrap(), b"archived");
}

// ============================================================================
// Close
// ============================================================================

#[test]
fn test_close_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 100);
    writer.write(b"data").unwrap();

    writer.close().unwrap();
    writer.close().unwrap();

    assert!(writer.is_closed());
    assert_eq!(fs::read(base(&dir)).unwrap(), b"data");
}

#[test]
fn test_operations_after_close_fail() {
    let dir = TempDir::new().unwrap();
    let mut writer = open(&dir, 100);
    writer.close().unwrap();

    assert!(matches!(writer.write(b"late"), Err(WriterError::Closed)));
    assert!(matches!(writer.rotate(), Err(WriterError::Closed)));
    assert!(matches!(writer.sync(), Err(WriterError::Closed)));

    let io_err = Write::write(&mut writer, b"late").unwrap_err();
    assert_eq!(io_err.kind(), std::io::ErrorKind::BrokenPipe);
}

#[test]
fn test_debug_output() {
    let dir = TempDir::new().unwrap();
    let writer = open(&dir, 100);

    let debug = format!("{writer:?}");
    assert!(debug.contains("RotatingWriter"));
    assert!(debug.contains("max_size: 100"));
}
