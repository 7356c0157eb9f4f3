//! Tests for archive naming

use crate::codec::Compression;
use crate::naming::{ArchiveName, ArchiveNaming, archive_dir, archive_path, with_suffix};
use chrono::{Duration, TimeZone, Utc};
use std::path::Path;

fn rotation_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 10, 15, 0).unwrap() + Duration::milliseconds(123)
}

// ============================================================================
// Key Tests
// ============================================================================

#[test]
fn test_sequence_key_is_zero_padded() {
    assert_eq!(ArchiveNaming::Sequence.key(7, rotation_time()), "0000000007");
}

#[test]
fn test_timestamp_key_format() {
    assert_eq!(
        ArchiveNaming::Timestamp.key(7, rotation_time()),
        "20261016T101500.123Z-0000000007"
    );
}

#[test]
fn test_sequence_keys_sort_numerically() {
    let now = rotation_time();
    let mut keys: Vec<String> = [10, 9, 100, 1]
        .into_iter()
        .map(|seq| ArchiveNaming::Sequence.key(seq, now))
        .collect();
    keys.sort();

    let parsed: Vec<u64> = keys
        .iter()
        .map(|k| ArchiveNaming::Sequence.parse_key(k).unwrap().0)
        .collect();
    assert_eq!(parsed, vec![1, 9, 10, 100]);
}

#[test]
fn test_timestamp_keys_sort_by_time_then_sequence() {
    let earlier = rotation_time();
    let later = earlier + Duration::seconds(1);

    let mut keys = vec![
        ArchiveNaming::Timestamp.key(3, later),
        ArchiveNaming::Timestamp.key(2, earlier),
        ArchiveNaming::Timestamp.key(1, earlier),
    ];
    keys.sort();

    assert!(keys[0].ends_with("0000000001"));
    assert!(keys[1].ends_with("0000000002"));
    assert!(keys[2].ends_with("0000000003"));
}

#[test]
fn test_parse_timestamp_key_round_trip() {
    let now = rotation_time();
    let key = ArchiveNaming::Timestamp.key(42, now);

    let (sequence, time) = ArchiveNaming::Timestamp.parse_key(&key).unwrap();
    assert_eq!(sequence, 42);
    assert_eq!(time, Some(now));
}

#[test]
fn test_parse_key_rejects_other_scheme() {
    let now = rotation_time();
    let timestamp_key = ArchiveNaming::Timestamp.key(1, now);
    let sequence_key = ArchiveNaming::Sequence.key(1, now);

    assert!(ArchiveNaming::Sequence.parse_key(&timestamp_key).is_none());
    assert!(ArchiveNaming::Timestamp.parse_key(&sequence_key).is_none());
}

#[test]
fn test_parse_key_rejects_short_or_non_numeric() {
    assert!(ArchiveNaming::Sequence.parse_key("7").is_none());
    assert!(ArchiveNaming::Sequence.parse_key("00000000x7").is_none());
    assert!(ArchiveNaming::Timestamp.parse_key("garbage-0000000001").is_none());
}

// ============================================================================
// ArchiveName Tests
// ============================================================================

#[test]
fn test_parse_plain_archive() {
    let name = ArchiveName::parse("app.log", "app.log.0000000003", ArchiveNaming::Sequence).unwrap();
    assert_eq!(name.key, "0000000003");
    assert_eq!(name.sequence, 3);
    assert_eq!(name.timestamp, None);
    assert_eq!(name.compression, Compression::None);
}

#[test]
fn test_parse_compressed_archive() {
    let gz = ArchiveName::parse("app.log", "app.log.0000000003.gz", ArchiveNaming::Sequence).unwrap();
    assert_eq!(gz.compression, Compression::Gzip);
    assert_eq!(gz.key, "0000000003");

    let lz4 =
        ArchiveName::parse("app.log", "app.log.0000000004.lz4", ArchiveNaming::Sequence).unwrap();
    assert_eq!(lz4.compression, Compression::Lz4);
}

#[test]
fn test_parse_ignores_unrelated_files() {
    let naming = ArchiveNaming::Sequence;
    assert!(ArchiveName::parse("app.log", "app.log", naming).is_none());
    assert!(ArchiveName::parse("app.log", "app.log.old", naming).is_none());
    assert!(ArchiveName::parse("app.log", "other.log.0000000001", naming).is_none());
    assert!(ArchiveName::parse("app", "app.log.0000000001", naming).is_none());
    assert!(ArchiveName::parse("app.log", "app.log.0000000001.gz.tmp", naming).is_none());
}

// ============================================================================
// Path Tests
// ============================================================================

#[test]
fn test_archive_path() {
    assert_eq!(
        archive_path(Path::new("/var/log/app.log"), "0000000001"),
        Path::new("/var/log/app.log.0000000001")
    );
}

#[test]
fn test_with_suffix() {
    assert_eq!(
        with_suffix(Path::new("logs/app.log.0000000001"), ".gz"),
        Path::new("logs/app.log.0000000001.gz")
    );
}

#[test]
fn test_archive_dir() {
    assert_eq!(archive_dir(Path::new("/var/log/app.log")), Path::new("/var/log"));
    assert_eq!(archive_dir(Path::new("app.log")), Path::new("."));
}
