use dupesieve::duplicates::DuplicateFinder;
use dupesieve::output::json::MetadataEntry;
use dupesieve::output::{JsonMetadataLog, SqliteMetadataLog};
use dupesieve::report::{load_report, save_report, ReportKind};
use dupesieve::scanner::{Hasher, LocalDirectory};
use std::fs;
use tempfile::tempdir;

fn scanned_report(dir: &std::path::Path) -> std::path::PathBuf {
    let data = dir.join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("one.txt"), b"metadata").unwrap();
    fs::write(data.join("two.txt"), b"metadata").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(&data))
        .unwrap();
    let report_path = dir.join("duplicates_report.txt");
    save_report(&report_path, ReportKind::Duplicates, &groups).unwrap();
    report_path
}

#[test]
fn test_json_log_for_scanned_report() {
    let dir = tempdir().unwrap();
    let report = load_report(&scanned_report(dir.path())).unwrap();
    let out = dir.path().join("duplicate_metadata.json");

    let log = JsonMetadataLog::build(&report, &Hasher::default());
    log.save(&out).unwrap();

    let digest = Hasher::default().hash_bytes(b"metadata").to_hex();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let files = value[&digest].as_array().unwrap();
    assert_eq!(files.len(), 2);
    for file in files {
        assert_eq!(file["size"], 8);
        assert_eq!(file["hash"], digest.as_str());
    }
    assert_eq!(log.error_count(), 0);
}

#[test]
fn test_json_log_records_vanished_file() {
    let dir = tempdir().unwrap();
    let report_path = scanned_report(dir.path());
    fs::remove_file(dir.path().join("data/two.txt")).unwrap();

    let report = load_report(&report_path).unwrap();
    let log = JsonMetadataLog::build(&report, &Hasher::default());

    assert_eq!(log.error_count(), 1);
    let entries = log.entries().values().next().unwrap();
    assert!(matches!(entries[0], MetadataEntry::File { .. }));
    assert!(matches!(entries[1], MetadataEntry::Error { .. }));
}

#[test]
fn test_sqlite_log_for_scanned_report() {
    let dir = tempdir().unwrap();
    let report = load_report(&scanned_report(dir.path())).unwrap();
    let db_path = dir.path().join("duplicates.db");

    let mut db = SqliteMetadataLog::open(&db_path).unwrap();
    let logged = db.log_report(&report).unwrap();
    assert_eq!(logged.rows, 2);
    assert_eq!(logged.errors, 0);

    let rows = db.rows().unwrap();
    let digest = Hasher::default().hash_bytes(b"metadata").to_hex();
    assert!(rows.iter().all(|r| r.hash == digest));
    assert!(rows.iter().all(|r| r.size == Some(8) && r.error.is_none()));
    assert!(rows[0].path.ends_with("one.txt"));
    assert!(rows[1].path.ends_with("two.txt"));
}
