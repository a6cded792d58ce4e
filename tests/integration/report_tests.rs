use dupesieve::duplicates::{DuplicateFinder, DuplicateGroups, FinderConfig};
use dupesieve::report::{load_report, save_report, ReportError, ReportKind};
use dupesieve::scanner::{HashAlgorithm, LocalDirectory};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_scan_report_lists_every_group() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a 1.txt"), b"first").unwrap();
    fs::write(data.join("a 2.txt"), b"first").unwrap();
    fs::write(data.join("b1.txt"), b"second").unwrap();
    fs::write(data.join("b2.txt"), b"second").unwrap();
    fs::write(data.join("b3.txt"), b"second").unwrap();

    let config = FinderConfig::default().with_algorithm(HashAlgorithm::Blake3);
    let (groups, _) = DuplicateFinder::new(config)
        .find_duplicates(&LocalDirectory::from_path(&data))
        .unwrap();

    let report_path = dir.path().join("duplicates_report.txt");
    save_report(&report_path, ReportKind::Duplicates, &groups).unwrap();

    let text = fs::read_to_string(&report_path).unwrap();
    assert_eq!(text.matches("Duplicate files with hash ").count(), 2);
    assert_eq!(text.lines().filter(|l| l.starts_with("  ")).count(), 5);
    assert!(text.ends_with("\n\n"));

    let parsed = load_report(&report_path).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.path_count(), 5);
    assert!(parsed.paths().any(|p| p == &data.join("a 1.txt")));
    assert_eq!(DuplicateGroups::from_map(parsed.into_groups()), groups);
}

#[test]
fn test_empty_scan_writes_empty_report() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("empty");
    fs::create_dir(&data).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(&data))
        .unwrap();
    let report_path = dir.path().join("duplicates_report.txt");
    save_report(&report_path, ReportKind::Duplicates, &groups).unwrap();

    assert_eq!(fs::read_to_string(&report_path).unwrap(), "");
    assert!(load_report(&report_path).unwrap().is_empty());
}

#[test]
fn test_load_hand_edited_report() {
    let dir = tempdir().unwrap();
    let report_path = dir.path().join("filtered_duplicates_report.txt");
    let digest = "ab".repeat(32);
    fs::write(
        &report_path,
        format!(
            "Filtered duplicates with hash {digest}:\n\t/srv/one.pdf\n    /srv/two.pdf   \n\n\n"
        ),
    )
    .unwrap();

    let parsed = load_report(&report_path).unwrap();

    let paths: Vec<_> = parsed.paths().map(|p| p.to_string_lossy().into_owned()).collect();
    assert_eq!(paths, vec!["/srv/one.pdf", "/srv/two.pdf"]);
}

#[test]
fn test_load_report_with_bad_header() {
    let dir = tempdir().unwrap();
    let report_path = dir.path().join("broken.txt");
    fs::write(&report_path, "Duplicate files with hash nothex:\n  /x\n").unwrap();

    let err = load_report(&report_path).unwrap_err();

    assert!(matches!(err, ReportError::InvalidDigest { line: 1, .. }));
}
