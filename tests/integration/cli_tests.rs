use clap::Parser;
use dupesieve::cli::Cli;
use dupesieve::error::ExitCode;
use dupesieve::report::{load_report, ReportKind};
use dupesieve::run_app;
use dupesieve::scanner::Hasher;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const PATTERN: &str = r"item(?P<uid>\d+)_";

/// Run the CLI quietly with a config file that does not exist.
fn run(dir: &Path, args: &[&dyn AsRef<OsStr>]) -> anyhow::Result<ExitCode> {
    let mut argv: Vec<OsString> = vec![
        "dupesieve".into(),
        "-q".into(),
        "--config".into(),
        dir.join("absent.toml").into(),
    ];
    argv.extend(args.iter().map(|a| AsRef::<OsStr>::as_ref(*a).to_os_string()));
    run_app(Cli::try_parse_from(argv).unwrap())
}

/// Creates item1_a.txt, item1_copy.txt, item2_a.txt and readme.txt with
/// identical content under `dir/data`.
fn setup_library(dir: &Path) -> PathBuf {
    let data = dir.join("data");
    fs::create_dir(&data).unwrap();
    for name in ["item1_a.txt", "item1_copy.txt", "item2_a.txt", "readme.txt"] {
        fs::write(data.join(name), b"library").unwrap();
    }
    data
}

fn write_raw_report(path: &Path, members: &[PathBuf]) {
    let digest = Hasher::default().hash_bytes(b"library");
    let mut text = format!("Duplicate files with hash {digest}:\n");
    for member in members {
        text.push_str(&format!("  {}\n", member.display()));
    }
    text.push('\n');
    fs::write(path, text).unwrap();
}

#[test]
fn test_scan_pattern_delete_keeps_one_per_identifier() {
    let dir = tempdir().unwrap();
    let data = setup_library(dir.path());
    let report = dir.path().join("report.txt");
    let filtered = dir.path().join("filtered.txt");

    let code = run(
        dir.path(),
        &[
            &"scan",
            &data,
            &"-o",
            &report,
            &"--pattern",
            &PATTERN,
            &"--criterion",
            &"shortest_name",
            &"--filtered-output",
            &filtered,
            &"--delete",
            &"--permanent",
            &"-y",
        ],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(data.join("item1_a.txt").exists());
    assert!(!data.join("item1_copy.txt").exists());
    assert!(data.join("item2_a.txt").exists());
    assert!(data.join("readme.txt").exists());

    let parsed = load_report(&filtered).unwrap();
    assert_eq!(
        parsed.paths().cloned().collect::<Vec<_>>(),
        vec![data.join("item1_copy.txt")]
    );
}

#[test]
fn test_scan_delete_without_pattern_keeps_first() {
    let dir = tempdir().unwrap();
    let data = setup_library(dir.path());
    let report = dir.path().join("report.txt");

    let code = run(
        dir.path(),
        &[&"scan", &data, &"-o", &report, &"--delete", &"--permanent", &"-y"],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let remaining: Vec<_> = fs::read_dir(&data).unwrap().collect();
    assert_eq!(remaining.len(), 1);
    assert!(data.join("item1_a.txt").exists());
}

#[test]
fn test_scan_empty_directory_reports_no_duplicates() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let report = dir.path().join("report.txt");

    let code = run(dir.path(), &[&"scan", &data, &"-o", &report]).unwrap();

    assert_eq!(code, ExitCode::NoDuplicates);
    assert_eq!(fs::read_to_string(&report).unwrap(), "");
}

#[test]
fn test_refine_writes_filtered_report() {
    let dir = tempdir().unwrap();
    let data = setup_library(dir.path());
    let report = dir.path().join("report.txt");
    let filtered = dir.path().join("filtered.txt");

    run(dir.path(), &[&"scan", &data, &"-o", &report]).unwrap();
    let code = run(
        dir.path(),
        &[
            &"refine",
            &report,
            &"-r",
            &PATTERN,
            &"-c",
            &"shortest_name",
            &"-o",
            &filtered,
        ],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let parsed = load_report(&filtered).unwrap();
    let digest = Hasher::default().hash_bytes(b"library");
    assert_eq!(parsed.kind(&digest), Some(ReportKind::Filtered));
    assert_eq!(
        parsed.paths().cloned().collect::<Vec<_>>(),
        vec![data.join("item1_copy.txt")]
    );
    // Refinement never touches the files
    assert_eq!(fs::read_dir(&data).unwrap().count(), 4);
}

#[test]
fn test_refine_concatenated_report_spares_survivor() {
    let dir = tempdir().unwrap();
    let data = setup_library(dir.path());
    let report = dir.path().join("report.txt");
    let filtered = dir.path().join("filtered.txt");

    let members = vec![data.join("item1_a.txt"), data.join("item1_copy.txt")];
    write_raw_report(&report, &members);
    let once = fs::read_to_string(&report).unwrap();
    fs::write(&report, once.repeat(2)).unwrap();

    run(
        dir.path(),
        &[
            &"refine",
            &report,
            &"-r",
            &PATTERN,
            &"-c",
            &"first_encountered",
            &"-o",
            &filtered,
        ],
    )
    .unwrap();
    let code = run(
        dir.path(),
        &[&"delete", &filtered, &"--execute", &"--permanent", &"-y"],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(members[0].exists());
    assert!(!members[1].exists());
}

#[test]
fn test_delete_dry_run_leaves_files() {
    let dir = tempdir().unwrap();
    let data = setup_library(dir.path());
    let report = dir.path().join("report.txt");
    let filtered = dir.path().join("filtered.txt");

    run(dir.path(), &[&"scan", &data, &"-o", &report]).unwrap();
    run(
        dir.path(),
        &[&"refine", &report, &"-r", &PATTERN, &"-o", &filtered],
    )
    .unwrap();
    let code = run(dir.path(), &[&"delete", &filtered]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_dir(&data).unwrap().count(), 4);
}

#[test]
fn test_delete_refuses_raw_report() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, b"library").unwrap();
    fs::write(&b, b"library").unwrap();
    let report = dir.path().join("report.txt");
    write_raw_report(&report, &[a.clone(), b.clone()]);

    let err = run(
        dir.path(),
        &[&"delete", &report, &"--execute", &"--permanent", &"-y"],
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("unrefined report"));
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_metadata_sqlite_exit_code_ignores_earlier_runs() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("duplicates.db");
    let present = dir.path().join("present.txt");
    fs::write(&present, b"library").unwrap();

    let stale = dir.path().join("stale.txt");
    write_raw_report(&stale, &[dir.path().join("gone.txt")]);
    let fresh = dir.path().join("fresh.txt");
    write_raw_report(&fresh, &[present]);

    let first = run(
        dir.path(),
        &[&"metadata", &stale, &"--format", &"sqlite", &"-o", &db],
    )
    .unwrap();
    let second = run(
        dir.path(),
        &[&"metadata", &fresh, &"--format", &"sqlite", &"-o", &db],
    )
    .unwrap();

    assert_eq!(first, ExitCode::PartialSuccess);
    assert_eq!(second, ExitCode::Success);
}
