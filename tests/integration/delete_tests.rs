use dupesieve::actions::{delete_batch, DeleteConfig};
use dupesieve::duplicates::DuplicateFinder;
use dupesieve::refine::{Criterion, Refiner};
use dupesieve::report::{load_report, save_report, ReportKind};
use dupesieve::scanner::LocalDirectory;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_delete_refined_report_end_to_end() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    let keep = data.join("item5_original.txt");
    let drop = data.join("item5_copy.txt");
    let unrelated = data.join("readme.txt");
    fs::write(&keep, b"payload").unwrap();
    thread::sleep(Duration::from_millis(50));
    fs::write(&drop, b"payload").unwrap();
    fs::write(&unrelated, b"payload").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(&data))
        .unwrap();
    let refinement = Refiner::new(r"item(?P<uid>\d+)", Criterion::Oldest)
        .unwrap()
        .refine(&groups);
    let filtered = dir.path().join("filtered_duplicates_report.txt");
    save_report(&filtered, ReportKind::Filtered, &refinement.refined).unwrap();

    let paths: Vec<PathBuf> = load_report(&filtered).unwrap().paths().cloned().collect();
    let result = delete_batch(&paths, &DeleteConfig::permanent(), None);

    assert!(result.all_succeeded());
    assert_eq!(result.success_count(), 1);
    assert_eq!(result.bytes_freed, 7);
    assert!(keep.exists());
    assert!(!drop.exists());
    assert!(unrelated.exists());
}

#[test]
fn test_dry_run_leaves_files() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, b"12345").unwrap();
    fs::write(&b, b"12345").unwrap();

    let result = delete_batch(&[a.clone(), b.clone()], &DeleteConfig::dry_run(), None);

    assert!(result.dry_run);
    assert_eq!(result.success_count(), 2);
    assert_eq!(result.bytes_freed, 10);
    assert!(result.summary().starts_with("[DRY RUN] Would delete"));
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_delete_skips_missing_and_continues() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("present.txt");
    fs::write(&present, b"x").unwrap();
    let missing = dir.path().join("already_gone.txt");

    let result = delete_batch(
        &[missing.clone(), present.clone()],
        &DeleteConfig::permanent(),
        None,
    );

    assert_eq!(result.skipped, vec![missing]);
    assert_eq!(result.success_count(), 1);
    assert_eq!(result.failure_count(), 0);
    assert!(!present.exists());
}
