use dupesieve::duplicates::{DuplicateFinder, DuplicateGroups};
use dupesieve::refine::{Criterion, Refiner};
use dupesieve::report::{load_report, save_report, ReportKind};
use dupesieve::scanner::{Hasher, LocalDirectory};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

const ITEM_PATTERN: &str = r"item(?P<uid>\d+)";

fn write_file(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn pause() {
    thread::sleep(Duration::from_millis(50));
}

#[test]
fn test_refine_keeps_oldest_version() {
    let dir = tempdir().unwrap();
    let v1 = dir.path().join("a/item1_v1.txt");
    let v2 = dir.path().join("b/item1_v2.txt");
    write_file(&v1, b"identical");
    pause();
    write_file(&v2, b"identical");
    write_file(&dir.path().join("c/item2.txt"), b"different");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(dir.path()))
        .unwrap();

    let refinement = Refiner::new(ITEM_PATTERN, Criterion::Oldest)
        .unwrap()
        .refine(&groups);

    let digest = Hasher::default().hash_bytes(b"identical");
    assert_eq!(refinement.refined.len(), 1);
    assert_eq!(refinement.refined[&digest], vec![v2]);
    assert_eq!(refinement.summary.groups_examined, 1);
    assert_eq!(refinement.summary.files_removed, 1);
    assert_eq!(refinement.summary.reclaimable_bytes, 9);
    assert!(v1.exists());
}

#[test]
fn test_refine_keeps_one_per_identifier() {
    let dir = tempdir().unwrap();
    let paths = [
        dir.path().join("x/item1_a.bin"),
        dir.path().join("y/item1_b.bin"),
        dir.path().join("x/item2_a.bin"),
        dir.path().join("y/item2_b.bin"),
        dir.path().join("z/item2_c.bin"),
    ];
    for path in &paths {
        write_file(path, b"shared payload");
        pause();
    }

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(dir.path()))
        .unwrap();
    assert_eq!(groups.file_count(), 5);

    let refinement = Refiner::new(ITEM_PATTERN, Criterion::Oldest)
        .unwrap()
        .refine(&groups);

    let removed = refinement.refined.values().next().unwrap();
    assert_eq!(removed.len(), 3);
    assert!(!removed.contains(&paths[0]));
    assert!(!removed.contains(&paths[2]));
    assert!(removed.contains(&paths[1]));
    assert!(removed.contains(&paths[3]));
    assert!(removed.contains(&paths[4]));
}

#[test]
fn test_refine_leaves_unidentified_members_alone() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("item7_first.txt");
    let b = dir.path().join("item7_second.txt");
    let stray = dir.path().join("notes.txt");
    write_file(&a, b"z");
    pause();
    write_file(&b, b"z");
    write_file(&stray, b"z");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(dir.path()))
        .unwrap();
    let refinement = Refiner::new(ITEM_PATTERN, Criterion::Oldest)
        .unwrap()
        .refine(&groups);

    let removed: Vec<_> = refinement.refined.values().flatten().collect();
    assert_eq!(removed, vec![&b]);
    assert_eq!(refinement.summary.unidentified, 1);
    assert!(refinement.summary.has_skipped());
}

#[test]
fn test_refine_without_matches_is_empty() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("one.txt"), b"q");
    write_file(&dir.path().join("two.txt"), b"q");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(dir.path()))
        .unwrap();
    let refinement = Refiner::new(ITEM_PATTERN, Criterion::Largest)
        .unwrap()
        .refine(&groups);

    assert!(refinement.refined.is_empty());
    assert_eq!(refinement.summary.groups_examined, 1);
    assert_eq!(refinement.summary.groups_refined, 0);
    assert_eq!(refinement.summary.unidentified, 2);
}

#[test]
fn test_refine_shortest_name() {
    let dir = tempdir().unwrap();
    let long = dir.path().join("item3_with_a_long_name.txt");
    let short = dir.path().join("item3.txt");
    write_file(&long, b"body");
    write_file(&short, b"body");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(dir.path()))
        .unwrap();
    let refinement = Refiner::new(ITEM_PATTERN, Criterion::ShortestName)
        .unwrap()
        .refine(&groups);

    let removed: Vec<_> = refinement.refined.values().flatten().collect();
    assert_eq!(removed, vec![&long]);
}

#[test]
fn test_refine_from_report_file() {
    let dir = tempdir().unwrap();
    let v1 = dir.path().join("a/item1_v1.txt");
    let v2 = dir.path().join("b/item1_v2.txt");
    write_file(&v1, b"identical");
    pause();
    write_file(&v2, b"identical");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(dir.path()))
        .unwrap();
    let report_path = dir.path().join("duplicates_report.txt");
    save_report(&report_path, ReportKind::Duplicates, &groups).unwrap();

    let reloaded = DuplicateGroups::from_map(load_report(&report_path).unwrap().into_groups());
    assert_eq!(reloaded, groups);

    let refinement = Refiner::new(ITEM_PATTERN, Criterion::Oldest)
        .unwrap()
        .refine(&reloaded);
    let filtered_path = dir.path().join("filtered_duplicates_report.txt");
    save_report(&filtered_path, ReportKind::Filtered, &refinement.refined).unwrap();

    let text = fs::read_to_string(&filtered_path).unwrap();
    let digest = Hasher::default().hash_bytes(b"identical");
    assert_eq!(
        text,
        format!(
            "Filtered duplicates with hash {digest}:\n  {}\n\n",
            v2.display()
        )
    );
}

#[test]
fn test_refine_skips_vanished_member() {
    let dir = tempdir().unwrap();
    let kept = dir.path().join("item4_a.txt");
    let other = dir.path().join("item4_b.txt");
    write_file(&kept, b"v");
    pause();
    write_file(&other, b"v");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(dir.path()))
        .unwrap();
    fs::remove_file(&kept).unwrap();

    let refinement = Refiner::new(ITEM_PATTERN, Criterion::Oldest)
        .unwrap()
        .refine(&groups);

    // The only readable candidate survives
    assert!(refinement.refined.is_empty());
    assert_eq!(refinement.summary.unreadable, 1);
}

#[test]
fn test_refiner_rejects_bad_pattern() {
    assert!(Refiner::new(r"item(?P<uid>\d+", Criterion::Oldest).is_err());
    assert!(Refiner::new(r"item\d+", Criterion::Oldest).is_err());
}
