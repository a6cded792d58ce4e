use dupesieve::duplicates::{DuplicateFinder, FinderConfig};
use dupesieve::scanner::{Hasher, LocalDirectory, ScanError, WalkerConfig};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

fn find(root: &Path) -> (dupesieve::duplicates::DuplicateGroups, dupesieve::duplicates::ScanSummary) {
    DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::from_path(root))
        .unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (groups, summary) = find(dir.path());

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"content a");
    write_file(&dir.path().join("b.txt"), b"content b");
    write_file(&dir.path().join("c.txt"), b"content c");

    let (groups, summary) = find(dir.path());

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.hashed_files, 3);
    assert_eq!(summary.eliminated_unique, 3);
}

#[test]
fn test_scan_item_versions() {
    let dir = tempdir().unwrap();
    let v1 = dir.path().join("a/item1_v1.txt");
    let v2 = dir.path().join("b/item1_v2.txt");
    write_file(&v1, b"same bytes");
    write_file(&v2, b"same bytes");
    write_file(&dir.path().join("c/item2.txt"), b"other bytes");

    let (groups, summary) = find(dir.path());

    let digest = Hasher::default().hash_bytes(b"same bytes");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.get(&digest).unwrap(), &[v1, v2][..]);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 10);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("top.bin"), b"nested duplicate");
    write_file(&dir.path().join("one/two/three/deep.bin"), b"nested duplicate");

    let (groups, _) = find(dir.path());

    assert_eq!(groups.len(), 1);
    assert_eq!(groups.file_count(), 2);
}

#[test]
fn test_scan_extension_filter() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.pdf"), b"book");
    write_file(&dir.path().join("b.PDF"), b"book");
    write_file(&dir.path().join("c.txt"), b"book");

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_extensions(vec![".pdf".to_string()]));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&LocalDirectory::from_path(dir.path()))
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    let members = groups.iter().next().unwrap().1;
    assert!(members.iter().all(|p| p.extension().unwrap() != "txt"));
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        write_file(&dir.path().join(format!("f{i}.dat")), format!("{}", i % 4).as_bytes());
    }

    let config = FinderConfig::default().with_concurrency(4);
    let finder = DuplicateFinder::new(config);
    let provider = LocalDirectory::from_path(dir.path());

    let (first, _) = finder.find_duplicates(&provider).unwrap();
    let (second, _) = finder.find_duplicates(&provider).unwrap();

    assert_eq!(first.len(), 4);
    for (digest, members) in first.iter() {
        let a: BTreeSet<&PathBuf> = members.iter().collect();
        let b: BTreeSet<&PathBuf> = second.get(digest).unwrap().iter().collect();
        assert_eq!(a, b);
    }
}

#[test]
fn test_scan_groups_are_sound_and_complete() {
    let dir = tempdir().unwrap();
    let contents: [&[u8]; 5] = [b"alpha", b"beta", b"alpha", b"gamma", b"beta"];
    for (i, content) in contents.iter().enumerate() {
        write_file(&dir.path().join(format!("file{i}")), content);
    }

    let (groups, _) = find(dir.path());

    // Soundness: all members of a group share bytes
    for (_, members) in groups.iter() {
        let first = fs::read(&members[0]).unwrap();
        for member in &members[1..] {
            assert_eq!(fs::read(member).unwrap(), first);
        }
    }

    // Completeness: every pair of equal files shares a group
    for i in 0..contents.len() {
        for j in (i + 1)..contents.len() {
            if contents[i] != contents[j] {
                continue;
            }
            let pi = dir.path().join(format!("file{i}"));
            let pj = dir.path().join(format!("file{j}"));
            assert!(groups
                .iter()
                .any(|(_, m)| m.contains(&pi) && m.contains(&pj)));
        }
    }
    assert_eq!(groups.len(), 2);
}

#[test]
fn test_scan_missing_root() {
    let result = DuplicateFinder::with_defaults()
        .find_duplicates(&LocalDirectory::new("/nonexistent/dupesieve/scan/root"));

    assert!(matches!(result, Err(ScanError::NotFound(_))));
}

#[test]
fn test_scan_rejects_network_location() {
    let result =
        DuplicateFinder::with_defaults().find_duplicates(&LocalDirectory::new("smb://nas/share"));

    assert!(matches!(result, Err(ScanError::UnsupportedLocation(_))));
}

#[cfg(unix)]
#[test]
fn test_scan_continues_past_unreadable_file() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"dup");
    write_file(&dir.path().join("b.txt"), b"dup");
    let locked = dir.path().join("locked.txt");
    write_file(&locked, b"dup");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if File::open(&locked).is_ok() {
        // Running with privileges that ignore file modes
        return;
    }

    let (groups, summary) = find(dir.path());

    assert_eq!(groups.len(), 1);
    assert_eq!(groups.file_count(), 2);
    assert_eq!(summary.hash_errors.len(), 1);
    assert_eq!(summary.hash_errors[0].path(), locked);
    assert!(summary.has_errors());

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}
