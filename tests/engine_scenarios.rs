//! Integration tests for the seed scenarios the equivalence engine must
//! satisfy, exercised end to end: walk a real temp directory, run the
//! engine, and check the `DuplicateSet`s that come out.

use dupescan::engine::{Engine, EngineConfig};
use dupescan::identity::fresh_storage_id;
use dupescan::walker::{walk, WalkOptions};
use dupescan::{DuplicateSet, FileEntry};

fn walk_all(root: &std::path::Path, zero_ok: bool) -> Vec<FileEntry> {
    let options = WalkOptions {
        min_size: if zero_ok { 0 } else { 1 },
        ..WalkOptions::default()
    };
    walk(&[root.to_path_buf()], &options, |e, p| panic!("walk error: {:?} {:?}", p, e))
}

fn run_engine(entries: Vec<FileEntry>, with_identity: bool) -> Vec<DuplicateSet> {
    let mut sets = Vec::new();
    let config = EngineConfig {
        storage_identity_fn: if with_identity {
            Some(Box::new(dupescan::identity::posix_storage_id))
        } else {
            Some(Box::new(|_: &FileEntry| fresh_storage_id()))
        },
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config);
    engine.run(entries, |set| sets.push(set));
    sets
}

#[test]
fn s1_simple_pair() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a"), b"HELLO\n").unwrap();
    std::fs::write(dir.path().join("b"), b"HELLO\n").unwrap();

    let entries = walk_all(dir.path(), false);
    let sets = run_engine(entries, false);

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].instances().len(), 2);
    assert!(sets[0].instances().iter().all(|i| i.entries().len() == 1));
}

#[test]
fn s2_big_files_diverge_mid_file() {
    let dir = tempfile::tempdir().unwrap();
    let size = 30 * 1024 * 1024 + 5;
    let mut a = vec![0xABu8; size];
    let mut b = a.clone();
    b[size / 2] ^= 0xFF;
    std::fs::write(dir.path().join("a"), &a).unwrap();
    std::fs::write(dir.path().join("b"), &b).unwrap();
    a.clear();

    let entries = walk_all(dir.path(), false);
    let sets = run_engine(entries, false);

    assert!(sets.is_empty(), "divergent files must not be reported as duplicates");
}

#[test]
fn s3_big_files_diverge_at_tail() {
    let dir = tempfile::tempdir().unwrap();
    let size = 30 * 1024 * 1024 + 5;
    let mut a = vec![0x42u8; size];
    let mut b = a.clone();
    b[size - 1] ^= 0xFF;
    std::fs::write(dir.path().join("a"), &a).unwrap();
    std::fs::write(dir.path().join("b"), &b).unwrap();
    a.clear();

    let entries = walk_all(dir.path(), false);
    let sets = run_engine(entries, false);

    assert!(sets.is_empty(), "comparison must run to the final byte before concluding a match");
}

#[test]
fn s4_open_fd_stress() {
    let dir = tempfile::tempdir().unwrap();
    let content = vec![0x99u8; 3 * 1024 * 1024 + 5];
    for i in 0..321 {
        std::fs::write(dir.path().join(format!("f{i}")), &content).unwrap();
    }

    let entries = walk_all(dir.path(), false);
    let mut sets = Vec::new();
    let bounds = dupescan::ResourceBounds { max_open_files_hard: 64, ..Default::default() };
    let config = EngineConfig {
        bounds,
        storage_identity_fn: Some(Box::new(|_: &FileEntry| fresh_storage_id())),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config);
    engine.run(entries, |set| sets.push(set));

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].instances().len(), 321);
}

#[test]
fn s5_zero_length() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..5 {
        std::fs::write(dir.path().join(format!("empty{i}")), b"").unwrap();
    }

    let entries = walk_all(dir.path(), true);
    let sets = run_engine(entries, false);

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].instances().len(), 5);
    assert!(sets[0].instances().iter().all(|i| i.size() == 0));
}

#[test]
fn s6_hardlink_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let x = dir.path().join("x");
    std::fs::write(&x, b"shared content").unwrap();
    std::fs::hard_link(&x, dir.path().join("x_link")).unwrap();
    std::fs::write(dir.path().join("copy1"), b"shared content").unwrap();
    std::fs::write(dir.path().join("copy2"), b"shared content").unwrap();

    let entries = walk_all(dir.path(), false);

    let sets_with_identity = run_engine(entries.clone(), true);
    assert_eq!(sets_with_identity.len(), 1);
    assert_eq!(sets_with_identity[0].instances().len(), 3);
    assert!(sets_with_identity[0].instances().iter().any(|i| i.has_aliases()));

    let sets_without_identity = run_engine(entries, false);
    assert_eq!(sets_without_identity.len(), 1);
    assert_eq!(sets_without_identity[0].instances().len(), 4);
    assert!(sets_without_identity[0].instances().iter().all(|i| !i.has_aliases()));
}

#[test]
fn s7_only_mixed_roots_cancel() {
    let root_a = tempfile::tempdir().unwrap();
    let root_b = tempfile::tempdir().unwrap();

    std::fs::write(root_a.path().join("d1"), b"dup-in-a").unwrap();
    std::fs::write(root_a.path().join("d2"), b"dup-in-a").unwrap();
    std::fs::write(root_a.path().join("d3"), b"dup-in-a").unwrap();
    std::fs::write(root_a.path().join("cross"), b"cross-root").unwrap();
    std::fs::write(root_b.path().join("cross"), b"cross-root").unwrap();

    let options = WalkOptions::default();
    let roots = vec![root_a.path().to_path_buf(), root_b.path().to_path_buf()];
    let entries = walk(&roots, &options, |_, _| {});

    let cancel_fn = |set: &DuplicateSet| -> bool {
        let mut roots = set.instances().iter().flat_map(|i| i.entries().iter()).map(|e| e.root().index());
        let first = match roots.next() {
            Some(r) => r,
            None => return true,
        };
        roots.all(|r| r == first)
    };

    let mut sets = Vec::new();
    let config = EngineConfig {
        storage_identity_fn: Some(Box::new(|_: &FileEntry| fresh_storage_id())),
        cancel_fn: Some(&cancel_fn),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config);
    engine.run(entries, |set| sets.push(set));

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].instances().len(), 2);
    let roots: Vec<_> = sets[0].instances().iter().map(|i| i.entries()[0].root().index()).collect();
    assert_ne!(roots[0], roots[1]);
}
