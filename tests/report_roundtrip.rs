//! Exercises the report writer/parser together against engine output,
//! rather than re-testing the escape grammar covered by `report.rs`'s
//! own unit tests.

use dupescan::engine::{Engine, EngineConfig};
use dupescan::identity::fresh_storage_id;
use dupescan::report::{parse_report, write_report};
use dupescan::walker::{walk, WalkOptions};
use dupescan::FileEntry;

#[test]
fn write_then_parse_preserves_set_and_instance_shape() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a"), b"same bytes").unwrap();
    std::fs::write(dir.path().join("b"), b"same bytes").unwrap();
    std::fs::write(dir.path().join("unique"), b"only one of these").unwrap();

    let entries = walk(&[dir.path().to_path_buf()], &WalkOptions::default(), |_, _| {});

    let mut sets = Vec::new();
    let config = EngineConfig {
        storage_identity_fn: Some(Box::new(|_: &FileEntry| fresh_storage_id())),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config);
    engine.run(entries, |set| sets.push(set));
    assert_eq!(sets.len(), 1, "only the duplicate pair should surface as a set");

    let mut buf: Vec<u8> = Vec::new();
    write_report(&mut buf, &sets).unwrap();

    let parsed = parse_report(std::io::Cursor::new(&buf)).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].instances.len(), 2);
    for instance in &parsed[0].instances {
        assert_eq!(instance.paths.len(), 1);
    }
}

#[test]
fn paths_with_spaces_and_unicode_round_trip_through_a_written_report() {
    let dir = tempfile::tempdir().unwrap();
    let weird_name = " leading space and emoji \u{1F600}.txt";
    std::fs::write(dir.path().join(weird_name), b"payload").unwrap();
    std::fs::write(dir.path().join("plain.txt"), b"payload").unwrap();

    let entries = walk(&[dir.path().to_path_buf()], &WalkOptions::default(), |_, _| {});

    let mut sets = Vec::new();
    let config = EngineConfig {
        storage_identity_fn: Some(Box::new(|_: &FileEntry| fresh_storage_id())),
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config);
    engine.run(entries, |set| sets.push(set));

    let mut buf: Vec<u8> = Vec::new();
    write_report(&mut buf, &sets).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let parsed = parse_report(std::io::Cursor::new(text.as_bytes())).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].instances.len(), 2);
}
