//! External collaborator: a small, fixed `--prefer` vocabulary.
//!
//! Covers only enough to let delete/coalesce pick which entry in a
//! [`DuplicateSet`] to keep; an arbitrary selection-criteria grammar
//! isn't implemented.

use crate::entry::FileEntry;
use crate::error::Error;
use crate::partition::DuplicateSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferStrategy {
    Oldest,
    Newest,
    ShortestPath,
    FirstRoot,
}

impl PreferStrategy {
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "oldest" => Ok(PreferStrategy::Oldest),
            "newest" => Ok(PreferStrategy::Newest),
            "shortest-path" => Ok(PreferStrategy::ShortestPath),
            "first-root" => Ok(PreferStrategy::FirstRoot),
            other => Err(Error::config(format!(
                "unknown --prefer strategy '{other}' (expected one of: oldest, newest, shortest-path, first-root)"
            ))),
        }
    }
}

/// Picks the entry to keep within a duplicate set. Ties break on the
/// first entry encountered in canonical (instance, entry) order, so the
/// result is deterministic given a fixed walk order.
pub fn pick_keeper<'a>(set: &'a DuplicateSet, strategy: PreferStrategy) -> &'a FileEntry {
    let all_entries = set.instances().iter().flat_map(|i| i.entries().iter());
    match strategy {
        PreferStrategy::Oldest => all_entries
            .min_by_key(|e| e.mtime())
            .expect("a DuplicateSet always has at least one entry"),
        PreferStrategy::Newest => all_entries
            .max_by_key(|e| e.mtime())
            .expect("a DuplicateSet always has at least one entry"),
        PreferStrategy::ShortestPath => all_entries
            .min_by_key(|e| e.path().as_os_str().len())
            .expect("a DuplicateSet always has at least one entry"),
        PreferStrategy::FirstRoot => all_entries
            .min_by_key(|e| e.root().index())
            .expect("a DuplicateSet always has at least one entry"),
    }
}
