//! External collaborators: delete and coalesce post-processors.
//!
//! Neither mutates the scanned tree from within the engine (C1-C5) — the
//! core never writes; these run strictly after a `DuplicateSet` has been
//! yielded, at the caller's explicit request (`-x/--delete`,
//! `-c/--coalesce`).

use crate::error::Error;
use crate::partition::DuplicateSet;
use crate::prefer::{pick_keeper, PreferStrategy};
use std::path::Path;

/// Outcome of running delete or coalesce over one [`DuplicateSet`].
pub struct PostprocessOutcome {
    pub kept: std::path::PathBuf,
    pub affected: Vec<std::path::PathBuf>,
    pub errors: Vec<(std::path::PathBuf, Error)>,
}

/// Deletes every entry in `set` except the one `strategy` picks to keep.
/// With `dry_run`, reports what *would* be deleted without touching
/// anything.
pub fn delete(set: &DuplicateSet, strategy: PreferStrategy, dry_run: bool) -> PostprocessOutcome {
    let keeper_path = pick_keeper(set, strategy).path().to_path_buf();
    let mut affected = Vec::new();
    let mut errors = Vec::new();

    for instance in set.instances() {
        for entry in instance.entries() {
            if entry.path() == keeper_path {
                continue;
            }
            if !dry_run {
                if let Err(e) = std::fs::remove_file(entry.path()) {
                    errors.push((entry.path().to_path_buf(), Error::io(entry.path(), e)));
                    continue;
                }
            }
            affected.push(entry.path().to_path_buf());
        }
    }

    PostprocessOutcome { kept: keeper_path, affected, errors }
}

/// Hard-links every entry in `set` to the one `strategy` picks to keep,
/// reclaiming the space taken by the others without deleting any path.
pub fn coalesce(set: &DuplicateSet, strategy: PreferStrategy, dry_run: bool) -> PostprocessOutcome {
    let keeper_path = pick_keeper(set, strategy).path().to_path_buf();
    let mut affected = Vec::new();
    let mut errors = Vec::new();

    for instance in set.instances() {
        for entry in instance.entries() {
            let path = entry.path();
            if path == keeper_path {
                continue;
            }
            if !dry_run {
                if let Err(e) = relink(path, &keeper_path) {
                    errors.push((path.to_path_buf(), e));
                    continue;
                }
            }
            affected.push(path.to_path_buf());
        }
    }

    PostprocessOutcome { kept: keeper_path, affected, errors }
}

fn relink(path: &Path, keeper_path: &Path) -> Result<(), Error> {
    let tmp = path.with_extension("dupescan-tmp-link");
    std::fs::hard_link(keeper_path, &tmp).map_err(|e| Error::io(keeper_path, e))?;
    std::fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}
