//! External collaborator: directory traversal and entry filtering.
//!
//! Not part of the core engine (C1-C5). Walks every root with a scoped
//! thread pool, one job per root, the per-entry job being a `stat` +
//! filter instead of a hash.

use crate::entry::{FileEntry, Root};
use crate::error::Error;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

/// Filter knobs the walker applies before an entry ever reaches the
/// engine. A full selection-criteria grammar (arbitrary `--prefer`
/// expressions) isn't implemented; this only covers basename exclusion,
/// symlink policy, recursion depth, and a size range.
pub struct WalkOptions {
    pub follow_symlinks: bool,
    pub recurse: bool,
    pub min_size: u64,
    pub max_size: u64,
    pub exclude_names: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            follow_symlinks: false,
            recurse: true,
            min_size: 0,
            max_size: u64::MAX,
            exclude_names: Vec::new(),
        }
    }
}

impl WalkOptions {
    fn excluded(&self, basename: &std::ffi::OsStr) -> bool {
        let basename = basename.to_string_lossy();
        self.exclude_names.iter().any(|pat| basename == pat.as_str())
    }
}

/// Walks `roots` in parallel using a scoped thread pool sized
/// `num_cpus::get() + 1`, applying
/// `options`, deduplicating exact repeated paths, and forwarding
/// filesystem errors to `on_error`. Returns every entry collected, since
/// the pool's scope must close before results can be handed back.
pub fn walk(
    roots: &[PathBuf],
    options: &WalkOptions,
    mut on_error: impl FnMut(Error, Option<&Path>),
) -> Vec<FileEntry> {
    let pool = scoped_pool::Pool::new(num_cpus::get() + 1);
    let mut collected = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut errors = Vec::new();

    pool.scoped(|scope| {
        let (tx, rx) = channel();

        for (root_index, root_path) in roots.iter().enumerate() {
            let root = Root::new(root_path.clone(), root_index);
            let tx = tx.clone();
            let follow_symlinks = options.follow_symlinks;
            let recurse = options.recurse;
            let min_size = options.min_size;
            let max_size = options.max_size;

            scope.execute(move || {
                let mut walkdir = walkdir::WalkDir::new(root.path()).follow_links(follow_symlinks);
                if !recurse {
                    walkdir = walkdir.max_depth(1);
                }

                for dir_entry in walkdir {
                    match dir_entry {
                        Ok(dir_entry) => {
                            if !dir_entry.file_type().is_file() {
                                continue;
                            }
                            match dir_entry.metadata() {
                                Ok(meta) => {
                                    let size = meta.len();
                                    if size < min_size || size > max_size {
                                        continue;
                                    }
                                    let entry = FileEntry::new(
                                        dir_entry.path().to_path_buf(),
                                        root.clone(),
                                        size,
                                        meta.modified().ok(),
                                        true,
                                        dir_entry.path_is_symlink(),
                                    );
                                    let _ = tx.send(Ok(entry));
                                }
                                Err(e) => {
                                    let _ = tx.send(Err((
                                        Error::io(dir_entry.path().to_path_buf(), e.into()),
                                        dir_entry.path().to_path_buf(),
                                    )));
                                }
                            }
                        }
                        Err(e) => {
                            let path = e.path().map(Path::to_path_buf);
                            if let Some(io_err) = e.into_io_error() {
                                if let Some(p) = path {
                                    let _ = tx.send(Err((Error::io(p.clone(), io_err), p)));
                                }
                            }
                        }
                    }
                }
            });
        }
        drop(tx);

        for result in rx.iter() {
            match result {
                Ok(entry) => {
                    let key = (entry.root().index(), entry.path().to_path_buf());
                    if seen.insert(key) && !options.excluded(entry.basename()) {
                        collected.push(entry);
                    }
                }
                Err((error, path)) => errors.push((error, path)),
            }
        }
    });

    for (error, path) in errors {
        on_error(error, Some(&path));
    }

    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_and_filters_by_min_size() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("small.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("big.txt"), b"aaaaaaaaaa").unwrap();

        let options = WalkOptions { min_size: 5, ..WalkOptions::default() };
        let entries = walk(&[dir.path().to_path_buf()], &options, |_, _| {});

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].basename(), "big.txt");
    }

    #[test]
    fn excludes_by_basename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("skip.txt"), b"a").unwrap();

        let options = WalkOptions {
            exclude_names: vec!["skip.txt".to_string()],
            ..WalkOptions::default()
        };
        let entries = walk(&[dir.path().to_path_buf()], &options, |_, _| {});

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].basename(), "keep.txt");
    }
}
