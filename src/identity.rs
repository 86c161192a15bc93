use crate::entry::FileEntry;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, hashable, comparable identifier naming one underlying storage
/// object. On POSIX it's `(device, inode)`. Where no such identifier is
/// available, [`fresh_storage_id`] hands out a unique id per entry so
/// nothing ever collapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageId {
    Posix { dev: u64, ino: u64 },
    Unique(u64),
}

static NEXT_UNIQUE_ID: AtomicU64 = AtomicU64::new(1);

/// Hands out a fresh id that will never equal any other id produced by
/// this function, for platforms where a stable storage identity isn't
/// available.
pub fn fresh_storage_id() -> StorageId {
    StorageId::Unique(NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Default storage-identity callback. On unix, stats the entry's path and
/// returns `(st_dev, st_ino)`; hardlinked paths resolve to the same id.
/// Elsewhere (or if the stat fails), falls back to a fresh unique id,
/// which disables hardlink collapsing for that entry.
#[cfg(use_ino)]
pub fn posix_storage_id(entry: &FileEntry) -> StorageId {
    use std::os::unix::fs::MetadataExt;

    match std::fs::symlink_metadata(entry.path()) {
        Ok(meta) => StorageId::Posix { dev: meta.dev(), ino: meta.ino() },
        Err(_) => fresh_storage_id(),
    }
}

#[cfg(not(use_ino))]
pub fn posix_storage_id(_entry: &FileEntry) -> StorageId {
    fresh_storage_id()
}

/// One storage object with one or more [`FileEntry`] aliases (hardlinks,
/// or the single-entry case). The first entry is the canonical path used
/// to open a stream on this instance.
#[derive(Debug, Clone)]
pub struct FileInstance {
    storage_id: StorageId,
    entries: Vec<FileEntry>,
}

impl FileInstance {
    pub fn new(storage_id: StorageId, entries: Vec<FileEntry>) -> Self {
        debug_assert!(!entries.is_empty(), "FileInstance must have at least one entry");
        FileInstance { storage_id, entries }
    }

    pub fn storage_id(&self) -> StorageId {
        self.storage_id
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn canonical_path(&self) -> &std::path::Path {
        self.entries[0].path()
    }

    pub fn size(&self) -> u64 {
        self.entries[0].size()
    }

    pub fn has_aliases(&self) -> bool {
        self.entries.len() > 1
    }
}
