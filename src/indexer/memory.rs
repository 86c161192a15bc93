use super::{Bucket, Indexer};
use crate::entry::FileEntry;
use crate::identity::{FileInstance, StorageId};
use fnv::FnvHashMap;
use std::collections::hash_map::Entry as MapEntry;

type IdentityFn = dyn Fn(&FileEntry) -> StorageId;

/// In-memory [`Indexer`]. Keeps every entry in a `size -> (storage_id ->
/// entries)` map; appropriate for any tree that fits comfortably in RAM,
/// which is the common case.
pub struct MemoryIndexer {
    identity_fn: Option<Box<IdentityFn>>,
    by_size: FnvHashMap<u64, FnvHashMap<StorageId, Vec<FileEntry>>>,
    seen_paths: FnvHashMap<(usize, std::path::PathBuf), ()>,
    next_anon_id: u64,
}

impl MemoryIndexer {
    /// `identity_fn` of `None` disables hardlink collapsing: every entry
    /// becomes its own [`FileInstance`].
    pub fn new(identity_fn: Option<Box<IdentityFn>>) -> Self {
        MemoryIndexer {
            identity_fn,
            by_size: FnvHashMap::default(),
            seen_paths: FnvHashMap::default(),
            next_anon_id: 0,
        }
    }
}

impl Indexer for MemoryIndexer {
    fn add(&mut self, entry: FileEntry) {
        let key = (entry.root().index(), entry.path().to_path_buf());
        if self.seen_paths.insert(key, ()).is_some() {
            // Exact path already seen under this root: silently ignored.
            return;
        }

        let storage_id = match &self.identity_fn {
            Some(f) => f(&entry),
            None => {
                let id = StorageId::Unique(self.next_anon_id);
                self.next_anon_id += 1;
                id
            }
        };

        let size_map = self.by_size.entry(entry.size()).or_default();
        match size_map.entry(storage_id) {
            MapEntry::Vacant(v) => {
                v.insert(vec![entry]);
            }
            MapEntry::Occupied(mut o) => {
                o.get_mut().push(entry);
            }
        }
    }

    fn into_buckets(self) -> Vec<Bucket> {
        self.by_size
            .into_iter()
            .map(|(size, by_id)| {
                let instances = by_id
                    .into_iter()
                    .map(|(id, entries)| FileInstance::new(id, entries))
                    .collect();
                Bucket { size, instances }
            })
            .filter(Bucket::qualifies)
            .collect()
    }
}
