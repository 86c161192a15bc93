//! C5: Engine Facade. Orchestrates C1-C4 behind a single "feed entries,
//! receive duplicate groups" operation.

use crate::entry::FileEntry;
use crate::identity::StorageId;
use crate::indexer::{Bucket, Indexer, MemoryIndexer};
use crate::partition::{CancelFn, CompareProgressSink, DuplicateSet, NullCompareProgressSink, Partitioner, StreamError};
use crate::progress::{ErrorSink, WalkProgressSink};
use crate::resource::ResourceBounds;
use crate::stream_pool::StreamPool;
use log::debug;

/// Everything the engine needs to run, gathered in one place so an
/// `Engine` can be built with only the collaborators a given call site
/// actually wants, defaulting the rest.
pub struct EngineConfig<'a> {
    pub bounds: ResourceBounds,
    /// `None` disables hardlink collapsing: every entry becomes its own
    /// instance.
    pub storage_identity_fn: Option<Box<dyn Fn(&FileEntry) -> StorageId>>,
    pub cancel_fn: Option<&'a CancelFn<'a>>,
    pub walk_progress_sink: Option<&'a mut dyn WalkProgressSink>,
    pub compare_progress_sink: Option<&'a mut dyn CompareProgressSink>,
    pub error_sink: Option<&'a mut dyn ErrorSink>,
}

impl<'a> Default for EngineConfig<'a> {
    fn default() -> Self {
        EngineConfig {
            bounds: ResourceBounds::default(),
            storage_identity_fn: None,
            cancel_fn: None,
            walk_progress_sink: None,
            compare_progress_sink: None,
            error_sink: None,
        }
    }
}

/// Drives C1-C4 over a lazy sequence of [`FileEntry`], yielding
/// [`DuplicateSet`]s. Buckets emit in descending-size order; within a
/// bucket, emission order follows the order sub-groups resolve in the
/// partitioner's work stack.
pub struct Engine<'a> {
    bounds: ResourceBounds,
    storage_identity_fn: Option<Box<dyn Fn(&FileEntry) -> StorageId>>,
    cancel_fn: Option<&'a CancelFn<'a>>,
    walk_progress_sink: Option<&'a mut dyn WalkProgressSink>,
    compare_progress_sink: Option<&'a mut dyn CompareProgressSink>,
    error_sink: Option<&'a mut dyn ErrorSink>,
}

impl<'a> Engine<'a> {
    pub fn new(config: EngineConfig<'a>) -> Self {
        Engine {
            bounds: config.bounds,
            storage_identity_fn: config.storage_identity_fn,
            cancel_fn: config.cancel_fn,
            walk_progress_sink: config.walk_progress_sink,
            compare_progress_sink: config.compare_progress_sink,
            error_sink: config.error_sink,
        }
    }

    /// Feeds `entries` through the indexer, then through the partitioner
    /// one size bucket at a time, calling `on_result` for every
    /// duplicate set found. Buckets are visited largest-first.
    pub fn run(&mut self, entries: impl IntoIterator<Item = FileEntry>, mut on_result: impl FnMut(DuplicateSet)) {
        let mut indexer = MemoryIndexer::new(
            self.storage_identity_fn
                .take()
                .map(|f| f as Box<dyn Fn(&FileEntry) -> StorageId>),
        );

        let mut file_count = 0usize;
        for entry in entries {
            file_count += 1;
            if let Some(sink) = self.walk_progress_sink.as_deref_mut() {
                sink.progress(entry.path());
            }
            indexer.add(entry);
        }
        if let Some(sink) = self.walk_progress_sink.as_deref_mut() {
            sink.complete();
        }
        debug!("indexed {} files", file_count);

        let mut buckets: Vec<Bucket> = indexer.into_buckets();
        buckets.sort_by(|a, b| b.size.cmp(&a.size));
        debug!("bucket count: {}", buckets.len());

        let mut null_progress = NullCompareProgressSink;

        for bucket in buckets {
            let Bucket { size, instances } = bucket;

            // Bypass the partitioner entirely for trivial cases: no
            // stream is ever opened for a bucket resolved this way.
            if size == 0 || instances.len() == 1 {
                if instances.len() >= 2 || (instances.len() == 1 && instances[0].has_aliases()) {
                    on_result(DuplicateSet::trivial(instances));
                }
                continue;
            }

            let pool = StreamPool::new(self.bounds.max_open_files_hard);
            let mut partitioner = Partitioner::new(pool, self.bounds, self.cancel_fn);

            let progress: &mut dyn CompareProgressSink = match self.compare_progress_sink.as_deref_mut() {
                Some(sink) => sink,
                None => &mut null_progress,
            };

            let error_sink = &mut self.error_sink;
            partitioner.run(
                size,
                instances,
                |set| on_result(set),
                |stream_error: StreamError| {
                    let StreamError { path, error } = stream_error;
                    if let Some(sink) = error_sink.as_deref_mut() {
                        sink.on_error(&error, Some(&path));
                    }
                    debug!("{}: {}", path.display(), error);
                },
                progress,
            );
        }
    }
}

/// Fallback used when the caller doesn't set `max_open_files` explicitly.
/// A more thorough implementation would derive this from
/// `RLIMIT_NOFILE`, but nothing in this crate's dependency stack
/// introspects rlimits, so this is a conservative fixed value instead.
pub fn default_max_open_files() -> usize {
    64
}
