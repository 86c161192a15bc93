//! C3: Equivalence Partitioner.
//!
//! Given one size bucket, iteratively reads the next buffer from every
//! candidate stream and splits the set by observed bytes until groups
//! are either exhausted (duplicates confirmed) or singletons (no
//! duplicates possible).

use crate::identity::FileInstance;
use crate::resource::ResourceBounds;
use crate::stream_pool::{StreamHandle, StreamPool};
use log::{debug, trace};

/// An immutable tuple of instances proved byte-identical (or a single
/// aliased instance, reported so the aliasing is surfaced).
#[derive(Debug, Clone)]
pub struct DuplicateSet {
    instances: Vec<FileInstance>,
}

impl DuplicateSet {
    /// Builds a `DuplicateSet` directly from instances already known to
    /// qualify, bypassing the partitioner. Used by the engine facade for
    /// the zero-size and alias-only bypass paths.
    pub fn trivial(instances: Vec<FileInstance>) -> Self {
        DuplicateSet { instances }
    }

    pub fn instances(&self) -> &[FileInstance] {
        &self.instances
    }

    pub fn instance_size(&self) -> u64 {
        self.instances.first().map(FileInstance::size).unwrap_or(0)
    }

    pub fn total_size(&self) -> u64 {
        self.instance_size() * self.instances.len() as u64
    }

    pub fn entry_count(&self) -> usize {
        self.instances.iter().map(|i| i.entries().len()).sum()
    }
}

/// A candidate group mid-comparison: every member has matched bytes up to
/// a common offset.
pub struct CompareGroup {
    members: Vec<StreamMember>,
}

impl CompareGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Immutable snapshot safe to hand to a cancel predicate or progress
    /// sink without aliasing engine-owned mutable state.
    pub fn snapshot(&self) -> DuplicateSet {
        DuplicateSet {
            instances: self.members.iter().map(|m| m.instance.clone()).collect(),
        }
    }
}

struct StreamMember {
    instance: FileInstance,
    stream: StreamHandle,
}

/// Callback consulted once per work-stack iteration, before any reads.
/// Returning true discards the group (and closes its streams).
pub type CancelFn<'a> = dyn Fn(&DuplicateSet) -> bool + 'a;

/// Sink for compare progress: `progress` may be called periodically
/// during reads, `clear` must be called immediately before a
/// `DuplicateSet` is yielded.
pub trait CompareProgressSink {
    fn progress(&mut self, groups: &[DuplicateSet], bytes_in_representative: u64, file_size: u64);
    fn clear(&mut self);
}

/// A sink that does nothing, the default when no sink is configured.
pub struct NullCompareProgressSink;

impl CompareProgressSink for NullCompareProgressSink {
    fn progress(&mut self, _groups: &[DuplicateSet], _bytes: u64, _file_size: u64) {}
    fn clear(&mut self) {}
}

/// Byte threshold between progress callouts.
pub const PROGRESS_CALLBACK_FREQUENCY: u64 = 0x10_0000;

/// Error reported for one stream dropped out of a comparison mid-round.
pub struct StreamError {
    pub path: std::path::PathBuf,
    pub error: crate::error::Error,
}

/// Runs the partitioner over one size bucket, yielding `DuplicateSet`s in
/// the order their defining branch completed. `on_stream_error` is called
/// for every read failure that drops a stream from its group; the
/// comparison continues with the remaining members.
pub struct Partitioner<'a> {
    pool: StreamPool,
    bounds: ResourceBounds,
    cancel_fn: Option<&'a CancelFn<'a>>,
}

impl<'a> Partitioner<'a> {
    pub fn new(pool: StreamPool, bounds: ResourceBounds, cancel_fn: Option<&'a CancelFn<'a>>) -> Self {
        Partitioner { pool, bounds, cancel_fn }
    }

    pub fn into_pool(self) -> StreamPool {
        self.pool
    }

    /// Compares every instance in `instances` (all sharing `size`),
    /// calling `on_result` for each `DuplicateSet` as it's discovered and
    /// `on_error` for each stream read error. `progress` receives
    /// periodic snapshots of the in-flight work.
    pub fn run(
        &mut self,
        size: u64,
        instances: Vec<FileInstance>,
        mut on_result: impl FnMut(DuplicateSet),
        mut on_error: impl FnMut(StreamError),
        progress: &mut dyn CompareProgressSink,
    ) {
        let mut work: Vec<CompareGroup> = Vec::new();
        let initial: Vec<StreamMember> = instances
            .into_iter()
            .map(|instance| {
                let path = instance.canonical_path().to_path_buf();
                let stream = self.pool.open(path, 0);
                StreamMember { instance, stream }
            })
            .collect();
        let initial_group = CompareGroup { members: initial };

        let mut bytes_read_total: u64 = 0;
        let mut last_progress: u64 = 0;
        let mut is_first_read = true;

        progress.progress(&[initial_group.snapshot()], 0, size);
        work.push(initial_group);

        while let Some(mut group) = work.pop() {
            if group.is_empty() {
                continue;
            }

            if let Some(cancel) = self.cancel_fn {
                let snap = group.snapshot();
                if cancel(&snap) {
                    for member in group.members.drain(..) {
                        member.stream.close(&mut self.pool);
                    }
                    continue;
                }
            }

            // Special case: zero-length files. A single empty read
            // succeeds for every stream; the whole group is resolved now.
            if size == 0 {
                self.emit_or_drop(group, &mut on_result, progress);
                continue;
            }

            // Special case: one instance left in play only because it
            // has multiple aliases. Nothing left to refine.
            if group.len() == 1 {
                self.emit_or_drop(group, &mut on_result, progress);
                continue;
            }

            let plan = self.bounds.plan_round(group.len(), is_first_read);
            is_first_read = false;
            self.pool.set_budget(plan.max_open_files);

            let mut buffers: Vec<Vec<u8>> = Vec::new();
            let mut next_sets: Vec<Vec<StreamMember>> = Vec::new();
            let members_snapshot_pending = group.members.iter().map(|m| m.instance.clone()).collect::<Vec<_>>();

            for member in group.members {
                let mut buf = vec![0u8; plan.buffer_size];
                let path = member.stream.path();
                let mut member = member;
                let n = {
                    let pool = &mut self.pool;
                    member.stream.read(pool, &mut buf)
                };
                let n = match n {
                    Ok(n) => n,
                    Err(error) => {
                        on_error(StreamError { path, error });
                        member.stream.close(&mut self.pool);
                        continue;
                    }
                };
                buf.truncate(n);
                bytes_read_total += n as u64;

                if bytes_read_total - last_progress > PROGRESS_CALLBACK_FREQUENCY {
                    last_progress = bytes_read_total;
                    let snap_pos = member.stream.tell();
                    let active = DuplicateSet { instances: members_snapshot_pending.clone() };
                    let mut snapshots: Vec<DuplicateSet> = vec![active];
                    snapshots.extend(work.iter().map(CompareGroup::snapshot));
                    progress.progress(&snapshots, snap_pos, size);
                    trace!("compare progress: {} bytes into {:?}", snap_pos, member.instance.canonical_path());
                }

                match buffers.iter().position(|b| b == &buf) {
                    Some(idx) => next_sets[idx].push(member),
                    None => {
                        buffers.push(buf);
                        next_sets.push(vec![member]);
                    }
                }
            }

            for (buffer, members) in buffers.into_iter().zip(next_sets.into_iter()) {
                let sub_group = CompareGroup { members };
                if buffer.is_empty() {
                    // EOF: every member's content has matched in full.
                    self.emit_or_drop(sub_group, &mut on_result, progress);
                } else if sub_group.len() <= 1 {
                    self.emit_or_drop(sub_group, &mut on_result, progress);
                } else {
                    work.push(sub_group);
                }
            }
        }

        progress.progress(&[], size, size);
        progress.clear();
        debug!("content comparison end: bytes_read={}", bytes_read_total);
    }

    fn emit_or_drop(
        &mut self,
        group: CompareGroup,
        on_result: &mut impl FnMut(DuplicateSet),
        progress: &mut dyn CompareProgressSink,
    ) {
        let of_interest = (group.len() > 1)
            || (group.len() == 1 && group.members[0].instance.has_aliases());

        if of_interest {
            let set = group.snapshot();
            progress.clear();
            on_result(set);
        }

        for member in group.members {
            member.stream.close(&mut self.pool);
        }
    }
}
