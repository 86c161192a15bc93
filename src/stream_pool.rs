//! C1: Stream Pool.
//!
//! Hands out byte-stream handles that transparently close and reopen
//! their underlying OS file descriptor so the pool never holds more than
//! `max_open_files` at once, while each [`StreamHandle`] keeps its own
//! logical read position across the close/reopen cycles.

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::cell::RefCell;

struct StreamState {
    path: PathBuf,
    offset: u64,
    handle: Option<File>,
}

/// A slot in the pool's open set. Tracks insertion order so eviction can
/// pick the oldest-bound stream still holding a handle (FIFO).
struct Slot {
    id: u64,
    state: Rc<RefCell<StreamState>>,
}

/// Pool owning a bounded number of real OS file descriptors, shared by
/// every [`StreamHandle`] it creates. Not `Send`/`Sync`: a single engine
/// run owns and drives it from one thread.
pub struct StreamPool {
    max_open_files: usize,
    open: VecDeque<Slot>,
    next_id: u64,
}

impl StreamPool {
    pub fn new(max_open_files: usize) -> Self {
        StreamPool {
            max_open_files: max_open_files.max(1),
            open: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Current budget. [`StreamHandle::ensure_open`] respects whatever
    /// this returns at the moment it's called, so the budget can be
    /// lowered between rounds by the resource controller.
    pub fn set_budget(&mut self, max_open_files: usize) {
        self.max_open_files = max_open_files.max(1);
    }

    pub fn budget(&self) -> usize {
        self.max_open_files
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Opens a new logical stream at `offset`. No OS file descriptor is
    /// acquired until the first read or seek-needing-fd.
    pub fn open(&mut self, path: impl Into<PathBuf>, offset: u64) -> StreamHandle {
        StreamHandle {
            id: None,
            state: Rc::new(RefCell::new(StreamState {
                path: path.into(),
                offset,
                handle: None,
            })),
        }
    }

    fn evict_one(&mut self) {
        if let Some(slot) = self.open.pop_front() {
            let mut state = slot.state.borrow_mut();
            if let Some(file) = &mut state.handle {
                // Checkpoint position before releasing the fd.
                if let Ok(pos) = file.stream_position() {
                    state.offset = pos;
                }
            }
            state.handle = None;
        }
    }

    fn ensure_open(&mut self, stream: &mut StreamHandle) -> Result<()> {
        if stream.state.borrow().handle.is_some() {
            return Ok(());
        }

        while self.open.len() >= self.max_open_files {
            self.evict_one();
        }

        let path;
        let offset;
        {
            let state = stream.state.borrow();
            path = state.path.clone();
            offset = state.offset;
        }

        let mut file = File::open(&path).map_err(|e| Error::io(path.clone(), e))?;
        if offset != 0 {
            file.seek(SeekFrom::Start(offset)).map_err(|e| Error::io(path.clone(), e))?;
        }

        let id = self.next_id;
        self.next_id += 1;
        stream.state.borrow_mut().handle = Some(file);
        stream.id = Some(id);
        self.open.push_back(Slot { id, state: Rc::clone(&stream.state) });
        Ok(())
    }

    fn forget(&mut self, id: u64) {
        if let Some(pos) = self.open.iter().position(|s| s.id == id) {
            self.open.remove(pos);
        }
    }
}

/// A logical byte stream bound to one path. Position survives the pool's
/// internal close/reopen cycles; `close` permanently releases the stream
/// and makes it impossible to reopen.
pub struct StreamHandle {
    id: Option<u64>,
    state: Rc<RefCell<StreamState>>,
}

impl StreamHandle {
    pub fn path(&self) -> PathBuf {
        self.state.borrow().path.clone()
    }

    pub fn tell(&self) -> u64 {
        self.state.borrow().offset
    }

    pub fn read(&mut self, pool: &mut StreamPool, buf: &mut [u8]) -> Result<usize> {
        pool.ensure_open(self)?;
        let mut state = self.state.borrow_mut();
        let path = state.path.clone();
        let file = state.handle.as_mut().expect("ensure_open just opened it");
        let n = fill_from(file, buf).map_err(|e| Error::io(path, e))?;
        state.offset += n as u64;
        Ok(n)
    }

    pub fn seek(&mut self, pool: &mut StreamPool, offset: u64) -> Result<()> {
        pool.ensure_open(self)?;
        let mut state = self.state.borrow_mut();
        let path = state.path.clone();
        let file = state.handle.as_mut().expect("ensure_open just opened it");
        file.seek(SeekFrom::Start(offset)).map_err(|e| Error::io(path, e))?;
        state.offset = offset;
        Ok(())
    }

    pub fn close(mut self, pool: &mut StreamPool) {
        if let Some(id) = self.id.take() {
            pool.forget(id);
        }
        self.state.borrow_mut().handle = None;
    }
}

/// A single, possibly-short read into `buf`. Unlike `Read::read_exact`,
/// never errors on a short final read; returns the number of bytes
/// actually placed.
fn fill_from(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    file.read(buf)
}
