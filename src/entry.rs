use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// One of the filesystem roots the walker was pointed at.
///
/// Entries remember which root they came from (by index) so cancellation
/// predicates like "only-mixed-roots" can tell whether a group's members
/// are all confined to a single root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    path: Arc<PathBuf>,
    index: usize,
}

impl Root {
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        Root { path: Arc::new(path.into()), index }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// One named file in the filesystem, as handed to the engine by the
/// walker. Immutable once constructed; two entries are equal iff their
/// path and root both match.
#[derive(Debug, Clone)]
pub struct FileEntry {
    path: PathBuf,
    root: Root,
    size: u64,
    mtime: Option<SystemTime>,
    is_file: bool,
    is_symlink: bool,
}

impl FileEntry {
    pub fn new(
        path: impl Into<PathBuf>,
        root: Root,
        size: u64,
        mtime: Option<SystemTime>,
        is_file: bool,
        is_symlink: bool,
    ) -> Self {
        FileEntry {
            path: path.into(),
            root,
            size,
            mtime,
            is_file,
            is_symlink,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    pub fn is_file(&self) -> bool {
        self.is_file
    }

    pub fn is_symlink(&self) -> bool {
        self.is_symlink
    }

    pub fn basename(&self) -> &std::ffi::OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }

    pub fn extension(&self) -> Option<&std::ffi::OsStr> {
        self.path.extension()
    }

    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }
}

impl PartialEq for FileEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.root == other.root
    }
}

impl Eq for FileEntry {}
