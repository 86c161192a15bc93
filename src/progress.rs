//! Progress and error sink traits (capability objects, not inheritance).
//!
//! [`crate::partition::CompareProgressSink`] covers in-bucket compare
//! progress; this module covers walk progress and the error sink shared
//! by the whole engine run.

use std::path::Path;

/// Reports directory-walk progress. `complete` is called once, after the
/// last entry has been fed to the engine.
pub trait WalkProgressSink {
    fn progress(&mut self, path: &Path);
    fn complete(&mut self);
}

pub struct NullWalkProgressSink;

impl WalkProgressSink for NullWalkProgressSink {
    fn progress(&mut self, _path: &Path) {}
    fn complete(&mut self) {}
}

/// Prints the path being walked to stderr, overwriting the previous line.
/// The CLI front end installs this when `--progress` is requested.
pub struct StderrWalkProgressSink {
    last_len: usize,
}

impl StderrWalkProgressSink {
    pub fn new() -> Self {
        StderrWalkProgressSink { last_len: 0 }
    }
}

impl Default for StderrWalkProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkProgressSink for StderrWalkProgressSink {
    fn progress(&mut self, path: &Path) {
        use std::io::Write;
        let text = format!("scanning: {}", path.display());
        let pad = self.last_len.saturating_sub(text.len());
        let _ = write!(std::io::stderr(), "\r{}{}\r", text, " ".repeat(pad));
        self.last_len = text.len();
    }

    fn complete(&mut self) {
        use std::io::Write;
        let _ = write!(std::io::stderr(), "\r{}\r", " ".repeat(self.last_len));
        self.last_len = 0;
    }
}

/// Terminal implementation of [`crate::partition::CompareProgressSink`].
pub struct StderrCompareProgressSink {
    last_len: usize,
}

impl StderrCompareProgressSink {
    pub fn new() -> Self {
        StderrCompareProgressSink { last_len: 0 }
    }
}

impl Default for StderrCompareProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::partition::CompareProgressSink for StderrCompareProgressSink {
    fn progress(&mut self, groups: &[crate::partition::DuplicateSet], bytes: u64, file_size: u64) {
        use std::io::Write;
        let text = format!(
            "comparing {} candidate group(s), {}/{} bytes",
            groups.len(),
            bytes,
            file_size
        );
        let pad = self.last_len.saturating_sub(text.len());
        let _ = write!(std::io::stderr(), "\r{}{}\r", text, " ".repeat(pad));
        self.last_len = text.len();
    }

    fn clear(&mut self) {
        use std::io::Write;
        let _ = write!(std::io::stderr(), "\r{}\r", " ".repeat(self.last_len));
        self.last_len = 0;
    }
}

/// Called for every recoverable I/O failure (walk, open, read, close).
/// The engine always logs the error first; the sink is free to also
/// collect it, display it, or propagate by panicking (not recommended).
pub trait ErrorSink {
    fn on_error(&mut self, error: &crate::error::Error, path: Option<&Path>);
}

pub struct NullErrorSink;

impl ErrorSink for NullErrorSink {
    fn on_error(&mut self, _error: &crate::error::Error, _path: Option<&Path>) {}
}

/// Logs via the `log` facade and prints a one-line message to stderr.
pub struct StderrErrorSink;

impl ErrorSink for StderrErrorSink {
    fn on_error(&mut self, error: &crate::error::Error, path: Option<&Path>) {
        match path {
            Some(p) => eprintln!("error: {}: {}", p.display(), error),
            None => eprintln!("error: {}", error),
        }
    }
}
