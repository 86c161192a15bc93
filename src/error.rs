use std::io;
use std::path::PathBuf;

/// Errors that can surface from the duplicate-equivalence engine.
///
/// Per-file I/O failures (open/read/close, walk errors) are always routed
/// through the configured error sink first; they only appear here when a
/// caller explicitly propagates them (e.g. a sink that reraises, or a
/// configuration/report-parsing failure, neither of which is recoverable).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("report parse error at line {line}: {message}")]
    ReportParse { line: usize, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn report_parse(line: usize, message: impl Into<String>) -> Self {
        Error::ReportParse { line, message: message.into() }
    }

    /// The path associated with this error, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
