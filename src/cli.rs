//! CLI front end (boundary only; not part of the core engine).
//!
//! Argument parsing via `clap`'s derive API.

use clap::Parser;

/// Finds sets of files with identical byte content across one or more
/// directory trees.
#[derive(Parser, Debug)]
#[command(name = "finddupes", version, about)]
pub struct Args {
    /// Root directory or directories to search.
    #[arg(required = true)]
    pub paths: Vec<std::path::PathBuf>,

    /// Follow symlinks while walking.
    #[arg(short = 's', long = "symlinks")]
    pub symlinks: bool,

    /// Include zero-length files.
    #[arg(short = 'z', long = "zero")]
    pub zero: bool,

    /// Report hardlink aliases even when no other duplicate exists.
    #[arg(short = 'a', long = "aliases")]
    pub aliases: bool,

    /// Recurse into subdirectories (default true; pass --recurse=false to disable).
    #[arg(short = 'r', long = "recurse", default_value_t = true)]
    pub recurse: bool,

    /// Only report duplicate sets whose members span more than one root.
    #[arg(short = 'o', long = "only-mixed-roots")]
    pub only_mixed_roots: bool,

    /// Minimum file size to consider. Accepts decimal or 0x-hex, with an
    /// optional 1024-based B/K/M/G/T suffix.
    #[arg(short = 'm', long = "min-size", default_value = "1", value_parser = parse_size)]
    pub min_size: u64,

    /// Maximum file size to consider.
    #[arg(long = "max-size", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Selection strategy used by --delete/--coalesce to decide which
    /// entry in a duplicate set to keep.
    #[arg(short = 'p', long = "prefer", default_value = "oldest")]
    pub prefer: String,

    /// Exclude files with this exact basename. May be repeated.
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Print elapsed wall-clock time when done.
    #[arg(long = "time")]
    pub time: bool,

    /// Verbose logging (enables debug-level log output).
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Show scan/compare progress on stderr.
    #[arg(long = "progress", overrides_with = "no_progress")]
    pub progress: bool,

    /// Disable progress output.
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Memory budget for the comparison engine's buffers.
    #[arg(long = "max-memory", default_value = "256M", value_parser = parse_size)]
    pub max_memory: u64,

    /// Largest buffer size the engine will use per round.
    #[arg(long = "max-buffer-size", default_value = "1M", value_parser = parse_size)]
    pub max_buffer_size: u64,

    /// Delete non-preferred duplicates, writing results to PATH (use '-'
    /// for stdout).
    #[arg(short = 'x', long = "delete", value_name = "PATH")]
    pub delete: Option<std::path::PathBuf>,

    /// Hard-link non-preferred duplicates to the preferred entry,
    /// writing results to PATH.
    #[arg(short = 'c', long = "coalesce", value_name = "PATH")]
    pub coalesce: Option<std::path::PathBuf>,

    /// Show what --delete/--coalesce would do without changing anything.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
}

impl Args {
    pub fn progress_enabled(&self) -> bool {
        self.progress && !self.no_progress
    }

    pub fn effective_max_size(&self) -> u64 {
        self.max_size.unwrap_or(u64::MAX)
    }
}

fn parse_size(s: &str) -> Result<u64, String> {
    unbytify::unbytify(s).map_err(|_| format!("{s:?} is not a valid byte size"))
}
