//! CLI entry point: wires the walker, the engine facade, reporting, and
//! the delete/coalesce post-processors together.

use clap::Parser;
use dupescan::engine::{Engine, EngineConfig};
use dupescan::identity::posix_storage_id;
use dupescan::postprocess;
use dupescan::prefer::PreferStrategy;
use dupescan::progress::{
    ErrorSink, NullWalkProgressSink, StderrCompareProgressSink, StderrErrorSink, StderrWalkProgressSink,
    WalkProgressSink,
};
use dupescan::report::write_report;
use dupescan::resource::ResourceBounds;
use dupescan::walker::{walk, WalkOptions};
use dupescan::DuplicateSet;
use dupescan::cli::Args;
use std::io::Write as _;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let prefer = match PreferStrategy::parse(&args.prefer) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    let started = std::time::Instant::now();
    // Scoped to delete/coalesce I/O failures only; scan errors are
    // surfaced through the error sink but don't affect the exit code.
    let mut had_postprocess_errors = false;

    let walk_options = WalkOptions {
        follow_symlinks: args.symlinks,
        recurse: args.recurse,
        min_size: if args.zero { 0 } else { args.min_size.max(1) },
        max_size: args.effective_max_size(),
        exclude_names: args.exclude.clone(),
    };

    let mut walk_progress: Box<dyn WalkProgressSink> = if args.progress_enabled() {
        Box::new(StderrWalkProgressSink::new())
    } else {
        Box::new(NullWalkProgressSink)
    };

    let entries = walk(&args.paths, &walk_options, |error, path| {
        StderrErrorSink.on_error(&error, path);
    });

    let bounds = ResourceBounds {
        max_memory: args.max_memory,
        max_buffer_size: args.max_buffer_size as usize,
        max_open_files_hard: dupescan::engine::default_max_open_files(),
        ..ResourceBounds::default()
    };

    let only_mixed_roots = args.only_mixed_roots;
    let cancel_fn = move |set: &DuplicateSet| -> bool {
        if !only_mixed_roots {
            return false;
        }
        let mut roots = set
            .instances()
            .iter()
            .flat_map(|i| i.entries().iter())
            .map(|e| e.root().index());
        let first = match roots.next() {
            Some(r) => r,
            None => return true,
        };
        roots.all(|r| r == first)
    };

    let mut compare_progress = StderrCompareProgressSink::new();
    let mut error_sink = StderrErrorSink;

    let config = EngineConfig {
        bounds,
        storage_identity_fn: if args.aliases {
            Some(Box::new(posix_storage_id))
        } else {
            Some(Box::new(|_: &_| dupescan::identity::fresh_storage_id()))
        },
        cancel_fn: Some(&cancel_fn),
        walk_progress_sink: Some(walk_progress.as_mut()),
        compare_progress_sink: if args.progress_enabled() { Some(&mut compare_progress) } else { None },
        error_sink: Some(&mut error_sink),
    };

    let mut engine = Engine::new(config);
    let mut sets: Vec<DuplicateSet> = Vec::new();
    engine.run(entries, |set| sets.push(set));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Some(delete_path) = &args.delete {
        let mut report_sets = Vec::new();
        for set in &sets {
            let outcome = postprocess::delete(set, prefer, args.dry_run);
            for err in &outcome.errors {
                had_postprocess_errors = true;
                eprintln!("error: {}: {}", err.0.display(), err.1);
            }
            report_sets.push(set.clone());
        }
        write_delete_report(delete_path, &report_sets, args.dry_run)
            .unwrap_or_else(|e| eprintln!("error writing report: {e}"));
    } else if let Some(coalesce_path) = &args.coalesce {
        let mut report_sets = Vec::new();
        for set in &sets {
            let outcome = postprocess::coalesce(set, prefer, args.dry_run);
            for err in &outcome.errors {
                had_postprocess_errors = true;
                eprintln!("error: {}: {}", err.0.display(), err.1);
            }
            report_sets.push(set.clone());
        }
        write_delete_report(coalesce_path, &report_sets, args.dry_run)
            .unwrap_or_else(|e| eprintln!("error writing report: {e}"));
    } else {
        write_report(&mut out, &sets).unwrap_or_else(|e| eprintln!("error writing report: {e}"));
    }

    if args.time {
        eprintln!("elapsed: {:.3}s", started.elapsed().as_secs_f64());
    }

    if had_postprocess_errors {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn write_delete_report(path: &std::path::Path, sets: &[DuplicateSet], _dry_run: bool) -> std::io::Result<()> {
    if path.as_os_str() == "-" {
        let stdout = std::io::stdout();
        write_report(stdout.lock(), sets)
    } else {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        write_report(&mut writer, sets)?;
        writer.flush()
    }
}
