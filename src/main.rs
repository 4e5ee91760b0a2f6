use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use neandoc::config::{discover, Config};
use neandoc::{
    DocumentationSource, FileStatus, Language, Periodic, PayloadFile, Pipeline, RunMode,
    Unavailable,
};
use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Directories never descended into when walking a tree.
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "target", ".git"];

#[derive(Parser)]
#[command(name = "neandoc")]
#[command(about = "Find undocumented code and insert explanations above it", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./neandoc.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// No log output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report functions and classes missing documentation
    Analyze {
        /// Files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print a documentation request for an external assistant
        #[arg(short, long)]
        prompt: bool,
    },

    /// Insert documentation blocks
    Apply {
        /// Files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// JSON answer to a documentation request (templates otherwise)
        #[arg(short, long)]
        payload: Option<PathBuf>,

        /// Dry run - show what would be inserted without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Skip classes
        #[arg(long)]
        only_functions: bool,
    },

    /// Re-analyze periodically and print a request whenever gaps appear
    Watch {
        /// Files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Minutes between scans
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Stop after this many scans
        #[arg(long)]
        max_runs: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = discover(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Analyze { paths, prompt } => cmd_analyze(&config, &paths, prompt),

        Commands::Apply {
            paths,
            payload,
            dry_run,
            diff,
            only_functions,
        } => cmd_apply(config, &paths, payload, dry_run, diff, only_functions),

        Commands::Watch {
            paths,
            interval,
            max_runs,
        } => cmd_watch(&config, &paths, interval, max_runs),
    }
}

fn init_logging(verbosity: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand directories into the supported source files below them.
///
/// Explicit file arguments are kept as given, whatever their extension. A
/// file reached more than once (`apply . src`) is listed once, under the
/// first spelling seen.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();
    let mut keep = |path: PathBuf, files: &mut Vec<PathBuf>| {
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if seen.insert(key) {
            files.push(path);
        }
    };

    for path in paths {
        if !path.is_dir() {
            keep(path.clone(), &mut files);
            continue;
        }

        let walker = WalkDir::new(path).into_iter().filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry.depth() > 0
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name)))
        });

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && Language::from_path(entry.path()).is_some() {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        for file in found {
            keep(file, &mut files);
        }
    }
    Ok(files)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (documented)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => continue,
        };
        print!("{}", sign);
    }
}

fn cmd_analyze(config: &Config, paths: &[PathBuf], prompt: bool) -> Result<()> {
    let files = collect_files(paths)?;
    let pipeline = Pipeline::from_config(config, Unavailable);
    let analysis = pipeline.analyze(&files);

    let mut total_elements = 0;
    let mut total_technical = 0;
    let mut total_simple = 0;

    for file in analysis.gaps() {
        total_elements += file.total_elements;
        let technical = file.missing_technical().len();
        let simple = file.missing_simple().len();
        total_technical += technical;
        total_simple += simple;

        let path = file.structure.path().display();
        if file.has_missing_docs() {
            println!(
                "{} {}: {} of {} element(s) need documentation",
                "✗".red(),
                path,
                file.gaps.len(),
                file.total_elements
            );
            for gap in &file.gaps {
                println!(
                    "    line {:>5}  {} {}",
                    gap.element.line, gap.element.kind, gap.element.name
                );
            }
        } else {
            println!("{} {}: {} element(s) documented", "✓".green(), path, file.total_elements);
        }
    }

    for err in &analysis.failures {
        eprintln!("{} {}", "✗".red(), err);
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} file(s) scanned", analysis.structures.len());
    println!("  {} element(s)", total_elements);
    println!(
        "  {} missing technical explanation",
        format!("{}", total_technical).yellow()
    );
    println!(
        "  {} missing simple explanation",
        format!("{}", total_simple).yellow()
    );
    println!("  {} failed", format!("{}", analysis.failures.len()).red());

    if prompt {
        println!("\n{}", "=".repeat(60).dimmed());
        print!("{}", analysis.request());
        println!("{}", "=".repeat(60).dimmed());
        println!(
            "{}",
            "Save the JSON answer to a file, then run: neandoc apply <paths> --payload <file>"
                .cyan()
        );
    }

    if !analysis.failures.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_apply(
    mut config: Config,
    paths: &[PathBuf],
    payload: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    only_functions: bool,
) -> Result<()> {
    config.synthesis.functions_only |= only_functions;
    let files = collect_files(paths)?;

    let source: Box<dyn DocumentationSource> = match payload {
        Some(path) => Box::new(PayloadFile::new(path)),
        None => Box::new(Unavailable),
    };
    let pipeline = Pipeline::from_config(&config, source);

    // file contents before applying, for diff output
    let before: Vec<Option<String>> = if show_diff && !dry_run {
        files
            .iter()
            .map(|f| std::fs::read_to_string(f).ok())
            .collect()
    } else {
        Vec::new()
    };

    let mode = if dry_run {
        println!("{}", "[DRY RUN - showing what would be inserted]".cyan());
        RunMode::Preview
    } else {
        RunMode::Apply
    };
    let outcomes = pipeline.run(&files, mode);

    let mut total_inserted = 0;
    let mut total_skipped = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for outcome in &outcomes {
        let path = outcome.path.display();
        match &outcome.status {
            FileStatus::Unchanged => {
                println!("{} {}: nothing to insert", "⊙".yellow(), path);
                total_unchanged += 1;
            }
            FileStatus::Applied(report) => {
                println!(
                    "{} {}: inserted {} block(s)",
                    "✓".green(),
                    path,
                    report.applied.len()
                );
                total_inserted += report.applied.len();
                total_skipped += report.skipped.len();
                for skip in &report.skipped {
                    println!("    {} {} ({})", "⊘".cyan(), skip.element.name, skip.reason);
                }

                if show_diff && report.changed() {
                    let original = files
                        .iter()
                        .position(|f| f == &outcome.path)
                        .and_then(|i| before.get(i).cloned().flatten());
                    if let (Some(original), Ok(after)) =
                        (original, std::fs::read_to_string(&outcome.path))
                    {
                        display_diff(&outcome.path, &original, &after);
                    }
                }
            }
            FileStatus::Previewed(preview) => {
                println!(
                    "{} {}: would insert {} block(s)",
                    "✓".green(),
                    path,
                    preview.applied.len()
                );
                total_inserted += preview.applied.len();
                total_skipped += preview.skipped.len();
                if show_diff {
                    display_diff(&preview.file, &preview.original, &preview.result);
                } else {
                    print!("{}", preview);
                }
            }
            FileStatus::Failed(err) => {
                eprintln!("{} {}: {}", "✗".red(), path, err);
                total_failed += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    let verb = if dry_run { "to insert" } else { "inserted" };
    println!("  {} {}", format!("{}", total_inserted).green(), verb);
    println!("  {} skipped", format!("{}", total_skipped).cyan());
    println!("  {} file(s) unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_watch(
    config: &Config,
    paths: &[PathBuf],
    interval_minutes: u64,
    max_runs: Option<u64>,
) -> Result<()> {
    let pipeline = Pipeline::from_config(config, Unavailable);
    let periodic = Periodic::new(Duration::from_secs(interval_minutes.saturating_mul(60)));
    let stop = periodic.stop_handle();

    println!(
        "{}",
        format!(
            "Watching {} path(s), scanning every {} minute(s)",
            paths.len(),
            interval_minutes
        )
        .cyan()
    );

    let mut last_error = None;
    periodic.run(|tick| {
        match collect_files(paths) {
            Ok(files) => {
                let analysis = pipeline.analyze(&files);
                let missing: usize = analysis.gaps().iter().map(|f| f.gaps.len()).sum();
                if missing > 0 {
                    println!(
                        "\n{} scan {}: {} element(s) need documentation",
                        "✗".red(),
                        tick,
                        missing
                    );
                    print!("{}", analysis.request());
                } else {
                    println!("{} scan {}: all code is documented", "✓".green(), tick);
                }
            }
            Err(err) => last_error = Some(err),
        }

        if last_error.is_some() || max_runs.is_some_and(|max| tick >= max) {
            stop.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });

    match last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
