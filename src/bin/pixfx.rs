use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{ArgAction, Parser};

/// Apply blur (B), edge-detect (E), sharpen (S) and grayscale (G) effects to the images listed
/// in a manifest.
///
/// Exits with status 2 on invalid usage (nothing is processed) and 1 when any image failed.
#[derive(Parser, Debug)]
#[command(name = "pixfx", version)]
struct Cli {
    /// Manifest file: one `input, output, effect[, effect...]` line per image.
    manifest: PathBuf,

    /// Run in parallel: `-p` uses every available core, `-p=N` uses N workers.
    #[arg(
        short = 'p',
        long = "parallel",
        num_args = 0..=1,
        require_equals = true,
        value_name = "N"
    )]
    parallel: Option<Option<usize>>,

    /// Finished images allowed to wait for the writer before workers block.
    #[arg(long, default_value_t = pixfx::DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Write a JSON run report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn parallelism(&self) -> pixfx::Parallelism {
        match self.parallel {
            None => pixfx::Parallelism::Sequential,
            Some(None) => pixfx::Parallelism::Auto,
            Some(Some(n)) => pixfx::Parallelism::Workers(n),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let opts = pixfx::PipelineOpts {
        queue_capacity: cli.queue_capacity,
        ..pixfx::PipelineOpts::with_parallelism(cli.parallelism())
    };
    tracing::debug!(workers = opts.workers, manifest = %cli.manifest.display(), "starting");

    let report = pixfx::run_manifest_to_files(&cli.manifest, &opts)
        .with_context(|| format!("process manifest '{}'", cli.manifest.display()))?;

    if let Some(path) = &cli.report {
        write_report(path, &report)?;
    }

    eprintln!(
        "wrote {} image(s) with {} worker(s)",
        report.images_written, report.workers
    );
    if !report.is_clean() {
        anyhow::bail!("{} image(s) failed", report.failures.len());
    }
    Ok(())
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        tracing::Level::WARN
    } else {
        match verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn write_report(path: &Path, report: &pixfx::RunReport) -> anyhow::Result<()> {
    pixfx::ensure_parent_dir(path)?;
    let f = File::create(path).with_context(|| format!("create report '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), report)
        .with_context(|| format!("write report '{}'", path.display()))?;
    Ok(())
}
