use std::path::Path;

use crossbeam::channel::{Receiver, Sender, bounded, unbounded};

use crate::{
    assets::codec::{ImageCodec, ImageRsCodec},
    foundation::error::{PixfxError, PixfxResult},
    manifest::decompose::{WorkUnit, decompose, manifest_base_dir, read_manifest},
    output::sink::{FileSink, ImageSink, OutputJob},
    pool::{
        opts::PipelineOpts,
        report::RunReport,
        worker::{worker_loop, writer_loop},
    },
};

/// Drain `work_rx` with `opts.workers` worker threads and one writer thread.
///
/// Returns once the queue is closed and drained, every worker has exited and the writer has
/// persisted (or failed) every finished image. Per-image failures land in the report; only
/// pool-level problems (invalid options, panicked threads) are returned as errors.
pub fn run_pool(
    work_rx: Receiver<WorkUnit>,
    codec: &dyn ImageCodec,
    sink: &mut dyn ImageSink,
    opts: &PipelineOpts,
) -> PixfxResult<RunReport> {
    opts.validate()?;
    let cap = opts.queue_capacity.max(1);

    std::thread::scope(|scope| -> PixfxResult<RunReport> {
        let (out_tx, out_rx) = bounded::<OutputJob>(cap);

        let writer = std::thread::Builder::new()
            .name("pixfx-writer".to_string())
            .spawn_scoped(scope, move || writer_loop(out_rx, sink))
            .map_err(|e| PixfxError::pipeline(format!("failed to spawn writer: {e}")))?;

        let mut workers = Vec::with_capacity(opts.workers);
        for id in 0..opts.workers {
            let work_rx = work_rx.clone();
            let out_tx = out_tx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("pixfx-worker-{id}"))
                .spawn_scoped(scope, move || worker_loop(id, work_rx, out_tx, codec, opts))
                .map_err(|e| PixfxError::pipeline(format!("failed to spawn worker {id}: {e}")))?;
            workers.push(handle);
        }
        // The writer stops once every worker has dropped its sender.
        drop(out_tx);
        drop(work_rx);

        let mut report = RunReport {
            workers: opts.workers,
            ..RunReport::default()
        };
        let mut panicked = 0usize;
        for handle in workers {
            match handle.join() {
                Ok(r) => report.absorb(r),
                Err(_) => panicked += 1,
            }
        }
        match writer.join() {
            Ok(r) => report.absorb(r),
            Err(_) => return Err(PixfxError::pipeline("writer thread panicked")),
        }
        if panicked > 0 {
            return Err(PixfxError::pipeline(format!(
                "{panicked} worker thread(s) panicked"
            )));
        }
        Ok(report)
    })
}

/// Feed units from `produce` while the pool consumes them.
///
/// `produce` runs on its own thread and returns the number of images it queued; the work queue
/// closes when it returns.
pub fn run_with_producer<P>(
    produce: P,
    codec: &dyn ImageCodec,
    sink: &mut dyn ImageSink,
    opts: &PipelineOpts,
) -> PixfxResult<RunReport>
where
    P: FnOnce(Sender<WorkUnit>) -> PixfxResult<u64> + Send,
{
    opts.validate()?;
    let (work_tx, work_rx) = unbounded::<WorkUnit>();

    std::thread::scope(|scope| -> PixfxResult<RunReport> {
        let producer = std::thread::Builder::new()
            .name("pixfx-manifest".to_string())
            .spawn_scoped(scope, move || produce(work_tx))
            .map_err(|e| PixfxError::pipeline(format!("failed to spawn manifest reader: {e}")))?;

        let report = run_pool(work_rx, codec, sink, opts);
        let queued = producer
            .join()
            .map_err(|_| PixfxError::pipeline("manifest reader panicked"))??;

        let mut report = report?;
        report.images_queued = queued;
        Ok(report)
    })
}

/// Run an in-memory manifest. Relative paths resolve against `base_dir`.
pub fn run_lines<I>(
    lines: I,
    base_dir: &Path,
    codec: &dyn ImageCodec,
    sink: &mut dyn ImageSink,
    opts: &PipelineOpts,
) -> PixfxResult<RunReport>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    I::IntoIter: Send,
{
    let lines = lines.into_iter();
    run_with_producer(
        move |tx| feed(lines.map(|l| Ok(Some(l))), base_dir, &tx, opts),
        codec,
        sink,
        opts,
    )
}

/// Read the manifest at `manifest` and run it. Relative paths resolve against its directory.
#[tracing::instrument(skip(codec, sink, opts), fields(workers = opts.workers))]
pub fn run_manifest(
    manifest: &Path,
    codec: &dyn ImageCodec,
    sink: &mut dyn ImageSink,
    opts: &PipelineOpts,
) -> PixfxResult<RunReport> {
    let lines = read_manifest(manifest)?;
    let base_dir = manifest_base_dir(manifest);
    let report = run_with_producer(
        move |tx| {
            let lines = lines.map(|l| {
                l.map(|bytes| String::from_utf8(bytes).ok()).map_err(|e| {
                    PixfxError::manifest(format!("read manifest '{}': {e}", manifest.display()))
                })
            });
            feed(lines, &base_dir, &tx, opts)
        },
        codec,
        sink,
        opts,
    )?;
    tracing::info!(
        written = report.images_written,
        failed = report.failures.len(),
        "manifest complete"
    );
    Ok(report)
}

/// [`run_manifest`] with the default `image`-crate codec writing files to disk.
pub fn run_manifest_to_files(manifest: &Path, opts: &PipelineOpts) -> PixfxResult<RunReport> {
    let codec = ImageRsCodec;
    let mut sink = FileSink::new(codec);
    run_manifest(manifest, &codec, &mut sink, opts)
}

fn feed<I, S>(
    lines: I,
    base_dir: &Path,
    tx: &Sender<WorkUnit>,
    opts: &PipelineOpts,
) -> PixfxResult<u64>
where
    I: Iterator<Item = PixfxResult<Option<S>>>,
    S: AsRef<str>,
{
    let mut images = 0u64;
    for (idx, line) in lines.enumerate() {
        if opts.is_cancelled() {
            tracing::info!("cancelled; no further manifest lines queued");
            break;
        }
        // `None` is a line that is not valid UTF-8.
        let Some(line) = line? else {
            tracing::warn!(line = idx + 1, "manifest line is not valid UTF-8; skipped");
            continue;
        };
        let units = decompose(line.as_ref(), base_dir);
        if units.is_empty() {
            continue;
        }
        images += 1;
        for unit in units {
            tx.send(unit)
                .map_err(|_| PixfxError::pipeline("work queue closed while feeding"))?;
        }
    }
    Ok(images)
}

#[cfg(test)]
#[path = "../../tests/unit/pool/run.rs"]
mod tests;
