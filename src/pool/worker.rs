use std::path::PathBuf;

use crossbeam::channel::{Receiver, Sender};

use crate::{
    assets::codec::ImageCodec,
    effects::kernel::render_plane,
    foundation::error::PixfxError,
    manifest::decompose::WorkUnit,
    output::sink::{ImageSink, OutputJob},
    pool::{
        opts::PipelineOpts,
        report::{FailureStage, ImageFailure, RunReport},
    },
};

enum UnitOutcome {
    Rendered,
    Skipped,
}

/// Pull units until the work queue is closed and drained.
///
/// Every pulled unit decrements its canvas exactly once, whatever happened to it, so each
/// image's counter always reaches zero.
pub(crate) fn worker_loop(
    worker: usize,
    work_rx: Receiver<WorkUnit>,
    out_tx: Sender<OutputJob>,
    codec: &dyn ImageCodec,
    opts: &PipelineOpts,
) -> RunReport {
    let mut report = RunReport::default();

    for unit in work_rx.iter() {
        let cancelled = opts.is_cancelled();
        match process_unit(&unit, codec, cancelled) {
            Ok(UnitOutcome::Rendered) => report.units_processed += 1,
            Ok(UnitOutcome::Skipped) => report.units_skipped += 1,
            Err((stage, e)) => {
                tracing::error!(
                    worker,
                    input = %unit.input().display(),
                    effect = %unit.effect(),
                    channel = %unit.channel(),
                    error = %e,
                    "work unit failed"
                );
                let path = match stage {
                    FailureStage::Decode => unit.input(),
                    _ => unit.output(),
                };
                report.failures.push(ImageFailure::new(path, stage, &e));
                report.units_skipped += 1;
            }
        }

        match unit.canvas().decrement_and_check_done() {
            Ok(true) => finish_image(worker, &unit, &out_tx, opts, &mut report),
            Ok(false) => {}
            Err(e) => {
                tracing::error!(worker, error = %e, "completion counter failed");
                report.failures.push(ImageFailure::new(
                    unit.output(),
                    FailureStage::Render,
                    &e,
                ));
            }
        }
    }

    tracing::debug!(worker, processed = report.units_processed, "worker drained");
    report
}

fn process_unit(
    unit: &WorkUnit,
    codec: &dyn ImageCodec,
    cancelled: bool,
) -> Result<UnitOutcome, (FailureStage, PixfxError)> {
    if cancelled {
        return Ok(UnitOutcome::Skipped);
    }

    let canvas = unit.canvas();
    let source = match canvas.get_or_init_source(|path| codec.decode(path)) {
        Ok(Some(source)) => source,
        Ok(None) => return Ok(UnitOutcome::Skipped),
        Err(e) => return Err((FailureStage::Decode, e)),
    };

    let plane = render_plane(source, unit.effect(), unit.channel());
    let committed = canvas
        .write_channel_plane(unit.channel(), unit.ordinal(), plane)
        .map_err(|e| (FailureStage::Render, e))?;
    tracing::trace!(unit = %unit, committed, "unit rendered");
    Ok(UnitOutcome::Rendered)
}

/// Runs on the single worker that observed the counter reach zero.
fn finish_image(
    worker: usize,
    unit: &WorkUnit,
    out_tx: &Sender<OutputJob>,
    opts: &PipelineOpts,
    report: &mut RunReport,
) {
    let canvas = unit.canvas();
    if opts.is_cancelled() {
        tracing::info!(output = %unit.output().display(), "cancelled; image not written");
        report.images_cancelled += 1;
        return;
    }
    if canvas.source_failed() {
        tracing::warn!(
            input = %unit.input().display(),
            "source unavailable; skipping flatten and write"
        );
        return;
    }

    let image = match canvas.flatten() {
        Ok(image) => image,
        Err(e) => {
            tracing::error!(worker, error = %e, "flatten failed");
            report
                .failures
                .push(ImageFailure::new(unit.output(), FailureStage::Render, &e));
            return;
        }
    };

    let job = OutputJob {
        output: unit.output().to_path_buf(),
        image,
    };
    if out_tx.send(job).is_err() {
        let e = PixfxError::pipeline("writer is not accepting images");
        tracing::error!(worker, output = %unit.output().display(), error = %e, "image dropped");
        report
            .failures
            .push(ImageFailure::new(unit.output(), FailureStage::Write, &e));
    }
}

/// Persist finished images one at a time until every worker has hung up.
pub(crate) fn writer_loop(out_rx: Receiver<OutputJob>, sink: &mut dyn ImageSink) -> RunReport {
    let mut report = RunReport::default();
    for job in out_rx.iter() {
        match write_job(sink, job) {
            Ok(path) => {
                tracing::info!(output = %path.display(), "image written");
                report.images_written += 1;
            }
            Err(failure) => {
                tracing::error!(
                    output = %failure.path.display(),
                    error = %failure.message,
                    "write failed"
                );
                report.failures.push(failure);
            }
        }
    }
    report
}

fn write_job(sink: &mut dyn ImageSink, job: OutputJob) -> Result<PathBuf, ImageFailure> {
    let OutputJob { output, image } = job;
    match sink.write(image, &output) {
        Ok(()) => Ok(output),
        Err(e) => Err(ImageFailure::new(&output, FailureStage::Write, &e)),
    }
}
