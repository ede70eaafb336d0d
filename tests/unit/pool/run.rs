use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Mutex,
};

use image::{Rgba, RgbaImage};

use super::*;
use crate::{
    effects::kernel::render_plane,
    foundation::core::{CancelToken, Channel, Effect},
    output::sink::InMemorySink,
    pool::report::FailureStage,
};

#[derive(Default)]
struct MapCodec {
    images: HashMap<PathBuf, RgbaImage>,
    decodes: Mutex<Vec<PathBuf>>,
}

impl MapCodec {
    fn with(mut self, path: &str, img: RgbaImage) -> Self {
        self.images.insert(PathBuf::from(path), img);
        self
    }

    fn decode_count(&self, path: &str) -> usize {
        self.decodes
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_path() == Path::new(path))
            .count()
    }
}

impl ImageCodec for MapCodec {
    fn decode(&self, path: &Path) -> PixfxResult<RgbaImage> {
        self.decodes.lock().unwrap().push(path.to_path_buf());
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| PixfxError::NotFound {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }

    fn encode(&self, _image: &RgbaImage, _path: &Path) -> PixfxResult<()> {
        Ok(())
    }
}

struct RejectingSink {
    reject: PathBuf,
    inner: InMemorySink,
}

impl ImageSink for RejectingSink {
    fn write(&mut self, image: RgbaImage, output: &Path) -> PixfxResult<()> {
        if output == self.reject {
            return Err(PixfxError::encode(output, "disk full"));
        }
        self.inner.write(image, output)
    }
}

fn gradient(w: u32, h: u32, seed: u8) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        let v = (x * 37 + y * 11) as u8;
        Rgba([
            v.wrapping_add(seed),
            v.wrapping_mul(3),
            seed ^ v,
            (x * 50) as u8,
        ])
    })
}

fn opts(workers: usize) -> PipelineOpts {
    PipelineOpts {
        workers,
        ..PipelineOpts::default()
    }
}

fn fixture_codec() -> MapCodec {
    MapCodec::default()
        .with("a.png", gradient(7, 5, 3))
        .with("b.png", gradient(4, 9, 90))
        .with("c.png", gradient(1, 1, 200))
}

const LINES: [&str; 5] = [
    "a.png, a_blur.png, B",
    "b.png, b_multi.png, E, S, G",
    "c.png, c_sharp.png, S",
    "a.png, a_none.png",
    "",
];

#[test]
fn every_image_is_written_exactly_once_and_decoded_once() {
    let codec = fixture_codec();
    let mut sink = InMemorySink::new();
    let report = run_lines(LINES, Path::new(""), &codec, &mut sink, &opts(6)).unwrap();

    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.images_queued, 3);
    assert_eq!(report.images_written, 3);
    assert_eq!(report.units_processed, 4 + 12 + 4);
    assert_eq!(sink.images().len(), 3);

    let mut outs: Vec<_> = sink.images().iter().map(|(p, _)| p.clone()).collect();
    outs.sort();
    assert_eq!(
        outs,
        vec![
            PathBuf::from("a_blur.png"),
            PathBuf::from("b_multi.png"),
            PathBuf::from("c_sharp.png")
        ]
    );

    // Two lines reference a.png, but the zero-effect line never decodes it.
    assert_eq!(codec.decode_count("a.png"), 1);
    assert_eq!(codec.decode_count("b.png"), 1);
    assert_eq!(codec.decode_count("c.png"), 1);
}

#[test]
fn one_worker_and_many_workers_agree() {
    let codec = fixture_codec();
    let mut seq = InMemorySink::new();
    let mut par = InMemorySink::new();
    run_lines(LINES, Path::new(""), &codec, &mut seq, &opts(1)).unwrap();
    run_lines(LINES, Path::new(""), &codec, &mut par, &opts(8)).unwrap();

    for (path, img) in seq.images() {
        assert_eq!(par.get(path), Some(img), "{}", path.display());
    }
}

#[test]
fn rightmost_effect_owns_each_channel() {
    let codec = fixture_codec();
    let mut sink = InMemorySink::new();
    run_lines(
        ["b.png, out.png, E, S, G"],
        Path::new(""),
        &codec,
        &mut sink,
        &opts(4),
    )
    .unwrap();

    let src = gradient(4, 9, 90);
    let gray = render_plane(&src, Effect::Grayscale, Channel::R);
    let out = sink.get(Path::new("out.png")).unwrap();
    for (x, y, px) in out.enumerate_pixels() {
        let g = gray.get_pixel(x, y).0[0];
        assert_eq!(px.0, [g, g, g, 255]);
    }
}

#[test]
fn emission_order_does_not_change_the_result() {
    let codec = fixture_codec();
    let line = "a.png, mixed.png, B, E, S";

    let run_units = |units: Vec<WorkUnit>| {
        let (tx, rx) = unbounded();
        for u in units {
            tx.send(u).unwrap();
        }
        drop(tx);
        let mut sink = InMemorySink::new();
        run_pool(rx, &codec, &mut sink, &opts(3)).unwrap();
        sink.get(Path::new("mixed.png")).cloned().unwrap()
    };

    let forward = run_units(decompose(line, Path::new("")));
    let mut reversed = decompose(line, Path::new(""));
    reversed.reverse();
    let backward = run_units(reversed);
    let mut interleaved = decompose(line, Path::new(""));
    interleaved.sort_by_key(|u| (u.channel().index(), std::cmp::Reverse(u.ordinal())));
    let shuffled = run_units(interleaved);

    assert_eq!(forward, backward);
    assert_eq!(forward, shuffled);
}

#[test]
fn missing_source_is_reported_once_and_does_not_block_others() {
    let codec = fixture_codec();
    let mut sink = InMemorySink::new();
    let report = run_lines(
        ["ghost.png, ghost_out.png, B, S", "c.png, c_out.png, E"],
        Path::new(""),
        &codec,
        &mut sink,
        &opts(3),
    )
    .unwrap();

    assert_eq!(report.images_written, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, FailureStage::Decode);
    assert_eq!(report.failures[0].path, PathBuf::from("ghost.png"));
    assert_eq!(report.units_skipped, 8);
    assert_eq!(codec.decode_count("ghost.png"), 1);
    assert!(sink.get(Path::new("ghost_out.png")).is_none());
    assert!(sink.get(Path::new("c_out.png")).is_some());
}

#[test]
fn write_failures_are_recorded_and_the_run_continues() {
    let codec = fixture_codec();
    let mut sink = RejectingSink {
        reject: PathBuf::from("a_blur.png"),
        inner: InMemorySink::new(),
    };
    let report = run_lines(LINES, Path::new(""), &codec, &mut sink, &opts(2)).unwrap();

    assert_eq!(report.images_written, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, FailureStage::Write);
    assert!(report.failures[0].message.contains("disk full"));
    assert_eq!(sink.inner.images().len(), 2);
}

#[test]
fn cancelled_runs_write_nothing() {
    let codec = fixture_codec();
    let token = CancelToken::new();
    token.cancel();

    let (tx, rx) = unbounded();
    for u in decompose("a.png, x.png, B", Path::new("")) {
        tx.send(u).unwrap();
    }
    drop(tx);

    let mut sink = InMemorySink::new();
    let report = run_pool(
        rx,
        &codec,
        &mut sink,
        &PipelineOpts {
            workers: 2,
            cancel: Some(token),
            ..PipelineOpts::default()
        },
    )
    .unwrap();

    assert_eq!(report.images_cancelled, 1);
    assert_eq!(report.units_skipped, 4);
    assert_eq!(report.images_written, 0);
    assert!(sink.images().is_empty());
    assert_eq!(codec.decode_count("a.png"), 0);
}

#[test]
fn tiny_output_queue_still_drains() {
    let codec = fixture_codec();
    let lines: Vec<String> = (0..12)
        .map(|i| format!("a.png, out_{i}.png, B"))
        .collect();
    let mut sink = InMemorySink::new();
    let report = run_lines(
        lines,
        Path::new(""),
        &codec,
        &mut sink,
        &PipelineOpts {
            workers: 4,
            queue_capacity: 0,
            cancel: None,
        },
    )
    .unwrap();
    assert_eq!(report.images_written, 12);
    assert_eq!(sink.images().len(), 12);
}

#[test]
fn zero_workers_is_a_validation_error() {
    let codec = fixture_codec();
    let mut sink = InMemorySink::new();
    let err = run_lines(LINES, Path::new(""), &codec, &mut sink, &opts(0)).unwrap_err();
    assert!(err.to_string().contains("validation error:"));
}

#[test]
fn parallelism_resolves_to_at_least_one_worker() {
    use crate::pool::opts::Parallelism;
    assert_eq!(Parallelism::Sequential.worker_count(), 1);
    assert_eq!(Parallelism::Workers(0).worker_count(), 1);
    assert_eq!(Parallelism::Workers(5).worker_count(), 5);
    assert!(Parallelism::Auto.worker_count() >= 1);
    assert_eq!(PipelineOpts::with_parallelism(Parallelism::Workers(3)).workers, 3);
}
