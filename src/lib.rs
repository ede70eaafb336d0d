//! pixfx applies per-channel convolution effects to images listed in a manifest.
//!
//! Each manifest line names an input image, an output image and zero or more effect codes
//! (`B` blur, `E` edge-detect, `S` sharpen, `G` grayscale). Every (image, effect, channel)
//! triple becomes an independent work unit; a fixed pool of workers processes units in any order
//! and the four channel planes of an image are recombined exactly once, when its last unit
//! finishes.
//!
//! # Pipeline overview
//!
//! 1. **Decompose**: `manifest line -> Vec<WorkUnit>` sharing one [`ChannelCanvas`]
//! 2. **Process**: workers decode the source once per image, render one channel plane per unit
//!    and decrement the canvas counter
//! 3. **Flatten**: the worker that takes the counter to zero combines the four planes
//! 4. **Write**: a single writer thread persists finished images through an [`ImageSink`]
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: output does not depend on the worker count or scheduling.
//! - **Failures are per image**: decode and write errors are reported, never fatal to the run.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod canvas;
mod effects;
mod foundation;
mod manifest;
mod output;
mod pool;

pub use assets::codec::{
    ImageCodec, ImageRsCodec, decode_rgba8, encode_png, ensure_parent_dir, premultiply_alpha,
};
pub use canvas::channel_canvas::ChannelCanvas;
pub use canvas::flatten::flatten;
pub use effects::kernel::{OPAQUE, apply, grayscale_average, neighborhood, render_plane, sample};
pub use foundation::core::{CancelToken, Channel, Effect};
pub use foundation::error::{PixfxError, PixfxResult};
pub use manifest::decompose::{
    ManifestEntry, WorkUnit, decompose, manifest_base_dir, parse_line, read_manifest, units_for,
};
pub use output::sink::{FileSink, ImageSink, InMemorySink, OutputJob};
pub use pool::opts::{DEFAULT_QUEUE_CAPACITY, Parallelism, PipelineOpts};
pub use pool::report::{FailureStage, ImageFailure, RunReport};
pub use pool::run::{
    run_lines, run_manifest, run_manifest_to_files, run_pool, run_with_producer,
};
