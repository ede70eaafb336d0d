use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::PixfxError;

/// Where an image's pipeline broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Source could not be read or decoded.
    Decode,
    /// Rendering, committing or flattening failed.
    Render,
    /// The writer could not persist the image.
    Write,
}

/// One image-level failure. Failures never abort the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFailure {
    /// Input path for decode failures, output path otherwise.
    pub path: PathBuf,
    /// Pipeline stage.
    pub stage: FailureStage,
    /// Rendered error message.
    pub message: String,
}

impl ImageFailure {
    pub(crate) fn new(path: &Path, stage: FailureStage, err: &PixfxError) -> Self {
        Self {
            path: path.to_path_buf(),
            stage,
            message: err.to_string(),
        }
    }
}

/// Summary of one pool run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Worker threads used.
    pub workers: usize,
    /// Images that produced at least one work unit (`0` when units are fed to `run_pool`
    /// directly).
    pub images_queued: u64,
    /// Images persisted by the writer.
    pub images_written: u64,
    /// Images whose flatten/write was skipped because of cancellation.
    pub images_cancelled: u64,
    /// Units that ran their kernel.
    pub units_processed: u64,
    /// Units that only decremented (failed source or cancellation).
    pub units_skipped: u64,
    /// Image-level failures in the order they were observed.
    pub failures: Vec<ImageFailure>,
}

impl RunReport {
    /// `true` when no image failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn absorb(&mut self, other: RunReport) {
        self.images_queued += other.images_queued;
        self.images_written += other.images_written;
        self.images_cancelled += other.images_cancelled;
        self.units_processed += other.units_processed;
        self.units_skipped += other.units_skipped;
        self.failures.extend(other.failures);
    }
}
