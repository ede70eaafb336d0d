use crate::foundation::{
    core::CancelToken,
    error::{PixfxError, PixfxResult},
};

/// Default bound on finished-but-unwritten images.
pub const DEFAULT_QUEUE_CAPACITY: usize = 2;

/// How many workers to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// One worker; behaves like a sequential run.
    #[default]
    Sequential,
    /// One worker per available hardware thread.
    Auto,
    /// An explicit worker count. `0` is treated as `1`.
    Workers(usize),
}

impl Parallelism {
    /// Resolve to a concrete worker count (always `>= 1`).
    pub fn worker_count(self) -> usize {
        match self {
            Parallelism::Sequential => 1,
            Parallelism::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Parallelism::Workers(n) => n.max(1),
        }
    }
}

/// Pool configuration.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Number of worker threads (must be `>= 1`).
    pub workers: usize,
    /// Capacity of the output queue between workers and the writer (clamped to `>= 1`).
    pub queue_capacity: usize,
    /// Optional cooperative cancellation.
    pub cancel: Option<CancelToken>,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            cancel: None,
        }
    }
}

impl PipelineOpts {
    /// Options with `workers` resolved from `parallelism`.
    pub fn with_parallelism(parallelism: Parallelism) -> Self {
        Self {
            workers: parallelism.worker_count(),
            ..Self::default()
        }
    }

    /// Reject configurations the pool cannot run.
    pub fn validate(&self) -> PixfxResult<()> {
        if self.workers == 0 {
            return Err(PixfxError::validation("pipeline 'workers' must be >= 1"));
        }
        Ok(())
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
