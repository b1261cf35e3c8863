//! Per-call engine context (§5): the bounded worker count, header cache and
//! block allocator that a single `read_idx_grid`/`write_idx_grid` call
//! shares across its worker fan-out. No state here outlives the call that
//! created it, and nothing here is process-global.

use crate::alloc::BlockAllocator;
use crate::headercache::HeaderCache;

/// Caller-tunable knobs for a single engine call, mirroring the teacher's
/// `ReaderOptions`/`WriterOptions`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineOptions {
    /// Caps the worker count below the `min(2*hw, 1024)` default. `None`
    /// uses the default.
    pub worker_limit: Option<usize>,
}

/// The bundle of shared, call-scoped resources described in §5: bounded
/// worker count, header cache, and block allocator.
pub struct EngineContext {
    /// Number of workers to fan `read_idx_grid`/`write_idx_grid` out across.
    pub workers: usize,
    /// Free list of reusable block buffers.
    pub allocator: BlockAllocator,
    /// Shared, read-only per-file header tables for the read path.
    pub header_cache: HeaderCache,
}

/// Hard ceiling on the worker count, independent of hardware concurrency.
pub const MAX_WORKERS: usize = 1024;

impl EngineContext {
    /// Builds a context for one engine call, applying `options.worker_limit`
    /// on top of the `min(2*hw, 1024)` default from §5.
    pub fn new(options: &EngineOptions) -> EngineContext {
        let hw = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let default_workers = (2 * hw).min(MAX_WORKERS);
        let workers = options
            .worker_limit
            .map(|limit| limit.clamp(1, default_workers))
            .unwrap_or(default_workers);
        EngineContext {
            workers,
            allocator: BlockAllocator::default(),
            header_cache: HeaderCache::new(),
        }
    }
}

impl Default for EngineContext {
    fn default() -> EngineContext {
        EngineContext::new(&EngineOptions::default())
    }
}
