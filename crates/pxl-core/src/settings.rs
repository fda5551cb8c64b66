//! Execution settings shared by every engine call.
//!
//! [`ExecutionSettings`] carries the parallelism knobs the row scheduler reads
//! and the [`BufferAllocator`] engines use for scratch rows and kernel-weight
//! buffers.
//!
//! ```rust
//! use pxl_core::ExecutionSettings;
//!
//! let settings = ExecutionSettings::default()
//!     .with_max_degree_of_parallelism(4)
//!     .with_min_pixels_per_task(1024);
//! assert_eq!(settings.min_pixels_per_task(), 1024);
//! assert!(settings.max_degree_of_parallelism() <= 4);
//! ```
//!
//! Settings can also be built from a plain [`ExecutionConfig`], which derives
//! serde traits under the `serde` feature.

use crate::{Buffer2D, Error, Result};
use std::sync::Arc;

/// Default minimum number of pixels a single task should cover.
pub const DEFAULT_MIN_PIXELS_PER_TASK: usize = 4096;

/// Hands out scoped buffers, optionally enforcing a per-allocation byte limit.
///
/// Buffers are ordinary owned values: they're released when the caller's
/// scope ends, on every exit path.
#[derive(Debug, Clone, Default)]
pub struct BufferAllocator {
    max_buffer_bytes: Option<usize>,
}

impl BufferAllocator {
    /// Allocator without a size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator refusing any single allocation above `bytes`.
    pub fn with_limit(bytes: usize) -> Self {
        Self {
            max_buffer_bytes: Some(bytes),
        }
    }

    /// Configured per-allocation limit.
    pub fn limit(&self) -> Option<usize> {
        self.max_buffer_bytes
    }

    /// Allocates `len` default-initialized elements.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] on overflow, over the limit, or if the
    /// system allocator refuses.
    pub fn allocate<T: Copy + Default>(&self, len: usize) -> Result<Vec<T>> {
        let bytes = len.checked_mul(std::mem::size_of::<T>()).ok_or_else(|| {
            Error::allocation_failed(usize::MAX, format!("{len} elements overflow usize"))
        })?;
        if let Some(limit) = self.max_buffer_bytes {
            if bytes > limit {
                return Err(Error::allocation_failed(
                    bytes,
                    format!("exceeds allocator limit of {limit} bytes"),
                ));
            }
        }
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| Error::allocation_failed(bytes, e.to_string()))?;
        data.resize(len, T::default());
        Ok(data)
    }

    /// Allocates a `width x height` buffer of default-initialized elements.
    pub fn allocate_2d<T: Copy + Default>(&self, width: u32, height: u32) -> Result<Buffer2D<T>> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflows usize"))?;
        Buffer2D::from_vec(width, height, self.allocate(len)?)
    }
}

/// Plain, serializable form of [`ExecutionSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExecutionConfig {
    /// Upper bound on concurrently dispatched intervals (None = pool size).
    pub max_degree_of_parallelism: Option<usize>,
    /// Minimum pixels per dispatched interval.
    pub min_pixels_per_task: usize,
    /// Build a dedicated pool with this many threads (None = global pool).
    pub threads: Option<usize>,
    /// Per-allocation byte limit for scratch and weight buffers.
    pub max_buffer_bytes: Option<usize>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_degree_of_parallelism: None,
            min_pixels_per_task: DEFAULT_MIN_PIXELS_PER_TASK,
            threads: None,
            max_buffer_bytes: None,
        }
    }
}

/// Parallelism settings and allocator for engine calls.
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    max_degree_of_parallelism: Option<usize>,
    min_pixels_per_task: usize,
    pool: Option<Arc<rayon::ThreadPool>>,
    allocator: BufferAllocator,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            max_degree_of_parallelism: None,
            min_pixels_per_task: DEFAULT_MIN_PIXELS_PER_TASK,
            pool: None,
            allocator: BufferAllocator::default(),
        }
    }
}

impl ExecutionSettings {
    /// Settings that run every call on the calling thread.
    pub fn single_threaded() -> Self {
        Self::default().with_max_degree_of_parallelism(1)
    }

    /// Builds settings from a plain config, creating a dedicated pool if requested.
    pub fn from_config(config: &ExecutionConfig) -> Result<Self> {
        let mut settings = Self::default().with_min_pixels_per_task(config.min_pixels_per_task);
        if let Some(n) = config.max_degree_of_parallelism {
            settings = settings.with_max_degree_of_parallelism(n);
        }
        if let Some(threads) = config.threads {
            settings = settings.with_thread_pool(threads)?;
        }
        if let Some(limit) = config.max_buffer_bytes {
            settings = settings.with_allocator(BufferAllocator::with_limit(limit));
        }
        Ok(settings)
    }

    /// Caps the number of intervals a single call is split into. Zero is treated as one.
    pub fn with_max_degree_of_parallelism(mut self, n: usize) -> Self {
        self.max_degree_of_parallelism = Some(n.max(1));
        self
    }

    /// Sets the minimum pixel count per interval. Zero is treated as one.
    pub fn with_min_pixels_per_task(mut self, n: usize) -> Self {
        self.min_pixels_per_task = n.max(1);
        self
    }

    /// Runs work on a dedicated pool of `threads` workers instead of the global pool.
    pub fn with_thread_pool(mut self, threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pxl-worker-{i}"))
            .build()?;
        self.pool = Some(Arc::new(pool));
        Ok(self)
    }

    /// Replaces the buffer allocator.
    pub fn with_allocator(mut self, allocator: BufferAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Minimum pixels per interval.
    #[inline]
    pub fn min_pixels_per_task(&self) -> usize {
        self.min_pixels_per_task
    }

    /// Number of worker threads available.
    pub fn worker_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Effective upper bound on intervals per call.
    pub fn max_degree_of_parallelism(&self) -> usize {
        self.max_degree_of_parallelism
            .unwrap_or_else(|| self.worker_threads())
            .max(1)
    }

    /// Buffer allocator for scratch and weight buffers.
    #[inline]
    pub fn allocator(&self) -> &BufferAllocator {
        &self.allocator
    }

    /// Runs `op` inside the configured pool (or directly, for the global pool).
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = ExecutionSettings::default();
        assert_eq!(s.min_pixels_per_task(), DEFAULT_MIN_PIXELS_PER_TASK);
        assert!(s.max_degree_of_parallelism() >= 1);
        assert!(s.allocator().limit().is_none());
    }

    #[test]
    fn test_single_threaded() {
        assert_eq!(ExecutionSettings::single_threaded().max_degree_of_parallelism(), 1);
    }

    #[test]
    fn test_zero_is_clamped() {
        let s = ExecutionSettings::default()
            .with_max_degree_of_parallelism(0)
            .with_min_pixels_per_task(0);
        assert_eq!(s.max_degree_of_parallelism(), 1);
        assert_eq!(s.min_pixels_per_task(), 1);
    }

    #[test]
    fn test_dedicated_pool() {
        let s = ExecutionSettings::default().with_thread_pool(3).unwrap();
        assert_eq!(s.worker_threads(), 3);
        assert_eq!(s.max_degree_of_parallelism(), 3);
        let n = s.install(rayon::current_num_threads);
        assert_eq!(n, 3);
    }

    #[test]
    fn test_from_config() {
        let config = ExecutionConfig {
            max_degree_of_parallelism: Some(2),
            min_pixels_per_task: 16,
            threads: Some(2),
            max_buffer_bytes: Some(64),
        };
        let s = ExecutionSettings::from_config(&config).unwrap();
        assert_eq!(s.max_degree_of_parallelism(), 2);
        assert_eq!(s.min_pixels_per_task(), 16);
        assert_eq!(s.allocator().limit(), Some(64));
    }

    #[test]
    fn test_allocator_limit() {
        let alloc = BufferAllocator::with_limit(16);
        assert!(alloc.allocate::<f32>(4).is_ok());
        let err = alloc.allocate::<f32>(5).unwrap_err();
        assert!(err.is_allocation_error());
    }

    #[test]
    fn test_allocate_2d() {
        let buf = BufferAllocator::new().allocate_2d::<f32>(7, 3).unwrap();
        assert_eq!(buf.dimensions(), (7, 3));
        assert!(buf.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_allocate_overflow() {
        let err = BufferAllocator::new().allocate::<u64>(usize::MAX).unwrap_err();
        assert!(err.is_allocation_error());
    }
}
