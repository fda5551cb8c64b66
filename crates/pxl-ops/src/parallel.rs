//! Fork-join row scheduling.
//!
//! A row range is partitioned into contiguous, pairwise-disjoint
//! [`RowInterval`]s whose union is the whole range. Each interval is handed
//! to a worker together with the matching band of destination rows, so
//! workers write without locks while freely reading any shared source.
//! The caller blocks until every interval has finished.
//!
//! The number of intervals is
//! `min(max_degree_of_parallelism, ceil(width * height / min_pixels_per_task), height)`,
//! i.e. an interval covers at least `ceil(min_pixels_per_task / width)` rows
//! unless parallelism is the tighter bound. A single interval runs on the
//! calling thread.
//!
//! When the `parallel` feature is disabled, intervals run sequentially.
//!
//! # Example
//!
//! ```rust
//! use pxl_core::{Buffer2D, ExecutionSettings};
//! use pxl_ops::parallel::iterate_rows;
//!
//! let settings = ExecutionSettings::default().with_min_pixels_per_task(64);
//! let mut buf: Buffer2D<u32> = Buffer2D::new(64, 64);
//! iterate_rows(&settings, 0..64, &mut buf, |_, mut rows| {
//!     for (y, row) in rows.iter_mut() {
//!         row.fill(y);
//!     }
//!     Ok(())
//! })
//! .unwrap();
//! assert_eq!(buf.get(0, 17), Some(17));
//! ```

use crate::OpsResult;
use pxl_core::{Buffer2D, ExecutionSettings, RowsMut};
use std::ops::Range;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Half-open row range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowInterval {
    /// First row (inclusive).
    pub min: u32,
    /// End row (exclusive).
    pub max: u32,
}

impl RowInterval {
    /// Creates `[min, max)`.
    #[inline]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Number of rows.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.max.saturating_sub(self.min)
    }

    /// `true` if no rows are covered.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.max <= self.min
    }

    /// `true` if `y` is covered.
    #[inline]
    pub const fn contains(&self, y: u32) -> bool {
        y >= self.min && y < self.max
    }

    /// Iterates the covered rows.
    #[inline]
    pub fn iter(&self) -> Range<u32> {
        self.min..self.max
    }
}

impl From<RowInterval> for Range<u32> {
    fn from(iv: RowInterval) -> Self {
        iv.min..iv.max
    }
}

/// Splits `rows` (of the given row width) into disjoint, exhaustive intervals.
///
/// Intervals are returned top to bottom, differ in length by at most one
/// row, and are never empty. An empty range yields no intervals.
pub fn partition(settings: &ExecutionSettings, rows: Range<u32>, width: u32) -> Vec<RowInterval> {
    if rows.start >= rows.end {
        return Vec::new();
    }
    let height = rows.end - rows.start;
    let pixels = width as u64 * height as u64;
    let by_size = pixels.div_ceil(settings.min_pixels_per_task() as u64);
    let steps = (settings.max_degree_of_parallelism() as u64)
        .min(by_size)
        .clamp(1, height as u64) as u32;

    let base = height / steps;
    let extra = height % steps;
    let mut out = Vec::with_capacity(steps as usize);
    let mut y = rows.start;
    for i in 0..steps {
        let len = base + u32::from(i < extra);
        out.push(RowInterval::new(y, y + len));
        y += len;
    }
    debug_assert_eq!(y, rows.end);
    out
}

/// Runs `op` once per interval of `rows`, giving it that interval's band of `buffer`.
///
/// # Errors
///
/// Every interval runs to completion even if another fails; the error of
/// the topmost failed interval is then returned. Rows written by other
/// intervals are kept.
pub fn iterate_rows<P, F>(
    settings: &ExecutionSettings,
    rows: Range<u32>,
    buffer: &mut Buffer2D<P>,
    op: F,
) -> OpsResult<()>
where
    P: Send,
    F: Fn(RowInterval, RowsMut<'_, P>) -> OpsResult<()> + Sync,
{
    let width = buffer.width();
    let band = buffer.rows_mut(rows.clone())?;
    if width == 0 || rows.is_empty() {
        return Ok(());
    }
    let intervals = partition(settings, rows, width);
    trace!(intervals = intervals.len(), width, "iterate_rows");
    let jobs = split_bands(band, &intervals);
    run(settings, jobs, |(interval, rows)| op(interval, rows))
}

/// Like [`iterate_rows`], with a scratch slice of `scratch_len` elements per interval.
///
/// The scratch is allocated through the settings' allocator when the
/// interval starts, reused for every row of that interval, and dropped when
/// the interval ends. It is never shared between intervals.
pub fn iterate_rows_with_scratch<P, S, F>(
    settings: &ExecutionSettings,
    rows: Range<u32>,
    buffer: &mut Buffer2D<P>,
    scratch_len: usize,
    op: F,
) -> OpsResult<()>
where
    P: Send,
    S: Copy + Default + Send,
    F: Fn(RowInterval, RowsMut<'_, P>, &mut [S]) -> OpsResult<()> + Sync,
{
    let width = buffer.width();
    let band = buffer.rows_mut(rows.clone())?;
    if width == 0 || rows.is_empty() {
        return Ok(());
    }
    let intervals = partition(settings, rows, width);
    trace!(intervals = intervals.len(), width, scratch_len, "iterate_rows_with_scratch");
    let allocator = settings.allocator();
    let jobs = split_bands(band, &intervals);
    run(settings, jobs, |(interval, rows)| {
        let mut scratch = allocator.allocate::<S>(scratch_len)?;
        op(interval, rows, &mut scratch)
    })
}

/// Runs `op` once per interval of `rows` without handing out any buffer.
pub fn for_each_interval<F>(
    settings: &ExecutionSettings,
    rows: Range<u32>,
    width: u32,
    op: F,
) -> OpsResult<()>
where
    F: Fn(RowInterval) -> OpsResult<()> + Sync,
{
    let intervals = partition(settings, rows, width);
    run(settings, intervals, op)
}

fn split_bands<'a, P>(
    band: RowsMut<'a, P>,
    intervals: &[RowInterval],
) -> Vec<(RowInterval, RowsMut<'a, P>)> {
    let mut out = Vec::with_capacity(intervals.len());
    let mut rest = band;
    for &interval in intervals {
        let (head, tail) = rest.split_at(interval.max);
        out.push((interval, head));
        rest = tail;
    }
    out
}

/// Fork-join over `jobs`, draining all of them before reporting the first error.
fn run<T, F>(settings: &ExecutionSettings, jobs: Vec<T>, f: F) -> OpsResult<()>
where
    T: Send,
    F: Fn(T) -> OpsResult<()> + Sync,
{
    if jobs.len() <= 1 {
        return jobs.into_iter().try_for_each(f);
    }

    #[cfg(feature = "parallel")]
    let results: Vec<OpsResult<()>> =
        settings.install(|| jobs.into_par_iter().map(&f).collect());

    #[cfg(not(feature = "parallel"))]
    let results: Vec<OpsResult<()>> = {
        let _ = settings;
        jobs.into_iter().map(&f).collect()
    };

    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpsError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn settings(dop: usize, min_pixels: usize) -> ExecutionSettings {
        ExecutionSettings::default()
            .with_max_degree_of_parallelism(dop)
            .with_min_pixels_per_task(min_pixels)
    }

    fn assert_exhaustive(intervals: &[RowInterval], rows: Range<u32>) {
        let mut expected = rows.start;
        for iv in intervals {
            assert!(!iv.is_empty());
            assert_eq!(iv.min, expected, "gap or overlap at {iv:?}");
            expected = iv.max;
        }
        assert_eq!(expected, rows.end.max(rows.start));
    }

    #[test]
    fn test_partition_disjoint_and_exhaustive() {
        for height in [1u32, 2, 3, 7, 16, 100, 257, 1000] {
            for dop in [1usize, 2, 3, 4, 8, 13, 64] {
                for min_pixels in [1usize, 64, 4096] {
                    let s = settings(dop, min_pixels);
                    let intervals = partition(&s, 0..height, 37);
                    assert!(intervals.len() <= dop);
                    assert_exhaustive(&intervals, 0..height);
                }
            }
        }
    }

    #[test]
    fn test_partition_offset_range() {
        let s = settings(4, 1);
        let intervals = partition(&s, 10..23, 5);
        assert_eq!(intervals.len(), 4);
        assert_exhaustive(&intervals, 10..23);
        let lens: Vec<u32> = intervals.iter().map(RowInterval::len).collect();
        assert_eq!(lens, vec![4, 3, 3, 3]);
    }

    #[test]
    fn test_partition_small_range_single_interval() {
        let s = settings(8, 4096);
        let intervals = partition(&s, 0..4, 4);
        assert_eq!(intervals, vec![RowInterval::new(0, 4)]);
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(&settings(4, 1), 5..5, 10).is_empty());
    }

    #[test]
    fn test_iterate_rows_writes_every_row_once() {
        let s = settings(6, 1);
        let mut buf: Buffer2D<u32> = Buffer2D::new(3, 50);
        iterate_rows(&s, 0..50, &mut buf, |interval, mut rows| {
            assert_eq!(rows.rows(), interval.iter());
            for (_, row) in rows.iter_mut() {
                for v in row.iter_mut() {
                    *v += 1;
                }
            }
            Ok(())
        })
        .unwrap();
        assert!(buf.as_slice().iter().all(|&v| v == 1));
    }

    #[test]
    fn test_iterate_rows_sub_range_leaves_rest() {
        let s = settings(3, 1);
        let mut buf: Buffer2D<u8> = Buffer2D::new(2, 10);
        iterate_rows(&s, 4..8, &mut buf, |_, mut rows| {
            for (_, row) in rows.iter_mut() {
                row.fill(7);
            }
            Ok(())
        })
        .unwrap();
        for y in 0..10 {
            let expected = if (4..8).contains(&y) { 7 } else { 0 };
            assert_eq!(buf.row(y), &[expected, expected]);
        }
    }

    #[test]
    fn test_iterate_rows_range_past_height() {
        let mut buf: Buffer2D<u8> = Buffer2D::new(2, 4);
        let result = iterate_rows(&settings(2, 1), 0..5, &mut buf, |_, _| Ok(()));
        assert!(matches!(result, Err(OpsError::Core(_))));
    }

    #[test]
    fn test_failure_drains_all_intervals() {
        let s = settings(4, 1);
        let mut buf: Buffer2D<u8> = Buffer2D::new(1, 8);
        let ran = AtomicUsize::new(0);
        let result = iterate_rows(&s, 0..8, &mut buf, |interval, mut rows| {
            ran.fetch_add(1, Ordering::SeqCst);
            for (_, row) in rows.iter_mut() {
                row.fill(1);
            }
            if interval.min >= 2 {
                return Err(OpsError::InvalidParameter(format!("row {}", interval.min)));
            }
            Ok(())
        });
        assert_eq!(ran.load(Ordering::SeqCst), 4);
        match result {
            Err(OpsError::InvalidParameter(msg)) => assert_eq!(msg, "row 2"),
            other => panic!("unexpected {other:?}"),
        }
        // No rollback.
        assert!(buf.as_slice().iter().all(|&v| v == 1));
    }

    #[test]
    fn test_scratch_per_interval() {
        let s = settings(4, 1);
        let mut buf: Buffer2D<u8> = Buffer2D::new(5, 12);
        let allocations = AtomicUsize::new(0);
        iterate_rows_with_scratch::<_, f32, _>(&s, 0..12, &mut buf, 5, |_, mut rows, scratch| {
            allocations.fetch_add(1, Ordering::SeqCst);
            assert_eq!(scratch.len(), 5);
            assert!(scratch.iter().all(|&v| v == 0.0));
            for (_, row) in rows.iter_mut() {
                scratch.fill(1.0);
                row.fill(scratch.len() as u8);
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(allocations.load(Ordering::SeqCst), 4);
        assert!(buf.as_slice().iter().all(|&v| v == 5));
    }

    #[test]
    fn test_scratch_allocation_failure() {
        let s = settings(2, 1)
            .with_allocator(pxl_core::BufferAllocator::with_limit(8));
        let mut buf: Buffer2D<u8> = Buffer2D::new(4, 4);
        let result =
            iterate_rows_with_scratch::<_, f32, _>(&s, 0..4, &mut buf, 16, |_, _, _| Ok(()));
        assert!(matches!(result, Err(OpsError::Core(e)) if e.is_allocation_error()));
    }

    #[test]
    fn test_for_each_interval_covers_rows() {
        let s = settings(5, 1);
        let rows = AtomicUsize::new(0);
        for_each_interval(&s, 0..33, 1, |iv| {
            rows.fetch_add(iv.len() as usize, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        assert_eq!(rows.load(Ordering::SeqCst), 33);
    }

    #[test]
    fn test_dedicated_pool() {
        let s = settings(4, 1).with_thread_pool(2).unwrap();
        let mut buf: Buffer2D<u16> = Buffer2D::new(4, 40);
        iterate_rows(&s, 0..40, &mut buf, |_, mut rows| {
            for (y, row) in rows.iter_mut() {
                row.fill(y as u16);
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(buf.row(39), &[39, 39, 39, 39]);
    }
}
