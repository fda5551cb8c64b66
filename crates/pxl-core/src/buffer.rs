//! Row-major 2D pixel storage.
//!
//! - [`Buffer2D`] - owned, exclusively held storage of `width * height` elements
//! - [`RowsMut`] - a mutable band of consecutive rows borrowed from a buffer
//!
//! # Memory Layout
//!
//! Rows are stored top-to-bottom with no padding, so row `y` occupies
//! `data[y * width .. (y + 1) * width]`:
//!
//! ```text
//! [P P P P ...]  ← Row 0
//! [P P P P ...]  ← Row 1
//! ...
//! ```
//!
//! A [`RowsMut`] band can be split at any row boundary into two bands that
//! borrow disjoint memory. The row scheduler relies on this to hand each
//! worker its own rows without locking.
//!
//! ```rust
//! use pxl_core::{Buffer2D, Rgba8};
//!
//! let mut buf: Buffer2D<Rgba8> = Buffer2D::new(4, 4);
//! buf.set(1, 2, [255, 0, 0, 255]);
//! assert_eq!(buf.get(1, 2), Some([255, 0, 0, 255]));
//! assert_eq!(buf.row(2).len(), 4);
//! ```

use crate::{Error, Rect, Result};
use std::ops::Range;

/// Owned row-major 2D buffer.
///
/// Every row has exactly `width` elements; `(x, y)` is valid iff
/// `x < width && y < height`.
#[derive(Clone, PartialEq)]
pub struct Buffer2D<P> {
    data: Vec<P>,
    width: u32,
    height: u32,
}

impl<P: Copy + Default> Buffer2D<P> {
    /// Creates a buffer filled with `P::default()`.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, P::default())
    }

    /// Creates a buffer filled with `value`.
    pub fn filled(width: u32, height: u32, value: P) -> Self {
        Self {
            data: vec![value; width as usize * height as usize],
            width,
            height,
        }
    }
}

impl<P> Buffer2D<P> {
    /// Wraps existing storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<P>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflows usize"))?;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} elements, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the buffer width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the buffer height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Rectangle covering the whole buffer.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Returns `true` if the buffer has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The whole backing storage.
    #[inline]
    pub fn as_slice(&self) -> &[P] {
        &self.data
    }

    #[inline]
    fn row_start(&self, y: u32) -> usize {
        y as usize * self.width as usize
    }

    /// Row `y` as a slice of length `width`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[P] {
        assert!(y < self.height, "row {y} out of bounds for height {}", self.height);
        let start = self.row_start(y);
        &self.data[start..start + self.width as usize]
    }

    /// Row `y` as a mutable slice of length `width`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [P] {
        assert!(y < self.height, "row {y} out of bounds for height {}", self.height);
        let start = self.row_start(y);
        let end = start + self.width as usize;
        &mut self.data[start..end]
    }

    /// Borrows rows `range` as a splittable mutable band.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] if the range is reversed or extends past `height`.
    pub fn rows_mut(&mut self, range: Range<u32>) -> Result<RowsMut<'_, P>> {
        if range.start > range.end || range.end > self.height {
            return Err(Error::invalid_region(
                0,
                range.start,
                self.width,
                range.end.saturating_sub(range.start),
                self.width,
                self.height,
            ));
        }
        let start = self.row_start(range.start);
        let end = self.row_start(range.end);
        Ok(RowsMut {
            data: &mut self.data[start..end],
            width: self.width,
            first_row: range.start,
        })
    }

    /// Copies every element of `src` into this buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] unless both buffers have the same size.
    pub fn copy_from(&mut self, src: &Buffer2D<P>) -> Result<()>
    where
        P: Copy,
    {
        if self.dimensions() != src.dimensions() {
            return Err(Error::dimension_mismatch(self.dimensions(), src.dimensions()));
        }
        self.data.copy_from_slice(&src.data);
        Ok(())
    }
}

impl<P: Copy> Buffer2D<P> {
    /// Element at `(x, y)`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<P> {
        if x < self.width && y < self.height {
            Some(self.data[self.row_start(y) + x as usize])
        } else {
            None
        }
    }

    /// Sets the element at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: P) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let idx = self.row_start(y) + x as usize;
        self.data[idx] = value;
    }

    /// Fills the whole buffer with `value`.
    pub fn fill(&mut self, value: P) {
        self.data.fill(value);
    }
}

impl<P> std::fmt::Debug for Buffer2D<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer2D")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("element", &std::any::type_name::<P>())
            .finish()
    }
}

/// Mutable band of consecutive rows `[first_row, first_row + row_count)`.
///
/// Row indices passed to a band are absolute (buffer) row indices.
pub struct RowsMut<'a, P> {
    data: &'a mut [P],
    width: u32,
    first_row: u32,
}

impl<'a, P> RowsMut<'a, P> {
    /// First (absolute) row in this band.
    #[inline]
    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    /// Number of rows in this band.
    #[inline]
    pub fn row_count(&self) -> u32 {
        if self.width == 0 {
            0
        } else {
            (self.data.len() / self.width as usize) as u32
        }
    }

    /// Absolute row range covered.
    #[inline]
    pub fn rows(&self) -> Range<u32> {
        self.first_row..self.first_row + self.row_count()
    }

    /// Width of each row.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Absolute row `y` of the band.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside [`rows`](Self::rows).
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [P] {
        assert!(
            self.rows().contains(&y),
            "row {y} outside band {:?}",
            self.rows()
        );
        let w = self.width as usize;
        let start = (y - self.first_row) as usize * w;
        &mut self.data[start..start + w]
    }

    /// Iterates `(absolute_row, row_slice)` pairs top to bottom.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut [P])> + '_ {
        let first = self.first_row;
        let w = self.width.max(1) as usize;
        self.data
            .chunks_exact_mut(w)
            .enumerate()
            .map(move |(i, row)| (first + i as u32, row))
    }

    /// Splits into `[first_row, y)` and `[y, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside `first_row..=end`.
    pub fn split_at(self, y: u32) -> (RowsMut<'a, P>, RowsMut<'a, P>) {
        let end = self.first_row + self.row_count();
        assert!(
            y >= self.first_row && y <= end,
            "split row {y} outside band {}..{end}",
            self.first_row
        );
        let mid = (y - self.first_row) as usize * self.width as usize;
        let (top, bottom) = self.data.split_at_mut(mid);
        (
            RowsMut {
                data: top,
                width: self.width,
                first_row: self.first_row,
            },
            RowsMut {
                data: bottom,
                width: self.width,
                first_row: y,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgba8;

    #[test]
    fn test_buffer_new() {
        let buf: Buffer2D<Rgba8> = Buffer2D::new(10, 5);
        assert_eq!(buf.dimensions(), (10, 5));
        assert_eq!(buf.as_slice().len(), 50);
        assert_eq!(buf.get(9, 4), Some([0, 0, 0, 0]));
        assert_eq!(buf.get(10, 4), None);
    }

    #[test]
    fn test_from_vec_wrong_size() {
        let result = Buffer2D::from_vec(4, 4, vec![0u8; 15]);
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_rows_have_width() {
        let buf = Buffer2D::from_vec(3, 2, vec![1u8, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(buf.row(0), &[1, 2, 3]);
        assert_eq!(buf.row(1), &[4, 5, 6]);
    }

    #[test]
    fn test_copy_from_mismatch() {
        let src: Buffer2D<u8> = Buffer2D::new(4, 4);
        let mut dst: Buffer2D<u8> = Buffer2D::new(4, 5);
        assert!(matches!(
            dst.copy_from(&src),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_copy_from() {
        let src = Buffer2D::from_vec(2, 2, vec![1u8, 2, 3, 4]).unwrap();
        let mut dst: Buffer2D<u8> = Buffer2D::new(2, 2);
        dst.copy_from(&src).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_rows_mut_split_disjoint() {
        let mut buf: Buffer2D<u8> = Buffer2D::new(3, 6);
        let band = buf.rows_mut(1..5).unwrap();
        assert_eq!(band.rows(), 1..5);

        let (mut top, mut bottom) = band.split_at(3);
        assert_eq!(top.rows(), 1..3);
        assert_eq!(bottom.rows(), 3..5);
        for (y, row) in top.iter_mut() {
            row.fill(y as u8);
        }
        bottom.row_mut(4).fill(9);

        assert_eq!(buf.row(0), &[0, 0, 0]);
        assert_eq!(buf.row(1), &[1, 1, 1]);
        assert_eq!(buf.row(2), &[2, 2, 2]);
        assert_eq!(buf.row(3), &[0, 0, 0]);
        assert_eq!(buf.row(4), &[9, 9, 9]);
        assert_eq!(buf.row(5), &[0, 0, 0]);
    }

    #[test]
    fn test_rows_mut_out_of_range() {
        let mut buf: Buffer2D<u8> = Buffer2D::new(3, 4);
        assert!(buf.rows_mut(2..5).is_err());
        assert!(buf.rows_mut(0..4).is_ok());
    }
}
