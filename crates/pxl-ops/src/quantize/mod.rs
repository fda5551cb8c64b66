//! Palette quantization.
//!
//! A [`Quantizer`] is a shared, stateless strategy that hands out a
//! [`FrameQuantizer`] for a single call. The frame quantizer turns a region
//! of the source into a [`QuantizedResult`]: one palette index per pixel
//! plus at most 256 palette colors. [`quantize`] then writes
//! `palette[index]` back over the region, in parallel by row.
//!
//! Quantizers are invoked once per call, so they're dispatched dynamically
//! (`&dyn Quantizer<P>`); the per-pixel write-back stays generic over `P`.
//!
//! # Strategies
//!
//! - [`PaletteQuantizer`] - maps onto a fixed, caller-supplied palette
//! - [`MedianCutQuantizer`] - builds a palette from the region's colors
//!
//! # Example
//!
//! ```rust
//! use pxl_core::{Buffer2D, ExecutionSettings, Rgba8};
//! use pxl_ops::quantize::{quantize, PaletteQuantizer};
//!
//! let mut img: Buffer2D<Rgba8> = Buffer2D::filled(8, 8, [250, 5, 5, 255]);
//! let quantizer = PaletteQuantizer::new(vec![[0, 0, 0, 255], [255, 0, 0, 255]]).unwrap();
//! let region = img.bounds();
//! quantize(&ExecutionSettings::default(), &quantizer, &mut img, region).unwrap();
//! assert_eq!(img.get(3, 3), Some([255, 0, 0, 255]));
//! ```

mod median_cut;
mod palette;

pub use median_cut::MedianCutQuantizer;
pub use palette::PaletteQuantizer;

use crate::parallel::iterate_rows;
use crate::{OpsError, OpsResult};
use pxl_core::{Buffer2D, ExecutionSettings, Pixel, Rect};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// Largest palette an index byte can address.
pub const MAX_PALETTE_LEN: usize = 256;

/// Options shared by the built-in quantizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizerOptions {
    /// Upper bound on palette length, `1..=256`.
    pub max_colors: usize,
}

impl Default for QuantizerOptions {
    fn default() -> Self {
        Self {
            max_colors: MAX_PALETTE_LEN,
        }
    }
}

impl QuantizerOptions {
    /// Options with the given palette bound.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] unless `1 <= max_colors <= 256`.
    pub fn new(max_colors: usize) -> OpsResult<Self> {
        if !(1..=MAX_PALETTE_LEN).contains(&max_colors) {
            return Err(OpsError::InvalidParameter(format!(
                "max_colors must be in 1..={MAX_PALETTE_LEN}, got {max_colors}"
            )));
        }
        Ok(Self { max_colors })
    }
}

/// Index buffer plus palette produced for one region.
///
/// `indices` is region-sized and row-major within the region. Nothing is
/// checked on construction; the engine calls [`validate`](Self::validate)
/// before using a result.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedResult<P> {
    indices: Buffer2D<u8>,
    palette: Vec<P>,
}

impl<P> QuantizedResult<P> {
    /// Wraps an index buffer and palette.
    pub fn new(indices: Buffer2D<u8>, palette: Vec<P>) -> Self {
        Self { indices, palette }
    }

    /// Region-relative palette indices.
    pub fn indices(&self) -> &Buffer2D<u8> {
        &self.indices
    }

    /// Palette colors.
    pub fn palette(&self) -> &[P] {
        &self.palette
    }

    /// Checks the palette length and that every index addresses the palette.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidPalette`] for an empty or oversized palette
    /// - [`OpsError::CorruptResult`] for the first out-of-range index
    pub fn validate(&self) -> OpsResult<()> {
        let len = self.palette.len();
        if len == 0 || len > MAX_PALETTE_LEN {
            return Err(OpsError::InvalidPalette { len });
        }
        if len == MAX_PALETTE_LEN {
            return Ok(());
        }
        for y in 0..self.indices.height() {
            if let Some(x) = self.indices.row(y).iter().position(|&i| i as usize >= len) {
                return Err(OpsError::CorruptResult {
                    index: self.indices.row(y)[x],
                    palette_len: len,
                    x: x as u32,
                    y,
                });
            }
        }
        Ok(())
    }
}

/// Per-call quantizer acquired from a [`Quantizer`].
pub trait FrameQuantizer<P: Pixel> {
    /// Quantizes `region` (already clipped to `source`) of `source`.
    fn quantize_region(
        &mut self,
        settings: &ExecutionSettings,
        source: &Buffer2D<P>,
        region: Rect,
    ) -> OpsResult<QuantizedResult<P>>;
}

/// Shared quantization strategy.
pub trait Quantizer<P: Pixel>: Send + Sync {
    /// Options this strategy was built with.
    fn options(&self) -> QuantizerOptions;

    /// Creates the frame quantizer for one call. It's dropped when the call ends.
    fn create_frame_quantizer(
        &self,
        settings: &ExecutionSettings,
    ) -> OpsResult<Box<dyn FrameQuantizer<P> + '_>>;
}

/// Quantizes `region` of `source` in place.
///
/// The region is clipped to the buffer; a region outside the buffer does
/// nothing. Pixels outside the region are never touched.
///
/// # Errors
///
/// The quantizer's own errors, [`OpsError::SizeMismatch`] if its index
/// buffer isn't region-sized, and the [`QuantizedResult::validate`] errors.
/// Validation happens before any pixel is written.
pub fn quantize<P: Pixel>(
    settings: &ExecutionSettings,
    quantizer: &dyn Quantizer<P>,
    source: &mut Buffer2D<P>,
    region: Rect,
) -> OpsResult<()> {
    let Some(region) = region.intersect(&source.bounds()) else {
        debug!(%region, "quantize region outside buffer, nothing to do");
        return Ok(());
    };

    let result = {
        let mut frame = quantizer.create_frame_quantizer(settings)?;
        frame.quantize_region(settings, source, region)?
    };

    if result.indices().dimensions() != (region.width, region.height) {
        return Err(OpsError::SizeMismatch(format!(
            "index buffer is {}x{}, region is {}x{}",
            result.indices().width(),
            result.indices().height(),
            region.width,
            region.height
        )));
    }
    result.validate()?;
    debug!(%region, colors = result.palette().len(), "applying palette");

    let indices = result.indices();
    let palette = result.palette();
    let span = columns(region);
    iterate_rows(settings, region.rows(), source, |_, mut rows| {
        for (y, row) in rows.iter_mut() {
            let ry = y - region.y;
            for (rx, (dst, &index)) in row[span.clone()]
                .iter_mut()
                .zip(indices.row(ry))
                .enumerate()
            {
                *dst = *palette.get(index as usize).ok_or(OpsError::CorruptResult {
                    index,
                    palette_len: palette.len(),
                    x: rx as u32,
                    y: ry,
                })?;
            }
        }
        Ok(())
    })
}

/// Owns a quantization strategy and applies it to buffers.
pub struct QuantizeProcessor<P: Pixel> {
    quantizer: Arc<dyn Quantizer<P>>,
}

impl<P: Pixel> QuantizeProcessor<P> {
    /// Creates a processor.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidArgument`] if no quantizer is given.
    pub fn new(quantizer: Option<Arc<dyn Quantizer<P>>>) -> OpsResult<Self> {
        let quantizer =
            quantizer.ok_or_else(|| OpsError::InvalidArgument("quantizer is required".into()))?;
        Ok(Self { quantizer })
    }

    /// The strategy in use.
    pub fn quantizer(&self) -> &dyn Quantizer<P> {
        self.quantizer.as_ref()
    }

    /// Quantizes `region` of `source` in place. See [`quantize`].
    pub fn apply(
        &self,
        settings: &ExecutionSettings,
        source: &mut Buffer2D<P>,
        region: Rect,
    ) -> OpsResult<()> {
        quantize(settings, self.quantizer.as_ref(), source, region)
    }
}

impl<P: Pixel> std::fmt::Debug for QuantizeProcessor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuantizeProcessor")
            .field("options", &self.quantizer.options())
            .finish()
    }
}

#[inline]
fn columns(region: Rect) -> Range<usize> {
    region.x as usize..region.right() as usize
}

/// Squared Euclidean distance in normalized RGBA.
#[inline]
fn distance_sq(a: [f32; 4], b: [f32; 4]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the palette color closest to `v`; ties go to the lowest index.
fn nearest_index(palette: &[[f32; 4]], v: [f32; 4]) -> u8 {
    let mut best = 0;
    let mut best_d = f32::INFINITY;
    for (i, c) in palette.iter().enumerate() {
        let d = distance_sq(*c, v);
        if d < best_d {
            best = i;
            best_d = d;
            if d == 0.0 {
                break;
            }
        }
    }
    best as u8
}

/// Maps every pixel of `region` to its nearest palette entry.
fn map_region<P: Pixel>(
    settings: &ExecutionSettings,
    source: &Buffer2D<P>,
    region: Rect,
    palette: &[[f32; 4]],
) -> OpsResult<Buffer2D<u8>> {
    let mut indices = settings
        .allocator()
        .allocate_2d::<u8>(region.width, region.height)?;
    let span = columns(region);
    iterate_rows(settings, 0..region.height, &mut indices, |_, mut rows| {
        for (ry, out) in rows.iter_mut() {
            let src = &source.row(region.y + ry)[span.clone()];
            let mut last: Option<(P, u8)> = None;
            for (o, &px) in out.iter_mut().zip(src) {
                *o = match last {
                    Some((p, i)) if p == px => i,
                    _ => {
                        let i = nearest_index(palette, px.to_vec4());
                        last = Some((px, i));
                        i
                    }
                };
            }
        }
        Ok(())
    })?;
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxl_core::Rgba8;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const R: Rgba8 = [255, 0, 0, 255];
    const G: Rgba8 = [0, 255, 0, 255];
    const B: Rgba8 = [0, 0, 255, 255];

    fn three_colors() -> Buffer2D<Rgba8> {
        Buffer2D::from_vec(
            4,
            4,
            vec![R, G, B, R, G, B, R, G, B, R, G, B, R, R, G, G],
        )
        .unwrap()
    }

    fn settings() -> ExecutionSettings {
        ExecutionSettings::default()
            .with_max_degree_of_parallelism(4)
            .with_min_pixels_per_task(1)
    }

    /// Returns a fixed result and counts dropped frame quantizers.
    struct Fixed {
        result: QuantizedResult<Rgba8>,
        dropped: Arc<AtomicUsize>,
    }

    struct FixedFrame<'a> {
        result: &'a QuantizedResult<Rgba8>,
        dropped: &'a AtomicUsize,
    }

    impl Drop for FixedFrame<'_> {
        fn drop(&mut self) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl FrameQuantizer<Rgba8> for FixedFrame<'_> {
        fn quantize_region(
            &mut self,
            _: &ExecutionSettings,
            _: &Buffer2D<Rgba8>,
            _: Rect,
        ) -> OpsResult<QuantizedResult<Rgba8>> {
            Ok(self.result.clone())
        }
    }

    impl Quantizer<Rgba8> for Fixed {
        fn options(&self) -> QuantizerOptions {
            QuantizerOptions::default()
        }

        fn create_frame_quantizer(
            &self,
            _: &ExecutionSettings,
        ) -> OpsResult<Box<dyn FrameQuantizer<Rgba8> + '_>> {
            Ok(Box::new(FixedFrame {
                result: &self.result,
                dropped: &self.dropped,
            }))
        }
    }

    #[test]
    fn test_options_bounds() {
        assert!(QuantizerOptions::new(0).is_err());
        assert!(QuantizerOptions::new(257).is_err());
        assert_eq!(QuantizerOptions::new(16).unwrap().max_colors, 16);
        assert_eq!(QuantizerOptions::default().max_colors, 256);
    }

    #[test]
    fn test_validate() {
        let idx = Buffer2D::from_vec(2, 1, vec![0u8, 1]).unwrap();
        assert!(QuantizedResult::new(idx.clone(), vec![R, G]).validate().is_ok());
        assert!(matches!(
            QuantizedResult::new(idx.clone(), vec![R]).validate(),
            Err(OpsError::CorruptResult { index: 1, palette_len: 1, x: 1, y: 0 })
        ));
        assert!(matches!(
            QuantizedResult::<Rgba8>::new(idx.clone(), vec![]).validate(),
            Err(OpsError::InvalidPalette { len: 0 })
        ));
        assert!(matches!(
            QuantizedResult::new(idx, vec![R; 257]).validate(),
            Err(OpsError::InvalidPalette { len: 257 })
        ));
    }

    #[test]
    fn test_round_trip_three_colors() {
        let original = three_colors();
        let mut img = original.clone();
        let quantizer = PaletteQuantizer::new(vec![R, G, B]).unwrap();
        quantize(&settings(), &quantizer, &mut img, original.bounds()).unwrap();
        assert_eq!(img, original);
    }

    #[test]
    fn test_region_only() {
        let mut img: Buffer2D<Rgba8> = Buffer2D::filled(6, 6, [200, 10, 10, 255]);
        let quantizer = PaletteQuantizer::new(vec![R, B]).unwrap();
        let region = Rect::new(1, 2, 3, 2);
        quantize(&settings(), &quantizer, &mut img, region).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                let expected = if region.contains(x, y) { R } else { [200, 10, 10, 255] };
                assert_eq!(img.get(x, y), Some(expected), "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_region_is_clipped() {
        let mut img: Buffer2D<Rgba8> = Buffer2D::filled(4, 4, [10, 10, 200, 255]);
        let quantizer = PaletteQuantizer::new(vec![R, B]).unwrap();
        quantize(&settings(), &quantizer, &mut img, Rect::new(2, 2, 10, 10)).unwrap();
        assert_eq!(img.get(3, 3), Some(B));
        assert_eq!(img.get(1, 1), Some([10, 10, 200, 255]));

        let before = img.clone();
        quantize(&settings(), &quantizer, &mut img, Rect::new(9, 9, 2, 2)).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_corrupt_result_rejected_before_writing() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let quantizer = Fixed {
            result: QuantizedResult::new(
                Buffer2D::from_vec(2, 2, vec![0u8, 1, 5, 0]).unwrap(),
                vec![R, G],
            ),
            dropped: dropped.clone(),
        };
        let original: Buffer2D<Rgba8> = Buffer2D::filled(2, 2, B);
        let mut img = original.clone();
        let err = quantize(&settings(), &quantizer, &mut img, original.bounds());
        assert!(matches!(
            err,
            Err(OpsError::CorruptResult { index: 5, palette_len: 2, x: 0, y: 1 })
        ));
        assert_eq!(img, original);
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrong_index_size_rejected() {
        let quantizer = Fixed {
            result: QuantizedResult::new(Buffer2D::new(1, 1), vec![R]),
            dropped: Arc::new(AtomicUsize::new(0)),
        };
        let mut img: Buffer2D<Rgba8> = Buffer2D::new(2, 2);
        let err = quantize(&settings(), &quantizer, &mut img, Rect::from_size(2, 2));
        assert!(matches!(err, Err(OpsError::SizeMismatch(_))));
    }

    #[test]
    fn test_processor_requires_quantizer() {
        let err = QuantizeProcessor::<Rgba8>::new(None).unwrap_err();
        assert!(matches!(err, OpsError::InvalidArgument(_)));
    }

    #[test]
    fn test_processor_applies() {
        let q: Arc<dyn Quantizer<Rgba8>> = Arc::new(MedianCutQuantizer::default());
        let processor = QuantizeProcessor::new(Some(q)).unwrap();
        let original = three_colors();
        let mut img = original.clone();
        processor.apply(&settings(), &mut img, original.bounds()).unwrap();
        assert_eq!(img, original);
    }

    #[test]
    fn test_nearest_index_ties_lowest() {
        let palette = [[0.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 1.0]];
        assert_eq!(nearest_index(&palette, [0.4, 0.0, 0.0, 1.0]), 0);
        assert_eq!(nearest_index(&palette, [0.6, 0.0, 0.0, 1.0]), 1);
        let tie = [[0.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0]];
        assert_eq!(nearest_index(&tie, [0.5, 0.0, 0.0, 1.0]), 0);
    }
}
