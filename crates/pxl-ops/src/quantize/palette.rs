//! Fixed-palette quantizer.

use super::{map_region, FrameQuantizer, QuantizedResult, Quantizer, QuantizerOptions};
use crate::{OpsError, OpsResult};
use pxl_core::{Buffer2D, ExecutionSettings, Pixel, Rect};
use tracing::trace;

/// Maps every pixel onto the nearest color of a caller-supplied palette.
///
/// Duplicate colors are dropped (first occurrence wins) and the palette is
/// truncated to `max_colors`.
#[derive(Debug, Clone)]
pub struct PaletteQuantizer<P> {
    palette: Vec<P>,
    options: QuantizerOptions,
}

impl<P: Pixel> PaletteQuantizer<P> {
    /// Quantizer over `palette` with default options.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidArgument`] if `palette` is empty.
    pub fn new(palette: Vec<P>) -> OpsResult<Self> {
        Self::with_options(palette, QuantizerOptions::default())
    }

    /// Quantizer over at most `options.max_colors` entries of `palette`.
    pub fn with_options(palette: Vec<P>, options: QuantizerOptions) -> OpsResult<Self> {
        let mut distinct: Vec<P> = Vec::with_capacity(palette.len().min(options.max_colors));
        for color in palette {
            if distinct.len() == options.max_colors {
                break;
            }
            if !distinct.contains(&color) {
                distinct.push(color);
            }
        }
        if distinct.is_empty() {
            return Err(OpsError::InvalidArgument("palette must not be empty".into()));
        }
        Ok(Self {
            palette: distinct,
            options,
        })
    }

    /// The palette in index order.
    pub fn palette(&self) -> &[P] {
        &self.palette
    }
}

struct PaletteFrame<'a, P> {
    palette: &'a [P],
    vectors: Vec<[f32; 4]>,
}

impl<P: Pixel> FrameQuantizer<P> for PaletteFrame<'_, P> {
    fn quantize_region(
        &mut self,
        settings: &ExecutionSettings,
        source: &Buffer2D<P>,
        region: Rect,
    ) -> OpsResult<QuantizedResult<P>> {
        trace!(%region, colors = self.palette.len(), "mapping onto fixed palette");
        let indices = map_region(settings, source, region, &self.vectors)?;
        Ok(QuantizedResult::new(indices, self.palette.to_vec()))
    }
}

impl<P: Pixel> Quantizer<P> for PaletteQuantizer<P> {
    fn options(&self) -> QuantizerOptions {
        self.options
    }

    fn create_frame_quantizer(
        &self,
        _settings: &ExecutionSettings,
    ) -> OpsResult<Box<dyn FrameQuantizer<P> + '_>> {
        Ok(Box::new(PaletteFrame {
            palette: &self.palette,
            vectors: self.palette.iter().map(|p| p.to_vec4()).collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxl_core::{Gray8, Rgba8};

    #[test]
    fn test_empty_palette_rejected() {
        assert!(matches!(
            PaletteQuantizer::<Rgba8>::new(vec![]),
            Err(OpsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_dedup_and_truncate() {
        let q = PaletteQuantizer::with_options(
            vec![[1u8], [1], [2], [3], [4]],
            QuantizerOptions::new(3).unwrap(),
        )
        .unwrap();
        assert_eq!(q.palette(), &[[1u8], [2], [3]]);
    }

    #[test]
    fn test_maps_to_nearest() {
        let q: PaletteQuantizer<Gray8> = PaletteQuantizer::new(vec![[0], [128], [255]]).unwrap();
        let src = Buffer2D::from_vec(4, 1, vec![[10u8], [100], [200], [250]]).unwrap();
        let settings = ExecutionSettings::single_threaded();
        let mut frame = q.create_frame_quantizer(&settings).unwrap();
        let result = frame.quantize_region(&settings, &src, src.bounds()).unwrap();
        assert_eq!(result.indices().as_slice(), &[0, 1, 2, 2]);
        assert_eq!(result.palette(), q.palette());
    }

    #[test]
    fn test_sub_region_indices() {
        let q: PaletteQuantizer<Gray8> = PaletteQuantizer::new(vec![[0], [255]]).unwrap();
        let src = Buffer2D::from_vec(3, 2, vec![[0u8], [0], [0], [0], [255], [255]]).unwrap();
        let settings = ExecutionSettings::single_threaded();
        let mut frame = q.create_frame_quantizer(&settings).unwrap();
        let result = frame.quantize_region(&settings, &src, Rect::new(1, 1, 2, 1)).unwrap();
        assert_eq!(result.indices().dimensions(), (2, 1));
        assert_eq!(result.indices().as_slice(), &[1, 1]);
    }
}
