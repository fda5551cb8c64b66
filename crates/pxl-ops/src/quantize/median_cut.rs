//! Median-cut palette construction.
//!
//! 1. Build an exact histogram of the region, keyed by the 8-bit RGBA value
//!    of each pixel (higher precision formats share a bucket per 8-bit key).
//! 2. If there are no more distinct keys than `max_colors`, the palette is
//!    the first pixel seen for each key, in key order.
//! 3. Otherwise repeatedly split the box with the largest
//!    `weight * widest channel range` at its weighted median along that
//!    channel, until there are `max_colors` boxes or nothing splits.
//! 4. Each box contributes its weighted mean color; duplicates are dropped.
//!
//! Pixels are then mapped to their nearest palette entry.

use super::{map_region, FrameQuantizer, QuantizedResult, Quantizer, QuantizerOptions};
use crate::OpsResult;
use pxl_core::{Buffer2D, ExecutionSettings, Pixel, Rect};
use std::collections::BTreeMap;
use tracing::debug;

/// Builds an adaptive palette of up to `max_colors` colors per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MedianCutQuantizer {
    options: QuantizerOptions,
}

impl MedianCutQuantizer {
    /// Quantizer with the given options.
    pub fn new(options: QuantizerOptions) -> Self {
        Self { options }
    }
}

impl<P: Pixel> Quantizer<P> for MedianCutQuantizer {
    fn options(&self) -> QuantizerOptions {
        self.options
    }

    fn create_frame_quantizer(
        &self,
        _settings: &ExecutionSettings,
    ) -> OpsResult<Box<dyn FrameQuantizer<P> + '_>> {
        Ok(Box::new(MedianCutFrame {
            max_colors: self.options.max_colors,
        }))
    }
}

struct MedianCutFrame {
    max_colors: usize,
}

impl<P: Pixel> FrameQuantizer<P> for MedianCutFrame {
    fn quantize_region(
        &mut self,
        settings: &ExecutionSettings,
        source: &Buffer2D<P>,
        region: Rect,
    ) -> OpsResult<QuantizedResult<P>> {
        let histogram = histogram(source, region);
        let distinct = histogram.len();
        let palette = median_cut(histogram, self.max_colors);
        debug!(%region, distinct, colors = palette.len(), "median cut palette");

        let vectors: Vec<[f32; 4]> = palette.iter().map(|p| p.to_vec4()).collect();
        let indices = map_region(settings, source, region, &vectors)?;
        Ok(QuantizedResult::new(indices, palette))
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry<P> {
    pixel: P,
    color: [f32; 4],
    weight: f32,
}

fn key(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn histogram<P: Pixel>(source: &Buffer2D<P>, region: Rect) -> Vec<Entry<P>> {
    let mut buckets: BTreeMap<[u8; 4], Entry<P>> = BTreeMap::new();
    for y in region.rows() {
        let row = &source.row(y)[region.x as usize..region.right() as usize];
        for &pixel in row {
            let color = pixel.to_vec4();
            buckets
                .entry(key(color))
                .and_modify(|e| e.weight += 1.0)
                .or_insert(Entry {
                    pixel,
                    color,
                    weight: 1.0,
                });
        }
    }
    buckets.into_values().collect()
}

struct ColorBox<P> {
    entries: Vec<Entry<P>>,
}

impl<P: Pixel> ColorBox<P> {
    fn total_weight(&self) -> f32 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Per-channel `max - min`.
    fn ranges(&self) -> [f32; 4] {
        let mut lo = [f32::INFINITY; 4];
        let mut hi = [f32::NEG_INFINITY; 4];
        for e in &self.entries {
            for c in 0..4 {
                lo[c] = lo[c].min(e.color[c]);
                hi[c] = hi[c].max(e.color[c]);
            }
        }
        [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2], hi[3] - lo[3]]
    }

    fn widest_channel(&self) -> (usize, f32) {
        self.ranges()
            .into_iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (c, r)| if r > best.1 { (c, r) } else { best })
    }

    fn priority(&self) -> f32 {
        self.total_weight() * self.widest_channel().1
    }

    fn splittable(&self) -> bool {
        self.entries.len() >= 2 && self.widest_channel().1 > 0.0
    }

    fn split(mut self) -> (ColorBox<P>, ColorBox<P>) {
        let (channel, _) = self.widest_channel();
        self.entries
            .sort_by(|a, b| a.color[channel].total_cmp(&b.color[channel]));

        let half = self.total_weight() / 2.0;
        let mut accumulated = 0.0f32;
        let mut at = 1;
        for (i, e) in self.entries.iter().enumerate() {
            accumulated += e.weight;
            if accumulated >= half && i + 1 < self.entries.len() {
                at = i + 1;
                break;
            }
        }
        let at = at.clamp(1, self.entries.len() - 1);
        let right = self.entries.split_off(at);
        (self, ColorBox { entries: right })
    }

    fn color(&self) -> P {
        if let [only] = self.entries.as_slice() {
            return only.pixel;
        }
        let mut sum = [0.0f32; 4];
        let mut weight = 0.0f32;
        for e in &self.entries {
            for c in 0..4 {
                sum[c] += e.color[c] * e.weight;
            }
            weight += e.weight;
        }
        P::from_vec4(sum.map(|s| s / weight.max(f32::MIN_POSITIVE)))
    }
}

fn median_cut<P: Pixel>(histogram: Vec<Entry<P>>, max_colors: usize) -> Vec<P> {
    if histogram.len() <= max_colors {
        return histogram.into_iter().map(|e| e.pixel).collect();
    }

    let mut boxes = Vec::with_capacity(max_colors);
    boxes.push(ColorBox { entries: histogram });
    while boxes.len() < max_colors {
        let best = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.splittable())
            .max_by(|(_, a), (_, b)| a.priority().total_cmp(&b.priority()))
            .map(|(i, _)| i);
        let Some(idx) = best else {
            break;
        };
        let (left, right) = boxes.swap_remove(idx).split();
        boxes.push(left);
        boxes.push(right);
    }

    let mut palette: Vec<P> = Vec::with_capacity(boxes.len());
    for color in boxes.iter().map(ColorBox::color) {
        if !palette.contains(&color) {
            palette.push(color);
        }
    }
    palette
}
