//! Corner-sampled background removal
//!
//! The background color is estimated from four square patches in the image
//! corners. Every pixel close to that color loses its alpha, pixels in a
//! narrow band just beyond the threshold get a linear alpha ramp, and all
//! other pixels are left exactly as they were. RGB channels are never
//! written.

use crate::config::RemovalConfig;
use crate::types::AlphaStatistics;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Estimated background color (mean of the four corner patch means)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl BackgroundColor {
    #[must_use]
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance between this color and a pixel's RGB channels
    #[must_use]
    pub fn distance_to(&self, pixel: &Rgba<u8>) -> f64 {
        let dr = f64::from(pixel[0]) - self.r;
        let dg = f64::from(pixel[1]) - self.g;
        let db = f64::from(pixel[2]) - self.b;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl std::fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({:.1}, {:.1}, {:.1})", self.r, self.g, self.b)
    }
}

/// Classification parameters for a single transform run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemovalParams {
    pub sample_size: u32,
    pub threshold: f64,
    pub feather: f64,
}

impl Default for RemovalParams {
    fn default() -> Self {
        Self::from(&RemovalConfig::default())
    }
}

impl From<&RemovalConfig> for RemovalParams {
    fn from(config: &RemovalConfig) -> Self {
        Self {
            sample_size: config.sample_size,
            threshold: config.threshold,
            feather: config.feather,
        }
    }
}

/// Output of [`remove_uniform_background`]
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Copy of the input with alpha rewritten
    pub image: RgbaImage,
    /// Background estimate, `None` for a zero-area image
    pub background: Option<BackgroundColor>,
    pub statistics: AlphaStatistics,
}

/// Estimate the background color from the four corner patches
///
/// Patches are clamped to the image, so an image narrower or shorter than
/// `sample_size` samples overlapping patches instead of reading out of
/// bounds. Returns `None` when the image has no pixels.
#[must_use]
pub fn estimate_background(image: &RgbaImage, sample_size: u32) -> Option<BackgroundColor> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let patch_w = sample_size.clamp(1, width);
    let patch_h = sample_size.clamp(1, height);
    let right = width - patch_w;
    let bottom = height - patch_h;

    let corners = [
        corner_average(image, 0, 0, patch_w, patch_h),
        corner_average(image, right, 0, patch_w, patch_h),
        corner_average(image, 0, bottom, patch_w, patch_h),
        corner_average(image, right, bottom, patch_w, patch_h),
    ];

    let mut sum = [0.0_f64; 3];
    for corner in &corners {
        sum[0] += corner[0];
        sum[1] += corner[1];
        sum[2] += corner[2];
    }

    Some(BackgroundColor::new(sum[0] / 4.0, sum[1] / 4.0, sum[2] / 4.0))
}

fn corner_average(image: &RgbaImage, x0: u32, y0: u32, w: u32, h: u32) -> [f64; 3] {
    let mut totals = [0.0_f64; 3];
    let mut count = 0_u64;

    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let pixel = image.get_pixel(x, y);
            totals[0] += f64::from(pixel[0]);
            totals[1] += f64::from(pixel[1]);
            totals[2] += f64::from(pixel[2]);
            count += 1;
        }
    }

    let count = count.max(1) as f64;
    [totals[0] / count, totals[1] / count, totals[2] / count]
}

/// Alpha assigned to a pixel at `distance` from the background
///
/// Returns `None` when the pixel lies beyond the feather band and keeps
/// its original alpha.
#[must_use]
pub fn alpha_for_distance(distance: f64, threshold: f64, feather: f64) -> Option<u8> {
    if distance <= threshold {
        return Some(0);
    }
    if distance <= threshold + feather {
        let t = (distance - threshold) / feather;
        let alpha = (255.0 * t).round().clamp(0.0, 255.0);
        return Some(alpha as u8);
    }
    None
}

/// Rewrite alpha against an already estimated background
///
/// Returns a new image with identical dimensions and RGB channels plus the
/// per-class pixel counts.
#[must_use]
pub fn apply_background_alpha(
    image: &RgbaImage,
    background: &BackgroundColor,
    threshold: f64,
    feather: f64,
) -> (RgbaImage, AlphaStatistics) {
    let mut output = image.clone();
    let mut statistics = AlphaStatistics::empty(u64::from(image.width()) * u64::from(image.height()));

    for pixel in output.pixels_mut() {
        let distance = background.distance_to(pixel);
        match alpha_for_distance(distance, threshold, feather) {
            Some(0) => {
                pixel[3] = 0;
                statistics.transparent_pixels += 1;
            },
            Some(alpha) => {
                pixel[3] = alpha;
                statistics.feathered_pixels += 1;
            },
            None => statistics.untouched_pixels += 1,
        }
    }

    (output, statistics)
}

/// Make a near-uniform background transparent
///
/// The input is not modified. A zero-area image comes back unchanged with
/// no background estimate.
#[must_use]
pub fn remove_uniform_background(image: &RgbaImage, params: &RemovalParams) -> TransformOutput {
    let Some(background) = estimate_background(image, params.sample_size) else {
        return TransformOutput {
            image: image.clone(),
            background: None,
            statistics: AlphaStatistics::empty(0),
        };
    };

    let (output, statistics) =
        apply_background_alpha(image, &background, params.threshold, params.feather);

    TransformOutput {
        image: output,
        background: Some(background),
        statistics,
    }
}
