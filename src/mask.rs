//! Frame to binary edge mask: color filter, erosion, blur, Canny.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{box_filter, gaussian_blur_f32};
use imageproc::morphology::erode;
use log::trace;

use crate::config::MaskConfig;
use crate::Result;

/// Anything that turns a color frame into a 0/255 edge mask.
pub trait MaskSource {
    fn generate(&self, frame: &RgbImage) -> Result<GrayImage>;
}

/// Builds the edge mask the outline extractor consumes. Configuration is fixed
/// at construction.
#[derive(Debug, Clone)]
pub struct MaskGenerator {
    config: MaskConfig,
}

impl MaskGenerator {
    pub fn new(config: MaskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Hue/value band filter; saturation is unconstrained.
    pub fn in_range(&self, hsv: &RgbImage) -> GrayImage {
        let [h_lo, h_hi] = self.config.hue;
        let [v_lo, v_hi] = self.config.value;
        GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
            let Rgb([h, _, v]) = *hsv.get_pixel(x, y);
            if (h_lo..=h_hi).contains(&h) && (v_lo..=v_hi).contains(&v) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

impl MaskSource for MaskGenerator {
    fn generate(&self, frame: &RgbImage) -> Result<GrayImage> {
        let hsv = to_hsv(frame);
        let hsv = gaussian_blur_f32(&hsv, self.config.blur_sigma);
        let mask = self.in_range(&hsv);

        let mask = erode(&mask, Norm::LInf, radius(self.config.erode_size));
        let r = u32::from(radius(self.config.edge_blur_size));
        let blurred = box_filter(&mask, r, r);

        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high());
        trace!(
            "edge mask {}x{}: {} edge pixels",
            edges.width(),
            edges.height(),
            edges.pixels().filter(|p| p[0] != 0).count()
        );
        Ok(edges)
    }
}

fn radius(size: u32) -> u8 {
    u8::try_from(size / 2).unwrap_or(u8::MAX)
}

/// Convert every pixel with [`rgb_to_hsv`]. Channels are stored as H, S, V.
pub fn to_hsv(frame: &RgbImage) -> RgbImage {
    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        Rgb(rgb_to_hsv(frame.get_pixel(x, y).0))
    })
}

/// 8-bit HSV with hue halved into `0..=180`.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [(h / 2.0).round() as u8, s.round() as u8, v as u8]
}
