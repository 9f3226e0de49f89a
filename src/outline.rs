//! Outline extraction from a binary edge mask.

use image::GrayImage;
use imageproc::contours::{find_contours, Contour};

use crate::geometry::{Outline, Point};
use crate::{Error, Result};

/// Turns a binary mask (0 = background, 255 = foreground) into candidate
/// outlines, each an ordered boundary.
pub trait OutlineExtractor {
    fn extract(&self, mask: &GrayImage) -> Result<Vec<Outline>>;
}

impl<T: OutlineExtractor + ?Sized> OutlineExtractor for &T {
    fn extract(&self, mask: &GrayImage) -> Result<Vec<Outline>> {
        (**self).extract(mask)
    }
}

/// Suzuki-Abe border following via `imageproc`. Every border is returned,
/// outer and hole alike, with every boundary pixel kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderFollowing;

impl OutlineExtractor for BorderFollowing {
    fn extract(&self, mask: &GrayImage) -> Result<Vec<Outline>> {
        ensure_binary(mask)?;
        let contours: Vec<Contour<i32>> = find_contours(mask);
        Ok(contours
            .into_iter()
            .map(|c| Outline::new(c.points.into_iter().map(|p| Point::new(p.x, p.y)).collect()))
            .collect())
    }
}

/// Reject masks that carry anything other than 0 and 255.
pub fn ensure_binary(mask: &GrayImage) -> Result<()> {
    if let Some((x, y, px)) = mask
        .enumerate_pixels()
        .find(|(_, _, px)| px[0] != 0 && px[0] != 255)
    {
        return Err(Error::InvalidMask(format!("pixel ({x}, {y}) has value {}", px[0])));
    }
    Ok(())
}
