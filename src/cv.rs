//! OpenCV-backed mask, outline and geometry primitives.
//!
//! Drop-in replacements for the pure-Rust stages. Note that `bounding_rect`
//! counts pixels inclusively, so its widths are one larger than
//! [`PolygonGeometry`](crate::geometry::PolygonGeometry) reports and never zero
//! for a non-empty outline.

use image::{GrayImage, RgbImage};
use opencv::{
    core::{self, Mat, Point as CvPoint, Scalar, Size, Vector, BORDER_CONSTANT, BORDER_DEFAULT, BORDER_REPLICATE},
    imgproc::{
        self, arc_length, bounding_rect, contour_area, find_contours, CHAIN_APPROX_NONE, COLOR_RGB2HSV,
        MORPH_RECT, RETR_LIST,
    },
    prelude::*,
};

use crate::config::MaskConfig;
use crate::geometry::{BoundingBox, GeometryBackend, Moments, Outline, Point};
use crate::mask::MaskSource;
use crate::outline::{ensure_binary, OutlineExtractor};
use crate::{Error, Result};

impl From<opencv::Error> for Error {
    fn from(e: opencv::Error) -> Self {
        Error::OpenCv(e.to_string())
    }
}

fn to_cv_points(outline: &Outline) -> Vector<CvPoint> {
    outline.points().iter().map(|p| CvPoint::new(p.x, p.y)).collect()
}

fn gray_to_mat(image: &GrayImage) -> Result<Mat> {
    let mat = Mat::from_slice_rows_cols(image.as_raw(), image.height() as usize, image.width() as usize)?;
    Ok(mat.try_clone()?)
}

fn mat_to_gray(mat: &Mat) -> Result<GrayImage> {
    let (cols, rows) = (mat.cols() as u32, mat.rows() as u32);
    let bytes = mat.data_bytes()?.to_vec();
    GrayImage::from_raw(cols, rows, bytes)
        .ok_or_else(|| Error::InvalidMask(format!("{cols}x{rows} mat is not single-channel 8-bit")))
}

/// `imgproc` polygon measurements.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvGeometry;

impl GeometryBackend for OpenCvGeometry {
    fn area(&self, outline: &Outline) -> Result<f64> {
        if outline.len() < 3 {
            return Ok(0.0);
        }
        Ok(contour_area(&to_cv_points(outline), false)?)
    }

    fn perimeter(&self, outline: &Outline) -> Result<f64> {
        if outline.is_empty() {
            return Ok(0.0);
        }
        Ok(arc_length(&to_cv_points(outline), true)?)
    }

    fn bounding_box(&self, outline: &Outline) -> Result<BoundingBox> {
        if outline.is_empty() {
            return Ok(BoundingBox::default());
        }
        let rect = bounding_rect(&to_cv_points(outline))?;
        Ok(BoundingBox {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        })
    }

    fn moments(&self, outline: &Outline) -> Result<Moments> {
        if outline.len() < 3 {
            return Ok(Moments::default());
        }
        let m = imgproc::moments(&to_cv_points(outline), false)?;
        Ok(Moments {
            m00: m.m00,
            m10: m.m10,
            m01: m.m01,
            m20: m.m20,
            m11: m.m11,
            m02: m.m02,
            mu20: m.mu20,
            mu11: m.mu11,
            mu02: m.mu02,
            nu20: m.nu20,
            nu11: m.nu11,
            nu02: m.nu02,
        })
    }
}

/// `find_contours` with every contour listed and no point compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvOutlines;

impl OpenCvOutlines {
    pub fn extract_mat(&self, mask: &Mat) -> Result<Vec<Outline>> {
        let mut contours = Vector::<Vector<CvPoint>>::new();
        find_contours(mask, &mut contours, RETR_LIST, CHAIN_APPROX_NONE, CvPoint::new(0, 0))?;
        Ok(contours
            .iter()
            .map(|c| Outline::new(c.iter().map(|p| Point::new(p.x, p.y)).collect()))
            .collect())
    }
}

impl OutlineExtractor for OpenCvOutlines {
    fn extract(&self, mask: &GrayImage) -> Result<Vec<Outline>> {
        ensure_binary(mask)?;
        self.extract_mat(&gray_to_mat(mask)?)
    }
}

/// The mask stages run through `imgproc`.
#[derive(Debug, Clone)]
pub struct OpenCvMask {
    config: MaskConfig,
}

impl OpenCvMask {
    pub fn new(config: MaskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Edge mask from an 8-bit, 3-channel RGB mat.
    pub fn generate_mat(&self, rgb: &Mat) -> Result<Mat> {
        let c = &self.config;

        let mut hsv = Mat::default();
        imgproc::cvt_color(rgb, &mut hsv, COLOR_RGB2HSV, 0)?;

        let mut blurred = Mat::default();
        let sigma = f64::from(c.blur_sigma);
        imgproc::gaussian_blur(&hsv, &mut blurred, Size::new(5, 5), sigma, sigma, BORDER_REPLICATE)?;

        let mut mask = Mat::default();
        core::in_range(
            &blurred,
            &Scalar::new(f64::from(c.hue[0]), 0.0, f64::from(c.value[0]), 0.0),
            &Scalar::new(f64::from(c.hue[1]), 255.0, f64::from(c.value[1]), 0.0),
            &mut mask,
        )?;

        let erode_size = c.erode_size as i32;
        let kernel = imgproc::get_structuring_element(
            MORPH_RECT,
            Size::new(erode_size, erode_size),
            CvPoint::new(-1, -1),
        )?;
        let mut eroded = Mat::default();
        imgproc::erode(
            &mask,
            &mut eroded,
            &kernel,
            CvPoint::new(-1, -1),
            1,
            BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        let edge_blur = c.edge_blur_size as i32;
        let mut smoothed = Mat::default();
        imgproc::blur(
            &eroded,
            &mut smoothed,
            Size::new(edge_blur, edge_blur),
            CvPoint::new(-1, -1),
            BORDER_DEFAULT,
        )?;

        let mut edges = Mat::default();
        imgproc::canny(
            &smoothed,
            &mut edges,
            f64::from(c.canny_low),
            f64::from(c.canny_high()),
            3,
            false,
        )?;
        Ok(edges)
    }
}

impl MaskSource for OpenCvMask {
    fn generate(&self, frame: &RgbImage) -> Result<GrayImage> {
        let (rows, cols) = (frame.height() as usize, frame.width() as usize);
        let flat = Mat::from_slice_rows_cols(frame.as_raw(), rows, cols * 3)?;
        let rgb = flat.reshape(3, rows as i32)?.try_clone()?;
        let edges = self.generate_mat(&rgb)?;
        mat_to_gray(&edges)
    }
}
