//! goalfinder — picks the outline in a frame's edge mask that best matches a
//! target shape, scored purely from geometry.
//!
//! Per frame:
//!
//! 1. **Mask** – HSV band filter, erosion, blur and Canny ([`mask`]).
//! 2. **Outlines** – border following over the mask ([`outline`]).
//! 3. **Features** – area, perimeter, bounding box, moments ([`features`]).
//! 4. **Selection** – area gate, four sub-scores, stable ranking ([`selector`]).
//!
//! Stages 1 and 2 are replaceable through [`mask::MaskSource`] and
//! [`outline::OutlineExtractor`]; geometry goes through
//! [`geometry::GeometryBackend`]. The `opencv` feature provides OpenCV-backed
//! versions of all three in [`cv`].

pub mod config;
#[cfg(feature = "opencv")]
pub mod cv;
pub mod error;
pub mod features;
pub mod geometry;
pub mod logging;
pub mod mask;
pub mod outline;
pub mod pipeline;
pub mod score;
pub mod selector;

pub use config::{Config, MaskConfig, ScorerConfig};
pub use error::{Error, Result};
pub use features::GeometricFeatures;
pub use geometry::{BoundingBox, GeometryBackend, Outline, Point, PolygonGeometry};
pub use pipeline::{FramePipeline, FrameResult};
pub use selector::{CandidateSelector, ScoredCandidate};
