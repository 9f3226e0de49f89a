//! One frame end to end: mask, outlines, selection.

use image::{GrayImage, RgbImage};
use log::{debug, info};
use serde::Serialize;

use crate::config::{Config, ScorerConfig};
use crate::geometry::{GeometryBackend, PolygonGeometry};
use crate::mask::{MaskGenerator, MaskSource};
use crate::outline::{BorderFollowing, OutlineExtractor};
use crate::selector::{CandidateSelector, Ranking, ScoredCandidate};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
    pub candidate: ScoredCandidate,
    /// Outlines found in the mask.
    pub outline_count: usize,
    /// Outlines excluded by the area gate or for degenerate bounds.
    pub rejected: usize,
}

impl FrameResult {
    pub fn found(&self) -> bool {
        !self.candidate.is_none()
    }
}

pub struct FramePipeline<M = MaskGenerator, E = BorderFollowing, G = PolygonGeometry> {
    mask: M,
    extractor: E,
    selector: CandidateSelector<G>,
}

impl FramePipeline {
    pub fn new(config: Config) -> Result<Self> {
        let mask = MaskGenerator::new(config.mask)?;
        Self::with_parts(config.scorer, mask, BorderFollowing, PolygonGeometry)
    }
}

impl<M: MaskSource, E: OutlineExtractor, G: GeometryBackend> FramePipeline<M, E, G> {
    pub fn with_parts(scorer: ScorerConfig, mask: M, extractor: E, geometry: G) -> Result<Self> {
        scorer.validate()?;
        Ok(Self {
            mask,
            extractor,
            selector: CandidateSelector::with_geometry(scorer, geometry),
        })
    }

    pub fn selector(&self) -> &CandidateSelector<G> {
        &self.selector
    }

    pub fn edge_mask(&self, frame: &RgbImage) -> Result<GrayImage> {
        self.mask.generate(frame)
    }

    pub fn process(&self, frame: &RgbImage) -> Result<FrameResult> {
        let mask = self.mask.generate(frame)?;
        self.process_mask(&mask)
    }

    /// Rank every outline in an edge mask produced elsewhere.
    pub fn rank_mask(&self, mask: &GrayImage) -> Result<Ranking> {
        let outlines = self.extractor.extract(mask)?;
        if self.selector.config().verbose {
            info!("found {} outlines", outlines.len());
        }
        self.selector.rank(outlines)
    }

    /// Score a frame whose edge mask was produced elsewhere.
    pub fn process_mask(&self, mask: &GrayImage) -> Result<FrameResult> {
        let ranking = self.rank_mask(mask)?;
        let outline_count = ranking.total();
        let rejected = ranking.rejected;
        let candidate = ranking.into_winner();
        debug!(
            "frame: {} outlines, {} rejected, best score {:.4}",
            outline_count, rejected, candidate.score
        );

        Ok(FrameResult {
            candidate,
            outline_count,
            rejected,
        })
    }
}
