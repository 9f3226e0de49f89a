//! Ranking of one frame's outlines and choice of the most target-like one.

use log::{debug, info, trace};
use serde::Serialize;

use crate::config::ScorerConfig;
use crate::features::GeometricFeatures;
use crate::geometry::{GeometryBackend, Outline, PolygonGeometry};
use crate::score::{angle_score, target_distance_score, SubScores};
use crate::Result;

/// An outline with its composite score. The frame's winner, or
/// [`ScoredCandidate::none`] when nothing qualified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub score: f64,
    pub outline: Outline,
}

impl ScoredCandidate {
    /// Canonical "no target in this frame" result.
    pub fn none() -> Self {
        Self {
            score: 0.0,
            outline: Outline::empty(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.outline.is_empty()
    }
}

/// Full scoring breakdown for one qualifying outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    /// Position of the outline in the frame's input order.
    pub index: usize,
    pub features: GeometricFeatures,
    pub scores: SubScores,
    pub composite: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RejectReason {
    BelowAreaThreshold { area: f64 },
    /// Zero-width or zero-height bounding box; its ratios are undefined.
    DegenerateBounds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Rejected(RejectReason),
    Scored(CandidateReport),
}

/// Every qualifying outline of a frame, in ascending score order.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    /// Stable ascending by composite score; equal scores keep input order.
    pub candidates: Vec<(CandidateReport, Outline)>,
    pub rejected: usize,
}

impl Ranking {
    pub fn total(&self) -> usize {
        self.candidates.len() + self.rejected
    }

    /// Highest score; among equal scores the one seen last in the input.
    pub fn best(&self) -> Option<&(CandidateReport, Outline)> {
        self.candidates.last()
    }

    pub fn into_winner(mut self) -> ScoredCandidate {
        match self.candidates.pop() {
            Some((report, outline)) => ScoredCandidate {
                score: report.composite,
                outline,
            },
            None => ScoredCandidate::none(),
        }
    }
}

/// Scores outlines against the configured targets.
///
/// Holds no per-frame state; one selector can serve any number of frames.
#[derive(Debug, Clone)]
pub struct CandidateSelector<G = PolygonGeometry> {
    config: ScorerConfig,
    geometry: G,
}

impl CandidateSelector<PolygonGeometry> {
    pub fn new(config: ScorerConfig) -> Self {
        Self::with_geometry(config, PolygonGeometry)
    }
}

impl<G: GeometryBackend> CandidateSelector<G> {
    pub fn with_geometry(config: ScorerConfig, geometry: G) -> Self {
        Self { config, geometry }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Gate one outline on area, then score whatever survives.
    pub fn evaluate(&self, index: usize, outline: &Outline) -> Result<Evaluation> {
        let area = self.geometry.area(outline)?;
        if !(area >= self.config.area_threshold_min) {
            trace!("outline {index}: area {area} below threshold");
            return Ok(Evaluation::Rejected(RejectReason::BelowAreaThreshold { area }));
        }

        let features = GeometricFeatures::extract_with_area(&self.geometry, outline, area)?;
        let (Some(coverage_ratio), Some(aspect_ratio)) = (features.coverage_ratio, features.aspect_ratio) else {
            debug!("outline {index}: degenerate bounds {:?}", features.bounding_box);
            return Ok(Evaluation::Rejected(RejectReason::DegenerateBounds));
        };

        let scores = SubScores {
            coverage: target_distance_score(self.config.coverage_ratio_target, coverage_ratio),
            aspect: target_distance_score(self.config.aspect_ratio_target, aspect_ratio),
            moment: target_distance_score(self.config.moment_target, features.nu02),
            angle: angle_score(features.orientation_degrees),
        };

        Ok(Evaluation::Scored(CandidateReport {
            index,
            features,
            scores,
            composite: scores.composite(),
        }))
    }

    /// Score every outline of a frame and order the survivors.
    pub fn rank<I>(&self, outlines: I) -> Result<Ranking>
    where
        I: IntoIterator<Item = Outline>,
    {
        let mut ranking = Ranking::default();
        for (index, outline) in outlines.into_iter().enumerate() {
            match self.evaluate(index, &outline)? {
                Evaluation::Rejected(_) => ranking.rejected += 1,
                Evaluation::Scored(report) => {
                    if self.config.verbose {
                        log_report(&report);
                    }
                    ranking.candidates.push((report, outline));
                }
            }
        }

        // sort_by is stable, so the last of several equal scores wins.
        ranking
            .candidates
            .sort_by(|(a, _), (b, _)| a.composite.total_cmp(&b.composite));

        if self.config.verbose {
            info!(
                "{} outlines, {} scored, {} rejected",
                ranking.total(),
                ranking.candidates.len(),
                ranking.rejected
            );
        }
        Ok(ranking)
    }

    /// The best-scoring outline of a frame, or [`ScoredCandidate::none`].
    pub fn select<I>(&self, outlines: I) -> Result<ScoredCandidate>
    where
        I: IntoIterator<Item = Outline>,
    {
        Ok(self.rank(outlines)?.into_winner())
    }
}

fn log_report(report: &CandidateReport) {
    let f = &report.features;
    let s = &report.scores;
    info!(
        "outline {}: area {:.1} perimeter {:.1} coverage {:.4} aspect {:.4} nu02 {:.4} orientation {:.2}",
        report.index,
        f.area,
        f.perimeter,
        f.coverage_ratio.unwrap_or_default(),
        f.aspect_ratio.unwrap_or_default(),
        f.nu02,
        f.orientation_degrees
    );
    info!(
        "outline {}: scores coverage {:.4} aspect {:.4} moment {:.4} angle {:.2} total {:.4}",
        report.index, s.coverage, s.aspect, s.moment, s.angle, report.composite
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Outline {
        vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h)].into()
    }

    /// Upright U: 200x120 box, covers a third of it.
    fn goal(x: i32, y: i32) -> Outline {
        vec![
            (x, y),
            (x + 20, y),
            (x + 20, y + 100),
            (x + 180, y + 100),
            (x + 180, y),
            (x + 200, y),
            (x + 200, y + 120),
            (x, y + 120),
        ]
        .into()
    }

    #[test]
    fn empty_frame_yields_none() {
        let selector = CandidateSelector::new(ScorerConfig::default());
        let result = selector.select(Vec::<Outline>::new()).unwrap();
        assert_eq!(result, ScoredCandidate::none());
        assert_eq!(result.score, 0.0);
        assert!(result.is_none());
    }

    #[test]
    fn small_outlines_never_score() {
        let selector = CandidateSelector::new(ScorerConfig::default());
        let outlines = vec![rect(0, 0, 10, 10), rect(50, 50, 30, 30), Outline::empty()];
        let ranking = selector.rank(outlines.clone()).unwrap();
        assert_eq!(ranking.rejected, 3);
        assert!(ranking.candidates.is_empty());
        assert_eq!(selector.select(outlines).unwrap(), ScoredCandidate::none());
    }

    #[test]
    fn area_exactly_at_threshold_survives() {
        let config = ScorerConfig {
            area_threshold_min: 1000.0,
            ..ScorerConfig::default()
        };
        let selector = CandidateSelector::new(config);
        let ranking = selector.rank(vec![rect(0, 0, 25, 40), rect(0, 0, 25, 39)]).unwrap();
        assert_eq!(ranking.candidates.len(), 1);
        assert_eq!(ranking.candidates[0].0.index, 0);
        assert_eq!(ranking.rejected, 1);
    }

    #[test]
    fn goal_shape_beats_square() {
        let selector = CandidateSelector::new(ScorerConfig::default());
        let winner = selector.select(vec![goal(300, 40), rect(0, 0, 100, 100)]).unwrap();
        assert_eq!(winner.outline, goal(300, 40));

        let winner = selector.select(vec![rect(0, 0, 100, 100), goal(300, 40)]).unwrap();
        assert_eq!(winner.outline, goal(300, 40));
    }

    #[test]
    fn goal_shape_sub_scores() {
        let selector = CandidateSelector::new(ScorerConfig::default());
        let Evaluation::Scored(report) = selector.evaluate(0, &goal(0, 0)).unwrap() else {
            panic!("goal outline should qualify");
        };
        assert_relative_eq!(report.features.coverage_ratio.unwrap(), 1.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(report.scores.coverage, 1.0, max_relative = 1e-12);
        assert_relative_eq!(report.scores.aspect, 1.0, max_relative = 1e-12);
        assert_relative_eq!(report.scores.angle, 100.0, epsilon = 1e-6);
        assert_relative_eq!(report.features.nu02, 1.0 / 6.0, max_relative = 1e-9);
        assert_relative_eq!(report.composite, report.scores.composite());
    }

    #[test]
    fn equal_scores_prefer_later_outline() {
        let selector = CandidateSelector::new(ScorerConfig::default());
        let target = rect(0, 0, 200, 120);
        let ranking = selector
            .rank(vec![target.clone(), target.clone(), rect(0, 0, 100, 100)])
            .unwrap();
        let best = &ranking.best().unwrap().0;
        assert_eq!(best.index, 1);
        assert_eq!(ranking.candidates[1].0.index, 0);
        assert_eq!(ranking.candidates[1].0.composite, best.composite);
    }

    #[test]
    fn zero_height_outline_is_excluded_without_fault() {
        let config = ScorerConfig {
            area_threshold_min: 0.0,
            ..ScorerConfig::default()
        };
        let selector = CandidateSelector::new(config);
        let flat: Outline = vec![(0, 10), (100, 10), (200, 10)].into();
        assert_eq!(
            selector.evaluate(0, &flat).unwrap(),
            Evaluation::Rejected(RejectReason::DegenerateBounds)
        );

        let ranking = selector.rank(vec![flat, rect(0, 0, 40, 30)]).unwrap();
        assert_eq!(ranking.rejected, 1);
        assert!(ranking.candidates.iter().all(|(r, _)| r.composite.is_finite()));
    }

    #[test]
    fn ranking_is_ascending() {
        let selector = CandidateSelector::new(ScorerConfig::default());
        let ranking = selector
            .rank(vec![goal(0, 0), rect(0, 0, 100, 100), rect(0, 0, 40, 80), rect(0, 0, 300, 60)])
            .unwrap();
        assert_eq!(ranking.total(), 4);
        let scores: Vec<f64> = ranking.candidates.iter().map(|(r, _)| r.composite).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
        assert_eq!(ranking.best().unwrap().0.index, 0);
    }
}
