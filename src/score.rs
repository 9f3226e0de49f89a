//! Sub-score functions and their aggregate.

use serde::Serialize;

/// Value of [`target_distance_score`] when the measurement hits its target.
pub const TARGET_SCORE_MAX: f64 = 1.0;

pub const ANGLE_SCORE_MIN: f64 = 10.0;
pub const ANGLE_SCORE_MAX: f64 = 100.0;

/// Reward a measurement for being close to `target`.
///
/// `1 / (1 + |target - value|)`: peaks at [`TARGET_SCORE_MAX`] and falls off
/// smoothly, staying in `(0, 1]`. Non-finite input scores zero.
pub fn target_distance_score(target: f64, value: f64) -> f64 {
    let distance = (target - value).abs();
    if !distance.is_finite() {
        return 0.0;
    }
    TARGET_SCORE_MAX / (1.0 + distance)
}

/// Reward near-horizontal principal axes: `(90 - |θ|) + 10`, in `[10, 100]`.
pub fn angle_score(orientation_degrees: f64) -> f64 {
    if !orientation_degrees.is_finite() {
        return ANGLE_SCORE_MIN;
    }
    ((90.0 - orientation_degrees.abs()) + ANGLE_SCORE_MIN).clamp(ANGLE_SCORE_MIN, ANGLE_SCORE_MAX)
}

/// The four per-criterion scores of one outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub coverage: f64,
    pub aspect: f64,
    pub moment: f64,
    pub angle: f64,
}

impl SubScores {
    /// Unweighted mean of the four criteria.
    pub fn composite(&self) -> f64 {
        (self.coverage + self.aspect + self.moment + self.angle) / 4.0
    }

    /// Smallest composite any outline can reach.
    pub fn composite_floor() -> f64 {
        ANGLE_SCORE_MIN / 4.0
    }

    /// Largest composite any outline can reach.
    pub fn composite_ceiling() -> f64 {
        (3.0 * TARGET_SCORE_MAX + ANGLE_SCORE_MAX) / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaks_at_target() {
        for &t in &[0.0, 0.28, 1.0 / 3.0, 5.0 / 3.0, -12.5, 1e9] {
            assert_eq!(target_distance_score(t, t), TARGET_SCORE_MAX);
        }
    }

    #[test]
    fn decreases_with_distance() {
        let t = 0.28;
        let mut last = target_distance_score(t, t);
        for step in 1..50 {
            let below = target_distance_score(t, t - step as f64 * 0.1);
            let above = target_distance_score(t, t + step as f64 * 0.1);
            assert!(above < last && below < last);
            assert!((above - below).abs() < 1e-12);
            assert!(above > 0.0);
            last = above;
        }
    }

    #[test]
    fn non_finite_values_score_zero() {
        assert_eq!(target_distance_score(1.0, f64::NAN), 0.0);
        assert_eq!(target_distance_score(1.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn angle_score_bounds() {
        assert_eq!(angle_score(0.0), 100.0);
        assert_eq!(angle_score(90.0), 10.0);
        assert_eq!(angle_score(-90.0), 10.0);
        assert_eq!(angle_score(-45.0), 55.0);
        assert_eq!(angle_score(f64::NAN), 10.0);
    }

    #[test]
    fn composite_is_mean() {
        let s = SubScores { coverage: 1.0, aspect: 0.5, moment: 0.5, angle: 100.0 };
        assert_eq!(s.composite(), 25.5);
        assert!(s.composite() <= SubScores::composite_ceiling());
        assert!(s.composite() >= SubScores::composite_floor());
    }
}
