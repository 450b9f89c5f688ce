//! Convergence estimate of the locked sources' rays.
//!
//! Every unordered pair of locked rays contributes the midpoint of its closest
//! approach, unless the pair is near-parallel or converges behind a source. The
//! surviving samples are averaged and scored against the hidden target.

use serde::Serialize;

use crate::geom::{Point3, Ray3};
use crate::options::PuzzleOptions;
use crate::scene::Scene;

/// Scoring rules, taken from [`PuzzleOptions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyRules {
    /// Locked count needed before accuracy may exceed `partial_cap`.
    pub full_fix_count: usize,
    pub partial_cap: f64,
    pub parallel_epsilon: f64,
}

impl AccuracyRules {
    #[must_use]
    pub fn from_options(options: &PuzzleOptions) -> Self {
        Self {
            full_fix_count: options.max_locked,
            partial_cap: options.two_vector_accuracy_cap,
            parallel_epsilon: options.parallel_epsilon,
        }
    }

    /// `clamp(100 - error, 0, 100)`, capped at `partial_cap` while fewer than
    /// `full_fix_count` sources are locked or any locked source is a decoy.
    #[must_use]
    pub fn accuracy(&self, error: f64, locked_count: usize, all_accurate: bool) -> f64 {
        let raw = (100.0 - error).clamp(0.0, 100.0);
        if locked_count < self.full_fix_count || !all_accurate {
            raw.min(self.partial_cap)
        } else {
            raw
        }
    }
}

impl Default for AccuracyRules {
    fn default() -> Self {
        Self::from_options(&PuzzleOptions::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvergenceEstimate {
    pub point: Point3,
    /// 0..=100.
    pub accuracy: f64,
    /// Number of ray pairs that contributed to `point`.
    pub sample_count: usize,
}

/// Closest-approach midpoints of every usable pair, in pair order.
#[must_use]
pub fn pair_samples(rays: &[Ray3], parallel_epsilon: f64) -> Vec<Point3> {
    let mut samples = Vec::new();
    for (i, a) in rays.iter().enumerate() {
        for b in &rays[i + 1..] {
            if let Some(approach) = a.closest_approach(b, parallel_epsilon) {
                samples.push(approach.midpoint());
            }
        }
    }
    samples
}

/// Average of the pair samples, with the number of samples used.
#[must_use]
pub fn converge(rays: &[Ray3], parallel_epsilon: f64) -> Option<(Point3, usize)> {
    if rays.len() < 2 {
        return None;
    }
    let samples = pair_samples(rays, parallel_epsilon);
    Point3::centroid(&samples).map(|point| (point, samples.len()))
}

/// Estimate for the scene's current lock set, or `None` when fewer than two
/// sources are locked or no pair produced a sample.
#[must_use]
pub fn estimate_convergence(scene: &Scene, rules: &AccuracyRules) -> Option<ConvergenceEstimate> {
    let rays: Vec<Ray3> = scene.locked_sources().map(|source| source.ray()).collect();
    let (point, sample_count) = converge(&rays, rules.parallel_epsilon)?;
    let error = point.distance_to(scene.hidden_target());
    let all_accurate = scene.locked_sources().all(|source| source.is_accurate);
    Some(ConvergenceEstimate {
        point,
        accuracy: rules.accuracy(error, rays.len(), all_accurate),
        sample_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Tolerance, Vec3};
    use crate::scene::{Source, SourceId};

    fn aimed(id: usize, position: Point3, at: Point3) -> Source {
        let direction = (at - position).normalized().unwrap();
        Source::new(SourceId(id), format!("S{id}"), position, direction, true)
    }

    fn locked(scene: &mut Scene, ids: &[usize]) {
        for id in ids {
            scene.toggle_lock(SourceId(*id), 3);
        }
    }

    #[test]
    fn needs_two_locked_sources() {
        let target = Point3::new(10.0, 0.0, 0.0);
        let mut scene = Scene::new(
            target,
            vec![
                aimed(0, Point3::new(100.0, 0.0, 0.0), target),
                aimed(1, Point3::new(0.0, 100.0, 0.0), target),
            ],
        );
        assert!(estimate_convergence(&scene, &AccuracyRules::default()).is_none());
        locked(&mut scene, &[0]);
        assert!(estimate_convergence(&scene, &AccuracyRules::default()).is_none());
        locked(&mut scene, &[1]);
        assert!(estimate_convergence(&scene, &AccuracyRules::default()).is_some());
    }

    #[test]
    fn two_vectors_are_capped_even_when_exact() {
        let target = Point3::new(5.0, -3.0, 12.0);
        let mut scene = Scene::new(
            target,
            vec![
                aimed(0, Point3::new(150.0, 20.0, 0.0), target),
                aimed(1, Point3::new(-100.0, -40.0, 80.0), target),
            ],
        );
        locked(&mut scene, &[0, 1]);

        let estimate = estimate_convergence(&scene, &AccuracyRules::default()).unwrap();
        assert!(Tolerance::LOOSE.approx_eq_point3(estimate.point, target));
        assert_eq!(estimate.accuracy, 65.0);
        assert_eq!(estimate.sample_count, 1);
    }

    #[test]
    fn parallel_pairs_do_not_contribute() {
        let target = Point3::ORIGIN;
        let mut scene = Scene::new(
            target,
            vec![
                Source::new(SourceId(0), "A", Point3::new(0.0, 10.0, 0.0), Vec3::X, false),
                Source::new(SourceId(1), "B", Point3::new(0.0, -10.0, 0.0), Vec3::X, false),
            ],
        );
        locked(&mut scene, &[0, 1]);
        assert!(estimate_convergence(&scene, &AccuracyRules::default()).is_none());
    }

    #[test]
    fn samples_are_averaged_over_surviving_pairs() {
        // The diagonal ray meets the first at (10, 0, 0) and the third at
        // (20, 0, 10); the first and third are parallel.
        let rays = [
            Ray3::new(Point3::new(-10.0, 0.0, 0.0), Vec3::X),
            Ray3::new(Point3::new(0.0, 0.0, -10.0), Vec3::new(1.0, 0.0, 1.0)),
            Ray3::new(Point3::new(-10.0, 0.0, 10.0), Vec3::X),
        ];
        let samples = pair_samples(&rays, 1e-9);
        assert_eq!(samples.len(), 2);

        let (point, count) = converge(&rays, 1e-9).unwrap();
        assert_eq!(count, 2);
        assert!(Tolerance::LOOSE.approx_eq_point3(point, Point3::new(15.0, 0.0, 5.0)));
    }

    #[test]
    fn accuracy_is_clamped() {
        let rules = AccuracyRules::default();
        assert_eq!(rules.accuracy(0.0, 3, true), 100.0);
        assert_eq!(rules.accuracy(250.0, 3, true), 0.0);
        assert_eq!(rules.accuracy(12.5, 3, true), 87.5);
        assert_eq!(rules.accuracy(12.5, 2, true), 65.0);
        assert_eq!(rules.accuracy(80.0, 2, true), 20.0);
        assert_eq!(rules.accuracy(0.0, 3, false), 65.0);
        assert_eq!(rules.accuracy(80.0, 3, false), 20.0);
    }

    #[test]
    fn a_decoy_in_the_lock_set_caps_accuracy() {
        // The decoy happens to pass through the target, so the fix is exact.
        let target = Point3::new(-20.0, 10.0, 40.0);
        let decoy_position = Point3::new(40.0, 45.0, -150.0);
        let decoy = Source::new(
            SourceId(2),
            "S2",
            decoy_position,
            (target - decoy_position).normalized().unwrap(),
            false,
        );
        let mut scene = Scene::new(
            target,
            vec![
                aimed(0, Point3::new(150.0, 20.0, 0.0), target),
                aimed(1, Point3::new(-110.0, -25.0, -80.0), target),
                decoy,
            ],
        );
        locked(&mut scene, &[0, 1, 2]);

        let estimate = estimate_convergence(&scene, &AccuracyRules::default()).unwrap();
        assert!(Tolerance::LOOSE.approx_eq_point3(estimate.point, target));
        assert_eq!(estimate.accuracy, 65.0);
    }
}
