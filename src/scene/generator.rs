//! Builds a fresh [`Scene`]: hidden target, accurate sources and decoys.

use std::f64::consts::TAU;

use rand::Rng;
use rand::seq::SliceRandom;

use super::{SOURCE_COUNT, Scene, Source, SourceId};
use crate::geom::{Point3, Ray3, Vec3};
use crate::intersection::{AccuracyRules, converge};
use crate::options::PuzzleOptions;

/// Noise redraws before the accurate rays fall back to exact directions.
const MAX_NOISE_DRAWS: usize = 16;

/// Fixed placement of one source: angle around the Y axis, horizontal radius, height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSlot {
    pub name: &'static str,
    pub angle_deg: f64,
    pub radius: f64,
    pub height: f64,
}

impl SourceSlot {
    #[must_use]
    pub fn position(&self) -> Point3 {
        let (sin, cos) = self.angle_deg.to_radians().sin_cos();
        Point3::new(self.radius * cos, self.height, self.radius * sin)
    }
}

/// Five angularly spread slots at varying distance and height.
pub const SOURCE_SLOTS: [SourceSlot; SOURCE_COUNT] = [
    SourceSlot {
        name: "Kepler Relay",
        angle_deg: 0.0,
        radius: 150.0,
        height: 20.0,
    },
    SourceSlot {
        name: "Vega Array",
        angle_deg: 72.0,
        radius: 130.0,
        height: -40.0,
    },
    SourceSlot {
        name: "Deneb Outpost",
        angle_deg: 144.0,
        radius: 165.0,
        height: 35.0,
    },
    SourceSlot {
        name: "Altair Beacon",
        angle_deg: 216.0,
        radius: 140.0,
        height: -25.0,
    },
    SourceSlot {
        name: "Rigel Station",
        angle_deg: 288.0,
        radius: 155.0,
        height: 45.0,
    },
];

/// Generation never fails: slot positions are fixed and non-degenerate.
#[derive(Debug, Clone)]
pub struct SourceGenerator {
    target_extent: [f64; 3],
    accurate_count: usize,
    noise: f64,
    decoy_offset_min: f64,
    decoy_offset_max: f64,
    rules: AccuracyRules,
    success_threshold: f64,
}

impl SourceGenerator {
    #[must_use]
    pub fn new(options: &PuzzleOptions) -> Self {
        Self {
            target_extent: options.target_extent,
            accurate_count: options.accurate_count.min(SOURCE_COUNT),
            noise: options.accurate_noise,
            decoy_offset_min: options.decoy_offset_min,
            decoy_offset_max: options.decoy_offset_max,
            rules: AccuracyRules::from_options(options),
            success_threshold: options.success_threshold,
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Scene {
        let target = Point3::new(
            symmetric(rng, self.target_extent[0]),
            symmetric(rng, self.target_extent[1]),
            symmetric(rng, self.target_extent[2]),
        );

        let mut accurate = [false; SOURCE_COUNT];
        accurate[..self.accurate_count].fill(true);
        accurate.shuffle(rng);

        let positions = SOURCE_SLOTS.map(|slot| slot.position());
        let accurate_positions: Vec<Point3> = positions
            .iter()
            .zip(accurate)
            .filter_map(|(position, is_accurate)| is_accurate.then_some(*position))
            .collect();
        let decoy_positions: Vec<Point3> = positions
            .iter()
            .zip(accurate)
            .filter_map(|(position, is_accurate)| (!is_accurate).then_some(*position))
            .collect();

        let mut accurate_directions =
            self.accurate_directions(rng, &accurate_positions, target);
        let fake_target = self.fake_target(rng, target, &decoy_positions);

        let sources = SOURCE_SLOTS
            .iter()
            .zip(positions)
            .zip(accurate)
            .enumerate()
            .map(|(index, ((slot, position), is_accurate))| {
                let direction = if is_accurate {
                    accurate_directions.remove(0)
                } else {
                    direction_between(position, fake_target)
                };
                Source::new(SourceId(index), slot.name, position, direction, is_accurate)
            })
            .collect();

        log::debug!(
            "triangulatiescene gegenereerd: doel {target:?}, nep-doel {fake_target:?}, nauwkeurig {accurate:?}"
        );

        Scene::new(target, sources)
    }

    /// Noisy directions towards the target, one per position.
    ///
    /// When exactly a full fix worth of sources is accurate, the noise is redrawn
    /// until that set clears the success threshold; after `MAX_NOISE_DRAWS`
    /// failures the exact directions are used.
    fn accurate_directions<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        positions: &[Point3],
        target: Point3,
    ) -> Vec<Vec3> {
        let check = positions.len() == self.rules.full_fix_count;
        for draw in 0..MAX_NOISE_DRAWS {
            let directions: Vec<Vec3> = positions
                .iter()
                .map(|position| self.noisy_direction(rng, *position, target))
                .collect();
            if !check || self.solvable(positions, &directions, target) {
                return directions;
            }
            log::debug!("ruisronde {draw} onoplosbaar, opnieuw trekken");
        }
        positions
            .iter()
            .map(|position| direction_between(*position, target))
            .collect()
    }

    /// Unit vector towards the target with per-component noise, renormalised.
    fn noisy_direction<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        position: Point3,
        target: Point3,
    ) -> Vec3 {
        let exact = direction_between(position, target);
        let noise = Vec3::new(
            symmetric(rng, self.noise),
            symmetric(rng, self.noise),
            symmetric(rng, self.noise),
        );
        (exact + noise).normalized().unwrap_or(exact)
    }

    fn solvable(&self, positions: &[Point3], directions: &[Vec3], target: Point3) -> bool {
        let rays: Vec<Ray3> = positions
            .iter()
            .zip(directions)
            .map(|(position, direction)| Ray3::new(*position, *direction))
            .collect();
        converge(&rays, self.rules.parallel_epsilon).is_some_and(|(point, _)| {
            let accuracy = self.rules.accuracy(point.distance_to(target), rays.len(), true);
            accuracy > self.success_threshold
        })
    }

    /// The single point every decoy aims at.
    ///
    /// The offset is perpendicular to the decoys' lines of sight where possible,
    /// so each decoy ray misses the target by a distance close to the offset.
    fn fake_target<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        target: Point3,
        decoys: &[Point3],
    ) -> Point3 {
        let magnitude = rng.random_range(self.decoy_offset_min..=self.decoy_offset_max);
        let sights: Vec<Vec3> = decoys.iter().map(|position| target - *position).collect();
        let shared = match sights.as_slice() {
            [a, b, ..] => a.cross(*b).normalized(),
            _ => None,
        };
        let direction = match (shared, sights.first()) {
            (Some(axis), _) => {
                if rng.random_bool(0.5) {
                    axis
                } else {
                    -axis
                }
            }
            (None, Some(sight)) => perpendicular_unit(rng, *sight),
            (None, None) => perpendicular_unit(rng, Vec3::Y),
        };
        target + direction * magnitude
    }
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> f64 {
    if extent <= 0.0 {
        return 0.0;
    }
    rng.random_range(-extent..=extent)
}

fn direction_between(from: Point3, to: Point3) -> Vec3 {
    (to - from).normalized().unwrap_or(Vec3::X)
}

/// Random unit vector perpendicular to `axis`.
fn perpendicular_unit<R: Rng + ?Sized>(rng: &mut R, axis: Vec3) -> Vec3 {
    let angle = rng.random_range(0.0..TAU);
    let helper = if axis.y.abs() < 0.9 * axis.length() { Vec3::Y } else { Vec3::X };
    let u = axis.cross(helper).normalized().unwrap_or(Vec3::Z);
    let v = match axis.cross(u).normalized() {
        Some(v) => v,
        None => return u,
    };
    let (sin, cos) = angle.sin_cos();
    u * cos + v * sin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;
    use crate::intersection::estimate_convergence;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn generate(seed: u64) -> Scene {
        let mut rng = StdRng::seed_from_u64(seed);
        SourceGenerator::new(&PuzzleOptions::default()).generate(&mut rng)
    }

    fn distance_from_ray(source: &Source, point: Point3) -> f64 {
        let to_point = point - source.position;
        to_point.reject_from(source.direction).length()
    }

    #[test]
    fn exactly_three_of_five_are_accurate() {
        for seed in 0..32 {
            let scene = generate(seed);
            assert_eq!(scene.sources().len(), SOURCE_COUNT);
            let accurate = scene.sources().iter().filter(|s| s.is_accurate).count();
            assert_eq!(accurate, 3, "seed {seed}");
            assert_eq!(scene.locked_count(), 0);
        }
    }

    #[test]
    fn accurate_assignment_varies_between_seeds() {
        let pattern = |scene: &Scene| -> Vec<bool> {
            scene.sources().iter().map(|s| s.is_accurate).collect()
        };
        let first = pattern(&generate(1));
        assert!((2..64).any(|seed| pattern(&generate(seed)) != first));
    }

    #[test]
    fn same_seed_gives_same_scene() {
        assert_eq!(generate(42), generate(42));
    }

    #[test]
    fn directions_are_close_to_unit_length() {
        let scene = generate(7);
        for source in scene.sources() {
            assert!(Tolerance::LOOSE.approx_eq_f64(source.direction.length(), 1.0));
        }
    }

    #[test]
    fn target_stays_within_extent() {
        let extent = PuzzleOptions::default().target_extent;
        for seed in 0..32 {
            let t = generate(seed).hidden_target();
            assert!(t.x.abs() <= extent[0] && t.y.abs() <= extent[1] && t.z.abs() <= extent[2]);
        }
    }

    #[test]
    fn accurate_rays_pass_near_target_and_decoys_do_not() {
        for seed in 0..32 {
            let scene = generate(seed);
            let target = scene.hidden_target();
            for source in scene.sources() {
                let miss = distance_from_ray(source, target);
                if source.is_accurate {
                    assert!(miss < 20.0, "seed {seed}: accurate miss {miss}");
                } else {
                    assert!(miss > 30.0, "seed {seed}: decoy miss {miss}");
                }
            }
        }
    }

    #[test]
    fn decoys_share_one_aim_point() {
        for seed in 0..64 {
            let scene = generate(seed);
            let decoys: Vec<&Source> =
                scene.sources().iter().filter(|s| !s.is_accurate).collect();
            let [a, b] = decoys.as_slice() else {
                panic!("seed {seed}: expected two decoys");
            };
            let approach = a.ray().closest_approach(&b.ray(), 1e-9).unwrap();
            assert!(
                approach.gap() < 1e-6,
                "seed {seed}: decoys miss each other by {}",
                approach.gap()
            );

            let offset = approach.midpoint().distance_to(scene.hidden_target());
            let options = PuzzleOptions::default();
            let range = options.decoy_offset_min - 1e-6..=options.decoy_offset_max + 1e-6;
            assert!(range.contains(&offset), "seed {seed}: fake target offset {offset}");
        }
    }

    #[test]
    fn accurate_triple_always_clears_the_threshold() {
        let options = PuzzleOptions::default();
        let rules = AccuracyRules::from_options(&options);
        for seed in 0..200 {
            let mut scene = generate(seed);
            let accurate: Vec<SourceId> = scene
                .sources()
                .iter()
                .filter(|s| s.is_accurate)
                .map(|s| s.id)
                .collect();
            for id in accurate {
                scene.toggle_lock(id, options.max_locked);
            }
            let estimate = estimate_convergence(&scene, &rules).unwrap();
            assert!(
                estimate.accuracy > options.success_threshold,
                "seed {seed}: accuracy {}",
                estimate.accuracy
            );
        }
    }

    #[test]
    fn slots_are_well_separated() {
        for (i, a) in SOURCE_SLOTS.iter().enumerate() {
            for b in &SOURCE_SLOTS[i + 1..] {
                assert!(a.position().distance_to(b.position()) > 100.0);
            }
        }
    }

    #[test]
    fn perpendicular_unit_is_orthogonal() {
        let mut rng = StdRng::seed_from_u64(3);
        for axis in [Vec3::X, Vec3::Y, Vec3::new(1.0, 2.0, -3.0)] {
            let p = perpendicular_unit(&mut rng, axis);
            assert!(Tolerance::LOOSE.approx_zero_f64(p.dot(axis)));
            assert!(Tolerance::LOOSE.approx_eq_f64(p.length(), 1.0));
        }
    }
}
