//! Per-frame draw list.
//!
//! The puzzle does not own a drawing surface. Each frame it produces a
//! [`RenderFrame`] of screen-space primitives that any presentation layer (a
//! canvas 2D context, SVG, a terminal) can paint in order.

use std::f64::consts::TAU;

use rand::Rng;
use serde::Serialize;

use crate::geom::Point3;
use crate::intersection::ConvergenceEstimate;
use crate::options::PuzzleOptions;
use crate::scene::Scene;
use crate::view::{Projected, Projector, Viewport};

const SOURCE_MARKER_RADIUS: f64 = 6.0;
const CONVERGENCE_MARKER_RADIUS: f64 = 9.0;
const ORIGIN_MARKER_RADIUS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Point3,
    pub size: f64,
}

/// Background stars on a sphere around the scene. Generated once per instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Starfield {
    stars: Vec<Star>,
}

impl Starfield {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, count: usize, radius: f64) -> Self {
        let stars = (0..count)
            .map(|_| {
                // Uniform on the sphere: uniform height, uniform azimuth.
                let z: f64 = rng.random_range(-1.0..=1.0);
                let azimuth = rng.random_range(0.0..TAU);
                let ring = (1.0 - z * z).sqrt();
                let (sin, cos) = azimuth.sin_cos();
                Star {
                    position: Point3::new(ring * cos * radius, ring * sin * radius, z * radius),
                    size: rng.random_range(0.5..=1.5),
                }
            })
            .collect();
        Self { stars }
    }

    #[must_use]
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DrawItem<'a> {
    Star {
        x: f64,
        y: f64,
        size: f64,
    },
    GridLine {
        from: [f64; 2],
        to: [f64; 2],
    },
    Vector {
        source: usize,
        from: [f64; 2],
        to: [f64; 2],
        locked: bool,
    },
    Origin {
        x: f64,
        y: f64,
        radius: f64,
    },
    Source {
        source: usize,
        name: &'a str,
        x: f64,
        y: f64,
        radius: f64,
        locked: bool,
    },
    Convergence {
        x: f64,
        y: f64,
        radius: f64,
        accuracy: f64,
    },
}

/// Screen-space primitives for one frame, in paint order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame<'a> {
    pub width: f64,
    pub height: f64,
    pub items: Vec<DrawItem<'a>>,
}

impl<'a> RenderFrame<'a> {
    /// Projects the whole scene. Elements behind the eye are skipped.
    #[must_use]
    pub fn build(
        scene: &'a Scene,
        estimate: Option<&ConvergenceEstimate>,
        starfield: &Starfield,
        projector: &Projector,
        viewport: Viewport,
        options: &PuzzleOptions,
    ) -> Self {
        let mut items = Vec::new();

        for star in starfield.stars() {
            let p = projector.project(star.position);
            if !p.behind_camera {
                items.push(DrawItem::Star {
                    x: p.x,
                    y: p.y,
                    size: star.size,
                });
            }
        }

        for (start, end) in grid_lines(options.grid_extent, options.grid_step) {
            if let Some((from, to)) = segment(projector, start, end) {
                items.push(DrawItem::GridLine { from, to });
            }
        }

        for source in scene.sources() {
            let tip = source.position + source.direction * options.vector_length;
            if let Some((from, to)) = segment(projector, source.position, tip) {
                items.push(DrawItem::Vector {
                    source: source.id.0,
                    from,
                    to,
                    locked: source.is_locked(),
                });
            }
        }

        let origin = projector.project(Point3::ORIGIN);
        if !origin.behind_camera {
            items.push(DrawItem::Origin {
                x: origin.x,
                y: origin.y,
                radius: ORIGIN_MARKER_RADIUS * origin.scale,
            });
        }

        // Far markers first so near ones overlap them.
        let mut markers: Vec<(Projected, DrawItem<'a>)> = scene
            .sources()
            .iter()
            .map(|source| {
                let p = projector.project(source.position);
                let item = DrawItem::Source {
                    source: source.id.0,
                    name: source.name.as_str(),
                    x: p.x,
                    y: p.y,
                    radius: SOURCE_MARKER_RADIUS * p.scale,
                    locked: source.is_locked(),
                };
                (p, item)
            })
            .filter(|(p, _)| !p.behind_camera)
            .collect();
        markers.sort_by(|a, b| b.0.depth.total_cmp(&a.0.depth));
        items.extend(markers.into_iter().map(|(_, item)| item));

        if let Some(estimate) = estimate {
            let p = projector.project(estimate.point);
            if !p.behind_camera {
                items.push(DrawItem::Convergence {
                    x: p.x,
                    y: p.y,
                    radius: CONVERGENCE_MARKER_RADIUS * p.scale,
                    accuracy: estimate.accuracy,
                });
            }
        }

        Self {
            width: viewport.width,
            height: viewport.height,
            items,
        }
    }
}

/// Lines of a square grid on the XZ plane, centred on the origin.
fn grid_lines(extent: f64, step: f64) -> Vec<(Point3, Point3)> {
    if step <= 0.0 || extent <= 0.0 {
        return Vec::new();
    }
    let count = (extent / step).floor() as i64;
    let mut lines = Vec::with_capacity((count as usize * 2 + 1) * 2);
    for i in -count..=count {
        let offset = i as f64 * step;
        lines.push((
            Point3::new(offset, 0.0, -extent),
            Point3::new(offset, 0.0, extent),
        ));
        lines.push((
            Point3::new(-extent, 0.0, offset),
            Point3::new(extent, 0.0, offset),
        ));
    }
    lines
}

fn segment(projector: &Projector, start: Point3, end: Point3) -> Option<([f64; 2], [f64; 2])> {
    let a = projector.project(start);
    let b = projector.project(end);
    if a.behind_camera || b.behind_camera {
        return None;
    }
    Some(([a.x, a.y], [b.x, b.y]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;
    use crate::scene::{Source, SourceId};
    use crate::view::ViewState;
    use crate::view::projection::FOCAL_LENGTH;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scene() -> Scene {
        let mut scene = Scene::new(
            Point3::ORIGIN,
            vec![
                Source::new(SourceId(0), "Near", Point3::new(-50.0, 0.0, -100.0), Vec3::X, true),
                Source::new(SourceId(1), "Far", Point3::new(50.0, 0.0, 100.0), -Vec3::X, false),
            ],
        );
        scene.toggle_lock(SourceId(1), 3);
        scene
    }

    fn flat() -> Projector {
        let view = ViewState {
            pitch: 0.0,
            yaw: 0.0,
            zoom: 1.0,
        };
        Projector::new(&view, Viewport::default(), FOCAL_LENGTH)
    }

    #[test]
    fn stars_lie_on_the_sphere() {
        let mut rng = StdRng::seed_from_u64(11);
        let field = Starfield::generate(&mut rng, 50, 900.0);
        assert_eq!(field.stars().len(), 50);
        for star in field.stars() {
            assert!((star.position.distance_to(Point3::ORIGIN) - 900.0).abs() < 1e-6);
        }
    }

    #[test]
    fn grid_has_lines_in_both_directions() {
        let lines = grid_lines(200.0, 50.0);
        assert_eq!(lines.len(), 18);
        assert!(grid_lines(200.0, 0.0).is_empty());
    }

    #[test]
    fn frame_contains_every_scene_element() {
        let scene = scene();
        let options = PuzzleOptions::default();
        let estimate = ConvergenceEstimate {
            point: Point3::new(1.0, 2.0, 3.0),
            accuracy: 42.0,
            sample_count: 1,
        };
        let frame = RenderFrame::build(
            &scene,
            Some(&estimate),
            &Starfield::default(),
            &flat(),
            Viewport::default(),
            &options,
        );

        let count =
            |pred: fn(&DrawItem<'_>) -> bool| frame.items.iter().filter(|i| pred(i)).count();
        assert_eq!(count(|i| matches!(i, DrawItem::GridLine { .. })), 18);
        assert_eq!(count(|i| matches!(i, DrawItem::Vector { .. })), 2);
        assert_eq!(count(|i| matches!(i, DrawItem::Origin { .. })), 1);
        assert_eq!(count(|i| matches!(i, DrawItem::Convergence { .. })), 1);

        let sources: Vec<(&str, bool)> = frame
            .items
            .iter()
            .filter_map(|item| match item {
                DrawItem::Source { name, locked, .. } => Some((*name, *locked)),
                _ => None,
            })
            .collect();
        // Far marker is painted first.
        assert_eq!(sources, vec![("Far", true), ("Near", false)]);
    }

    #[test]
    fn frame_without_estimate_has_no_convergence_marker() {
        let scene = scene();
        let frame = RenderFrame::build(
            &scene,
            None,
            &Starfield::default(),
            &flat(),
            Viewport::default(),
            &PuzzleOptions::default(),
        );
        assert!(
            !frame
                .items
                .iter()
                .any(|i| matches!(i, DrawItem::Convergence { .. }))
        );
    }
}
