//! Perspective projection from scene space onto the 2D viewport.
//!
//! Every drawn element (source markers, vector endpoints, origin, convergence
//! marker, stars, grid) goes through the same [`Projector`], so relative geometry
//! is preserved under any rotation or zoom.

use serde::Serialize;

use crate::error::PuzzleError;
use crate::geom::{Point3, Transform};

/// Default focal length; the generated scene fits an 800x600 viewport at zoom 1.
pub const FOCAL_LENGTH: f64 = 500.0;

/// Smallest `focal + z` used in the perspective divide. Points closer to (or
/// behind) the eye are flagged via [`Projected::behind_camera`].
const NEAR_PLANE: f64 = 1.0;

pub const DEFAULT_PITCH: f64 = 0.35;
pub const DEFAULT_YAW: f64 = 0.6;
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Camera orientation and zoom. Reset to defaults for every puzzle instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    /// Rotation about the X axis, clamped to `[-max_pitch, max_pitch]`.
    pub pitch: f64,
    /// Rotation about the Y axis; unbounded.
    pub yaw: f64,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pitch: DEFAULT_PITCH,
            yaw: DEFAULT_YAW,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl ViewState {
    /// Pitch first, then yaw.
    #[must_use]
    pub fn rotation(&self) -> Transform {
        Transform::rotate_y(self.yaw) * Transform::rotate_x(self.pitch)
    }

    pub fn rotate_by(&mut self, dx: f64, dy: f64, sensitivity: f64, max_pitch: f64) {
        self.yaw += dx * sensitivity;
        self.pitch = (self.pitch + dy * sensitivity).clamp(-max_pitch, max_pitch);
    }

    pub fn zoom_by(&mut self, delta_y: f64, speed: f64, min_zoom: f64, max_zoom: f64) {
        self.zoom = (self.zoom - delta_y * speed).clamp(min_zoom, max_zoom);
    }
}

/// Drawing surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self, PuzzleError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PuzzleError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.width * 0.5, self.height * 0.5)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Screen-space result of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    /// Rotated z, before the perspective divide. Larger is further away.
    pub depth: f64,
    /// Perspective scale including zoom; multiply marker sizes by this.
    pub scale: f64,
    pub behind_camera: bool,
}

/// Projection with the rotation for one view state precomputed.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    rotation: Transform,
    zoom: f64,
    focal: f64,
    center: (f64, f64),
}

impl Projector {
    #[must_use]
    pub fn new(view: &ViewState, viewport: Viewport, focal: f64) -> Self {
        Self {
            rotation: view.rotation(),
            zoom: view.zoom,
            focal,
            center: viewport.center(),
        }
    }

    #[must_use]
    pub fn project(&self, point: Point3) -> Projected {
        let rotated = self.rotation.apply_point(point);
        let distance = self.focal + rotated.z;
        let behind_camera = distance < NEAR_PLANE;
        let scale = self.focal / distance.max(NEAR_PLANE) * self.zoom;

        Projected {
            x: self.center.0 + rotated.x * scale,
            y: self.center.1 + rotated.y * scale,
            depth: rotated.z,
            scale,
            behind_camera,
        }
    }
}

/// Projects a single point with the default focal length.
#[must_use]
pub fn project(point: Point3, view: &ViewState, viewport: Viewport) -> Projected {
    Projector::new(view, viewport, FOCAL_LENGTH).project(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_3};

    fn flat_view(zoom: f64) -> ViewState {
        ViewState {
            pitch: 0.0,
            yaw: 0.0,
            zoom,
        }
    }

    #[test]
    fn projection_is_pure() {
        let view = ViewState {
            pitch: 0.4,
            yaw: -1.3,
            zoom: 1.7,
        };
        let p = Point3::new(12.0, -40.0, 77.0);
        let viewport = Viewport::default();
        assert_eq!(project(p, &view, viewport), project(p, &view, viewport));
    }

    #[test]
    fn origin_lands_on_viewport_center() {
        let viewport = Viewport::new(640.0, 480.0).unwrap();
        let projected = project(Point3::ORIGIN, &ViewState::default(), viewport);
        assert_eq!((projected.x, projected.y), (320.0, 240.0));
        assert!(Tolerance::DEFAULT.approx_eq_f64(projected.scale, DEFAULT_ZOOM));
    }

    #[test]
    fn perspective_divide_and_zoom() {
        let viewport = Viewport::default();
        let near = project(Point3::new(100.0, 0.0, 0.0), &flat_view(1.0), viewport);
        assert!(Tolerance::DEFAULT.approx_eq_f64(near.x, 500.0));

        // z = focal halves the scale; zoom multiplies it.
        let far = project(Point3::new(100.0, 0.0, 500.0), &flat_view(2.0), viewport);
        assert!(Tolerance::DEFAULT.approx_eq_f64(far.scale, 1.0));
        assert!(Tolerance::DEFAULT.approx_eq_f64(far.x, 500.0));
    }

    #[test]
    fn pitch_is_applied_before_yaw() {
        let view = ViewState {
            pitch: FRAC_PI_2,
            yaw: FRAC_PI_2,
            zoom: 1.0,
        };
        // +Y -> pitch -> +Z -> yaw -> +X, so the point ends up at z = 0.
        let projected = project(Point3::new(0.0, 10.0, 0.0), &view, Viewport::default());
        assert!(Tolerance::LOOSE.approx_eq_f64(projected.x, 410.0));
        assert!(Tolerance::LOOSE.approx_eq_f64(projected.y, 300.0));
        assert!(Tolerance::LOOSE.approx_zero_f64(projected.depth));
    }

    #[test]
    fn points_behind_the_eye_are_flagged() {
        let projected = project(
            Point3::new(0.0, 0.0, -600.0),
            &flat_view(1.0),
            Viewport::default(),
        );
        assert!(projected.behind_camera);
        assert!(projected.scale.is_finite());
    }

    #[test]
    fn pitch_is_clamped_and_yaw_is_not() {
        let mut view = flat_view(1.0);
        view.rotate_by(10_000.0, 10_000.0, 0.005, FRAC_PI_3);
        assert_eq!(view.pitch, FRAC_PI_3);
        assert!(Tolerance::DEFAULT.approx_eq_f64(view.yaw, 50.0));

        view.rotate_by(0.0, -100_000.0, 0.005, FRAC_PI_3);
        assert_eq!(view.pitch, -FRAC_PI_3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut view = flat_view(1.0);
        view.zoom_by(-100.0, 0.001, 0.5, 2.5);
        assert!(Tolerance::DEFAULT.approx_eq_f64(view.zoom, 1.1));
        view.zoom_by(-1e6, 0.001, 0.5, 2.5);
        assert_eq!(view.zoom, 2.5);
        view.zoom_by(1e6, 0.001, 0.5, 2.5);
        assert_eq!(view.zoom, 0.5);
    }

    #[test]
    fn rejects_degenerate_viewport() {
        assert!(Viewport::new(0.0, 600.0).is_err());
        assert!(Viewport::new(800.0, f64::NAN).is_err());
    }
}
