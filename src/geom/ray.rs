//! Half-lines and the closest-approach solver used by triangulation.

use super::core::{Point3, Vec3};

/// A half-line `origin + t * direction` for `t >= 0`.
///
/// `direction` is not required to be unit length; the closest-approach
/// parameters are expressed in multiples of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3 {
    pub origin: Point3,
    pub direction: Vec3,
}

/// Closest points between two rays, as returned by [`Ray3::closest_approach`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayApproach {
    /// Parameter along the first ray.
    pub t_self: f64,
    /// Parameter along the second ray.
    pub t_other: f64,
    pub point_self: Point3,
    pub point_other: Point3,
}

impl RayApproach {
    /// Point halfway between the two closest points.
    #[must_use]
    pub fn midpoint(&self) -> Point3 {
        self.point_self.midpoint(self.point_other)
    }

    /// Distance between the two closest points (zero when the rays intersect).
    #[must_use]
    pub fn gap(&self) -> f64 {
        self.point_self.distance_to(self.point_other)
    }
}

impl Ray3 {
    #[must_use]
    pub const fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Solves for the pair of parameters minimising the distance between the
    /// infinite lines through `self` and `other`.
    ///
    /// With `w0 = self.origin - other.origin`, `a = d1·d1`, `b = d1·d2`,
    /// `c = d2·d2`, `d = d1·w0`, `e = d2·w0`:
    ///
    /// ```text
    /// denom = a*c - b*b
    /// t1    = (b*e - c*d) / denom
    /// t2    = (a*e - b*d) / denom
    /// ```
    ///
    /// Returns `None` when `|denom| < parallel_eps` (near-parallel lines) or when
    /// either parameter is negative, i.e. the closest approach lies behind one of
    /// the ray origins.
    #[must_use]
    pub fn closest_approach(&self, other: &Self, parallel_eps: f64) -> Option<RayApproach> {
        let d1 = self.direction;
        let d2 = other.direction;
        let w0 = self.origin - other.origin;

        let a = d1.dot(d1);
        let b = d1.dot(d2);
        let c = d2.dot(d2);
        let d = d1.dot(w0);
        let e = d2.dot(w0);

        let denom = a * c - b * b;
        if !denom.is_finite() || denom.abs() < parallel_eps {
            return None;
        }

        let t_self = (b * e - c * d) / denom;
        let t_other = (a * e - b * d) / denom;
        if t_self < 0.0 || t_other < 0.0 {
            return None;
        }

        Some(RayApproach {
            t_self,
            t_other,
            point_self: self.point_at(t_self),
            point_other: other.point_at(t_other),
        })
    }
}
