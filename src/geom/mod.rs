//! Scene-space geometry: vectors, points, rotations and rays.

mod core;
mod ray;

pub use core::{Point3, Tolerance, Transform, Vec3};
pub use ray::{Ray3, RayApproach};
