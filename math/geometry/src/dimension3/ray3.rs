use rendiation_algebra::*;
use serde::{Deserialize, Serialize};

/// A half line. The direction is not required to be normalized, hit distances are
/// expressed in multiples of the direction vector.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ray3<T = f32> {
  pub origin: Vec3<T>,
  pub direction: Vec3<T>,
}

impl<T: Scalar> Ray3<T> {
  pub fn new(origin: Vec3<T>, direction: Vec3<T>) -> Self {
    Self { origin, direction }
  }

  pub fn from_point_to_point(origin: Vec3<T>, target: Vec3<T>) -> Self {
    Self::new(origin, (target - origin).normalize())
  }

  pub fn at(&self, distance: T) -> Vec3<T> {
    self.origin + self.direction * distance
  }
}
