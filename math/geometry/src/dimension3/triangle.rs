use rendiation_algebra::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle<V = Vec3<f32>> {
  pub a: V,
  pub b: V,
  pub c: V,
}

pub type Triangle3D<T = f32> = Triangle<Vec3<T>>;

impl<V> Triangle<V> {
  pub fn new(a: V, b: V, c: V) -> Self {
    Self { a, b, c }
  }

  pub fn iter_point(&self) -> impl Iterator<Item = &V> {
    [&self.a, &self.b, &self.c].into_iter()
  }
}

impl<T: Scalar> Triangle3D<T> {
  /// Create a triangle whose winding agrees with `desired_normal`.
  ///
  /// When the source winding order is unknown the caller may pass the expected facing
  /// direction, b and c are swapped if the raw normal points away from it
  /// (or is perpendicular to it).
  pub fn new_facing(a: Vec3<T>, b: Vec3<T>, c: Vec3<T>, desired_normal: Option<Vec3<T>>) -> Self {
    let triangle = Self::new(a, b, c);
    match desired_normal {
      Some(desired) if triangle.raw_normal().dot(desired) <= T::zero() => Self::new(a, c, b),
      _ => triangle,
    }
  }

  /// (b - a) x (c - a), not normalized
  #[inline(always)]
  pub fn raw_normal(&self) -> Vec3<T> {
    (self.b - self.a).cross(self.c - self.a)
  }

  pub fn face_normal(&self) -> Vec3<T> {
    self.raw_normal().normalize()
  }

  /// return None when triangle is degenerated to a point
  pub fn barycentric(&self, p: Vec3<T>) -> Option<Vec3<T>> {
    let v0 = self.b - self.a;
    let v1 = self.c - self.a;
    let v2 = p - self.a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;

    if denom == T::zero() {
      return None;
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = T::one() - v - w;

    Vec3::new(u, v, w).into()
  }
}

pub const TRIANGLE_RAY_EPSILON: f32 = 1e-7;

intersect_reverse!(Ray3, Option<f32>, (), Triangle3D);
/// Möller–Trumbore. Parallel rays, hits outside the triangle and hits at or behind
/// the ray origin all return None.
impl IntersectAble<Ray3, Option<f32>> for Triangle3D {
  fn intersect(&self, ray: &Ray3, _: &()) -> Option<f32> {
    let edge1 = self.b - self.a;
    let edge2 = self.c - self.a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < TRIANGLE_RAY_EPSILON {
      return None;
    }
    let inv_det = 1. / det;

    let s = ray.origin - self.a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
      return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0. || u + v > 1. {
      return None;
    }

    let t = edge2.dot(q) * inv_det;
    if t <= TRIANGLE_RAY_EPSILON {
      return None;
    }
    Some(t)
  }
}
