use std::iter::FromIterator;

use rendiation_algebra::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box3<T = f32> {
  pub min: Vec3<T>,
  pub max: Vec3<T>,
}

impl<T: Scalar> Default for Box3<T> {
  fn default() -> Self {
    Self::empty()
  }
}

impl<T: Scalar> Box3<T> {
  pub fn new(min: Vec3<T>, max: Vec3<T>) -> Self {
    Self { min, max }
  }

  /// the inverted infinite box, which is the identity of union
  pub fn empty() -> Self {
    Self::new(
      Vec3::splat(T::infinity()),
      Vec3::splat(T::neg_infinity()),
    )
  }

  pub fn is_empty(&self) -> bool {
    (self.max.x < self.min.x) || (self.max.y < self.min.y) || (self.max.z < self.min.z)
  }

  pub fn center(&self) -> Vec3<T> {
    (self.min + self.max) * T::half()
  }

  pub fn size(&self) -> Vec3<T> {
    if self.is_empty() {
      return Vec3::zero();
    }
    self.max - self.min
  }

  pub fn half_size(&self) -> Vec3<T> {
    self.size() * T::half()
  }

  /// full surface area of the box, zero for the empty box
  pub fn surface_area(&self) -> T {
    if self.is_empty() {
      return T::zero();
    }
    let s = self.size();
    T::two() * (s.x * s.y + s.x * s.z + s.y * s.z)
  }

  pub fn longest_axis(&self) -> (Axis3, T) {
    let s = self.size();
    if s.x > s.y {
      if s.x > s.z {
        (Axis3::X, s.x)
      } else {
        (Axis3::Z, s.z)
      }
    } else if s.y > s.z {
      (Axis3::Y, s.y)
    } else {
      (Axis3::Z, s.z)
    }
  }

  pub fn expand_by_point(&mut self, point: Vec3<T>) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  pub fn expand_by_box(&mut self, box3: Self) {
    if box3.is_empty() {
      return;
    }
    self.min = self.min.min(box3.min);
    self.max = self.max.max(box3.max);
  }

  #[must_use]
  pub fn union(&self, box3: Self) -> Self {
    let mut r = *self;
    r.expand_by_box(box3);
    r
  }

  pub fn contains_point(&self, p: Vec3<T>) -> bool {
    p.x >= self.min.x
      && p.y >= self.min.y
      && p.z >= self.min.z
      && p.x <= self.max.x
      && p.y <= self.max.y
      && p.z <= self.max.z
  }

  /// an empty box is contained by every box
  pub fn contains_box(&self, other: &Self) -> bool {
    other.is_empty() || (self.contains_point(other.min) && self.contains_point(other.max))
  }
}

impl<'a, T: Scalar> FromIterator<&'a Vec3<T>> for Box3<T> {
  fn from_iter<I: IntoIterator<Item = &'a Vec3<T>>>(items: I) -> Self {
    let mut bbox = Self::empty();
    items.into_iter().for_each(|p| bbox.expand_by_point(*p));
    bbox
  }
}

impl<T: Scalar> FromIterator<Vec3<T>> for Box3<T> {
  fn from_iter<I: IntoIterator<Item = Vec3<T>>>(items: I) -> Self {
    let mut bbox = Self::empty();
    items.into_iter().for_each(|p| bbox.expand_by_point(p));
    bbox
  }
}

impl<'a, T: Scalar> FromIterator<&'a Box3<T>> for Box3<T> {
  fn from_iter<I: IntoIterator<Item = &'a Box3<T>>>(items: I) -> Self {
    let mut bbox = Self::empty();
    items.into_iter().for_each(|p| bbox.expand_by_box(*p));
    bbox
  }
}

impl<T: Scalar> FromIterator<Box3<T>> for Box3<T> {
  fn from_iter<I: IntoIterator<Item = Box3<T>>>(items: I) -> Self {
    let mut bbox = Self::empty();
    items.into_iter().for_each(|p| bbox.expand_by_box(p));
    bbox
  }
}

intersect_reverse!(Ray3, Option<f32>, (), Box3);
/// Slab test. Returns the entry distance clamped to zero, so a ray starting inside
/// the box reports `Some(0.)`. Boxes fully behind the origin miss.
impl<T: Scalar> IntersectAble<Ray3<T>, Option<T>> for Box3<T> {
  fn intersect(&self, ray: &Ray3<T>, _: &()) -> Option<T> {
    if self.is_empty() {
      return None;
    }
    let mut t_near = T::zero();
    let mut t_far = T::infinity();
    for axis in 0..3 {
      let origin = ray.origin[axis];
      let direction = ray.direction[axis];
      let (min, max) = (self.min[axis], self.max[axis]);
      if direction == T::zero() {
        if origin < min || origin > max {
          return None;
        }
        continue;
      }
      let inv = direction.recip();
      let mut t0 = (min - origin) * inv;
      let mut t1 = (max - origin) * inv;
      if t0 > t1 {
        std::mem::swap(&mut t0, &mut t1);
      }
      t_near = t_near.max(t0);
      t_far = t_far.min(t1);
      if t_near > t_far {
        return None;
      }
    }
    Some(t_near)
  }
}

#[test]
fn box_ray_slab() {
  let b: Box3 = Box3::new(Vec3::new(0., 0., 0.), Vec3::new(1., 1., 1.));
  let hit: Ray3 = Ray3::new(Vec3::new(0.5, 0.5, -2.), Vec3::new(0., 0., 1.));
  assert_eq!(b.intersect(&hit, &()), Some(2.));
  assert_eq!(hit.intersect(&b, &()), Some(2.));

  let inside: Ray3 = Ray3::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(1., 0., 0.));
  assert_eq!(b.intersect(&inside, &()), Some(0.));

  let behind: Ray3 = Ray3::new(Vec3::new(0.5, 0.5, 2.), Vec3::new(0., 0., 1.));
  assert_eq!(b.intersect(&behind, &()), None);

  let parallel_outside: Ray3 = Ray3::new(Vec3::new(2., 0.5, -2.), Vec3::new(0., 0., 1.));
  assert_eq!(b.intersect(&parallel_outside, &()), None);

  assert_eq!(Box3::<f32>::empty().intersect(&hit, &()), None);
}

#[test]
fn box_measure() {
  let b: Box3 = Box3::new(Vec3::new(0., 0., 0.), Vec3::new(1., 2., 3.));
  assert_eq!(b.surface_area(), 22.);
  assert_eq!(b.longest_axis(), (Axis3::Z, 3.));
  assert_eq!(Box3::<f32>::empty().surface_area(), 0.);
  let u = b.union(Box3::new(Vec3::new(-1., 0., 0.), Vec3::new(0., 0., 0.)));
  assert_eq!(u.min, Vec3::new(-1., 0., 0.));
  assert!(u.contains_box(&b));
}
