use rendiation_algebra::*;

use crate::*;

impl<T: Scalar> SpaceBounding<T, Box3<T>> for Triangle3D<T> {
  #[inline(always)]
  fn to_bounding(&self) -> Box3<T> {
    self.iter_point().collect()
  }
}

impl<T: Scalar> SpaceBounding<T, Box3<T>> for Box3<T> {
  #[inline(always)]
  fn to_bounding(&self) -> Box3<T> {
    *self
  }
}

#[test]
fn triangle_bounding() {
  let t: Triangle3D = Triangle::new(
    Vec3::new(0., 2., 0.),
    Vec3::new(1., 0., -1.),
    Vec3::new(-1., 1., 3.),
  );
  let b = t.to_bounding();
  assert_eq!(b.min, Vec3::new(-1., 0., -1.));
  assert_eq!(b.max, Vec3::new(1., 2., 3.));
}
