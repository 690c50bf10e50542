use std::ops::*;

use serde::{Deserialize, Serialize};

use crate::*;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3<T> {
  pub x: T,
  pub y: T,
  pub z: T,
}

unsafe impl<T: bytemuck::Zeroable> bytemuck::Zeroable for Vec3<T> {}
unsafe impl<T: bytemuck::Pod> bytemuck::Pod for Vec3<T> {}

impl<T> Vec3<T> {
  #[inline(always)]
  pub const fn new(x: T, y: T, z: T) -> Self {
    Self { x, y, z }
  }
}

impl<T: Scalar> Vector<T> for Vec3<T> {
  #[inline]
  fn create<F>(f: F) -> Self
  where
    F: Fn() -> T,
  {
    Self::new(f(), f(), f())
  }

  #[inline]
  fn map<F>(self, f: F) -> Self
  where
    F: Fn(T) -> T,
  {
    Self::new(f(self.x), f(self.y), f(self.z))
  }

  #[inline]
  fn zip<F>(self, v2: Self, f: F) -> Self
  where
    F: Fn(T, T) -> T,
  {
    Self::new(f(self.x, v2.x), f(self.y, v2.y), f(self.z, v2.z))
  }

  #[inline]
  fn dot(&self, b: Self) -> T {
    self.x * b.x + self.y * b.y + self.z * b.z
  }
}

impl<T: Scalar> Vec3<T> {
  #[inline]
  pub fn cross(&self, b: Self) -> Self {
    Self {
      x: self.y * b.z - self.z * b.y,
      y: self.z * b.x - self.x * b.z,
      z: self.x * b.y - self.y * b.x,
    }
  }

  #[inline]
  pub fn channel_sum(self) -> T {
    self.x + self.y + self.z
  }
}

impl<T> Index<usize> for Vec3<T> {
  type Output = T;

  #[inline]
  fn index(&self, index: usize) -> &T {
    match index {
      0 => &self.x,
      1 => &self.y,
      2 => &self.z,
      _ => panic!("Vec3 index out of range: {index}"),
    }
  }
}

impl<T> IndexMut<usize> for Vec3<T> {
  #[inline]
  fn index_mut(&mut self, index: usize) -> &mut T {
    match index {
      0 => &mut self.x,
      1 => &mut self.y,
      2 => &mut self.z,
      _ => panic!("Vec3 index out of range: {index}"),
    }
  }
}

impl<T: Scalar> Add for Vec3<T> {
  type Output = Self;
  #[inline]
  fn add(self, rhs: Self) -> Self {
    self.zip(rhs, |a, b| a + b)
  }
}

impl<T: Scalar> Sub for Vec3<T> {
  type Output = Self;
  #[inline]
  fn sub(self, rhs: Self) -> Self {
    self.zip(rhs, |a, b| a - b)
  }
}

impl<T: Scalar> Neg for Vec3<T> {
  type Output = Self;
  #[inline]
  fn neg(self) -> Self {
    self.map(|v| -v)
  }
}

impl<T: Scalar> Mul<T> for Vec3<T> {
  type Output = Self;
  #[inline]
  fn mul(self, rhs: T) -> Self {
    self.map(|v| v * rhs)
  }
}

impl<T: Scalar> Div<T> for Vec3<T> {
  type Output = Self;
  #[inline]
  fn div(self, rhs: T) -> Self {
    self.map(|v| v / rhs)
  }
}

impl<T: Scalar> AddAssign for Vec3<T> {
  #[inline]
  fn add_assign(&mut self, rhs: Self) {
    *self = *self + rhs;
  }
}

impl<T> From<[T; 3]> for Vec3<T> {
  #[inline]
  fn from(v: [T; 3]) -> Self {
    let [x, y, z] = v;
    Self { x, y, z }
  }
}

impl<T> From<Vec3<T>> for [T; 3] {
  #[inline]
  fn from(v: Vec3<T>) -> Self {
    [v.x, v.y, v.z]
  }
}

#[test]
fn vec3_basic_ops() {
  let a = Vec3::new(1., 0., 0.);
  let b = Vec3::new(0., 1., 0.);
  assert_eq!(a.cross(b), Vec3::new(0., 0., 1.));
  assert_eq!(a.dot(b), 0.);
  assert_eq!((a + b) * 2., Vec3::new(2., 2., 0.));
  assert_eq!(Vec3::new(3., 4., 0.).length(), 5.);
  assert_eq!(Vec3::<f32>::zero().normalize(), Vec3::zero());
  assert_eq!(a.min(b), Vec3::zero());
  assert_eq!(Vec3::new(1., 2., 3.)[2], 3.);
}
