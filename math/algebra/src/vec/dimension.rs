use crate::*;

// this trait abstract for ops on vector
pub trait Vector<T: Scalar>: Copy {
  fn create<F>(f: F) -> Self
  where
    F: Fn() -> T;

  /// Perform the given operation on each field in the vector, returning a new point
  /// constructed from the operations.
  #[must_use]
  fn map<F>(self, f: F) -> Self
  where
    F: Fn(T) -> T;

  /// Construct a new vector where each component is the result of
  /// applying the given operation to each pair of components of the
  /// given vectors.
  #[must_use]
  fn zip<F>(self, v2: Self, f: F) -> Self
  where
    F: Fn(T, T) -> T;

  fn dot(&self, b: Self) -> T;

  #[inline]
  #[must_use]
  fn zero() -> Self {
    Self::create(|| T::zero())
  }
  #[inline]
  #[must_use]
  fn splat(v: T) -> Self {
    Self::create(|| v)
  }

  #[inline]
  fn min(self, rhs: Self) -> Self {
    self.zip(rhs, |a, b| a.min(b))
  }
  #[inline]
  fn max(self, rhs: Self) -> Self {
    self.zip(rhs, |a, b| a.max(b))
  }

  #[inline]
  fn length2(&self) -> T {
    self.dot(*self)
  }
  #[inline]
  fn length(&self) -> T {
    self.length2().sqrt()
  }

  /// return self when the length is zero, avoid producing nan
  #[inline]
  #[must_use]
  fn normalize(&self) -> Self {
    let len = self.length();
    if len == T::zero() {
      return *self;
    }
    let inv = len.recip();
    self.map(|c| c * inv)
  }
}
