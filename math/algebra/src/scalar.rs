use std::fmt::Debug;

use num_traits::Float;

pub trait Scalar: Float + Debug + Default + Send + Sync + 'static {
  #[inline(always)]
  fn half() -> Self {
    Self::two().recip()
  }

  #[inline(always)]
  fn two() -> Self {
    Self::one() + Self::one()
  }
}

impl Scalar for f32 {}

impl Scalar for f64 {}
