#[macro_use]
mod intersection;
mod dimension3;

pub use dimension3::*;
pub use intersection::*;
use rendiation_algebra::*;

/// the entity that can compute a bounding volume of type `B` enclosing itself
pub trait SpaceBounding<T: Scalar, B> {
  fn to_bounding(&self) -> B;
}
