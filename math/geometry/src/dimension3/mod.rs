mod bounding_impl;
mod box3;
mod ray3;
mod triangle;

pub use box3::*;
pub use ray3::*;
pub use triangle::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis3 {
  X,
  Y,
  Z,
}

impl Axis3 {
  #[inline(always)]
  pub fn index(self) -> usize {
    match self {
      Axis3::X => 0,
      Axis3::Y => 1,
      Axis3::Z => 2,
    }
  }
}
