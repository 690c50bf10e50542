mod scalar;
mod vec;

pub use num_traits::{Float, One, Zero};
pub use scalar::*;
pub use vec::*;
