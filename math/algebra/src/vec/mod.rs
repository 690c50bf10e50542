mod dimension;
mod vec3;

pub use dimension::*;
pub use vec3::*;
