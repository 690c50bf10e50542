//! Triangle index of a mesh tagged by the section and material that own each triangle,
//! answering "which named part does this ray hit first".

mod build;
mod io;
mod query;


pub use build::*;
use interning::*;
pub use query::*;
use rendiation_algebra::*;
use rendiation_geometry::*;
pub use rendiation_space_algorithm::bvh::{BvhBuildOption, BvhIoError, CorruptReason};
use rendiation_space_algorithm::bvh::*;

/// One triangle and the interned names of its section and material.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriangleData {
  pub triangle: Triangle3D,
  pub section: InternedId<String>,
  pub material: InternedId<String>,
}

/// Immutable after creation. Triangle `i` of [`MaterialBvh::get_triangle`] is always
/// proxy `i` of the inner bvh.
pub struct MaterialBvh {
  bvh: PackedBvh,
  triangles: Vec<TriangleData>,
  strings: ValueInterning<String>,
}

impl std::fmt::Debug for MaterialBvh {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MaterialBvh")
      .field("triangle_count", &self.triangles.len())
      .field("strings", &self.strings)
      .field("bvh", &self.bvh.statistics())
      .finish()
  }
}

impl MaterialBvh {
  pub fn bvh(&self) -> &PackedBvh {
    &self.bvh
  }

  pub fn triangle_count(&self) -> usize {
    self.triangles.len()
  }

  /// `id` should come from a traversal of this same instance, panics when out of range
  pub fn get_triangle(&self, id: u32) -> &Triangle3D {
    &self.triangles[id as usize].triangle
  }

  pub fn triangle_data(&self, id: u32) -> Option<&TriangleData> {
    self.triangles.get(id as usize)
  }

  /// the interning table in id order
  pub fn strings(&self) -> &[String] {
    self.strings.values()
  }

  pub fn section_of(&self, id: u32) -> Option<&str> {
    self.triangle_data(id).map(|t| self.string(t.section))
  }

  pub fn material_of(&self, id: u32) -> Option<&str> {
    self.triangle_data(id).map(|t| self.string(t.material))
  }

  // ids are checked at creation and when reading, so the lookup can not miss
  fn string(&self, id: InternedId<String>) -> &str {
    self.strings.get_value(id).map_or("", String::as_str)
  }
}
