use crate::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshSection {
  pub name: String,
  /// offset into the owning part's index buffer
  pub start_index: u32,
  pub index_count: u32,
}

/// A run of triangles sharing one material.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeshPart {
  pub material: String,
  pub indices: Vec<u32>,
  pub sections: Vec<MeshSection>,
}

/// What the asset pipeline hands over: one vertex position buffer shared by every
/// part, and optional per vertex normals used to fix up unknown winding.
#[derive(Debug, Clone, Default)]
pub struct MeshTagSource {
  pub positions: Vec<Vec3<f32>>,
  pub normals: Option<Vec<Vec3<f32>>>,
  pub parts: Vec<MeshPart>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterialBvhBuildError {
  #[error("mesh part {part} ({material}) has {count} indices, which is not a multiple of 3")]
  IndexCountNotTriangle {
    part: usize,
    material: String,
    count: usize,
  },
  #[error("mesh part {part} references vertex {index}, but only {vertex_count} vertices exist")]
  VertexIndexOutOfRange {
    part: usize,
    index: u32,
    vertex_count: usize,
  },
  #[error("{normal_count} vertex normals supplied for {vertex_count} vertices")]
  NormalCountMismatch {
    normal_count: usize,
    vertex_count: usize,
  },
  #[error("mesh has {0} triangles, more than a bvh can index")]
  TooManyTriangles(usize),
}

impl MeshSection {
  fn contains(&self, index_offset: usize) -> bool {
    let start = self.start_index as usize;
    index_offset >= start && index_offset < start + self.index_count as usize
  }
}

impl MaterialBvh {
  pub fn create(
    source: &MeshTagSource,
    shapes_per_node: usize,
  ) -> Result<Self, MaterialBvhBuildError> {
    Self::create_with_option(source, &BvhBuildOption { shapes_per_node })
  }

  pub fn create_with_option(
    source: &MeshTagSource,
    option: &BvhBuildOption,
  ) -> Result<Self, MaterialBvhBuildError> {
    let vertex_count = source.positions.len();
    if let Some(normals) = &source.normals {
      if normals.len() != vertex_count {
        return Err(MaterialBvhBuildError::NormalCountMismatch {
          normal_count: normals.len(),
          vertex_count,
        });
      }
    }

    let mut strings = ValueInterning::<String>::default();
    let mut triangles = Vec::new();

    for (part_index, part) in source.parts.iter().enumerate() {
      if part.indices.len() % 3 != 0 {
        return Err(MaterialBvhBuildError::IndexCountNotTriangle {
          part: part_index,
          material: part.material.clone(),
          count: part.indices.len(),
        });
      }
      if let Some(&index) = part.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(MaterialBvhBuildError::VertexIndexOutOfRange {
          part: part_index,
          index,
          vertex_count,
        });
      }

      let material = strings.compute_intern_id(part.material.as_str());
      for (triangle_index, abc) in part.indices.chunks_exact(3).enumerate() {
        let index_offset = triangle_index * 3;
        let section_name = part
          .sections
          .iter()
          .find(|s| s.contains(index_offset))
          .map_or("", |s| s.name.as_str());
        let section = strings.compute_intern_id(section_name);

        let [a, b, c] = [abc[0], abc[1], abc[2]].map(|i| i as usize);
        let desired_normal = source
          .normals
          .as_ref()
          .map(|normals| normals[a] + normals[b] + normals[c]);
        let triangle = Triangle3D::new_facing(
          source.positions[a],
          source.positions[b],
          source.positions[c],
          desired_normal,
        );

        triangles.push(TriangleData {
          triangle,
          section,
          material,
        });
      }
    }

    if u32::try_from(triangles.len()).is_err() {
      return Err(MaterialBvhBuildError::TooManyTriangles(triangles.len()));
    }

    let boxes: Vec<Box3> = triangles.iter().map(|t| t.triangle.to_bounding()).collect();
    let bvh = SahBvhBuilder::with_option(&boxes, option).build();

    log::debug!(
      "material bvh created: {} parts, {} triangles, {} distinct names",
      source.parts.len(),
      triangles.len(),
      strings.len()
    );

    Ok(Self::from_parts(bvh, triangles, strings))
  }

  pub(crate) fn from_parts(
    bvh: PackedBvh,
    triangles: Vec<TriangleData>,
    strings: ValueInterning<String>,
  ) -> Self {
    debug_assert_eq!(bvh.shape_count(), triangles.len());
    Self {
      bvh,
      triangles,
      strings,
    }
  }
}
