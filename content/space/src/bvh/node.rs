use std::ops::Range;

use rendiation_geometry::Box3;

/// A node either owns a contiguous slice of the proxy table or two children.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PackedBvhNodeKind {
  Leaf { first_proxy: u32, proxy_count: u32 },
  Internal { left: u32, right: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PackedBvhNode {
  pub bounding: Box3,
  pub kind: PackedBvhNodeKind,
}

impl PackedBvhNode {
  pub fn new_leaf(bounding: Box3, proxy_range: Range<usize>) -> Self {
    Self {
      bounding,
      kind: PackedBvhNodeKind::Leaf {
        first_proxy: proxy_range.start as u32,
        proxy_count: proxy_range.len() as u32,
      },
    }
  }

  pub fn new_internal(bounding: Box3, left: u32, right: u32) -> Self {
    Self {
      bounding,
      kind: PackedBvhNodeKind::Internal { left, right },
    }
  }

  pub fn proxy_range(&self) -> Option<Range<usize>> {
    match self.kind {
      PackedBvhNodeKind::Leaf {
        first_proxy,
        proxy_count,
      } => {
        let start = first_proxy as usize;
        Some(start..start + proxy_count as usize)
      }
      PackedBvhNodeKind::Internal { .. } => None,
    }
  }

  pub fn children(&self) -> Option<(u32, u32)> {
    match self.kind {
      PackedBvhNodeKind::Internal { left, right } => Some((left, right)),
      PackedBvhNodeKind::Leaf { .. } => None,
    }
  }
}
