mod io;
mod node;
mod strategy;
mod traverse;

#[cfg(test)]
mod test;

pub use io::*;
pub use node::*;
use rendiation_geometry::Box3;
pub use strategy::*;
pub use traverse::*;

/// Why a node/proxy table pair does not form a well shaped tree.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptReason {
  #[error("unexpected end of stream")]
  Truncated,
  #[error("negative {what} count {count}")]
  NegativeCount { what: &'static str, count: i32 },
  #[error("malformed variable length integer")]
  MalformedVarInt,
  #[error("{0} trailing bytes after the index")]
  TrailingBytes(usize),
  #[error("node table is empty")]
  MissingRoot,
  #[error("node {node} has invalid child {child}")]
  InvalidChild { node: u32, child: u32 },
  #[error("node {node} is referenced by more than one parent")]
  SharedNode { node: u32 },
  #[error("node {node} is not reachable from the root")]
  UnreachableNode { node: u32 },
  #[error("leaf {node} proxy range {start}..{end} exceeds proxy table length {len}")]
  LeafRangeOutOfBounds {
    node: u32,
    start: u64,
    end: u64,
    len: usize,
  },
  #[error("proxy slot {slot} is not covered by exactly one leaf")]
  ProxySlotCoverage { slot: usize },
  #[error("proxy table is not a permutation, bad entry {proxy}")]
  ProxyNotPermutation { proxy: u32 },
  #[error("{0}")]
  Content(String),
}

/// The immutable flattened tree. Node 0 is the root, leaves reference contiguous
/// slices of the proxy table, and the proxy table is a permutation of the shape ids.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedBvh {
  nodes: Vec<PackedBvhNode>,
  proxies: Vec<u32>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BvhStatistic {
  pub node_count: usize,
  pub leaf_count: usize,
  pub max_depth: usize,
  pub max_leaf_size: usize,
}

impl PackedBvh {
  pub(crate) fn new_unchecked(nodes: Vec<PackedBvhNode>, proxies: Vec<u32>) -> Self {
    debug_assert!(!nodes.is_empty());
    Self { nodes, proxies }
  }

  /// Assemble a tree from raw tables, rejecting anything that breaks the tree invariants.
  pub fn from_parts(nodes: Vec<PackedBvhNode>, proxies: Vec<u32>) -> Result<Self, CorruptReason> {
    let bvh = Self { nodes, proxies };
    bvh.validate()?;
    Ok(bvh)
  }

  pub fn nodes(&self) -> &[PackedBvhNode] {
    &self.nodes
  }

  pub fn node(&self, index: u32) -> &PackedBvhNode {
    &self.nodes[index as usize]
  }

  pub fn root(&self) -> &PackedBvhNode {
    &self.nodes[0]
  }

  pub fn bounding(&self) -> Box3 {
    self.root().bounding
  }

  pub fn proxies(&self) -> &[u32] {
    &self.proxies
  }

  /// the proxy ids owned by a leaf, empty for internal nodes
  pub fn node_proxies(&self, node: &PackedBvhNode) -> &[u32] {
    node
      .proxy_range()
      .and_then(|range| self.proxies.get(range))
      .unwrap_or(&[])
  }

  pub fn shape_count(&self) -> usize {
    self.proxies.len()
  }

  /// Check the structural invariants: every non root node has exactly one parent which
  /// precedes it, leaves cover every proxy slot exactly once, and the proxy table is a
  /// permutation of `0..shape_count`.
  pub fn validate(&self) -> Result<(), CorruptReason> {
    let node_count = self.nodes.len();
    if node_count == 0 {
      return Err(CorruptReason::MissingRoot);
    }
    let proxy_count = self.proxies.len();

    let mut has_parent = vec![false; node_count];
    let mut slot_covered = vec![false; proxy_count];

    for (index, node) in self.nodes.iter().enumerate() {
      let index = index as u32;
      match node.kind {
        PackedBvhNodeKind::Internal { left, right } => {
          for child in [left, right] {
            if child as usize >= node_count || child <= index {
              return Err(CorruptReason::InvalidChild { node: index, child });
            }
            if std::mem::replace(&mut has_parent[child as usize], true) {
              return Err(CorruptReason::SharedNode { node: child });
            }
          }
        }
        PackedBvhNodeKind::Leaf {
          first_proxy,
          proxy_count: count,
        } => {
          let start = first_proxy as u64;
          let end = start + count as u64;
          if end > proxy_count as u64 {
            return Err(CorruptReason::LeafRangeOutOfBounds {
              node: index,
              start,
              end,
              len: proxy_count,
            });
          }
          for slot in start as usize..end as usize {
            if std::mem::replace(&mut slot_covered[slot], true) {
              return Err(CorruptReason::ProxySlotCoverage { slot });
            }
          }
        }
      }
    }

    // children always come after their parent, so a single parent per node means
    // every node hangs off the root
    if let Some(node) = has_parent.iter().skip(1).position(|p| !p) {
      return Err(CorruptReason::UnreachableNode {
        node: node as u32 + 1,
      });
    }

    if let Some(slot) = slot_covered.iter().position(|c| !c) {
      return Err(CorruptReason::ProxySlotCoverage { slot });
    }

    let mut seen = vec![false; proxy_count];
    for &proxy in &self.proxies {
      match seen.get_mut(proxy as usize) {
        Some(flag) if !*flag => *flag = true,
        _ => return Err(CorruptReason::ProxyNotPermutation { proxy }),
      }
    }

    Ok(())
  }

  /// Depth first walk. `branch_enter_visitor` decides if an internal node's children
  /// are visited, `leaf_visitor` returns false to stop the whole traversal.
  pub fn traverse(
    &self,
    mut branch_enter_visitor: impl FnMut(&PackedBvhNode) -> bool,
    mut leaf_visitor: impl FnMut(&PackedBvhNode, &[u32]) -> bool,
  ) {
    let mut stack = vec![0];
    while let Some(index) = stack.pop() {
      let node = self.node(index);
      match node.children() {
        Some((left, right)) => {
          if branch_enter_visitor(node) {
            stack.push(right);
            stack.push(left);
          }
        }
        None => {
          if !leaf_visitor(node, self.node_proxies(node)) {
            return;
          }
        }
      }
    }
  }

  /// Visit every node box with its depth, root is depth 0. Used for debug export.
  pub fn for_each_node_box(&self, mut visitor: impl FnMut(u32, &Box3, usize)) {
    let mut stack = vec![(0, 0)];
    while let Some((index, depth)) = stack.pop() {
      let node = self.node(index);
      visitor(index, &node.bounding, depth);
      if let Some((left, right)) = node.children() {
        stack.push((right, depth + 1));
        stack.push((left, depth + 1));
      }
    }
  }

  pub fn statistics(&self) -> BvhStatistic {
    let mut statistic = BvhStatistic {
      node_count: self.nodes.len(),
      ..Default::default()
    };
    self.for_each_node_box(|index, _, depth| {
      statistic.max_depth = statistic.max_depth.max(depth);
      if let Some(range) = self.node(index).proxy_range() {
        statistic.leaf_count += 1;
        statistic.max_leaf_size = statistic.max_leaf_size.max(range.len());
      }
    });
    statistic
  }
}
