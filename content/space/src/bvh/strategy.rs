use std::{collections::VecDeque, iter::FromIterator, ops::Range};

use rendiation_algebra::*;
use rendiation_geometry::*;
use serde::{Deserialize, Serialize};

use super::*;

pub const SAH_BUCKET_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)] // any missing field will be set to the struct's default
pub struct BvhBuildOption {
  /// nodes holding at most this many shapes are never split
  pub shapes_per_node: usize,
}

impl Default for BvhBuildOption {
  fn default() -> Self {
    Self { shapes_per_node: 8 }
  }
}

/// Builds a [`PackedBvh`] over a list of boxes, one box per shape. Shape `i` is proxy `i`.
///
/// Nodes are split breadth first from a work queue. Each split is either a binned
/// surface area heuristic split along the dominant centroid axis, or a median split when
/// the shapes are larger than they are spread out. A split is only committed when it
/// strictly lowers `surface_area * count`.
pub struct SahBvhBuilder<'a> {
  shapes: &'a [Box3],
  shapes_per_node: usize,
  centers: Vec<Vec3<f32>>,
  proxies: Vec<u32>,
  nodes: Vec<PackedBvhNode>,
  pre_partition: [SAHPrePartitionCache; SAH_BUCKET_COUNT],
}

#[derive(Clone, Debug)]
struct SAHPrePartitionCache {
  bounding: Box3,
  primitive_bucket: Vec<u32>,
}

impl Default for SAHPrePartitionCache {
  fn default() -> Self {
    Self {
      bounding: Box3::empty(),
      primitive_bucket: Vec::new(),
    }
  }
}

impl SAHPrePartitionCache {
  fn reset(&mut self) {
    self.primitive_bucket.clear();
    self.bounding = Box3::empty();
  }
  fn set_primitive(&mut self, bounding: &Box3, index: u32) {
    self.bounding.expand_by_box(*bounding);
    self.primitive_bucket.push(index);
  }
}

#[derive(Clone, Debug)]
struct SAHPartitionGroup {
  bounding: Box3,
  primitive_count: usize,
}

impl SAHPartitionGroup {
  fn cost(&self) -> f32 {
    self.bounding.surface_area() * self.primitive_count as f32
  }
}

impl<'a> FromIterator<&'a SAHPrePartitionCache> for SAHPartitionGroup {
  fn from_iter<I: IntoIterator<Item = &'a SAHPrePartitionCache>>(items: I) -> Self {
    let mut primitive_count = 0;
    let bounding = items
      .into_iter()
      .map(|p| {
        primitive_count += p.primitive_bucket.len();
        p.bounding
      })
      .collect();
    Self {
      bounding,
      primitive_count,
    }
  }
}

struct PartitionSide {
  bounding: Box3,
  range: Range<usize>,
}

impl PartitionSide {
  fn cost(&self) -> f32 {
    self.bounding.surface_area() * self.range.len() as f32
  }
}

impl<'a> SahBvhBuilder<'a> {
  /// `shapes_per_node` below one is treated as one.
  pub fn new(shapes: &'a [Box3], shapes_per_node: usize) -> Self {
    Self {
      shapes,
      shapes_per_node: shapes_per_node.max(1),
      centers: shapes.iter().map(|b| b.center()).collect(),
      proxies: (0..shapes.len() as u32).collect(),
      nodes: Vec::new(),
      pre_partition: Default::default(),
    }
  }

  pub fn with_option(shapes: &'a [Box3], option: &BvhBuildOption) -> Self {
    Self::new(shapes, option.shapes_per_node)
  }

  pub fn build(mut self) -> PackedBvh {
    let shape_count = self.shapes.len();
    let root_bbox: Box3 = self.shapes.iter().collect();
    self.nodes.push(PackedBvhNode::new_leaf(root_bbox, 0..shape_count));

    let mut queue = VecDeque::from([0_usize]);
    while let Some(node_index) = queue.pop_front() {
      let node = self.nodes[node_index];
      let Some(range) = node.proxy_range() else {
        continue;
      };

      if range.len() > self.shapes_per_node {
        if let Some((left, right)) = self.partition(range.clone()) {
          let original_cost = node.bounding.surface_area() * range.len() as f32;
          if left.cost() + right.cost() < original_cost {
            let left_index = self.nodes.len();
            self
              .nodes
              .push(PackedBvhNode::new_leaf(left.bounding, left.range));
            self
              .nodes
              .push(PackedBvhNode::new_leaf(right.bounding, right.range));
            self.nodes[node_index] = PackedBvhNode::new_internal(
              node.bounding,
              left_index as u32,
              left_index as u32 + 1,
            );
            queue.push_back(left_index);
            queue.push_back(left_index + 1);
            continue;
          }
        }
      }

      // final leaf, sorted for access locality
      self.proxies[range].sort_unstable();
    }

    let bvh = PackedBvh::new_unchecked(self.nodes, self.proxies);
    let statistic = bvh.statistics();
    log::debug!(
      "sah bvh built: {} shapes, {} nodes, {} leaves, max depth {}, max leaf size {}",
      shape_count,
      statistic.node_count,
      statistic.leaf_count,
      statistic.max_depth,
      statistic.max_leaf_size,
    );
    bvh
  }

  fn partition(&mut self, range: Range<usize>) -> Option<(PartitionSide, PartitionSide)> {
    let count = range.len();
    let mut centroid_bounds = Box3::empty();
    let mut extents_sum = Vec3::zero();
    for &index in &self.proxies[range.clone()] {
      centroid_bounds.expand_by_point(self.centers[index as usize]);
      extents_sum += self.shapes[index as usize].half_size();
    }
    let average_extents = extents_sum / count as f32;

    // shapes are larger than they are spread out, binning would be unreliable
    if centroid_bounds.half_size().channel_sum() < average_extents.channel_sum() * 2. {
      return Some(self.median_partition(range));
    }
    self.sah_partition(range, &centroid_bounds)
  }

  /// halves the node in its current proxy order
  fn median_partition(&self, range: Range<usize>) -> (PartitionSide, PartitionSide) {
    let middle = range.start + range.len() / 2;
    let side = |range: Range<usize>| PartitionSide {
      bounding: self.proxies[range.clone()]
        .iter()
        .map(|&index| self.shapes[index as usize])
        .collect(),
      range,
    };
    (side(range.start..middle), side(middle..range.end))
  }

  fn sah_partition(
    &mut self,
    range: Range<usize>,
    centroid_bounds: &Box3,
  ) -> Option<(PartitionSide, PartitionSide)> {
    // step 1, bin every shape by its centroid along the dominant axis
    self.pre_partition.iter_mut().for_each(|p| p.reset());
    let (axis, extent) = centroid_bounds.longest_axis();
    let axis = axis.index();
    let axis_start = centroid_bounds.min[axis];

    for &index in &self.proxies[range.clone()] {
      let center = self.centers[index as usize][axis];
      let which_partition = if extent > 0. {
        ((center - axis_start) / extent * SAH_BUCKET_COUNT as f32) as usize
      } else {
        0
      };
      // the max end lands one past the last bucket
      let which_partition = which_partition.min(SAH_BUCKET_COUNT - 1);
      self.pre_partition[which_partition].set_primitive(&self.shapes[index as usize], index);
    }

    // step 2, find best partition
    let mut best: Option<(usize, SAHPartitionGroup, SAHPartitionGroup, f32)> = None;
    for split in 1..SAH_BUCKET_COUNT {
      let (left, right) = self.pre_partition.split_at(split);
      let left: SAHPartitionGroup = left.iter().collect();
      let right: SAHPartitionGroup = right.iter().collect();
      if left.primitive_count == 0 || right.primitive_count == 0 {
        continue;
      }
      let cost = left.cost() + right.cost();
      if best.as_ref().map_or(true, |(_, _, _, best_cost)| cost < *best_cost) {
        best = Some((split, left, right, cost));
      }
    }
    let (split, left, right, _) = best?;

    // step 3, scatter bucket members so each side is contiguous
    let mut ptr = range.start;
    let (left_buckets, right_buckets) = self.pre_partition.split_at(split);
    for bucket in left_buckets {
      for &index in &bucket.primitive_bucket {
        self.proxies[ptr] = index;
        ptr += 1;
      }
    }
    let middle = ptr;
    for bucket in right_buckets {
      for &index in &bucket.primitive_bucket {
        self.proxies[ptr] = index;
        ptr += 1;
      }
    }
    debug_assert_eq!(ptr, range.end);
    debug_assert_eq!(middle - range.start, left.primitive_count);

    Some((
      PartitionSide {
        bounding: left.bounding,
        range: range.start..middle,
      },
      PartitionSide {
        bounding: right.bounding,
        range: middle..range.end,
      },
    ))
  }
}

/// convenience over [`SahBvhBuilder`]
pub fn bvh_build(shapes: &[Box3], option: &BvhBuildOption) -> PackedBvh {
  SahBvhBuilder::with_option(shapes, option).build()
}
