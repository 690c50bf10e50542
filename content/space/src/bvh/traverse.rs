use std::{cmp::Reverse, collections::BinaryHeap};

use ordered_float::OrderedFloat;
use rendiation_geometry::*;

use super::*;

/// Decides if a proxy is hit by the ray, returning the hit distance.
///
/// Implemented for any `Fn(u32, &Ray3) -> Option<f32>`, so a closure is the usual way
/// to plug the real shape test into a traversal. The traversals are generic over this
/// so the test is inlined into the loop.
pub trait ProxyRayTest {
  fn test(&self, proxy: u32, ray: &Ray3) -> Option<f32>;
}

impl<F> ProxyRayTest for F
where
  F: Fn(u32, &Ray3) -> Option<f32>,
{
  #[inline(always)]
  fn test(&self, proxy: u32, ray: &Ray3) -> Option<f32> {
    self(proxy, ray)
  }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProxyHit {
  pub proxy: u32,
  pub distance: f32,
}

impl PackedBvh {
  /// Yields proxy hits strictly nearest first.
  pub fn intersect_ray_ordered<T: ProxyRayTest>(
    &self,
    ray: Ray3,
    test: T,
  ) -> OrderedRayTraversal<'_, T> {
    let mut traversal = OrderedRayTraversal {
      bvh: self,
      ray,
      test,
      queue: BinaryHeap::new(),
      max_distance: f32::INFINITY,
    };
    if let Some(distance) = self.root().bounding.intersect(&ray, &()) {
      traversal.push(distance, QueueItemKind::Node, 0);
    }
    traversal
  }

  /// Yields proxy hits roughly nearest first, with no ordering guarantee. Cheaper than
  /// [`PackedBvh::intersect_ray_ordered`]; suitable for any-hit queries or callers
  /// that keep their own running minimum.
  pub fn intersect_ray_unordered<T: ProxyRayTest>(
    &self,
    ray: Ray3,
    test: T,
  ) -> UnorderedRayTraversal<'_, T> {
    let mut stack = Vec::new();
    if let Some(distance) = self.root().bounding.intersect(&ray, &()) {
      stack.push(StackItem::Node { index: 0, distance });
    }
    UnorderedRayTraversal {
      bvh: self,
      ray,
      test,
      stack,
      max_distance: f32::INFINITY,
    }
  }

  /// Yields the id of every node whose box is hit by the ray, near child first.
  /// Diagnostic walk, no proxy is tested.
  pub fn intersect_ray_nodes(&self, ray: Ray3) -> RayNodeTraversal<'_> {
    let mut stack = Vec::new();
    if self.root().bounding.intersect(&ray, &()).is_some() {
      stack.push(0);
    }
    RayNodeTraversal {
      bvh: self,
      ray,
      stack,
    }
  }

  /// both children boxes tested against the ray, nearer hit first
  #[inline]
  fn hit_children(&self, ray: &Ray3, left: u32, right: u32) -> [Option<(u32, f32)>; 2] {
    let hit = |index: u32| {
      self
        .node(index)
        .bounding
        .intersect(ray, &())
        .map(|d| (index, d))
    };
    let (l, r) = (hit(left), hit(right));
    match (l, r) {
      (Some((_, ld)), Some((_, rd))) if rd < ld => [r, l],
      _ => [l, r],
    }
  }
}

// proxies sort before nodes of equal distance
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum QueueItemKind {
  Proxy,
  Node,
}

type QueueKey = (OrderedFloat<f32>, QueueItemKind, u32);

pub struct OrderedRayTraversal<'a, T> {
  bvh: &'a PackedBvh,
  ray: Ray3,
  test: T,
  queue: BinaryHeap<Reverse<QueueKey>>,
  max_distance: f32,
}

impl<'a, T: ProxyRayTest> OrderedRayTraversal<'a, T> {
  /// Never yield, and never expand into, anything farther than `max_distance`.
  #[must_use]
  pub fn with_max_distance(mut self, max_distance: f32) -> Self {
    self.max_distance = max_distance;
    self.queue.retain(|Reverse((d, _, _))| d.0 <= max_distance);
    self
  }

  /// The smallest distance still queued, which bounds every result yet to come.
  pub fn peek_distance(&self) -> Option<f32> {
    self.queue.peek().map(|Reverse((d, _, _))| d.0)
  }

  /// Like `next`, but returns None without consuming anything once the nearest queued
  /// candidate is farther than `limit`. Later calls with a larger limit resume.
  pub fn next_within(&mut self, limit: f32) -> Option<ProxyHit> {
    let limit = limit.min(self.max_distance);
    loop {
      let &Reverse((distance, kind, index)) = self.queue.peek()?;
      if distance.0 > limit {
        return None;
      }
      self.queue.pop();
      match kind {
        QueueItemKind::Proxy => {
          return Some(ProxyHit {
            proxy: index,
            distance: distance.0,
          })
        }
        QueueItemKind::Node => self.expand(index),
      }
    }
  }

  fn expand(&mut self, index: u32) {
    let bvh = self.bvh;
    let node = bvh.node(index);
    match node.children() {
      Some((left, right)) => {
        for (child, distance) in bvh.hit_children(&self.ray, left, right).into_iter().flatten() {
          self.push(distance, QueueItemKind::Node, child);
        }
      }
      None => {
        for &proxy in bvh.node_proxies(node) {
          if let Some(distance) = self.test.test(proxy, &self.ray) {
            self.push(distance, QueueItemKind::Proxy, proxy);
          }
        }
      }
    }
  }

  #[inline]
  fn push(&mut self, distance: f32, kind: QueueItemKind, index: u32) {
    if distance <= self.max_distance {
      self.queue.push(Reverse((OrderedFloat(distance), kind, index)));
    }
  }
}

impl<'a, T: ProxyRayTest> Iterator for OrderedRayTraversal<'a, T> {
  type Item = ProxyHit;

  fn next(&mut self) -> Option<ProxyHit> {
    self.next_within(self.max_distance)
  }
}

enum StackItem {
  Node { index: u32, distance: f32 },
  Hit(ProxyHit),
}

pub struct UnorderedRayTraversal<'a, T> {
  bvh: &'a PackedBvh,
  ray: Ray3,
  test: T,
  stack: Vec<StackItem>,
  max_distance: f32,
}

impl<'a, T: ProxyRayTest> UnorderedRayTraversal<'a, T> {
  /// Skip subtrees entered beyond, and hits farther than, `max_distance`.
  #[must_use]
  pub fn with_max_distance(mut self, max_distance: f32) -> Self {
    self.max_distance = max_distance;
    self
  }
}

impl<'a, T: ProxyRayTest> Iterator for UnorderedRayTraversal<'a, T> {
  type Item = ProxyHit;

  fn next(&mut self) -> Option<ProxyHit> {
    let bvh = self.bvh;
    while let Some(item) = self.stack.pop() {
      let index = match item {
        StackItem::Hit(hit) => return Some(hit),
        StackItem::Node { index, distance } if distance <= self.max_distance => index,
        StackItem::Node { .. } => continue,
      };
      let node = bvh.node(index);
      match node.children() {
        Some((left, right)) => {
          let children = bvh.hit_children(&self.ray, left, right);
          // nearer child pushed last so it is popped first
          for (child, distance) in children.into_iter().rev().flatten() {
            self.stack.push(StackItem::Node {
              index: child,
              distance,
            });
          }
        }
        None => {
          for &proxy in bvh.node_proxies(node).iter().rev() {
            if let Some(distance) = self.test.test(proxy, &self.ray) {
              if distance <= self.max_distance {
                self.stack.push(StackItem::Hit(ProxyHit { proxy, distance }));
              }
            }
          }
        }
      }
    }
    None
  }
}

pub struct RayNodeTraversal<'a> {
  bvh: &'a PackedBvh,
  ray: Ray3,
  stack: Vec<u32>,
}

impl<'a> Iterator for RayNodeTraversal<'a> {
  type Item = u32;

  fn next(&mut self) -> Option<u32> {
    let index = self.stack.pop()?;
    if let Some((left, right)) = self.bvh.node(index).children() {
      let children = self.bvh.hit_children(&self.ray, left, right);
      for (child, _) in children.into_iter().rev().flatten() {
        self.stack.push(child);
      }
    }
    Some(index)
  }
}
