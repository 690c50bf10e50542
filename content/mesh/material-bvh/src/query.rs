use crate::*;

/// Slack on the pruning distance. A node's slab entry distance may round a few ulps
/// above the triangle distance of a shape inside it, the winner is still picked by
/// exact comparison.
const PRUNE_TOLERANCE: f32 = 1e-5;

/// The nearest tagged triangle along a ray. Names borrow from the owning [`MaterialBvh`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialHit<'a> {
  pub section: &'a str,
  pub material: &'a str,
  pub distance: f32,
  pub triangle: u32,
}

impl MaterialBvh {
  fn triangle_test(&self) -> impl Fn(u32, &Ray3) -> Option<f32> + '_ {
    move |id: u32, ray: &Ray3| self.triangles[id as usize].triangle.intersect(ray, &())
  }

  fn to_hit(&self, hit: ProxyHit) -> MaterialHit<'_> {
    let data = &self.triangles[hit.proxy as usize];
    MaterialHit {
      section: self.string(data.section),
      material: self.string(data.material),
      distance: hit.distance,
      triangle: hit.proxy,
    }
  }

  /// Nearest triangle hit by the ray, both faces count. Equally near hits resolve to
  /// the lower triangle id so the answer does not depend on tree shape.
  pub fn ray_cast(&self, ray: &Ray3) -> Option<MaterialHit<'_>> {
    let mut traversal = self.bvh.intersect_ray_ordered(*ray, self.triangle_test());
    let mut best: Option<ProxyHit> = None;

    // once a hit is known, anything queued further away can not win
    let limit = |best: Option<ProxyHit>| {
      best.map_or(f32::INFINITY, |b| b.distance + b.distance.abs() * PRUNE_TOLERANCE)
    };
    while let Some(hit) = traversal.next_within(limit(best)) {
      let closer = match best {
        None => true,
        Some(best) => {
          hit.distance < best.distance || (hit.distance == best.distance && hit.proxy < best.proxy)
        }
      };
      if closer {
        best = Some(hit);
      }
    }

    best.map(|hit| self.to_hit(hit))
  }

  /// If anything is hit within `max_distance`. Stops at the first hit found.
  pub fn ray_cast_any(&self, ray: &Ray3, max_distance: f32) -> bool {
    self
      .bvh
      .intersect_ray_unordered(*ray, self.triangle_test())
      .with_max_distance(max_distance)
      .next()
      .is_some()
  }

  /// Every hit along the ray, nearest first.
  pub fn ray_cast_all(&self, ray: &Ray3) -> Vec<MaterialHit<'_>> {
    self
      .bvh
      .intersect_ray_ordered(*ray, self.triangle_test())
      .map(|hit| self.to_hit(hit))
      .collect()
  }
}
