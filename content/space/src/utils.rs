use rendiation_algebra::Vec3;
use rendiation_geometry::Box3;

/// Deterministic random boxes, used by tests and benches.
pub fn generate_boxes_in_space(count: usize, space_size: f32, box_size: f32) -> Vec<Box3> {
  use rand::prelude::*;
  use rand_chacha::ChaCha8Rng;

  const SEED: u64 = 0x6246A426A2424AC + 0x1;
  let mut rng = ChaCha8Rng::seed_from_u64(SEED);
  let mut random = || rng.gen::<f32>();

  (0..count)
    .map(|_| {
      let center = Vec3::new(random(), random(), random()) * space_size;
      let half_size = Vec3::new(random(), random(), random()) * box_size;
      Box3::new(center - half_size, center + half_size)
    })
    .collect()
}
