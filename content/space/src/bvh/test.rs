use std::collections::HashSet;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rendiation_algebra::*;
use rendiation_geometry::*;

use super::*;
use crate::utils::generate_boxes_in_space;

fn build(boxes: &[Box3], shapes_per_node: usize) -> PackedBvh {
  SahBvhBuilder::new(boxes, shapes_per_node).build()
}

fn random_rays(count: usize, space_size: f32) -> Vec<Ray3> {
  let mut rng = ChaCha8Rng::seed_from_u64(42);
  let mut random = || rng.gen::<f32>();
  (0..count)
    .map(|_| {
      let origin = Vec3::new(random(), random(), random()) * space_size;
      let target = Vec3::new(random(), random(), random()) * space_size;
      Ray3::from_point_to_point(origin, target)
    })
    .collect()
}

fn box_test(boxes: &[Box3]) -> impl Fn(u32, &Ray3) -> Option<f32> + '_ {
  move |proxy, ray| boxes[proxy as usize].intersect(ray, &())
}

fn collect_leaf_proxies(bvh: &PackedBvh) -> Vec<u32> {
  let mut result = Vec::new();
  bvh.traverse(
    |_| true,
    |_, proxies| {
      result.extend_from_slice(proxies);
      true
    },
  );
  result
}

#[test]
fn leaves_cover_every_shape_once() {
  for count in [0, 1, 2, 7, 8, 9, 33, 100, 1000] {
    let boxes = generate_boxes_in_space(count, 100., 1.);
    let bvh = build(&boxes, 8);
    bvh.validate().unwrap();

    let proxies = collect_leaf_proxies(&bvh);
    assert_eq!(proxies.len(), count);
    let unique: HashSet<u32> = proxies.iter().cloned().collect();
    assert_eq!(unique.len(), count);
    assert!(proxies.iter().all(|&p| (p as usize) < count));
  }
}

#[test]
fn leaf_proxies_are_sorted() {
  let boxes = generate_boxes_in_space(500, 100., 1.);
  let bvh = build(&boxes, 4);
  bvh.traverse(
    |_| true,
    |_, proxies| {
      assert!(proxies.windows(2).all(|w| w[0] < w[1]));
      true
    },
  );
}

#[test]
fn every_ancestor_contains_its_shapes() {
  let boxes = generate_boxes_in_space(300, 50., 3.);
  let bvh = build(&boxes, 4);

  let mut stack = vec![(0_u32, Vec::<u32>::new())];
  while let Some((index, ancestors)) = stack.pop() {
    let node = bvh.node(index);
    for &ancestor in &ancestors {
      assert!(bvh.node(ancestor).bounding.contains_box(&node.bounding));
    }
    let mut ancestors = ancestors;
    ancestors.push(index);
    match node.children() {
      Some((left, right)) => {
        stack.push((left, ancestors.clone()));
        stack.push((right, ancestors));
      }
      None => {
        for &proxy in bvh.node_proxies(node) {
          for &ancestor in &ancestors {
            assert!(bvh
              .node(ancestor)
              .bounding
              .contains_box(&boxes[proxy as usize]));
          }
        }
      }
    }
  }
}

#[test]
fn empty_and_single_shape() {
  let empty = build(&[], 8);
  assert_eq!(empty.nodes().len(), 1);
  assert_eq!(
    empty.root().kind,
    PackedBvhNodeKind::Leaf {
      first_proxy: 0,
      proxy_count: 0
    }
  );
  let ray = Ray3::new(Vec3::zero(), Vec3::new(1., 0., 0.));
  assert_eq!(empty.intersect_ray_ordered(ray, |_: u32, _: &Ray3| Some(0_f32)).count(), 0);
  assert_eq!(empty.intersect_ray_unordered(ray, |_: u32, _: &Ray3| Some(0_f32)).count(), 0);

  let one = [Box3::new(Vec3::zero(), Vec3::splat(1.))];
  let single = build(&one, 1);
  assert_eq!(single.nodes().len(), 1);
  assert_eq!(single.proxies(), &[0]);
}

#[test]
fn zero_leaf_size_is_treated_as_one() {
  let boxes = generate_boxes_in_space(20, 100., 1.);
  let bvh = build(&boxes, 0);
  bvh.validate().unwrap();
  assert_eq!(collect_leaf_proxies(&bvh).len(), 20);
}

#[test]
fn flat_row_splits_into_balanced_leaves() {
  let boxes: Vec<Box3> = (0..16)
    .map(|x| {
      let min = Vec3::new(x as f32, 0., 0.);
      Box3::new(min, min + Vec3::splat(1.))
    })
    .collect();
  let bvh = build(&boxes, 4);

  let statistic = bvh.statistics();
  assert!(statistic.node_count <= 2 * 16_usize.div_ceil(4) - 1);
  assert!(statistic.max_leaf_size <= 4);
  assert_eq!(statistic.leaf_count, 4);
  assert_eq!(statistic.max_depth, 2);

  // each leaf holds a contiguous run of the row
  bvh.traverse(
    |_| true,
    |_, proxies| {
      assert_eq!(proxies.len(), 4);
      assert!(proxies.windows(2).all(|w| w[1] == w[0] + 1));
      true
    },
  );
}

#[test]
fn coincident_shapes_stay_in_one_leaf() {
  let boxes = vec![Box3::new(Vec3::splat(1.), Vec3::splat(1.)); 20];
  let bvh = build(&boxes, 4);
  assert_eq!(bvh.nodes().len(), 1);
  assert_eq!(bvh.proxies().len(), 20);
}

#[test]
fn heavily_overlapping_shapes_use_median_split() {
  // centers within a unit cube, boxes twenty units wide
  let boxes = generate_boxes_in_space(64, 1., 10.)
    .into_iter()
    .map(|b| Box3::new(b.center() - Vec3::splat(10.), b.center() + Vec3::splat(10.)))
    .collect::<Vec<_>>();
  let bvh = build(&boxes, 4);
  bvh.validate().unwrap();
  assert_eq!(collect_leaf_proxies(&bvh).len(), 64);

  let statistic = bvh.statistics();
  assert!(statistic.leaf_count > 1);
  assert!(statistic.max_leaf_size <= 4);
}

#[test]
fn unordered_traversal_visits_near_child_first() {
  let boxes = [
    Box3::new(Vec3::new(0., 0., 0.), Vec3::new(1., 1., 1.)),
    Box3::new(Vec3::new(10., 0., 0.), Vec3::new(11., 1., 1.)),
  ];
  let bvh = build(&boxes, 1);
  assert_eq!(bvh.nodes().len(), 3);
  let (left, right) = bvh.root().children().unwrap();
  assert_eq!(bvh.node_proxies(bvh.node(left)), &[0]);
  assert_eq!(bvh.node_proxies(bvh.node(right)), &[1]);

  let forward = Ray3::new(Vec3::new(-5., 0.5, 0.5), Vec3::new(1., 0., 0.));
  let backward = Ray3::new(Vec3::new(20., 0.5, 0.5), Vec3::new(-1., 0., 0.));

  let first = |ray: Ray3| {
    bvh
      .intersect_ray_unordered(ray, box_test(&boxes))
      .next()
      .map(|h| h.proxy)
  };
  assert_eq!(first(forward), Some(0));
  assert_eq!(first(backward), Some(1));

  let proxies = |ray: Ray3| {
    bvh
      .intersect_ray_unordered(ray, box_test(&boxes))
      .map(|h| h.proxy)
      .collect::<Vec<_>>()
  };
  assert_eq!(proxies(forward), vec![0, 1]);
  assert_eq!(proxies(backward), vec![1, 0]);

  let nodes = |ray: Ray3| bvh.intersect_ray_nodes(ray).collect::<Vec<_>>();
  assert_eq!(nodes(forward), vec![0, left, right]);
  assert_eq!(nodes(backward), vec![0, right, left]);
}

#[test]
fn ordered_traversal_is_monotonic_and_matches_brute_force() {
  let boxes = generate_boxes_in_space(2000, 100., 2.);
  let bvh = build(&boxes, 8);

  for ray in random_rays(200, 100.) {
    let hits: Vec<ProxyHit> = bvh.intersect_ray_ordered(ray, box_test(&boxes)).collect();
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

    let brute: Vec<(u32, f32)> = boxes
      .iter()
      .enumerate()
      .filter_map(|(i, b)| b.intersect(&ray, &()).map(|d| (i as u32, d)))
      .collect();
    assert_eq!(hits.len(), brute.len());

    let nearest = brute
      .iter()
      .map(|(_, d)| *d)
      .fold(None, |acc: Option<f32>, d| Some(acc.map_or(d, |a| a.min(d))));
    assert_eq!(hits.first().map(|h| h.distance), nearest);
  }
}

#[test]
fn unordered_traversal_finds_the_same_hits() {
  let boxes = generate_boxes_in_space(1000, 100., 2.);
  let bvh = build(&boxes, 8);

  for ray in random_rays(100, 100.) {
    let mut ordered: Vec<u32> = bvh
      .intersect_ray_ordered(ray, box_test(&boxes))
      .map(|h| h.proxy)
      .collect();
    let mut unordered: Vec<u32> = bvh
      .intersect_ray_unordered(ray, box_test(&boxes))
      .map(|h| h.proxy)
      .collect();
    ordered.sort_unstable();
    unordered.sort_unstable();
    assert_eq!(ordered, unordered);
  }
}

#[test]
fn root_miss_yields_nothing() {
  let boxes = generate_boxes_in_space(100, 10., 1.);
  let bvh = build(&boxes, 4);
  let away = Ray3::new(Vec3::splat(-100.), Vec3::new(-1., 0., 0.));
  let calls = std::cell::Cell::new(0);
  let counting = |proxy: u32, ray: &Ray3| {
    calls.set(calls.get() + 1);
    boxes[proxy as usize].intersect(ray, &())
  };
  assert!(bvh.intersect_ray_ordered(away, &counting).next().is_none());
  assert!(bvh.intersect_ray_unordered(away, &counting).next().is_none());
  assert!(bvh.intersect_ray_nodes(away).next().is_none());
  assert_eq!(calls.get(), 0);
}

#[test]
fn distance_limit_stops_without_consuming() {
  let boxes: Vec<Box3> = (0..10)
    .map(|x| {
      let min = Vec3::new(x as f32 * 2., 0., 0.);
      Box3::new(min, min + Vec3::splat(1.))
    })
    .collect();
  let bvh = build(&boxes, 2);
  let ray = Ray3::new(Vec3::new(-1., 0.5, 0.5), Vec3::new(1., 0., 0.));

  let mut traversal = bvh.intersect_ray_ordered(ray, box_test(&boxes));
  let first = traversal.next_within(5.).unwrap();
  assert_eq!(first.proxy, 0);
  assert_eq!(first.distance, 1.);
  assert_eq!(traversal.next_within(5.).unwrap().proxy, 1);
  assert_eq!(traversal.next_within(5.).unwrap().proxy, 2);
  assert!(traversal.next_within(5.).is_none());
  assert!(traversal.peek_distance().unwrap() > 5.);
  // resumes with the remaining hits
  assert_eq!(traversal.next().unwrap().proxy, 3);
  assert_eq!(traversal.count(), 6);

  let capped: Vec<u32> = bvh
    .intersect_ray_ordered(ray, box_test(&boxes))
    .with_max_distance(7.)
    .map(|h| h.proxy)
    .collect();
  assert_eq!(capped, vec![0, 1, 2, 3]);

  let mut capped_unordered: Vec<u32> = bvh
    .intersect_ray_unordered(ray, box_test(&boxes))
    .with_max_distance(7.)
    .map(|h| h.proxy)
    .collect();
  capped_unordered.sort_unstable();
  assert_eq!(capped_unordered, vec![0, 1, 2, 3]);
}

#[test]
fn node_walk_only_reports_hit_boxes() {
  let boxes = generate_boxes_in_space(500, 100., 2.);
  let bvh = build(&boxes, 4);
  for ray in random_rays(50, 100.) {
    let nodes: Vec<u32> = bvh.intersect_ray_nodes(ray).collect();
    for &index in &nodes {
      assert!(bvh.node(index).bounding.intersect(&ray, &()).is_some());
    }
    let unique: HashSet<u32> = nodes.iter().cloned().collect();
    assert_eq!(unique.len(), nodes.len());
  }
}

#[test]
fn binary_round_trip() {
  for count in [0, 1, 300] {
    let boxes = generate_boxes_in_space(count, 100., 1.);
    let bvh = build(&boxes, 4);
    let bytes = bvh.to_bytes().unwrap();
    let expected_len = 4 + bvh.nodes().len() * 32 + 4 + count * 4;
    assert_eq!(bytes.len(), expected_len);

    let restored = PackedBvh::from_bytes(&bytes).unwrap();
    assert_eq!(restored, bvh);
    assert_eq!(restored.to_bytes().unwrap(), bytes);
  }
}

#[test]
fn internal_node_encoding_is_bit_negated() {
  let boxes = generate_boxes_in_space(64, 100., 1.);
  let bvh = build(&boxes, 4);
  let (left, right) = bvh.root().children().unwrap();
  let bytes = bvh.to_bytes().unwrap();
  let field_a = i32::from_le_bytes(bytes[28..32].try_into().unwrap());
  let field_b = i32::from_le_bytes(bytes[32..36].try_into().unwrap());
  assert_eq!(field_a, !(left as i32));
  assert_eq!(field_b, !(right as i32));
}

fn assert_corrupt(bytes: &[u8]) {
  match PackedBvh::from_bytes(bytes) {
    Err(BvhIoError::CorruptIndex(_)) => {}
    other => panic!("expected corrupt index, got {other:?}"),
  }
}

#[test]
fn corrupt_streams_are_rejected() {
  let boxes = generate_boxes_in_space(40, 100., 1.);
  let bvh = build(&boxes, 4);
  let bytes = bvh.to_bytes().unwrap();

  // truncated anywhere
  for cut in [0, 3, 4, 20, bytes.len() - 1] {
    assert_corrupt(&bytes[..cut]);
  }

  // trailing garbage
  let mut trailing = bytes.clone();
  trailing.push(0);
  assert_corrupt(&trailing);

  // negative node count
  let mut negative = bytes.clone();
  negative[0..4].copy_from_slice(&(-1_i32).to_le_bytes());
  assert_corrupt(&negative);

  // root child pointing back at the root
  let mut cycle = bytes.clone();
  cycle[28..32].copy_from_slice(&(!0_i32).to_le_bytes());
  assert_corrupt(&cycle);

  // root child out of range
  let mut out_of_range = bytes.clone();
  out_of_range[28..32].copy_from_slice(&(!10_000_i32).to_le_bytes());
  assert_corrupt(&out_of_range);

  // duplicated proxy id
  let mut duplicated = bytes.clone();
  let len = duplicated.len();
  let first_proxy = duplicated[len - 8..len - 4].to_vec();
  duplicated[len - 4..].copy_from_slice(&first_proxy);
  assert_corrupt(&duplicated);

  // empty node table
  let mut no_root = Vec::new();
  no_root.extend_from_slice(&0_i32.to_le_bytes());
  no_root.extend_from_slice(&0_i32.to_le_bytes());
  assert_corrupt(&no_root);
}

#[test]
fn from_parts_rejects_uncovered_proxies() {
  let leaf = PackedBvhNode::new_leaf(Box3::empty(), 0..1);
  assert_eq!(
    PackedBvh::from_parts(vec![leaf], vec![0, 1]),
    Err(CorruptReason::ProxySlotCoverage { slot: 1 })
  );
  assert!(PackedBvh::from_parts(vec![leaf], vec![0]).is_ok());
}

#[test]
fn var_int_round_trip_edges() {
  for v in [0, 1, 127, 128, 300, 16_383, 16_384, u32::MAX] {
    let mut buffer = Vec::new();
    buffer.write_var_u32(v).unwrap();
    assert!(buffer.len() <= 5);
    assert_eq!((&buffer[..]).read_var_u32().unwrap(), v);
  }
  let overlong = [0xFF_u8, 0xFF, 0xFF, 0xFF, 0xFF];
  assert!((&overlong[..]).read_var_u32().is_err());
}

#[test]
fn build_option_from_config() {
  let option: BvhBuildOption = serde_json::from_str(r#"{ "shapes_per_node": 2 }"#).unwrap();
  assert_eq!(option.shapes_per_node, 2);
  let option: BvhBuildOption = serde_json::from_str("{}").unwrap();
  assert_eq!(option, BvhBuildOption::default());
}
