/*
 * Octree Module
 *
 * This module defines the Octree struct for efficient neighbor lookups in
 * the 3D simulation volume. Each node covers an axis-aligned box and is
 * either a leaf holding up to LEAF_CAPACITY agent indices or an internal
 * node owning exactly 8 children that tile the parent volume in equal
 * octants. The tree is rebuilt from scratch every tick.
 *
 * Nodes never hold agent positions themselves; every call takes the agent
 * position table as an explicit parameter so the tree carries no back
 * reference into simulation state.
 */

use glam::Vec3;

/// Maximum number of agent indices a leaf holds before it subdivides.
pub const LEAF_CAPACITY: usize = 4;

pub struct Octree {
    center: Vec3,
    half_extent: Vec3,
    indices: Vec<usize>,
    children: Option<Box<[Octree; 8]>>,
}

impl Octree {
    pub fn new(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            center,
            half_extent,
            indices: Vec::with_capacity(LEAF_CAPACITY),
            children: None,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn half_extent(&self) -> Vec3 {
        self.half_extent
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn children(&self) -> Option<&[Octree; 8]> {
        self.children.as_deref()
    }

    /// Indices held directly by this node; empty for internal nodes.
    pub fn leaf_indices(&self) -> &[usize] {
        &self.indices
    }

    // Membership test. The upper bound is exclusive on every axis, so a
    // point sitting exactly on the shared face of two octants belongs to
    // the higher one.
    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        let min = self.center - self.half_extent;
        let max = self.center + self.half_extent;
        point.x >= min.x
            && point.x < max.x
            && point.y >= min.y
            && point.y < max.y
            && point.z >= min.z
            && point.z < max.z
    }

    // Insert agent `index` using its entry in the position table. Returns
    // false if the point lies outside this node's box; at the root that
    // means the point is outside the configured domain and the caller has
    // a bug.
    pub fn insert(&mut self, positions: &[Vec3], index: usize) -> bool {
        let point = positions[index];
        if !self.contains(point) {
            return false;
        }

        if self.is_leaf() && self.indices.len() >= LEAF_CAPACITY {
            self.subdivide(positions);
        }

        match self.children.as_mut() {
            Some(children) => children
                .iter_mut()
                .any(|child| child.insert(positions, index)),
            None => {
                self.indices.push(index);
                true
            }
        }
    }

    // Split a full leaf into 8 equal octants and push the held indices
    // down. Calling this on an internal node is a logic error upstream.
    fn subdivide(&mut self, positions: &[Vec3]) {
        assert!(
            self.children.is_none(),
            "subdivide called on an internal octree node"
        );

        let center = self.center;
        let quarter = self.half_extent * 0.5;
        self.children = Some(Box::new(std::array::from_fn(|octant| {
            let offset = Vec3::new(
                if octant & 1 == 0 { -quarter.x } else { quarter.x },
                if octant & 2 == 0 { -quarter.y } else { quarter.y },
                if octant & 4 == 0 { -quarter.z } else { quarter.z },
            );
            Octree::new(center + offset, quarter)
        })));

        let held = std::mem::take(&mut self.indices);
        if let Some(children) = self.children.as_mut() {
            for index in held {
                let placed = children
                    .iter_mut()
                    .any(|child| child.insert(positions, index));
                debug_assert!(placed, "held index escaped its node during subdivision");
            }
        }
    }

    // Append every index within `radius` of `center` to `out`. Subtrees
    // whose box cannot touch the query sphere are pruned with a
    // closest-point-on-box test; leaves run the exact squared-distance
    // filter against the position table.
    pub fn query_radius(&self, positions: &[Vec3], center: Vec3, radius: f32, out: &mut Vec<usize>) {
        let radius_sq = radius * radius;
        if !self.intersects_sphere(center, radius_sq) {
            return;
        }

        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query_radius(positions, center, radius, out);
            }
            return;
        }

        for &index in &self.indices {
            if positions[index].distance_squared(center) <= radius_sq {
                out.push(index);
            }
        }
    }

    // Radius query in the wrapped (toroidal) domain. Replaces the contents
    // of `out`.
    //
    // A single unwrapped query cannot see a neighbor that is close only
    // through the wrap, so the sphere is re-queried at each image of the
    // center that pokes through a domain face. The folded re-test below is
    // authoritative either way: every candidate has its delta folded by the
    // domain extent and must pass the exact distance check again.
    pub fn query_radius_wrapped(
        &self,
        positions: &[Vec3],
        center: Vec3,
        radius: f32,
        domain_extent: Vec3,
        out: &mut Vec<usize>,
    ) {
        out.clear();

        let min = self.center - self.half_extent;
        let max = self.center + self.half_extent;

        let shifts_x = axis_shifts(center.x, radius, min.x, max.x, domain_extent.x);
        let shifts_y = axis_shifts(center.y, radius, min.y, max.y, domain_extent.y);
        let shifts_z = axis_shifts(center.z, radius, min.z, max.z, domain_extent.z);

        for &sx in shifts_x.iter().flatten() {
            for &sy in shifts_y.iter().flatten() {
                for &sz in shifts_z.iter().flatten() {
                    let image = center + Vec3::new(sx, sy, sz);
                    self.query_radius(positions, image, radius, out);
                }
            }
        }

        // Image queries can report the same index more than once.
        out.sort_unstable();
        out.dedup();

        let radius_sq = radius * radius;
        out.retain(|&index| {
            let delta = crate::math::wrapped_delta3(positions[index] - center, domain_extent);
            delta.length_squared() <= radius_sq
        });
    }

    #[inline]
    fn intersects_sphere(&self, center: Vec3, radius_sq: f32) -> bool {
        let min = self.center - self.half_extent;
        let max = self.center + self.half_extent;
        let closest = center.clamp(min, max);
        closest.distance_squared(center) <= radius_sq
    }

    /// Total number of nodes in the subtree, this node included.
    pub fn node_count(&self) -> usize {
        match self.children.as_ref() {
            Some(children) => 1 + children.iter().map(Octree::node_count).sum::<usize>(),
            None => 1,
        }
    }

    /// Number of leaves in the subtree.
    pub fn leaf_count(&self) -> usize {
        match self.children.as_ref() {
            Some(children) => children.iter().map(Octree::leaf_count).sum(),
            None => 1,
        }
    }

    /// Largest leaf occupancy in the subtree.
    pub fn max_leaf_len(&self) -> usize {
        match self.children.as_ref() {
            Some(children) => children
                .iter()
                .map(Octree::max_leaf_len)
                .max()
                .unwrap_or(0),
            None => self.indices.len(),
        }
    }
}

// Center offsets to try on one axis: the raw query, plus the wrapped image
// when the sphere reaches past a domain face on that side.
fn axis_shifts(center: f32, radius: f32, min: f32, max: f32, extent: f32) -> [Option<f32>; 3] {
    let mut shifts = [Some(0.0), None, None];
    if center - radius < min {
        shifts[1] = Some(extent);
    }
    if center + radius > max {
        shifts[2] = Some(-extent);
    }
    shifts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_positions(count: usize, half: f32, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                )
            })
            .collect()
    }

    fn build_tree(positions: &[Vec3], half: f32) -> Octree {
        let mut tree = Octree::new(Vec3::ZERO, Vec3::splat(half));
        for index in 0..positions.len() {
            assert!(tree.insert(positions, index));
        }
        tree
    }

    #[test]
    fn insert_rejects_points_outside_the_volume() {
        let positions = vec![Vec3::new(5.0, 0.0, 0.0)];
        let mut tree = Octree::new(Vec3::ZERO, Vec3::ONE);
        assert!(!tree.insert(&positions, 0));
    }

    #[test]
    fn upper_bound_is_exclusive() {
        let tree = Octree::new(Vec3::ZERO, Vec3::ONE);
        assert!(tree.contains(Vec3::new(-1.0, 0.0, 0.0)));
        assert!(!tree.contains(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn five_clustered_points_subdivide_into_eight_unit_children() {
        // Root of size (2, 2, 2) around the origin, five points near the
        // center: one more than the leaf capacity.
        let positions = vec![
            Vec3::new(0.1, 0.1, 0.1),
            Vec3::new(-0.1, 0.1, 0.1),
            Vec3::new(0.1, -0.1, 0.1),
            Vec3::new(0.1, 0.1, -0.1),
            Vec3::new(-0.1, -0.1, -0.1),
        ];
        let tree = build_tree(&positions, 1.0);

        assert!(!tree.is_leaf());
        let children = tree.children().expect("root must have subdivided");
        for child in children.iter() {
            assert_eq!(child.half_extent(), Vec3::splat(0.5));
            assert!(child.is_leaf());
        }

        let total: usize = children.iter().map(|c| c.leaf_indices().len()).sum();
        assert_eq!(total, positions.len());
    }

    #[test]
    fn leaves_never_exceed_capacity() {
        let positions = random_positions(300, 10.0, 11);
        let tree = build_tree(&positions, 10.0);
        assert!(tree.max_leaf_len() <= LEAF_CAPACITY);
    }

    #[test]
    fn query_radius_matches_brute_force() {
        let positions = random_positions(200, 10.0, 23);
        let tree = build_tree(&positions, 10.0);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20 {
            let center = Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            let radius = rng.gen_range(0.5..6.0);

            let mut found = Vec::new();
            tree.query_radius(&positions, center, radius, &mut found);
            found.sort_unstable();

            let mut expected: Vec<usize> = positions
                .iter()
                .enumerate()
                .filter(|(_, p)| p.distance_squared(center) <= radius * radius)
                .map(|(i, _)| i)
                .collect();
            expected.sort_unstable();

            assert_eq!(found, expected);
        }
    }

    #[test]
    fn wrapped_query_sees_across_opposite_faces() {
        // Two agents hugging opposite faces of a [-1, 1) domain: 1.98 apart
        // in raw terms, 0.02 apart through the wrap.
        let positions = vec![Vec3::new(-0.99, 0.0, 0.0), Vec3::new(0.99, 0.0, 0.0)];
        let tree = build_tree(&positions, 1.0);
        let extent = Vec3::splat(2.0);

        let mut plain = Vec::new();
        tree.query_radius(&positions, positions[0], 0.05, &mut plain);
        assert_eq!(plain, vec![0]);

        let mut wrapped = Vec::new();
        tree.query_radius_wrapped(&positions, positions[0], 0.05, extent, &mut wrapped);
        assert_eq!(wrapped, vec![0, 1]);
    }

    #[test]
    fn wrapped_query_still_filters_by_distance() {
        let positions = vec![Vec3::new(-0.9, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)];
        let tree = build_tree(&positions, 1.0);

        let mut wrapped = Vec::new();
        tree.query_radius_wrapped(&positions, positions[0], 0.3, Vec3::splat(2.0), &mut wrapped);
        // The raw delta of 1.4 folds to 0.6, still outside the radius.
        assert_eq!(wrapped, vec![0]);
    }

    #[test]
    #[should_panic(expected = "subdivide called on an internal octree node")]
    fn subdividing_an_internal_node_panics() {
        let positions = random_positions(16, 1.0, 3);
        let mut tree = build_tree(&positions, 1.0);
        assert!(!tree.is_leaf());
        tree.subdivide(&positions);
    }
}
