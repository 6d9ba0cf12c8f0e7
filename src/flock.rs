/*
 * Flock Module
 *
 * This module owns the agent table and runs the per-tick flocking update.
 * Each boid follows three steering rules:
 * 1. Separation: Avoid crowding neighbors
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 *
 * A tick rebuilds the octree over current positions, runs a force pass that
 * only reads the position/velocity snapshot, and then an integration pass
 * that mutates it. The two passes are strictly sequential so no agent ever
 * reacts to an already-updated neighbor.
 */

use glam::Vec3;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::debug::FlockStats;
use crate::math::{
    cosine_similarity, normalize_or_zero, random_in_cube, random_unit_vector, wrapped_delta3,
    NORMALIZE_EPSILON,
};
use crate::octree::Octree;
use crate::params::{ConfigError, SimulationParams};

// Floor for the squared distance used in separation weighting, so two
// coincident agents do not produce an unbounded repulsion.
const DISTANCE_EPSILON: f32 = 1.0e-6;

// Relative padding applied to the octree root. A boundary teleport lands an
// agent exactly on the domain maximum, which the half-open containment test
// would otherwise reject.
const ROOT_PADDING: f32 = 1.0e-3;

/// Axis-aligned simulation volume with half-open `[min, max)` extents.
/// Opposite faces are identified: leaving through one face re-enters
/// through the other.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    pub min: Vec3,
    pub max: Vec3,
}

impl Domain {
    pub fn new(min: Vec3, max: Vec3) -> Result<Self, ConfigError> {
        if !(min.x < max.x && min.y < max.y && min.z < max.z) {
            return Err(ConfigError::Invalid("domain min must be below max on every axis"));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(ConfigError::Invalid("domain bounds must be finite"));
        }
        Ok(Self { min, max })
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extent(&self) -> Vec3 {
        self.extent() * 0.5
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(
            rng.gen_range(self.min.x..self.max.x),
            rng.gen_range(self.min.y..self.max.y),
            rng.gen_range(self.min.z..self.max.z),
        )
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            min: Vec3::splat(-50.0),
            max: Vec3::splat(50.0),
        }
    }
}

pub struct Flock {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    accelerations: Vec<Vec3>,
    neighbor_counts: Vec<u32>,
    domain: Domain,
    params: SimulationParams,
    index: Octree,
    rng: StdRng,
    // Reused between queries to avoid per-agent allocation
    neighbor_scratch: Vec<usize>,
    ticks: u64,
}

impl Flock {
    pub fn new(params: SimulationParams, domain: Domain) -> Result<Self, ConfigError> {
        Self::with_rng(params, domain, StdRng::from_entropy())
    }

    /// Deterministic construction for tests and reproducible runs.
    pub fn with_seed(
        params: SimulationParams,
        domain: Domain,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(params, domain, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        params: SimulationParams,
        domain: Domain,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let mut flock = Self {
            positions: Vec::new(),
            velocities: Vec::new(),
            accelerations: Vec::new(),
            neighbor_counts: Vec::new(),
            domain,
            params,
            index: Octree::new(domain.center(), domain.half_extent() * (1.0 + ROOT_PADDING)),
            rng,
            neighbor_scratch: Vec::new(),
            ticks: 0,
        };
        flock.init();
        Ok(flock)
    }

    // Randomize the whole agent table and rebuild the index. Also runs when
    // the agent count is reconfigured between ticks.
    fn init(&mut self) {
        let count = self.params.num_boids;
        self.positions.clear();
        self.velocities.clear();
        for _ in 0..count {
            let position = self.domain.sample(&mut self.rng);
            let speed = self
                .rng
                .gen_range(self.params.min_speed..=self.params.max_speed);
            let velocity = random_unit_vector(&mut self.rng) * speed;
            self.positions.push(position);
            self.velocities.push(velocity);
        }
        self.accelerations.clear();
        self.accelerations.resize(count, Vec3::ZERO);
        self.neighbor_counts.clear();
        self.neighbor_counts.resize(count, 0);
        self.rebuild_index();
        debug!("initialized flock with {count} boids");
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        // Agent-count changes take effect as a full reinitialization.
        if self.params.num_boids != self.positions.len() {
            self.init();
        }

        self.rebuild_index();
        self.force_pass();
        self.integrate(dt);
        self.ticks += 1;

        if self.ticks % 120 == 0 {
            let stats = self.stats();
            debug!(
                "tick {}: {} boids, mean neighbors {:.2}, speeds {:.2}..{:.2}",
                self.ticks, stats.boids, stats.mean_neighbors, stats.min_speed, stats.max_speed
            );
        }
    }

    // Discard and rebuild the octree over the current position table. The
    // tree lives only until the next rebuild.
    fn rebuild_index(&mut self) {
        let half = self.domain.half_extent() * (1.0 + ROOT_PADDING);
        let mut index = Octree::new(self.domain.center(), half);
        for i in 0..self.positions.len() {
            let inserted = index.insert(&self.positions, i);
            debug_assert!(inserted, "agent {i} fell outside the simulation domain");
        }
        self.index = index;
    }

    // Compute an acceleration for every agent from one consistent
    // position/velocity snapshot. Nothing in the agent table is mutated
    // here except the acceleration and neighbor-count outputs.
    fn force_pass(&mut self) {
        let extent = self.domain.extent();
        let radius = self.params.interaction_radius;
        let cap = self.params.accuracy as u32;

        for i in 0..self.positions.len() {
            let position = self.positions[i];
            let velocity = self.velocities[i];

            self.index.query_radius_wrapped(
                &self.positions,
                position,
                radius,
                extent,
                &mut self.neighbor_scratch,
            );

            let mut alignment_sum = Vec3::ZERO;
            let mut cohesion_sum = Vec3::ZERO;
            let mut separation_sum = Vec3::ZERO;
            let mut count = 0u32;

            // The cap applies in traversal order, not nearest-first: a
            // deterministic tie-break inherited from the index ordering.
            for &j in &self.neighbor_scratch {
                if j == i {
                    continue;
                }
                if count >= cap {
                    break;
                }

                let delta = wrapped_delta3(self.positions[j] - position, extent);
                let similarity = cosine_similarity(velocity, self.velocities[j]);
                alignment_sum +=
                    self.velocities[j] * (1.0 + self.params.alignment_bias * similarity);
                // Fold the neighbor to its nearest image so cohesion pulls
                // through the boundary rather than across the whole domain.
                cohesion_sum += position + delta;
                separation_sum += -delta / delta.length_squared().max(DISTANCE_EPSILON);
                count += 1;
            }

            self.neighbor_counts[i] = count;
            self.accelerations[i] = if count > 0 {
                let inv_count = 1.0 / count as f32;
                let alignment = normalize_or_zero(alignment_sum * inv_count - velocity)
                    * self.params.alignment_force;
                let cohesion = normalize_or_zero(cohesion_sum * inv_count - position)
                    * self.params.cohesion_force;
                let separation =
                    normalize_or_zero(separation_sum) * self.params.separation_force;
                let jitter = random_in_cube(&mut self.rng) * self.params.randomness;
                (alignment + cohesion + separation) * self.params.steering_force + jitter
            } else {
                Vec3::ZERO
            };
        }
    }

    // Apply the accelerations computed by the force pass and move every
    // agent, wrapping at the domain boundary.
    fn integrate(&mut self, dt: f32) {
        let drag_factor = 1.0 - self.params.drag;

        for i in 0..self.positions.len() {
            let mut velocity = self.velocities[i] + self.accelerations[i] * dt;
            velocity *= drag_factor;

            // Clamp speed by rescaling the magnitude only; the direction is
            // never inverted, and a near-zero vector is left alone.
            let speed = velocity.length();
            if speed > NORMALIZE_EPSILON {
                let clamped = speed.clamp(self.params.min_speed, self.params.max_speed);
                if clamped != speed {
                    velocity *= clamped / speed;
                }
            }

            let mut position = self.positions[i] + velocity * dt;

            // Boundary wrap is an exact jump to the opposite extreme, not a
            // modulo carry of the overflow distance. A fast agent can
            // visibly snap for large dt.
            for axis in 0..3 {
                if position[axis] < self.domain.min[axis] {
                    position[axis] = self.domain.max[axis];
                } else if position[axis] > self.domain.max[axis] {
                    position[axis] = self.domain.min[axis];
                }
            }

            self.velocities[i] = velocity;
            self.positions[i] = position;
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn accelerations(&self) -> &[Vec3] {
        &self.accelerations
    }

    pub fn neighbor_counts(&self) -> &[u32] {
        &self.neighbor_counts
    }

    /// The spatial index built by the most recent tick. Exposed for
    /// diagnostic visualization only.
    pub fn index(&self) -> &Octree {
        &self.index
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Tunables may be changed freely between ticks. A changed `num_boids`
    /// reinitializes the whole flock on the next step.
    pub fn params_mut(&mut self) -> &mut SimulationParams {
        &mut self.params
    }

    /// Summary metrics for debug overlays and logs.
    pub fn stats(&self) -> FlockStats {
        let boids = self.positions.len();
        let mean_neighbors = if boids == 0 {
            0.0
        } else {
            self.neighbor_counts.iter().map(|&c| c as f32).sum::<f32>() / boids as f32
        };
        let mut min_speed = f32::INFINITY;
        let mut max_speed: f32 = 0.0;
        for velocity in &self.velocities {
            let speed = velocity.length();
            min_speed = min_speed.min(speed);
            max_speed = max_speed.max(speed);
        }
        if boids == 0 {
            min_speed = 0.0;
        }
        FlockStats {
            boids,
            mean_neighbors,
            min_speed,
            max_speed,
            octree_nodes: self.index.node_count(),
            octree_leaves: self.index.leaf_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params(num_boids: usize) -> SimulationParams {
        SimulationParams {
            num_boids,
            ..SimulationParams::default()
        }
    }

    fn in_domain(flock: &Flock) -> bool {
        let domain = flock.domain();
        flock.positions().iter().all(|p| {
            // The teleport targets the exact extremes, so both ends are
            // reachable values.
            (0..3).all(|axis| p[axis] >= domain.min[axis] && p[axis] <= domain.max[axis])
        })
    }

    #[test]
    fn init_populates_parallel_sequences() {
        let flock = Flock::with_seed(small_params(64), Domain::default(), 1).unwrap();
        assert_eq!(flock.positions().len(), 64);
        assert_eq!(flock.velocities().len(), 64);
        assert_eq!(flock.accelerations().len(), 64);
        assert_eq!(flock.neighbor_counts().len(), 64);
        assert!(in_domain(&flock));
    }

    #[test]
    fn initial_speeds_lie_within_configured_limits() {
        let flock = Flock::with_seed(small_params(100), Domain::default(), 2).unwrap();
        let params = flock.params();
        for velocity in flock.velocities() {
            let speed = velocity.length();
            assert!(speed >= params.min_speed - 1.0e-3);
            assert!(speed <= params.max_speed + 1.0e-3);
        }
    }

    #[test]
    fn positions_stay_in_domain_across_many_steps() {
        let mut flock = Flock::with_seed(small_params(80), Domain::default(), 3).unwrap();
        for _ in 0..120 {
            flock.step(1.0 / 60.0);
            assert!(in_domain(&flock));
        }
    }

    #[test]
    fn speeds_stay_clamped_after_stepping() {
        let mut flock = Flock::with_seed(small_params(80), Domain::default(), 4).unwrap();
        for _ in 0..30 {
            flock.step(1.0 / 60.0);
        }
        let params = *flock.params();
        for velocity in flock.velocities() {
            let speed = velocity.length();
            assert!(speed <= params.max_speed + 1.0e-3);
            assert!(speed >= params.min_speed - 1.0e-3);
        }
    }

    #[test]
    fn boundary_overflow_teleports_to_the_opposite_extreme() {
        let mut flock = Flock::with_seed(small_params(1), Domain::default(), 5).unwrap();
        let domain = flock.domain();

        // Park the single agent just inside the maximum face, flying out.
        flock.positions[0] = Vec3::new(domain.max.x - 0.001, 0.0, 0.0);
        flock.velocities[0] = Vec3::new(flock.params.max_speed, 0.0, 0.0);
        flock.accelerations[0] = Vec3::ZERO;
        flock.params.randomness = 0.0;

        flock.rebuild_index();
        flock.integrate(1.0);

        assert_eq!(flock.positions[0].x, domain.min.x);
    }

    #[test]
    fn neighbor_counts_respect_the_accuracy_cap() {
        let mut params = small_params(50);
        params.accuracy = 3;
        // A radius covering the whole domain makes everyone a candidate.
        params.interaction_radius = 50.0;
        let mut flock = Flock::with_seed(params, Domain::default(), 6).unwrap();
        flock.step(1.0 / 60.0);
        for &count in flock.neighbor_counts() {
            assert!(count <= 3);
        }
    }

    #[test]
    fn two_close_agents_see_each_other() {
        let mut flock = Flock::with_seed(small_params(2), Domain::default(), 7).unwrap();
        flock.positions[0] = Vec3::new(0.0, 0.0, 0.0);
        flock.positions[1] = Vec3::new(1.0, 0.0, 0.0);
        flock.step(1.0 / 60.0);
        assert_eq!(flock.neighbor_counts()[0], 1);
        assert_eq!(flock.neighbor_counts()[1], 1);
    }

    #[test]
    fn isolated_agent_gets_zero_acceleration() {
        let mut params = small_params(1);
        params.randomness = 0.5;
        let mut flock = Flock::with_seed(params, Domain::default(), 8).unwrap();
        flock.step(1.0 / 60.0);
        assert_eq!(flock.accelerations()[0], Vec3::ZERO);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = Flock::with_seed(small_params(40), Domain::default(), 9).unwrap();
        let mut b = Flock::with_seed(small_params(40), Domain::default(), 9).unwrap();
        for _ in 0..10 {
            a.step(1.0 / 60.0);
            b.step(1.0 / 60.0);
        }
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.velocities(), b.velocities());
    }

    #[test]
    fn changing_num_boids_reinitializes_on_the_next_step() {
        let mut flock = Flock::with_seed(small_params(10), Domain::default(), 10).unwrap();
        flock.params_mut().num_boids = 25;
        flock.step(1.0 / 60.0);
        assert_eq!(flock.len(), 25);
        assert!(in_domain(&flock));
    }

    #[test]
    fn invalid_domain_is_rejected() {
        assert!(Domain::new(Vec3::splat(1.0), Vec3::splat(-1.0)).is_err());
        assert!(Domain::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)).is_err());
    }
}
