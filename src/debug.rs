/*
 * Debug Information Module
 *
 * This module defines the FlockStats struct with summary metrics for
 * debug overlays and periodic log lines.
 *
 * Includes metrics for:
 * - Flock size and mean neighbor count
 * - Observed speed range
 * - Octree shape (node and leaf counts)
 */

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlockStats {
    pub boids: usize,
    pub mean_neighbors: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub octree_nodes: usize,
    pub octree_leaves: usize,
}
