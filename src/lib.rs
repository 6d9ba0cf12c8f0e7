/*
 * 3D Boid Flocking Simulation - Module Definitions
 *
 * This file defines the module structure for the boid simulation crate.
 * It organizes the code into logical components for better maintainability:
 * spatial indexing, the flocking integrator, and the software projection
 * pipeline that turns world-space primitives into screen-space geometry.
 */

// Re-export key components for easier access
pub use camera::Camera;
pub use clip::{
    clip_line, clip_polygon, clip_polyline, clip_visible, project_to_clip, to_screen,
    FRUSTUM_PLANES,
};
pub use debug::FlockStats;
pub use flock::{Domain, Flock};
pub use octree::{Octree, LEAF_CAPACITY};
pub use params::{ConfigError, SimulationParams};
pub use renderer::{BoidStyle, Fill, Frame, Renderer, Rgba, Stroke, Viewport};

// Define modules
pub mod camera;
pub mod clip;
pub mod debug;
pub mod flock;
pub mod math;
pub mod octree;
pub mod params;
pub mod renderer;

// Constants
pub const BOID_SIZE: f32 = 1.0;
