/*
 * Math Helpers Module
 *
 * Small vector utilities shared by the integrator and the renderer:
 * guarded normalization, toroidal delta folding, random direction sampling,
 * and homogeneous-coordinate conversion.
 */

use glam::{Vec3, Vec4};
use rand::Rng;

// Magnitudes below this floor are treated as zero instead of being divided
// through, which would feed NaN/Infinity into the integrator.
pub const NORMALIZE_EPSILON: f32 = 1.0e-8;

// Normalize a vector, returning zero for near-zero input.
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let mag = v.length();
    if mag < NORMALIZE_EPSILON {
        Vec3::ZERO
    } else {
        v / mag
    }
}

// Cosine of the angle between two vectors, zero when either is degenerate.
pub fn cosine_similarity(a: Vec3, b: Vec3) -> f32 {
    let denom = a.length() * b.length();
    if denom < NORMALIZE_EPSILON {
        0.0
    } else {
        (a.dot(b) / denom).clamp(-1.0, 1.0)
    }
}

// Fold a raw coordinate delta into the wrapped domain: once the magnitude
// exceeds half the extent, the image on the opposite face is closer.
pub fn wrapped_delta(delta: f32, extent: f32) -> f32 {
    let half_extent = extent * 0.5;
    if delta > half_extent {
        delta - extent
    } else if delta < -half_extent {
        delta + extent
    } else {
        delta
    }
}

// Per-axis fold of a 3D delta against the domain extent.
pub fn wrapped_delta3(delta: Vec3, extent: Vec3) -> Vec3 {
    Vec3::new(
        wrapped_delta(delta.x, extent.x),
        wrapped_delta(delta.y, extent.y),
        wrapped_delta(delta.z, extent.z),
    )
}

// Uniformly random direction, sampled by rejection inside the unit sphere.
pub fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1.0e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

// Uniformly random vector with each component in [-1, 1].
pub fn random_in_cube<R: Rng>(rng: &mut R) -> Vec3 {
    Vec3::new(
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
    )
}

// Lift a 3-component point into homogeneous coordinates with w = 1.
pub fn to_homogeneous(v: Vec3) -> Vec4 {
    v.extend(1.0)
}

// Drop the w component. Together with to_homogeneous this round-trips the
// first three components exactly.
pub fn from_homogeneous(v: Vec4) -> Vec3 {
    v.truncate()
}

// Build an orthonormal basis (forward, up, right) from a heading vector.
// Falls back to +X when the heading is degenerate, and switches the up
// reference when the heading is nearly vertical.
pub fn heading_basis(heading: Vec3) -> (Vec3, Vec3, Vec3) {
    let forward = {
        let f = normalize_or_zero(heading);
        if f == Vec3::ZERO {
            Vec3::X
        } else {
            f
        }
    };

    let mut up_ref = Vec3::Y;
    if forward.dot(up_ref).abs() > 0.97 {
        up_ref = Vec3::Z;
    }

    let right = {
        let r = normalize_or_zero(up_ref.cross(forward));
        if r == Vec3::ZERO {
            Vec3::Z
        } else {
            r
        }
    };
    let up = {
        let u = normalize_or_zero(forward.cross(right));
        if u == Vec3::ZERO {
            Vec3::Y
        } else {
            u
        }
    };

    (forward, up, right)
}
