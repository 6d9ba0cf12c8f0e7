/*
 * Clip Projection Module
 *
 * This module is the software projection pipeline: world-space points go
 * through view and projection matrices into homogeneous clip space, lines
 * and polygons are clipped against the six frustum half-spaces, and
 * surviving clip-space points are mapped to pixel coordinates.
 *
 * A plane (a, b, c, d) keeps a clip-space point (x, y, z, w) when
 * ax + by + cz + dw >= 0. The six planes below bound the canonical
 * frustum |x| <= w, |y| <= w, |z| <= w and are fixed constants, not
 * per-camera state.
 */

use glam::{Mat4, Vec2, Vec3, Vec4};

// A segment direction with a plane dot below this magnitude is treated as
// parallel to the plane.
pub const PLANE_EPSILON: f32 = 1.0e-6;

pub const FRUSTUM_PLANES: [Vec4; 6] = [
    Vec4::new(1.0, 0.0, 0.0, 1.0),  // left:   x >= -w
    Vec4::new(-1.0, 0.0, 0.0, 1.0), // right:  x <= w
    Vec4::new(0.0, 1.0, 0.0, 1.0),  // bottom: y >= -w
    Vec4::new(0.0, -1.0, 0.0, 1.0), // top:    y <= w
    Vec4::new(0.0, 0.0, 1.0, 1.0),  // near:   z >= -w
    Vec4::new(0.0, 0.0, -1.0, 1.0), // far:    z <= w
];

/// Transform a world-space point into homogeneous clip space.
pub fn project_to_clip(view: &Mat4, projection: &Mat4, point: Vec3) -> Vec4 {
    *projection * (*view * point.extend(1.0))
}

/// A clip-space point is visible when it lies inside all six planes.
pub fn clip_visible(point: Vec4) -> bool {
    point.x.abs() <= point.w && point.y.abs() <= point.w && point.z.abs() <= point.w
}

/// Clip the segment p1..p2 against the frustum, parametrically. Returns the
/// surviving sub-segment as `(t_min, t_max)` in [0, 1], or None when the
/// segment is entirely outside.
pub fn clip_line(p1: Vec4, p2: Vec4) -> Option<(f32, f32)> {
    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;
    let direction = p2 - p1;

    for plane in FRUSTUM_PLANES {
        let start = plane.dot(p1);
        let delta = plane.dot(direction);

        if delta.abs() < PLANE_EPSILON {
            // Parallel to the plane: either fully inside it or fully out.
            if start < 0.0 {
                return None;
            }
            continue;
        }

        let t = -start / delta;
        if delta > 0.0 {
            // Moving toward the inside of the plane: entry point.
            t_min = t_min.max(t);
        } else {
            // Moving toward the outside: exit point.
            t_max = t_max.min(t);
        }
    }

    if t_min >= t_max {
        None
    } else {
        Some((t_min, t_max))
    }
}

/// Clip each consecutive edge of a polyline independently, wrapping
/// last -> first when `closed`. Every surviving portion comes back as its
/// own 2-point segment: segments sharing a vertex on a clip boundary are
/// deliberately not stitched back together.
pub fn clip_polyline(closed: bool, points: &[Vec4]) -> Vec<[Vec4; 2]> {
    let mut segments = Vec::new();
    if points.len() < 2 {
        return segments;
    }

    let edge_count = if closed {
        points.len()
    } else {
        points.len() - 1
    };

    for edge in 0..edge_count {
        let a = points[edge];
        let b = points[(edge + 1) % points.len()];
        if let Some((t_min, t_max)) = clip_line(a, b) {
            segments.push([a.lerp(b, t_min), a.lerp(b, t_max)]);
        }
    }

    segments
}

/// Sutherland-Hodgman polygon clip: the vertex ring is clipped against each
/// frustum plane in turn, inserting interpolated vertices where edges cross
/// a plane. Returns None as soon as any stage empties the ring.
pub fn clip_polygon(points: &[Vec4]) -> Option<Vec<Vec4>> {
    if points.is_empty() {
        return None;
    }

    let mut ring: Vec<Vec4> = points.to_vec();
    let mut next: Vec<Vec4> = Vec::with_capacity(ring.len() + 6);

    for plane in FRUSTUM_PLANES {
        next.clear();
        for k in 0..ring.len() {
            let current = ring[k];
            let previous = ring[(k + ring.len() - 1) % ring.len()];
            let current_dot = plane.dot(current);
            let previous_dot = plane.dot(previous);
            let current_inside = current_dot >= 0.0;
            let previous_inside = previous_dot >= 0.0;

            if current_inside != previous_inside {
                // The edge crosses the plane; the dots have opposite signs
                // so the denominator cannot vanish.
                let t = previous_dot / (previous_dot - current_dot);
                next.push(previous.lerp(current, t));
            }
            if current_inside {
                next.push(current);
            }
        }

        if next.is_empty() {
            return None;
        }
        std::mem::swap(&mut ring, &mut next);
    }

    Some(ring)
}

/// Perspective-divide a clip-space point and map NDC [-1, 1] to pixels.
/// The y axis flips so NDC +1 lands on pixel row 0.
pub fn to_screen(clip: Vec4, viewport_width: f32, viewport_height: f32) -> Vec2 {
    let inv_w = 1.0 / clip.w;
    let ndc_x = clip.x * inv_w;
    let ndc_y = clip.y * inv_w;
    Vec2::new(
        (ndc_x + 1.0) * 0.5 * viewport_width,
        (1.0 - ndc_y) * 0.5 * viewport_height,
    )
}
