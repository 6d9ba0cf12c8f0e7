/*
 * Camera Module
 *
 * This module defines the Camera struct that produces the view and
 * projection matrices consumed by the projection pipeline. Input handling
 * (orbit, drag) lives outside the crate; the camera only holds pose and
 * lens state, replaceable between ticks.
 */

use glam::{Mat4, Vec3};

pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 150.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_radians: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            z_near: 0.1,
            z_far: 1000.0,
            min_distance: 1.0,
            max_distance: 500.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    // GL-style projection: the clip volume is |x| <= w, |y| <= w, |z| <= w,
    // matching the frustum planes in the clip module.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, self.aspect, self.z_near, self.z_far)
    }

    pub fn set_aspect(&mut self, viewport_width: f32, viewport_height: f32) {
        if viewport_height > 0.0 {
            self.aspect = viewport_width / viewport_height;
        }
    }

    // Move the camera along its view direction, clamping the distance to
    // the target into [min_distance, max_distance].
    pub fn dolly(&mut self, factor: f32) {
        let offset = self.position - self.target;
        let distance = (offset.length() * factor).clamp(self.min_distance, self.max_distance);
        let direction = offset.normalize_or_zero();
        if direction != Vec3::ZERO {
            self.position = self.target + direction * distance;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
