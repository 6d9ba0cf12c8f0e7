/*
 * Renderer Module
 *
 * This module turns simulation state into screen-space geometry through
 * the clip pipeline. It draws the boids, the domain boundary, and the
 * spatial index for debug visualization.
 *
 * There is no rasterizer here: a Frame of strokes and fills is the final
 * artifact, and whatever display layer embeds the crate decides how to
 * put the pixels up.
 */

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::clip;
use crate::flock::{Domain, Flock};
use crate::math::heading_basis;
use crate::octree::Octree;
use crate::BOID_SIZE;

/// Plain RGBA color with components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
}

/// How each boid is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoidStyle {
    /// Velocity-oriented wireframe tetrahedron.
    Tetrahedron,
    /// Camera-facing quad.
    Billboard,
    /// Skip boid rendering entirely.
    None,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// One clipped 2-point line segment in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub from: Vec2,
    pub to: Vec2,
    pub color: Rgba,
}

/// One clipped convex polygon in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub vertices: Vec<Vec2>,
    pub color: Rgba,
}

/// Screen-space output of one rendered frame.
#[derive(Debug, Default)]
pub struct Frame {
    pub strokes: Vec<Stroke>,
    pub fills: Vec<Fill>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.fills.clear();
    }
}

pub struct Renderer {
    pub viewport: Viewport,
    // Reused staging buffer for projected polygon rings
    clip_scratch: Vec<Vec4>,
}

impl Renderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            clip_scratch: Vec::new(),
        }
    }

    /// Draw a world-space line segment, clipped to the frustum.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        model: &Mat4,
        a: Vec3,
        b: Vec3,
        stroke: Rgba,
    ) {
        let p1 = clip::project_to_clip(view, projection, model.transform_point3(a));
        let p2 = clip::project_to_clip(view, projection, model.transform_point3(b));
        if let Some((t_min, t_max)) = clip::clip_line(p1, p2) {
            frame.strokes.push(Stroke {
                from: self.to_screen(p1.lerp(p2, t_min)),
                to: self.to_screen(p1.lerp(p2, t_max)),
                color: stroke,
            });
        }
    }

    /// Draw a world-space polyline; each clipped edge becomes its own
    /// stroke.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_polyline(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        model: &Mat4,
        closed: bool,
        points: &[Vec3],
        stroke: Rgba,
    ) {
        self.project_points(view, projection, model, points);
        for segment in clip::clip_polyline(closed, &self.clip_scratch) {
            frame.strokes.push(Stroke {
                from: self.to_screen(segment[0]),
                to: self.to_screen(segment[1]),
                color: stroke,
            });
        }
    }

    /// Fill a convex world-space polygon, clipped to the frustum. Nothing
    /// is emitted when the polygon is fully culled.
    pub fn draw_closed_polygon(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        model: &Mat4,
        points: &[Vec3],
        fill: Rgba,
    ) {
        self.project_points(view, projection, model, points);
        if let Some(ring) = clip::clip_polygon(&self.clip_scratch) {
            frame.fills.push(Fill {
                vertices: ring.into_iter().map(|v| self.to_screen(v)).collect(),
                color: fill,
            });
        }
    }

    /// Fill a camera-facing square of `size` world units centered on
    /// `center`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_billboard_quad(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        model: &Mat4,
        center: Vec3,
        size: f32,
        fill: Rgba,
    ) {
        let world_center = model.transform_point3(center);
        let (right, up) = billboard_axes(view);
        let half = size * 0.5;
        let corners = [
            world_center - right * half - up * half,
            world_center + right * half - up * half,
            world_center + right * half + up * half,
            world_center - right * half + up * half,
        ];
        self.draw_closed_polygon(frame, view, projection, &Mat4::IDENTITY, &corners, fill);
    }

    /// Wireframe box for the simulation volume, matching the boundary the
    /// integrator wraps at.
    pub fn draw_domain(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        domain: &Domain,
        stroke: Rgba,
    ) {
        self.draw_box(frame, view, projection, domain.min, domain.max, stroke);
    }

    /// Recursive wireframe of every octree node box, for diagnosing the
    /// spatial index.
    pub fn draw_octree(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        tree: &Octree,
        stroke: Rgba,
    ) {
        let min = tree.center() - tree.half_extent();
        let max = tree.center() + tree.half_extent();
        self.draw_box(frame, view, projection, min, max, stroke);
        if let Some(children) = tree.children() {
            for child in children.iter() {
                self.draw_octree(frame, view, projection, child, stroke);
            }
        }
    }

    /// Draw every boid in the flock with the requested style.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_flock(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        flock: &Flock,
        style: BoidStyle,
        color: Rgba,
    ) {
        match style {
            BoidStyle::None => {}
            BoidStyle::Billboard => {
                for &position in flock.positions() {
                    self.draw_billboard_quad(
                        frame,
                        view,
                        projection,
                        &Mat4::IDENTITY,
                        position,
                        BOID_SIZE,
                        color,
                    );
                }
            }
            BoidStyle::Tetrahedron => {
                for (position, velocity) in
                    flock.positions().iter().zip(flock.velocities().iter())
                {
                    self.draw_tetrahedron(frame, view, projection, *position, *velocity, color);
                }
            }
        }
    }

    // Wireframe tetrahedron with its nose along the velocity heading.
    fn draw_tetrahedron(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        position: Vec3,
        velocity: Vec3,
        stroke: Rgba,
    ) {
        let (forward, up, right) = heading_basis(velocity);
        let nose = position + forward * BOID_SIZE;
        let base_center = position - forward * (BOID_SIZE * 0.5);
        let base_radius = BOID_SIZE * 0.5;
        let base = [
            base_center + up * base_radius,
            base_center - up * (base_radius * 0.5) + right * (base_radius * 0.866),
            base_center - up * (base_radius * 0.5) - right * (base_radius * 0.866),
        ];

        self.draw_polyline(frame, view, projection, &Mat4::IDENTITY, true, &base, stroke);
        for corner in base {
            self.draw_line(
                frame,
                view,
                projection,
                &Mat4::IDENTITY,
                nose,
                corner,
                stroke,
            );
        }
    }

    fn draw_box(
        &mut self,
        frame: &mut Frame,
        view: &Mat4,
        projection: &Mat4,
        min: Vec3,
        max: Vec3,
        stroke: Rgba,
    ) {
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        const EDGES: [(usize, usize); 12] = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];
        for (a, b) in EDGES {
            self.draw_line(
                frame,
                view,
                projection,
                &Mat4::IDENTITY,
                corners[a],
                corners[b],
                stroke,
            );
        }
    }

    fn project_points(&mut self, view: &Mat4, projection: &Mat4, model: &Mat4, points: &[Vec3]) {
        self.clip_scratch.clear();
        self.clip_scratch.extend(
            points
                .iter()
                .map(|&p| clip::project_to_clip(view, projection, model.transform_point3(p))),
        );
    }

    fn to_screen(&self, point: Vec4) -> Vec2 {
        clip::to_screen(point, self.viewport.width, self.viewport.height)
    }
}

// Camera-aligned right and up directions in world space. The view matrix
// rotation is orthonormal, so its rows are the camera axes.
fn billboard_axes(view: &Mat4) -> (Vec3, Vec3) {
    (view.row(0).truncate(), view.row(1).truncate())
}
