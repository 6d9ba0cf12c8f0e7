/*
 * End-to-end simulation test
 *
 * Drives the full tick: init -> step -> render, the same sequence the
 * embedding application runs every frame.
 */

use boids3d::{
    BoidStyle, Camera, Domain, Flock, Frame, Renderer, Rgba, SimulationParams, Viewport,
};

#[test]
fn full_tick_produces_renderable_output() {
    let params = SimulationParams {
        num_boids: 100,
        ..SimulationParams::default()
    };
    let mut flock = Flock::with_seed(params, Domain::default(), 2024).unwrap();

    for _ in 0..60 {
        flock.step(1.0 / 60.0);
    }

    // Every agent is still inside the wrap-around volume.
    let domain = flock.domain();
    for position in flock.positions() {
        for axis in 0..3 {
            assert!(position[axis] >= domain.min[axis]);
            assert!(position[axis] <= domain.max[axis]);
        }
    }

    let mut camera = Camera::new();
    camera.set_aspect(800.0, 600.0);
    let view = camera.view_matrix();
    let projection = camera.projection_matrix();

    let mut renderer = Renderer::new(Viewport::new(800.0, 600.0));
    let mut frame = Frame::new();

    renderer.draw_domain(&mut frame, &view, &projection, &domain, Rgba::WHITE);
    renderer.draw_flock(
        &mut frame,
        &view,
        &projection,
        &flock,
        BoidStyle::Tetrahedron,
        Rgba::WHITE,
    );

    // The camera looks at the whole domain, so geometry must survive
    // clipping.
    assert!(!frame.strokes.is_empty());

    // Billboards go through the polygon path instead.
    frame.clear();
    renderer.draw_flock(
        &mut frame,
        &view,
        &projection,
        &flock,
        BoidStyle::Billboard,
        Rgba::WHITE,
    );
    assert!(!frame.fills.is_empty());

    // BoidStyle::None renders nothing.
    frame.clear();
    renderer.draw_flock(
        &mut frame,
        &view,
        &projection,
        &flock,
        BoidStyle::None,
        Rgba::WHITE,
    );
    assert!(frame.strokes.is_empty() && frame.fills.is_empty());

    // The diagnostic octree overlay draws the index rebuilt by the last
    // tick.
    frame.clear();
    renderer.draw_octree(&mut frame, &view, &projection, flock.index(), Rgba::WHITE);
    assert!(frame.strokes.len() >= 12);
}

#[test]
fn tunables_can_change_between_ticks() {
    let params = SimulationParams {
        num_boids: 30,
        ..SimulationParams::default()
    };
    let mut flock = Flock::with_seed(params, Domain::default(), 7).unwrap();
    flock.step(1.0 / 60.0);

    let mut updated = *flock.params();
    updated.interaction_radius = 20.0;
    updated.max_speed = 12.0;
    let prior = flock.params_mut().replace(updated);
    assert_eq!(prior.interaction_radius, 10.0);

    flock.step(1.0 / 60.0);
    for velocity in flock.velocities() {
        assert!(velocity.length() <= 12.0 + 1.0e-3);
    }
}
