// Id allocation is process-wide, so this lives in its own test binary.

use planar_physics::{reset_ids, shapes, BodyOptions, Engine, Vec2};

fn build_scene() -> Engine {
    let mut engine = Engine::new();
    for i in 0..3 {
        engine.world_mut().add_body(shapes::rectangle(
            Vec2::new(50.0 * i as f64, 0.0),
            20.0,
            20.0,
            BodyOptions::default(),
        ));
    }
    engine
}

#[test]
fn test_reset_ids_rebuilds_identical_scene() {
    reset_ids();
    let mut first = build_scene();
    let first_ids: Vec<_> = first.world().bodies().iter().map(|b| b.id()).collect();
    assert_eq!(first_ids, vec![0, 1, 2]);

    reset_ids();
    let mut second = build_scene();
    let second_ids: Vec<_> = second.world().bodies().iter().map(|b| b.id()).collect();
    assert_eq!(first_ids, second_ids);

    for _ in 0..30 {
        first.step();
        second.step();
    }
    for (a, b) in first.world().bodies().iter().zip(second.world().bodies()) {
        assert_eq!(a.position(), b.position());
        assert_eq!(a.angle(), b.angle());
    }
}
