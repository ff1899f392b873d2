//! The step driver: owns the world, the pair registry and the clock, and runs
//! every phase of a simulation step in a fixed order.

pub mod config;
pub mod events;
pub mod sleeping;

pub use config::{EngineConfig, Gravity, Timing};
pub use events::{Event, EventKind, Events, HandlerId};

use tracing::{debug, trace};

use crate::collision::detector::Detector;
use crate::collision::pairs::Pairs;
use crate::collision::resolver;
use crate::constraints;
use crate::error::PhysicsError;
use crate::integration::integrate;
use crate::objects::rigid_body::RigidBody;
use crate::world::PhysicsWorld;

#[derive(Debug, Default)]
pub struct Engine {
    world: PhysicsWorld,
    pairs: Pairs,
    detector: Detector,
    events: Events,
    config: EngineConfig,
    timing: Timing,
}

impl Engine {
    pub fn new() -> Self {
        let engine = Engine::default();
        debug!(config = ?engine.config, "engine created");
        engine
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        debug!(?config, "engine created");
        Ok(Engine {
            timing: Timing {
                time_scale: config.time_scale,
                ..Timing::default()
            },
            config,
            ..Engine::default()
        })
    }

    /// Steps with the configured default delta and no correction.
    pub fn step(&mut self) {
        self.update(self.config.delta, 1.0);
    }

    /// Advances the simulation by `delta` milliseconds.
    ///
    /// `correction` compensates for a delta that differs from the previous
    /// one; pass 1 for a fixed step.
    pub fn update(&mut self, delta: f64, correction: f64) {
        let time_scale = self.timing.time_scale;
        self.timing.timestamp += delta * time_scale;
        self.timing.last_delta = delta * time_scale;
        let timestamp = self.timing.timestamp;

        self.events.trigger(&Event::BeforeUpdate { timestamp });

        let config = &self.config;
        let (bodies, world_constraints) = self.world.split_mut();

        if config.enable_sleeping {
            sleeping::update(bodies, time_scale, &mut self.events);
        }

        apply_gravity(bodies, config.gravity);

        for body in bodies.iter_mut() {
            if body.is_static || body.is_sleeping {
                continue;
            }
            integrate(body, delta, time_scale, correction);
        }

        constraints::pre_solve_all(bodies);
        for _ in 0..config.constraint_iterations {
            constraints::solve_all(world_constraints, bodies, time_scale);
        }
        constraints::post_solve_all(bodies, &mut self.events);

        let collisions = self.detector.collisions(bodies);
        trace!(timestamp, collisions = collisions.len(), "narrow phase");
        self.pairs.update(collisions, bodies, timestamp);

        if config.enable_sleeping {
            sleeping::after_collisions(&self.pairs, bodies, time_scale, &mut self.events);
        }

        if !self.pairs.collision_start().is_empty() {
            let started = self.pairs.resolve(self.pairs.collision_start());
            self.events.trigger(&Event::CollisionStart { pairs: started.as_slice() });
        }

        resolver::pre_solve_position(&self.pairs, bodies);
        for _ in 0..config.position_iterations {
            resolver::solve_position(&mut self.pairs, bodies, time_scale);
        }
        resolver::post_solve_position(bodies);

        constraints::pre_solve_all(bodies);
        for _ in 0..config.constraint_iterations {
            constraints::solve_all(world_constraints, bodies, time_scale);
        }
        constraints::post_solve_all(bodies, &mut self.events);

        resolver::pre_solve_velocity(&self.pairs, bodies);
        for _ in 0..config.velocity_iterations {
            resolver::solve_velocity(&mut self.pairs, bodies, time_scale);
        }

        if !self.pairs.collision_active().is_empty() {
            let active = self.pairs.resolve(self.pairs.collision_active());
            self.events.trigger(&Event::CollisionActive { pairs: active.as_slice() });
        }
        if !self.pairs.collision_end().is_empty() {
            let ended = self.pairs.resolve(self.pairs.collision_end());
            self.events.trigger(&Event::CollisionEnd { pairs: ended.as_slice() });
        }

        for body in bodies.iter_mut() {
            body.clear_forces();
        }

        self.events.trigger(&Event::AfterUpdate { timestamp });
    }

    /// Forgets every pair, so the next step starts without contact history.
    pub fn clear(&mut self) {
        debug!(pairs = self.pairs.len(), "engine cleared");
        self.pairs.clear();
    }

    /// Removes a body with its pairs and constraints. Later indices shift down.
    pub fn remove_body(&mut self, index: usize) -> Option<RigidBody> {
        let body = self.world.remove_body(index)?;
        self.pairs.remove_body(index);
        Some(body)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn pairs(&self) -> &Pairs {
        &self.pairs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        self.timing.time_scale = time_scale;
    }

    pub fn set_gravity(&mut self, gravity: Gravity) {
        self.config.gravity = gravity;
    }

    pub fn set_sleeping(&mut self, enabled: bool) {
        self.config.enable_sleeping = enabled;
    }

    pub fn events_mut(&mut self) -> &mut Events {
        &mut self.events
    }

    /// Shorthand for `events_mut().on(..)`.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> HandlerId
    where
        F: FnMut(&Event<'_>) + 'static,
    {
        self.events.on(kind, callback)
    }
}

fn apply_gravity(bodies: &mut [RigidBody], gravity: Gravity) {
    if (gravity.x == 0.0 && gravity.y == 0.0) || gravity.scale == 0.0 {
        return;
    }

    for body in bodies.iter_mut() {
        if body.is_static || body.is_sleeping {
            continue;
        }
        body.force += gravity.vector() * (body.mass * gravity.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintOptions;
    use crate::math::vec2::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;
    const EPSILON: f64 = 1e-9;

    fn square(position: Vec2) -> RigidBody {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        RigidBody::new(&points, position)
    }

    #[test]
    fn test_engine_new() {
        let engine = Engine::new();
        assert!(engine.world().bodies().is_empty());
        assert!(engine.pairs().is_empty());
        assert_eq!(engine.timing().timestamp, 0.0);
        assert_eq!(engine.config(), &EngineConfig::default());
    }

    #[test]
    fn test_with_config_validates() {
        let bad = EngineConfig {
            position_iterations: 0,
            ..EngineConfig::default()
        };
        assert!(Engine::with_config(bad).is_err());

        let slow = EngineConfig {
            time_scale: 0.5,
            ..EngineConfig::default()
        };
        let engine = Engine::with_config(slow).unwrap();
        assert_eq!(engine.timing().time_scale, 0.5);
    }

    #[test]
    fn test_timestamp_advances_by_scaled_delta() {
        let mut engine = Engine::new();
        engine.set_time_scale(0.5);
        engine.update(10.0, 1.0);
        engine.update(10.0, 1.0);

        assert!((engine.timing().timestamp - 10.0).abs() < EPSILON);
        assert!((engine.timing().last_delta - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_step_gravity() {
        let mut engine = Engine::new();
        let idx = engine.world_mut().add_body(square(Vec2::ZERO));

        engine.step();

        // a = g·scale, one step from rest moves a·dt²
        let dt = 1000.0 / 60.0;
        let body = engine.world().body(idx).unwrap();
        assert!((body.position().y - 0.001 * dt * dt).abs() < EPSILON);
        assert_eq!(body.position().x, 0.0);
        assert!(body.force.is_zero());
    }

    #[test]
    fn test_step_no_gravity_on_static() {
        let mut engine = Engine::new();
        let mut ground = square(Vec2::ZERO);
        ground.set_static(true);
        let idx = engine.world_mut().add_body(ground);
        let initial = engine.world().body(idx).unwrap().clone();

        engine.step();
        assert_eq!(engine.world().body(idx).unwrap(), &initial);
    }

    #[test]
    fn test_step_distance_constraint_solving() {
        let mut engine = Engine::new();
        engine.set_gravity(Gravity {
            x: 0.0,
            y: 0.0,
            scale: 0.0,
        });
        let idx_a = engine.world_mut().add_body(square(Vec2::ZERO));
        let idx_b = engine.world_mut().add_body(square(Vec2::new(4.0, 0.0)));
        engine
            .world_mut()
            .add_constraint(ConstraintOptions {
                body_a: Some(idx_a),
                body_b: Some(idx_b),
                length: Some(6.0),
                ..ConstraintOptions::default()
            })
            .unwrap();

        engine.step();

        let a = engine.world().body(idx_a).unwrap().position();
        let b = engine.world().body(idx_b).unwrap().position();
        assert!((a.distance(b) - 6.0).abs() < 0.05);
        assert!(a.x < 0.0 && b.x > 4.0);
    }

    #[test]
    fn test_update_event_order() {
        let mut engine = Engine::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::BeforeUpdate, EventKind::AfterUpdate] {
            let log = Rc::clone(&log);
            engine.on(kind, move |event| log.borrow_mut().push(event.kind()));
        }

        engine.step();
        assert_eq!(
            *log.borrow(),
            vec![EventKind::BeforeUpdate, EventKind::AfterUpdate]
        );
    }

    #[test]
    fn test_remove_body_purges_pairs() {
        let mut engine = Engine::new();
        let mut ground = square(Vec2::new(0.0, 1.9));
        ground.set_static(true);
        engine.world_mut().add_body(ground);
        engine.world_mut().add_body(square(Vec2::ZERO));

        engine.step();
        assert_eq!(engine.pairs().len(), 1);

        assert!(engine.remove_body(1).is_some());
        assert!(engine.pairs().is_empty());
        assert!(engine.remove_body(5).is_none());
    }

    #[test]
    fn test_collision_end_carries_the_ended_pair() {
        let mut engine = Engine::new();
        engine.world_mut().add_body(square(Vec2::ZERO));
        engine.world_mut().add_body(square(Vec2::new(1.5, 0.0)));
        let ended = Rc::new(RefCell::new(Vec::new()));
        {
            let ended = Rc::clone(&ended);
            engine.on(EventKind::CollisionEnd, move |event| {
                if let Event::CollisionEnd { pairs } = event {
                    ended.borrow_mut().extend(pairs.iter().map(|p| p.bodies()));
                }
            });
        }

        engine.step();
        engine
            .world_mut()
            .body_mut(1)
            .unwrap()
            .set_position(Vec2::new(500.0, 0.0));
        engine.step();

        assert_eq!(*ended.borrow(), vec![(0, 1)]);
        assert!(engine.pairs().is_empty());
    }

    #[test]
    fn test_clear_drops_pairs() {
        let mut engine = Engine::new();
        engine.world_mut().add_body(square(Vec2::ZERO));
        engine.world_mut().add_body(square(Vec2::new(1.0, 0.0)));

        engine.step();
        assert!(!engine.pairs().is_empty());
        engine.clear();
        assert!(engine.pairs().is_empty());
    }
}
