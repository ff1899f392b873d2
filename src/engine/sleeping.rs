//! Motion-based deactivation of resting bodies.

use tracing::trace;

use crate::collision::pairs::Pairs;
use crate::engine::events::{Event, Events};
use crate::objects::get_mutable_body_pair;
use crate::objects::rigid_body::RigidBody;

const MOTION_WAKE_THRESHOLD: f64 = 0.18;
const MOTION_SLEEP_THRESHOLD: f64 = 0.08;
/// Weight of the smaller of (previous, current) motion in the running blend.
const MIN_BIAS: f64 = 0.9;

/// Updates every body's smoothed motion and puts bodies to sleep after
/// `sleep_threshold` consecutive quiet steps.
///
/// A body with a pending force is woken instead. Static bodies are skipped.
pub fn update(bodies: &mut [RigidBody], time_scale: f64, events: &mut Events) {
    let time_factor = time_scale * time_scale * time_scale;

    for body in bodies.iter_mut() {
        if body.is_static {
            continue;
        }

        let motion = body.speed * body.speed + body.angular_speed * body.angular_speed;

        if !body.force.is_zero() {
            set(body, false, events);
            continue;
        }

        let min_motion = body.motion.min(motion);
        let max_motion = body.motion.max(motion);
        body.motion = MIN_BIAS * min_motion + (1.0 - MIN_BIAS) * max_motion;

        if body.sleep_threshold > 0 && body.motion < MOTION_SLEEP_THRESHOLD * time_factor {
            body.sleep_counter += 1;
            if body.sleep_counter >= body.sleep_threshold {
                set(body, true, events);
            }
        } else if body.sleep_counter > 0 {
            body.sleep_counter -= 1;
        }
    }
}

/// Wakes a sleeping body that is touched by a body moving fast enough.
///
/// Pairs where both bodies sleep, or where either is static, are ignored.
pub fn after_collisions(pairs: &Pairs, bodies: &mut [RigidBody], time_scale: f64, events: &mut Events) {
    let time_factor = time_scale * time_scale * time_scale;

    for pair in pairs.iter() {
        if !pair.is_active {
            continue;
        }
        let Some((a, b)) = get_mutable_body_pair(bodies, pair.body_a, pair.body_b) else {
            continue;
        };

        if (a.is_sleeping && b.is_sleeping) || a.is_static || b.is_static {
            continue;
        }

        if a.is_sleeping || b.is_sleeping {
            let (sleeping, moving) = if a.is_sleeping { (a, b) } else { (b, a) };
            if moving.motion > MOTION_WAKE_THRESHOLD * time_factor {
                set(sleeping, false, events);
            }
        }
    }
}

/// Puts a body to sleep or wakes it, raising `sleepStart`/`sleepEnd` only
/// on an actual transition.
pub fn set(body: &mut RigidBody, is_sleeping: bool, events: &mut Events) {
    if is_sleeping {
        if body.sleep() {
            trace!(body = body.id, "sleep start");
            events.trigger(&Event::SleepStart { body: body.id });
        }
    } else if body.wake() {
        trace!(body = body.id, "sleep end");
        events.trigger(&Event::SleepEnd { body: body.id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::EventKind;
    use crate::math::vec2::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

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
    fn test_sleeps_after_exact_threshold() {
        let mut bodies = vec![square(Vec2::ZERO)];
        bodies[0].sleep_threshold = 5;
        let mut events = Events::new();

        for _ in 0..4 {
            update(&mut bodies, 1.0, &mut events);
            assert!(!bodies[0].is_sleeping());
        }
        update(&mut bodies, 1.0, &mut events);
        assert!(bodies[0].is_sleeping());
        assert_eq!(bodies[0].sleep_counter(), 5);
    }

    #[test]
    fn test_force_resets_eligibility() {
        let mut bodies = vec![square(Vec2::ZERO)];
        bodies[0].sleep_threshold = 3;
        let mut events = Events::new();

        update(&mut bodies, 1.0, &mut events);
        update(&mut bodies, 1.0, &mut events);
        bodies[0].force = Vec2::new(0.0, 1.0);
        update(&mut bodies, 1.0, &mut events);
        assert_eq!(bodies[0].sleep_counter(), 0);
        bodies[0].force = Vec2::ZERO;

        update(&mut bodies, 1.0, &mut events);
        update(&mut bodies, 1.0, &mut events);
        assert!(!bodies[0].is_sleeping());
        update(&mut bodies, 1.0, &mut events);
        assert!(bodies[0].is_sleeping());
    }

    #[test]
    fn test_moving_body_does_not_sleep() {
        let mut bodies = vec![square(Vec2::ZERO)];
        bodies[0].sleep_threshold = 2;
        bodies[0].speed = 1.0;
        let mut events = Events::new();

        for _ in 0..10 {
            update(&mut bodies, 1.0, &mut events);
        }
        assert!(!bodies[0].is_sleeping());
        assert_eq!(bodies[0].sleep_counter(), 0);
    }

    #[test]
    fn test_zero_threshold_never_sleeps() {
        let mut bodies = vec![square(Vec2::ZERO)];
        bodies[0].sleep_threshold = 0;
        let mut events = Events::new();

        for _ in 0..10 {
            update(&mut bodies, 1.0, &mut events);
        }
        assert!(!bodies[0].is_sleeping());
    }

    #[test]
    fn test_set_fires_only_on_transitions() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = Events::new();
        for kind in [EventKind::SleepStart, EventKind::SleepEnd] {
            let log = Rc::clone(&log);
            events.on(kind, move |event| log.borrow_mut().push(event.kind()));
        }

        let mut body = square(Vec2::ZERO);
        body.set_velocity(Vec2::new(1.0, 0.0));

        set(&mut body, true, &mut events);
        set(&mut body, true, &mut events);
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert_eq!(body.speed(), 0.0);

        set(&mut body, false, &mut events);
        set(&mut body, false, &mut events);
        assert_eq!(body.sleep_counter(), 0);

        assert_eq!(
            *log.borrow(),
            vec![EventKind::SleepStart, EventKind::SleepEnd]
        );
    }

    #[test]
    fn test_static_bodies_are_skipped() {
        let mut bodies = vec![square(Vec2::ZERO)];
        bodies[0].sleep_threshold = 1;
        bodies[0].set_static(true);
        let mut events = Events::new();

        update(&mut bodies, 1.0, &mut events);
        assert!(!bodies[0].is_sleeping());
    }
}
