//! Synchronous, ordered notifications raised during a step.
//!
//! Handlers run inline, in registration order, while the engine is in the
//! middle of its update. They receive read-only data and cannot reach back
//! into the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collision::pair::Pair;
use crate::common::BodyId;

/// The topics the engine raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    BeforeUpdate,
    AfterUpdate,
    CollisionStart,
    CollisionActive,
    CollisionEnd,
    SleepStart,
    SleepEnd,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BeforeUpdate => "beforeUpdate",
            EventKind::AfterUpdate => "afterUpdate",
            EventKind::CollisionStart => "collisionStart",
            EventKind::CollisionActive => "collisionActive",
            EventKind::CollisionEnd => "collisionEnd",
            EventKind::SleepStart => "sleepStart",
            EventKind::SleepEnd => "sleepEnd",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification with its payload.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    BeforeUpdate { timestamp: f64 },
    AfterUpdate { timestamp: f64 },
    CollisionStart { pairs: &'a [&'a Pair] },
    CollisionActive { pairs: &'a [&'a Pair] },
    CollisionEnd { pairs: &'a [&'a Pair] },
    SleepStart { body: BodyId },
    SleepEnd { body: BodyId },
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::BeforeUpdate { .. } => EventKind::BeforeUpdate,
            Event::AfterUpdate { .. } => EventKind::AfterUpdate,
            Event::CollisionStart { .. } => EventKind::CollisionStart,
            Event::CollisionActive { .. } => EventKind::CollisionActive,
            Event::CollisionEnd { .. } => EventKind::CollisionEnd,
            Event::SleepStart { .. } => EventKind::SleepStart,
            Event::SleepEnd { .. } => EventKind::SleepEnd,
        }
    }
}

/// Handle returned by [`Events::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

pub type Callback = Box<dyn FnMut(&Event<'_>)>;

/// Subscriber registry.
#[derive(Default)]
pub struct Events {
    next_id: usize,
    handlers: Vec<(HandlerId, EventKind, Callback)>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `callback` to one topic.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> HandlerId
    where
        F: FnMut(&Event<'_>) + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, kind, Box::new(callback)));
        id
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler, _, _)| *handler != id);
        self.handlers.len() != before
    }

    pub fn has_handlers(&self, kind: EventKind) -> bool {
        self.handlers.iter().any(|(_, k, _)| *k == kind)
    }

    /// Calls every handler of the event's topic, in subscription order.
    pub fn trigger(&mut self, event: &Event<'_>) {
        let kind = event.kind();
        for (_, k, callback) in self.handlers.iter_mut() {
            if *k == kind {
                callback(event);
            }
        }
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_trigger_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = Events::new();

        let first = Rc::clone(&log);
        events.on(EventKind::SleepStart, move |_| first.borrow_mut().push("first"));
        let second = Rc::clone(&log);
        events.on(EventKind::SleepStart, move |_| second.borrow_mut().push("second"));
        let other = Rc::clone(&log);
        events.on(EventKind::SleepEnd, move |_| other.borrow_mut().push("other"));

        events.trigger(&Event::SleepStart { body: 1 });
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_off_unsubscribes() {
        let count = Rc::new(RefCell::new(0));
        let mut events = Events::new();

        let counter = Rc::clone(&count);
        let id = events.on(EventKind::BeforeUpdate, move |event| {
            if let Event::BeforeUpdate { timestamp } = event {
                assert_eq!(*timestamp, 16.0);
            }
            *counter.borrow_mut() += 1;
        });

        events.trigger(&Event::BeforeUpdate { timestamp: 16.0 });
        assert!(events.off(id));
        assert!(!events.off(id));
        events.trigger(&Event::BeforeUpdate { timestamp: 16.0 });

        assert_eq!(*count.borrow(), 1);
        assert!(!events.has_handlers(EventKind::BeforeUpdate));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EventKind::CollisionStart.as_str(), "collisionStart");
        assert_eq!(EventKind::SleepEnd.to_string(), "sleepEnd");
        assert_eq!(Event::AfterUpdate { timestamp: 0.0 }.kind(), EventKind::AfterUpdate);
    }
}
