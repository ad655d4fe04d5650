//! Collision notifications and the event system they feed
//!
//! The collision core only ever writes [`Notification`]s into a
//! [`NotificationSink`]. Buffering and fan-out belong to the sink. The
//! [`EventSystem`] here is one such sink, following Game Engine Architecture
//! Ch 16.8:
//! - Key-value arguments (no order dependency)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify interested handlers)

use std::collections::HashMap;

use crate::foundation::math::Vec3;
use crate::physics::BodyId;
use crate::spatial::NodeId;

/// Probe direction a collision was detected in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeDirection {
    /// Above the body
    Up,
    /// Below the body
    Down,
    /// Toward -x
    Left,
    /// Toward +x
    Right,
}

/// Kind of surface a collision response settled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Sloped staircase surface
    Plane,
    /// Flat face of a solid cell
    Box,
}

/// Which locomotion machine a transition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locomotion {
    /// Staircase ascent and descent
    Staircase,
    /// Ladder climbing
    Ladder,
}

/// Phase of a locomotion machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionPhase {
    /// Normal ground locomotion
    #[default]
    Idle,
    /// Lining up with the staircase or ladder
    Starting,
    /// Following the ramp or ladder
    Climbing,
    /// Leaving the ramp or ladder
    Finishing,
    /// Off the ladder but still overlapping it
    Stopped,
}

/// A collision response applied to a body
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionNotification {
    /// Body the response applied to
    pub subject: BodyId,
    /// Leaf that caused the response, `None` for door records with no cell
    pub node: Option<NodeId>,
    /// Probe that detected the contact
    pub direction: ProbeDirection,
    /// Surface kind
    pub surface: Surface,
    /// Positional correction applied along the probe axis
    pub correction: f32,
}

/// A body passed through an unlocked door
#[derive(Debug, Clone, PartialEq)]
pub struct LevelChange {
    /// Body that used the door
    pub subject: BodyId,
    /// Level to load
    pub next_level: String,
    /// Spawn position in that level
    pub spawn: Vec3,
}

/// A locomotion machine changed phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionNotice {
    /// Body whose machine changed
    pub subject: BodyId,
    /// Machine that changed
    pub machine: Locomotion,
    /// Phase before the change
    pub from: TransitionPhase,
    /// Phase after the change
    pub to: TransitionPhase,
}

/// Everything the collision core reports
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Collision response
    Collision(CollisionNotification),
    /// Door traversal
    LevelChanged(LevelChange),
    /// Locomotion phase change
    Transition(TransitionNotice),
    /// A body left a ladder and walks normally again
    LocomotionRestored {
        /// Body that left the ladder
        subject: BodyId,
    },
}

impl Notification {
    /// Body the notification concerns
    pub fn subject(&self) -> BodyId {
        match self {
            Self::Collision(n) => n.subject,
            Self::LevelChanged(n) => n.subject,
            Self::Transition(n) => n.subject,
            Self::LocomotionRestored { subject } => *subject,
        }
    }

    /// Convert into a keyed event for the [`EventSystem`]
    pub fn to_event(&self, timestamp: f64) -> Event {
        match self {
            Self::Collision(n) => {
                let event = Event::new(EventType::Collision, timestamp)
                    .with_arg("subject", EventArg::Body(n.subject))
                    .with_arg("direction", EventArg::Direction(n.direction))
                    .with_arg("surface", EventArg::Surface(n.surface))
                    .with_arg("correction", EventArg::Correction(n.correction));
                match n.node {
                    Some(node) => event.with_arg("node", EventArg::Node(node)),
                    None => event,
                }
            }
            Self::LevelChanged(n) => Event::new(EventType::LevelChanged, timestamp)
                .with_arg("subject", EventArg::Body(n.subject))
                .with_arg("level", EventArg::Level(n.next_level.clone()))
                .with_arg("spawn", EventArg::Position(n.spawn)),
            Self::Transition(n) => Event::new(EventType::TransitionChanged, timestamp)
                .with_arg("subject", EventArg::Body(n.subject))
                .with_arg("machine", EventArg::Machine(n.machine))
                .with_arg("from", EventArg::Phase(n.from))
                .with_arg("to", EventArg::Phase(n.to)),
            Self::LocomotionRestored { subject } => {
                Event::new(EventType::LocomotionRestored, timestamp)
                    .with_arg("subject", EventArg::Body(*subject))
            }
        }
    }
}

/// Receiver of collision notifications
pub trait NotificationSink {
    /// Accept one notification
    fn notify(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Collision response applied
    Collision,
    /// Body passed through a door
    LevelChanged,
    /// Locomotion phase changed
    TransitionChanged,
    /// Body left a ladder
    LocomotionRestored,
}

/// Variant for type-safe event arguments
/// Uses key-value pairs to avoid order dependency problems
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Body handle
    Body(BodyId),
    /// Index node handle
    Node(NodeId),
    /// Probe direction
    Direction(ProbeDirection),
    /// Surface kind
    Surface(Surface),
    /// Positional correction
    Correction(f32),
    /// Level name
    Level(String),
    /// World position
    Position(Vec3),
    /// Locomotion machine
    Machine(Locomotion),
    /// Machine phase
    Phase(TransitionPhase),
}

/// Event with type ID and key-value arguments
#[derive(Debug, Clone)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Timestamp when event was created (seconds)
    pub timestamp: f64,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create a new event with the given type and timestamp
    pub fn new(event_type: EventType, timestamp: f64) -> Self {
        Self {
            event_type,
            timestamp,
            args: HashMap::new(),
        }
    }

    /// Add an argument to the event (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get subject argument if present
    pub fn get_subject(&self) -> Option<BodyId> {
        match self.get_arg("subject") {
            Some(EventArg::Body(id)) => Some(*id),
            _ => None,
        }
    }

    /// Get level argument if present
    pub fn get_level(&self) -> Option<&str> {
        match self.get_arg("level") {
            Some(EventArg::Level(name)) => Some(name),
            _ => None,
        }
    }

    /// Get target phase argument if present
    pub fn get_phase(&self) -> Option<TransitionPhase> {
        match self.get_arg("to") {
            Some(EventArg::Phase(phase)) => Some(*phase),
            _ => None,
        }
    }

    /// Get surface argument if present
    pub fn get_surface(&self) -> Option<Surface> {
        match self.get_arg("surface") {
            Some(EventArg::Surface(surface)) => Some(*surface),
            _ => None,
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

/// Event system with registration and an immediate queue
/// Follows chain of responsibility pattern
pub struct EventSystem {
    queue: Vec<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
    current_time: f64,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            handlers: HashMap::new(),
            current_time: 0.0,
        }
    }

    /// Update current time (seconds since start)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Register a handler for a specific event type
    /// Only handlers registered for this type will be notified
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Queue an event for the next dispatch
    pub fn send(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch all queued events in arrival order
    pub fn dispatch(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        for event in queued {
            self.dispatch_event(&event);
        }
    }

    /// Dispatch single event to registered handlers
    /// Stops on first handler that returns true (consumed)
    fn dispatch_event(&mut self, event: &Event) {
        if let Some(handlers) = self.handlers.get_mut(&event.event_type) {
            for handler in handlers.iter_mut() {
                if handler.on_event(event) {
                    break;
                }
            }
        }
    }

    /// Clear all queued events (useful for level transitions)
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for EventSystem {
    fn notify(&mut self, notification: Notification) {
        let event = notification.to_event(self.current_time);
        self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use slotmap::SlotMap;

    struct RecordingHandler {
        seen: Rc<RefCell<Vec<EventType>>>,
        consume: bool,
    }

    impl EventHandler for RecordingHandler {
        fn on_event(&mut self, event: &Event) -> bool {
            self.seen.borrow_mut().push(event.event_type);
            self.consume
        }
    }

    fn body_id() -> BodyId {
        let mut bodies: SlotMap<BodyId, ()> = SlotMap::with_key();
        bodies.insert(())
    }

    #[test]
    fn test_notifications_become_events() {
        let subject = body_id();
        let mut system = EventSystem::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        system.register_handler(
            EventType::LevelChanged,
            Box::new(RecordingHandler { seen: Rc::clone(&seen), consume: false }),
        );

        system.update_time(2.5);
        system.notify(Notification::LevelChanged(LevelChange {
            subject,
            next_level: "Vault".to_string(),
            spawn: Vec3::new(1.0, 1.0, 0.0),
        }));
        system.notify(Notification::LocomotionRestored { subject });
        assert_eq!(system.pending(), 2);

        system.dispatch();
        assert_eq!(system.pending(), 0);
        assert_eq!(*seen.borrow(), vec![EventType::LevelChanged]);
    }

    #[test]
    fn test_event_arguments() {
        let subject = body_id();
        let event = Notification::Transition(TransitionNotice {
            subject,
            machine: Locomotion::Ladder,
            from: TransitionPhase::Starting,
            to: TransitionPhase::Climbing,
        })
        .to_event(0.0);

        assert_eq!(event.event_type, EventType::TransitionChanged);
        assert_eq!(event.get_subject(), Some(subject));
        assert_eq!(event.get_phase(), Some(TransitionPhase::Climbing));
        assert_eq!(event.get_level(), None);
    }

    #[test]
    fn test_event_consumption() {
        let mut system = EventSystem::new();
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        system.register_handler(
            EventType::Collision,
            Box::new(RecordingHandler { seen: Rc::clone(&first), consume: true }),
        );
        system.register_handler(
            EventType::Collision,
            Box::new(RecordingHandler { seen: Rc::clone(&second), consume: false }),
        );

        system.send(Event::new(EventType::Collision, 0.0));
        system.dispatch();

        assert_eq!(first.borrow().len(), 1);
        assert!(second.borrow().is_empty());
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let subject = body_id();
        let mut sink: Vec<Notification> = Vec::new();
        sink.notify(Notification::LocomotionRestored { subject });
        sink.notify(Notification::Collision(CollisionNotification {
            subject,
            node: None,
            direction: ProbeDirection::Right,
            surface: Surface::Box,
            correction: -0.1,
        }));
        assert_eq!(sink.len(), 2);
        assert!(sink.iter().all(|n| n.subject() == subject));
    }
}
