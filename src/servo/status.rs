//! Servo status snapshots and change notifications (std only).

use std::sync::Arc;
use std::time::SystemTime;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::units::{Degrees, ServoId};
use crate::config::ChannelConfig;

use super::power::PowerStateKind;

/// Point-in-time view of one servo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServoStatus {
    /// Servo id.
    pub id: ServoId,
    /// Output pin.
    pub pin: u8,
    /// Display name.
    pub name: heapless::String<32>,
    /// Last angle written to the output.
    pub current_angle: Degrees,
    /// Output power state.
    pub power_state: PowerStateKind,
    /// Whether a move is in flight.
    pub moving: bool,
    /// Whether the servo has a working output. Inactive servos take no commands.
    pub active: bool,
    /// When the last move completed.
    pub last_move: Option<SystemTime>,
}

impl ServoStatus {
    /// Status of a freshly registered, detached servo.
    pub fn new(channel: &ChannelConfig) -> Self {
        Self {
            id: channel.id,
            pin: channel.pin,
            name: channel.name.clone(),
            current_angle: channel.initial_angle,
            power_state: PowerStateKind::Detached,
            moving: false,
            active: true,
            last_move: None,
        }
    }

    /// Status of a servo whose output could not be opened.
    pub fn inactive(channel: &ChannelConfig) -> Self {
        Self {
            active: false,
            ..Self::new(channel)
        }
    }
}

/// Why a [`StatusEvent`] was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCause {
    /// A new angle was written.
    AngleChanged,
    /// The power state changed.
    PowerChanged,
    /// The PWM output rejected a command.
    WriteFailed,
}

/// Change notification pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    /// Servo id.
    pub servo_id: ServoId,
    /// Angle at the time of the event.
    pub current_angle: Degrees,
    /// Power state at the time of the event.
    pub power_state: PowerStateKind,
    /// Wall-clock time of the event.
    pub timestamp: SystemTime,
    /// What happened.
    pub cause: EventCause,
}

impl StatusEvent {
    /// Event describing `status` right now.
    pub fn from_status(status: &ServoStatus, cause: EventCause) -> Self {
        Self {
            servo_id: status.id,
            current_angle: status.current_angle,
            power_state: status.power_state,
            timestamp: SystemTime::now(),
            cause,
        }
    }
}

/// Fan-out of [`StatusEvent`]s to any number of subscribers.
///
/// Delivery is best effort: every subscriber has a bounded queue and events
/// for a full queue are dropped, so a stalled consumer never blocks a servo
/// worker. Dropped receivers are pruned on the next publish.
#[derive(Debug, Clone, Default)]
pub struct StatusBus {
    subscribers: Arc<Mutex<Vec<Sender<StatusEvent>>>>,
}

impl StatusBus {
    /// Queue length given to each subscriber by [`subscribe`](Self::subscribe).
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe with the default queue length.
    pub fn subscribe(&self) -> Receiver<StatusEvent> {
        self.subscribe_with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Subscribe with a queue of `capacity` events (at least one).
    pub fn subscribe_with_capacity(&self, capacity: usize) -> Receiver<StatusEvent> {
        let (tx, rx) = bounded(capacity.max(1));
        self.subscribers.lock().push(tx);
        rx
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver `event` to every subscriber.
    pub fn publish(&self, event: StatusEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(servo = %event.servo_id, "status subscriber lagging, event dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: u8) -> StatusEvent {
        let status = ServoStatus::new(&ChannelConfig::new(id, 18));
        StatusEvent::from_status(&status, EventCause::AngleChanged)
    }

    #[test]
    fn test_initial_status() {
        let status = ServoStatus::new(&ChannelConfig::new(3, 19).with_name("wrist"));
        assert_eq!(status.id, ServoId(3));
        assert_eq!(status.name.as_str(), "wrist");
        assert_eq!(status.current_angle, Degrees::CENTER);
        assert_eq!(status.power_state, PowerStateKind::Detached);
        assert!(!status.moving);
        assert!(status.active);
        assert!(status.last_move.is_none());

        let status = ServoStatus::inactive(&ChannelConfig::new(4, 26));
        assert!(!status.active);
        assert_eq!(status.power_state, PowerStateKind::Detached);
    }

    #[test]
    fn test_fan_out() {
        let bus = StatusBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(event(1));

        assert_eq!(a.try_recv().unwrap().servo_id, ServoId(1));
        assert_eq!(b.try_recv().unwrap().servo_id, ServoId(1));
    }

    #[test]
    fn test_full_subscriber_drops_events() {
        let bus = StatusBus::new();
        let rx = bus.subscribe_with_capacity(1);

        bus.publish(event(1));
        bus.publish(event(2));

        assert_eq!(rx.try_recv().unwrap().servo_id, ServoId(1));
        assert!(rx.try_recv().is_err());
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_disconnected_subscriber_pruned() {
        let bus = StatusBus::new();
        let rx = bus.subscribe();
        drop(rx);

        bus.publish(event(1));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
