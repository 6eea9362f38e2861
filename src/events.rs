//! Command events and the subscriber registry.
//!
//! Recognized commands are delivered to subscribers as fire-and-forget
//! notifications. The registry replaces ad-hoc callback wiring: consumers
//! subscribe explicitly and are unregistered deterministically when the
//! pipeline shuts down.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// A recognized spoken command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpokenCommand {
    /// The affirmative option ("one" / 1).
    Affirmative,
    /// The negative option ("two" / 2).
    Negative,
}

impl SpokenCommand {
    /// The numeric value game logic consumes (1 or 2).
    pub fn digit(self) -> u8 {
        match self {
            SpokenCommand::Affirmative => 1,
            SpokenCommand::Negative => 2,
        }
    }
}

/// Events emitted by the command mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandEvent {
    /// An utterance mapped to a command.
    Recognized { command: SpokenCommand },
    /// An utterance matched neither vocabulary; the consumer should
    /// prompt the speaker to repeat. Raised once per utterance.
    Unrecognized,
}

/// Identifier returned by [`CommandBus::subscribe`], used to unsubscribe.
pub type SubscriberId = u64;

/// A live subscription to command events.
pub struct Subscription {
    pub id: SubscriberId,
    pub events: crossbeam_channel::Receiver<CommandEvent>,
}

/// Observer registry for command events.
///
/// Publishing never blocks: channels are unbounded and disconnected
/// subscribers are pruned on the next publish.
#[derive(Default)]
pub struct CommandBus {
    subscribers: Mutex<Vec<(SubscriberId, crossbeam_channel::Sender<CommandEvent>)>>,
    next_id: AtomicU64,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push((id, tx));
        }
        Subscription { id, events: rx }
    }

    /// Removes a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|(sub_id, _)| *sub_id != id);
        }
    }

    /// Removes all subscribers. Called on pipeline shutdown so stale
    /// receivers never outlive the stream that fed them.
    pub fn clear(&self) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.clear();
        }
    }

    /// Delivers an event to every live subscriber.
    pub fn publish(&self, event: CommandEvent) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|(_, tx)| tx.send(event).is_ok());
        }
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoken_command_digits() {
        assert_eq!(SpokenCommand::Affirmative.digit(), 1);
        assert_eq!(SpokenCommand::Negative.digit(), 2);
    }

    #[test]
    fn test_event_json_is_snake_case() {
        let event = CommandEvent::Recognized {
            command: SpokenCommand::Negative,
        };
        let json = serde_json::to_string(&event).expect("should serialize");
        assert!(
            json.contains("\"type\":\"recognized\""),
            "JSON should use snake_case. Got: {}",
            json
        );
        assert!(json.contains("\"command\":\"negative\""), "Got: {}", json);
    }

    #[test]
    fn test_event_json_roundtrip() {
        let events = [
            CommandEvent::Recognized {
                command: SpokenCommand::Affirmative,
            },
            CommandEvent::Recognized {
                command: SpokenCommand::Negative,
            },
            CommandEvent::Unrecognized,
        ];

        for event in events {
            let json = serde_json::to_string(&event).expect("should serialize");
            let back: CommandEvent = serde_json::from_str(&json).expect("should deserialize");
            assert_eq!(event, back, "roundtrip failed for {:?}", event);
        }
    }

    #[test]
    fn test_subscribe_receives_published_events() {
        let bus = CommandBus::new();
        let sub = bus.subscribe();

        bus.publish(CommandEvent::Unrecognized);

        assert_eq!(sub.events.try_recv(), Ok(CommandEvent::Unrecognized));
        assert!(sub.events.try_recv().is_err(), "only one event published");
    }

    #[test]
    fn test_publish_fans_out_to_all_subscribers() {
        let bus = CommandBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        let event = CommandEvent::Recognized {
            command: SpokenCommand::Affirmative,
        };
        bus.publish(event);

        assert_eq!(a.events.try_recv(), Ok(event));
        assert_eq!(b.events.try_recv(), Ok(event));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = CommandBus::new();
        let sub = bus.subscribe();
        bus.unsubscribe(sub.id);

        bus.publish(CommandEvent::Unrecognized);
        assert!(sub.events.try_recv().is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_dropped_receivers_are_pruned_on_publish() {
        let bus = CommandBus::new();
        let sub = bus.subscribe();
        drop(sub.events);

        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(CommandEvent::Unrecognized);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_clear_removes_everyone() {
        let bus = CommandBus::new();
        let _a = bus.subscribe();
        let _b = bus.subscribe();
        bus.clear();
        assert_eq!(bus.subscriber_count(), 0);
    }
}
