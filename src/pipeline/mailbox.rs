//! Shared slot for the most recent recognized utterance.
//!
//! The stdout reader context posts into the mailbox; the capture-loop
//! context takes from it. This is the only state shared between the two
//! flows, and the lock is held only for the swap itself — never across a
//! parse or an event dispatch.

use crate::stt::parser::TranscriptionEvent;
use std::sync::Mutex;

/// Single-slot mailbox holding the latest unconsumed transcription.
///
/// A new post replaces an unconsumed value; the consumer always sees the
/// most recent utterance, matching the original per-frame consumption
/// model where stale text was overwritten.
#[derive(Default)]
pub struct Mailbox {
    slot: Mutex<Option<TranscriptionEvent>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a recognized utterance, replacing any unconsumed one.
    pub fn post(&self, event: TranscriptionEvent) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(event);
        }
    }

    /// Take the pending utterance, leaving the mailbox empty.
    pub fn take(&self) -> Option<TranscriptionEvent> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn event(text: &str) -> TranscriptionEvent {
        TranscriptionEvent {
            text: text.to_string(),
            observed_at: Instant::now(),
        }
    }

    #[test]
    fn test_take_empty_mailbox() {
        let mailbox = Mailbox::new();
        assert!(mailbox.take().is_none());
    }

    #[test]
    fn test_post_then_take_consumes() {
        let mailbox = Mailbox::new();
        mailbox.post(event("one"));
        assert_eq!(mailbox.take().map(|e| e.text), Some("one".to_string()));
        assert!(mailbox.take().is_none(), "take consumes the slot");
    }

    #[test]
    fn test_post_replaces_unconsumed_value() {
        let mailbox = Mailbox::new();
        mailbox.post(event("one"));
        mailbox.post(event("two"));
        assert_eq!(mailbox.take().map(|e| e.text), Some("two".to_string()));
    }
}
