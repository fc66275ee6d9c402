//! Single-slot mailbox between message arrival and the frame tick
//!
//! The producer overwrites the slot with the latest value; the consumer takes
//! it and leaves the slot empty. Both sides go through one lock, so the
//! consumer never observes a partially written value even when the producer
//! runs on another thread.

use parking_lot::Mutex;

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    closed: bool,
}

/// Holds at most one pending value; newer values replace older ones
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
            }),
        }
    }

    /// Store `value`, replacing any value not yet taken.
    /// Returns `false` and drops `value` if the mailbox is closed.
    pub fn try_set(&self, value: T) -> bool {
        let mut slot = self.slot.lock();
        if slot.closed {
            return false;
        }
        if slot.value.replace(value).is_some() {
            log::trace!("Replaced a pending value that was never taken");
        }
        true
    }

    /// Take the pending value, leaving the slot empty
    pub fn take_and_clear(&self) -> Option<T> {
        self.slot.lock().value.take()
    }

    pub fn has_pending(&self) -> bool {
        self.slot.lock().value.is_some()
    }

    /// Drop any pending value and refuse further values
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        slot.closed = true;
        slot.value = None;
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_latest_value_wins() {
        let mailbox = Mailbox::new();
        assert!(mailbox.try_set(1));
        assert!(mailbox.try_set(2));
        assert!(mailbox.has_pending());

        assert_eq!(mailbox.take_and_clear(), Some(2));
        assert_eq!(mailbox.take_and_clear(), None);
        assert!(!mailbox.has_pending());
    }

    #[test]
    fn test_closed_mailbox_refuses_values() {
        let mailbox = Mailbox::new();
        mailbox.try_set("pending");
        mailbox.close();

        assert!(mailbox.is_closed());
        assert_eq!(mailbox.take_and_clear(), None);
        assert!(!mailbox.try_set("late"));
        assert_eq!(mailbox.take_and_clear(), None);
    }

    #[test]
    fn test_cross_thread_handoff() {
        let mailbox = Arc::new(Mailbox::new());
        let producer = {
            let mailbox = Arc::clone(&mailbox);
            std::thread::spawn(move || {
                for i in 0..1000u32 {
                    mailbox.try_set(vec![i; 16]);
                }
            })
        };

        let mut taken = 0;
        while !producer.is_finished() || mailbox.has_pending() {
            if let Some(value) = mailbox.take_and_clear() {
                // Every observed value is complete and uniform
                assert_eq!(value.len(), 16);
                assert!(value.iter().all(|v| *v == value[0]));
                taken += 1;
            }
        }
        producer.join().unwrap();
        assert!(taken >= 1);
    }
}
