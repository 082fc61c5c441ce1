//! Event inbox for callbacks that arrive between decision ticks
//!
//! Host callbacks (scans, collisions, deaths) may be delivered while a tick is
//! being decided. They push into a bounded crossbeam channel and the agent
//! drains everything pending at the start of its next tick, in arrival order.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::game::events::HostEvent;

/// Bounded multi-producer inbox drained by the decision tick
pub struct EventInbox {
    sender: Sender<HostEvent>,
    receiver: Receiver<HostEvent>,
    capacity: usize,
}

impl EventInbox {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Cloneable handle for a callback site
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Returns false when the inbox is full
    #[inline]
    pub fn try_push(&self, event: HostEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    /// Take every pending event, oldest first
    pub fn drain(&self) -> Vec<HostEvent> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventInbox {
    fn default() -> Self {
        // A tick rarely sees more than a scan per opponent plus a few collisions
        Self::new(256)
    }
}

/// Clonable sender handle for callback sites
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<HostEvent>,
}

impl EventSender {
    #[inline]
    pub fn try_send(&self, event: HostEvent) -> Result<(), InboxError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => InboxError::Full,
            TrySendError::Disconnected(_) => InboxError::Disconnected,
        })
    }
}

/// Inbox errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InboxError {
    #[error("event inbox is full")]
    Full,
    #[error("event inbox was dropped")]
    Disconnected,
}
