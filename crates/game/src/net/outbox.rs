use std::collections::VecDeque;

use super::channel::Recipient;
use super::protocol::Broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub recipient: Recipient,
    pub payload: Broadcast,
}

/// Payloads produced by authoritative handlers, waiting for the owning node
/// to stamp a sequence and hand them to the channel.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast(&mut self, payload: Broadcast) {
        self.push(Recipient::All, payload);
    }

    pub fn push(&mut self, recipient: Recipient, payload: Broadcast) {
        self.queue.push_back(Outgoing { recipient, payload });
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Outgoing> + '_ {
        self.queue.drain(..)
    }
}
