use std::collections::VecDeque;

use super::types::HostEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEvent {
    pub sequence: u32,
    pub event: HostEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventQueueError {
    #[error("event queue full ({capacity} pending)")]
    Full { capacity: usize },
}

/// A full queue refuses new events instead of evicting old ones.
pub struct EventQueue {
    pending: VecDeque<PendingEvent>,
    next_sequence: u32,
    max_pending: usize,
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending),
            next_sequence: 0,
            max_pending,
        }
    }

    pub fn push(&mut self, event: HostEvent) -> Result<u32, EventQueueError> {
        if self.pending.len() >= self.max_pending {
            return Err(EventQueueError::Full {
                capacity: self.max_pending,
            });
        }

        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.pending.push_back(PendingEvent { sequence, event });
        Ok(sequence)
    }

    pub fn pop(&mut self) -> Option<PendingEvent> {
        self.pending.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = PendingEvent> + '_ {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_with_sequences() {
        let mut queue = EventQueue::new(8);
        queue.push(HostEvent::PlayerJoined { player: 1 }).unwrap();
        queue
            .push(HostEvent::TriggerEnter {
                player: 1,
                control_point: 3,
            })
            .unwrap();

        let drained: Vec<PendingEvent> = queue.drain().collect();
        assert_eq!(drained[0].sequence, 0);
        assert_eq!(drained[0].event, HostEvent::PlayerJoined { player: 1 });
        assert_eq!(drained[1].sequence, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_refuses() {
        let mut queue = EventQueue::new(1);
        queue.push(HostEvent::PlayerJoined { player: 1 }).unwrap();

        assert_eq!(
            queue.push(HostEvent::PlayerJoined { player: 2 }),
            Err(EventQueueError::Full { capacity: 1 })
        );
        assert_eq!(queue.len(), 1);
    }
}
