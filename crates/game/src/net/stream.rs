use super::protocol::sequence_greater_than;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Older than what this stream already applied.
    Stale,
    /// Addressed to a different instance on this process.
    Foreign,
}

impl ApplyOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Tracks the newest authority sequence applied to one replicated stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamCursor {
    last_applied: Option<u32>,
}

impl StreamCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> Option<u32> {
        self.last_applied
    }

    /// Accepts `sequence` unless it is older than the last applied one.
    /// Re-delivery of the last applied sequence is accepted.
    pub fn admit(&mut self, sequence: u32) -> bool {
        match self.last_applied {
            Some(last) if sequence_greater_than(last, sequence) => false,
            _ => {
                self.last_applied = Some(sequence);
                true
            }
        }
    }

    /// Moves the cursor forward without gating.
    pub fn observe(&mut self, sequence: u32) {
        match self.last_applied {
            Some(last) if !sequence_greater_than(sequence, last) => {}
            _ => self.last_applied = Some(sequence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cursor_accepts_anything() {
        let mut cursor = StreamCursor::new();
        assert!(cursor.admit(500));
        assert_eq!(cursor.last_applied(), Some(500));
    }

    #[test]
    fn older_sequence_rejected() {
        let mut cursor = StreamCursor::new();
        assert!(cursor.admit(5));
        assert!(!cursor.admit(4));
        assert_eq!(cursor.last_applied(), Some(5));
    }

    #[test]
    fn duplicate_sequence_admitted() {
        let mut cursor = StreamCursor::new();
        assert!(cursor.admit(5));
        assert!(cursor.admit(5));
    }

    #[test]
    fn wraparound_counts_as_newer() {
        let mut cursor = StreamCursor::new();
        assert!(cursor.admit(u32::MAX));
        assert!(cursor.admit(0));
        assert!(!cursor.admit(u32::MAX - 1));
    }

    #[test]
    fn observe_never_moves_backwards() {
        let mut cursor = StreamCursor::new();
        cursor.observe(10);
        cursor.observe(3);
        assert_eq!(cursor.last_applied(), Some(10));
    }
}
