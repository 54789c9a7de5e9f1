use crate::net::{ApplyOutcome, ControlPointUpdate, StreamCursor};
use crate::team::{Team, TeamCounts};

use super::ControlPointState;

#[derive(Debug, Clone, Default)]
pub struct ControlPointStateMirror {
    state: ControlPointState,
    counts: TeamCounts,
    cursor: StreamCursor,
}

impl ControlPointStateMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, sequence: u32, update: &ControlPointUpdate) -> ApplyOutcome {
        if !self.cursor.admit(sequence) {
            return ApplyOutcome::Stale;
        }
        self.state = update.state;
        self.counts = TeamCounts::new(update.red_count, update.blue_count);
        ApplyOutcome::Applied
    }

    pub fn state(&self) -> ControlPointState {
        self.state
    }

    pub fn count(&self, team: Team) -> u32 {
        self.counts.get(team)
    }

    pub fn counts(&self) -> TeamCounts {
        self.counts
    }

    pub fn last_sequence(&self) -> Option<u32> {
        self.cursor.last_applied()
    }
}
