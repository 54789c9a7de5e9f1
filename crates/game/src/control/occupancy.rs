use std::collections::HashSet;

use crate::team::{PlayerId, Team};

use super::state::{ControlPointState, Presence};

/// Authoritative occupant sets of one capture volume. Sets rather than
/// counts: exits remove a specific player and repeated enters collapse.
#[derive(Debug, Clone, Default)]
pub struct ControlPointOccupancy {
    red: HashSet<PlayerId>,
    blue: HashSet<PlayerId>,
    state: ControlPointState,
}

impl ControlPointOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, player: PlayerId, team: Team) -> Option<ControlPointState> {
        let (own, other) = match team {
            Team::Red => (&mut self.red, &mut self.blue),
            Team::Blue => (&mut self.blue, &mut self.red),
        };
        other.remove(&player);
        own.insert(player);
        self.refresh()
    }

    pub fn exit(&mut self, player: PlayerId) -> Option<ControlPointState> {
        self.red.remove(&player);
        self.blue.remove(&player);
        self.refresh()
    }

    fn refresh(&mut self) -> Option<ControlPointState> {
        let next = ControlPointState::from_presence(self.presence());
        if next == self.state {
            return None;
        }
        self.state = next;
        Some(next)
    }

    pub fn presence(&self) -> Presence {
        Presence::from_counts(self.red.len(), self.blue.len())
    }

    pub fn state(&self) -> ControlPointState {
        self.state
    }

    pub fn count(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red.len() as u32,
            Team::Blue => self.blue.len() as u32,
        }
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.red.contains(&player) || self.blue.contains(&player)
    }

    pub fn len(&self) -> usize {
        self.red.len() + self.blue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
