mod mirror;
mod roster;
mod service;

use serde::{Deserialize, Serialize};

pub use mirror::TeamRosterMirror;
pub use roster::TeamRoster;
pub use service::TeamAssignmentService;

pub type PlayerId = u32;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    pub fn other(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCounts {
    pub red: u32,
    pub blue: u32,
}

impl TeamCounts {
    pub fn new(red: u32, blue: u32) -> Self {
        Self { red, blue }
    }

    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    pub fn total(&self) -> u32 {
        self.red + self.blue
    }

    pub fn imbalance(&self) -> u32 {
        self.red.abs_diff(self.blue)
    }
}

pub trait TeamLookup {
    fn team_of(&self, player: PlayerId) -> Option<Team>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_team_flips() {
        assert_eq!(Team::Red.other(), Team::Blue);
        assert_eq!(Team::Blue.other(), Team::Red);
    }

    #[test]
    fn counts_imbalance() {
        assert_eq!(TeamCounts::new(3, 1).imbalance(), 2);
        assert_eq!(TeamCounts::new(1, 3).imbalance(), 2);
        assert_eq!(TeamCounts::new(2, 2).get(Team::Blue), 2);
    }
}
