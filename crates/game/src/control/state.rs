use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::presentation::Color;
use crate::team::Team;

bitflags! {
    /// Which teams currently have at least one occupant on a point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Presence: u8 {
        const RED = 1 << 0;
        const BLUE = 1 << 1;
    }
}

impl Presence {
    pub fn from_counts(red: usize, blue: usize) -> Self {
        let mut presence = Self::empty();
        presence.set(Self::RED, red > 0);
        presence.set(Self::BLUE, blue > 0);
        presence
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum ControlPointState {
    #[default]
    Neutral,
    RedControlled,
    BlueControlled,
    Contested,
}

impl ControlPointState {
    pub fn from_presence(presence: Presence) -> Self {
        match (
            presence.contains(Presence::RED),
            presence.contains(Presence::BLUE),
        ) {
            (true, true) => Self::Contested,
            (true, false) => Self::RedControlled,
            (false, true) => Self::BlueControlled,
            (false, false) => Self::Neutral,
        }
    }

    pub fn controller(self) -> Option<Team> {
        match self {
            Self::RedControlled => Some(Team::Red),
            Self::BlueControlled => Some(Team::Blue),
            Self::Neutral | Self::Contested => None,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Neutral => Color::Gray,
            Self::RedControlled => Color::Red,
            Self::BlueControlled => Color::Blue,
            Self::Contested => Color::Yellow,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::RedControlled => "red",
            Self::BlueControlled => "blue",
            Self::Contested => "contested",
        }
    }
}
