use crate::control::ControlPointId;
use crate::team::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    PlayerJoined {
        player: PlayerId,
    },
    PlayerLeft {
        player: PlayerId,
    },
    TriggerEnter {
        player: PlayerId,
        control_point: ControlPointId,
    },
    TriggerExit {
        player: PlayerId,
        control_point: ControlPointId,
    },
}

impl HostEvent {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "on_player_join",
            Self::PlayerLeft { .. } => "on_player_leave",
            Self::TriggerEnter { .. } => "on_enter",
            Self::TriggerExit { .. } => "on_exit",
        }
    }
}
