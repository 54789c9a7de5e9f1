use holdpoint::{ControlPointId, ControlPointState, NodeId, PlayerId, Team};

#[derive(Debug, Clone)]
pub enum ServerEvent {
    PlayerJoined {
        player: PlayerId,
        team: Team,
    },
    PlayerLeft {
        player: PlayerId,
    },
    ControlPointChanged {
        control_point: ControlPointId,
        state: ControlPointState,
    },
    ScoresChanged {
        red: u32,
        blue: u32,
    },
    Resynced {
        node: NodeId,
    },
    Diverged {
        node: NodeId,
        player: PlayerId,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn describe(&self) -> String {
        match self {
            Self::PlayerJoined { player, team } => {
                format!("Player {} joined {}", player, team.as_str())
            }
            Self::PlayerLeft { player } => format!("Player {} left", player),
            Self::ControlPointChanged {
                control_point,
                state,
            } => format!("Control point {} is {}", control_point, state.as_str()),
            Self::ScoresChanged { red, blue } => format!("Score red {} / blue {}", red, blue),
            Self::Resynced { node } => format!("Node {} back in sync", node),
            Self::Diverged { node, player } => {
                format!("Node {} (player {}) disagrees with authority", node, player)
            }
            Self::Error { message } => message.clone(),
        }
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Diverged { .. } | Self::Error { .. })
    }
}
