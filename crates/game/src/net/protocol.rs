use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::control::{ControlPointId, ControlPointState};
use crate::team::{PlayerId, Team};

pub const MAX_PACKET_SIZE: usize = 16 * 1024;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x484F4C44;

const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
}

impl PacketHeader {
    pub fn new(sequence: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

#[inline]
pub fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

/// Single roster change. `team == None` means the player was removed.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct TeamDelta {
    pub player: PlayerId,
    pub team: Option<Team>,
    pub red_count: u32,
    pub blue_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct TeamSnapshot {
    pub red_players: Vec<PlayerId>,
    pub blue_players: Vec<PlayerId>,
    pub red_count: u32,
    pub blue_count: u32,
}

impl TeamSnapshot {
    pub fn players(&self, team: Team) -> &[PlayerId] {
        match team {
            Team::Red => &self.red_players,
            Team::Blue => &self.blue_players,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ControlPointUpdate {
    pub control_point: ControlPointId,
    pub state: ControlPointState,
    pub red_count: u32,
    pub blue_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ScoreUpdate {
    pub red_score: u32,
    pub blue_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Broadcast {
    TeamDelta(TeamDelta),
    TeamSnapshot(TeamSnapshot),
    ControlPoint(ControlPointUpdate),
    Scores(ScoreUpdate),
}

impl Broadcast {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TeamDelta(_) => "team-delta",
            Self::TeamSnapshot(_) => "team-snapshot",
            Self::ControlPoint(_) => "control-point",
            Self::Scores(_) => "scores",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: Broadcast,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("invalid packet header (magic {magic:#x}, version {version})")]
    InvalidHeader { magic: u32, version: u32 },
    #[error("packet of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
}

impl Packet {
    pub fn new(header: PacketHeader, payload: Broadcast) -> Self {
        Self { header, payload }
    }

    pub fn sequence(&self) -> u32 {
        self.header.sequence
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    /// Wire bytes, refused when they would not fit in one datagram.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let data = self.serialize()?;
        if data.len() > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge {
                size: data.len(),
                max: MAX_PACKET_SIZE,
            });
        }
        Ok(data)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        // Inbound buffers carry no alignment guarantee.
        let mut aligned = AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);

        let packet = rkyv::from_bytes::<Self, rancor::Error>(&aligned)
            .map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::InvalidHeader {
                magic: packet.header.magic,
                version: packet.header.version,
            });
        }
        Ok(packet)
    }
}
