pub mod authority;
pub mod config;
pub mod control;
pub mod event;
pub mod net;
pub mod node;
pub mod presentation;
pub mod score;
pub mod team;

pub use authority::{AuthorityError, Role};
pub use config::{GameConfig, MAX_PLAYERS, ReplicationMode};
pub use control::{
    ControlPointId, ControlPointOccupancy, ControlPointState, ControlPointStateMachine,
    ControlPointStateMirror, Presence,
};
pub use event::{EventQueue, EventQueueError, HostEvent, PendingEvent};
pub use net::{
    ApplyOutcome, Broadcast, ChannelError, ControlPointUpdate, DeliverySimulation, LoopbackHub,
    Packet, PacketError, PacketHeader, Recipient, ReplicationChannel, ReplicationStats,
    ScoreUpdate, TeamDelta, TeamSnapshot,
};
pub use node::{GameNode, NodeError, NodeId};
pub use presentation::{Color, LogPresentation, Presentation, PresentationCall, RecordingPresentation};
pub use score::{ScoreBoard, ScoreMirror, Scores};
pub use team::{
    PlayerId, Team, TeamAssignmentService, TeamCounts, TeamLookup, TeamRoster, TeamRosterMirror,
};
