mod channel;
mod outbox;
mod protocol;
mod simulation;
mod stats;
mod stream;

pub use channel::{ChannelError, LoopbackHub, Recipient, ReplicationChannel};
pub use outbox::{Outbox, Outgoing};
pub use protocol::sequence_greater_than;
pub use protocol::{
    Broadcast, ControlPointUpdate, MAX_PACKET_SIZE, PROTOCOL_MAGIC, PROTOCOL_VERSION, Packet,
    PacketError, PacketHeader, ScoreUpdate, TeamDelta, TeamSnapshot,
};
pub use simulation::DeliverySimulation;
pub use stats::ReplicationStats;
pub use stream::{ApplyOutcome, StreamCursor};
