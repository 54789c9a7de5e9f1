use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::node::NodeId;
use crate::team::PlayerId;

use super::protocol::MAX_PACKET_SIZE;
use super::simulation::DeliverySimulation;
use super::stats::ReplicationStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    All,
    Player(PlayerId),
}

impl Recipient {
    pub fn includes(&self, local_player: Option<PlayerId>) -> bool {
        match self {
            Self::All => true,
            Self::Player(player) => local_player == Some(*player),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("packet of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
}

/// Reliable one-way fan-out from the authority to its observers.
pub trait ReplicationChannel {
    fn send(&mut self, from: NodeId, recipient: Recipient, data: &[u8])
    -> Result<(), ChannelError>;
}

#[derive(Debug, Default)]
struct Inbox {
    player: Option<PlayerId>,
    queue: VecDeque<Vec<u8>>,
}

pub struct LoopbackHub {
    inboxes: BTreeMap<NodeId, Inbox>,
    simulation: DeliverySimulation,
    rng: StdRng,
    stats: ReplicationStats,
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::with_simulation(DeliverySimulation::default(), 0)
    }

    pub fn with_simulation(simulation: DeliverySimulation, seed: u64) -> Self {
        Self {
            inboxes: BTreeMap::new(),
            simulation,
            rng: StdRng::seed_from_u64(seed),
            stats: ReplicationStats::default(),
        }
    }

    pub fn connect(&mut self, node: NodeId, player: Option<PlayerId>) {
        let inbox = self.inboxes.entry(node).or_default();
        inbox.player = player;
    }

    pub fn disconnect(&mut self, node: NodeId) -> bool {
        self.inboxes.remove(&node).is_some()
    }

    pub fn node_for_player(&self, player: PlayerId) -> Option<NodeId> {
        self.inboxes
            .iter()
            .find(|(_, inbox)| inbox.player == Some(player))
            .map(|(&id, _)| id)
    }

    pub fn take_inbox(&mut self, node: NodeId) -> Vec<Vec<u8>> {
        self.inboxes
            .get_mut(&node)
            .map(|inbox| inbox.queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn pending(&self, node: NodeId) -> usize {
        self.inboxes.get(&node).map_or(0, |inbox| inbox.queue.len())
    }

    pub fn simulation(&self) -> &DeliverySimulation {
        &self.simulation
    }

    pub fn set_simulation(&mut self, simulation: DeliverySimulation) {
        self.simulation = simulation;
    }

    pub fn stats(&self) -> &ReplicationStats {
        &self.stats
    }

    fn deliver(&mut self, node: NodeId, data: &[u8]) {
        if self.simulation.should_drop(&mut self.rng) {
            self.stats.packets_dropped += 1;
            return;
        }

        let copies = if self.simulation.should_duplicate(&mut self.rng) {
            self.stats.packets_duplicated += 1;
            2
        } else {
            1
        };

        let Some(inbox) = self.inboxes.get_mut(&node) else {
            return;
        };

        for _ in 0..copies {
            if !inbox.queue.is_empty() && self.simulation.should_reorder(&mut self.rng) {
                let index = self.rng.gen_range(0..inbox.queue.len());
                inbox.queue.insert(index, data.to_vec());
                self.stats.packets_reordered += 1;
            } else {
                inbox.queue.push_back(data.to_vec());
            }
            self.stats.packets_delivered += 1;
        }
    }
}

impl ReplicationChannel for LoopbackHub {
    fn send(
        &mut self,
        from: NodeId,
        recipient: Recipient,
        data: &[u8],
    ) -> Result<(), ChannelError> {
        if data.len() > MAX_PACKET_SIZE {
            return Err(ChannelError::TooLarge {
                size: data.len(),
                max: MAX_PACKET_SIZE,
            });
        }

        let targets: Vec<NodeId> = match recipient {
            Recipient::All => self
                .inboxes
                .keys()
                .copied()
                .filter(|&id| id != from)
                .collect(),
            Recipient::Player(player) => match self.node_for_player(player) {
                Some(id) if id != from => vec![id],
                Some(_) => Vec::new(),
                None => {
                    log::debug!(
                        "no observer bound to player {}, dropping {} bytes",
                        player,
                        data.len()
                    );
                    Vec::new()
                }
            },
        };

        self.stats.packets_sent += 1;
        self.stats.bytes_sent += data.len() as u64;

        for target in targets {
            self.deliver(target, data);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::{Broadcast, Packet, PacketHeader, ScoreUpdate};

    fn score_packet(sequence: u32) -> Vec<u8> {
        Packet::new(
            PacketHeader::new(sequence),
            Broadcast::Scores(ScoreUpdate {
                red_score: sequence,
                blue_score: 0,
            }),
        )
        .encode()
        .unwrap()
    }

    #[test]
    fn broadcast_skips_sender() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        hub.connect(1, Some(10));
        hub.connect(2, Some(20));

        hub.send(0, Recipient::All, &score_packet(1)).unwrap();

        assert_eq!(hub.pending(0), 0);
        assert_eq!(hub.pending(1), 1);
        assert_eq!(hub.pending(2), 1);
    }

    #[test]
    fn targeted_send_reaches_only_that_player() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        hub.connect(1, Some(10));
        hub.connect(2, Some(20));

        hub.send(0, Recipient::Player(20), &score_packet(1)).unwrap();

        assert_eq!(hub.pending(1), 0);
        assert_eq!(hub.pending(2), 1);
    }

    #[test]
    fn unknown_player_is_not_an_error() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);

        assert!(hub.send(0, Recipient::Player(99), &score_packet(1)).is_ok());
        assert_eq!(hub.stats().packets_delivered, 0);
    }

    #[test]
    fn disconnected_node_stops_receiving() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        hub.connect(1, Some(10));
        assert!(hub.disconnect(1));

        hub.send(0, Recipient::All, &score_packet(1)).unwrap();
        assert!(hub.take_inbox(1).is_empty());
    }

    #[test]
    fn oversized_datagram_is_refused() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        hub.connect(1, Some(10));

        let err = hub
            .send(0, Recipient::All, &vec![0; MAX_PACKET_SIZE + 1])
            .unwrap_err();

        assert!(matches!(err, ChannelError::TooLarge { .. }));
        assert_eq!(hub.pending(1), 0);
        assert_eq!(hub.stats().packets_sent, 0);
    }

    #[test]
    fn duplication_doubles_delivery() {
        let sim = DeliverySimulation {
            enabled: true,
            duplicate_percent: 100.0,
            ..Default::default()
        };
        let mut hub = LoopbackHub::with_simulation(sim, 3);
        hub.connect(0, None);
        hub.connect(1, Some(10));

        hub.send(0, Recipient::All, &score_packet(1)).unwrap();

        let inbox = hub.take_inbox(1);
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0], inbox[1]);
        assert_eq!(hub.stats().packets_duplicated, 1);
    }

    #[test]
    fn total_loss_delivers_nothing() {
        let sim = DeliverySimulation {
            enabled: true,
            loss_percent: 100.0,
            ..Default::default()
        };
        let mut hub = LoopbackHub::with_simulation(sim, 3);
        hub.connect(0, None);
        hub.connect(1, Some(10));

        hub.send(0, Recipient::All, &score_packet(1)).unwrap();

        assert_eq!(hub.pending(1), 0);
        assert_eq!(hub.stats().packets_dropped, 1);
    }
}
