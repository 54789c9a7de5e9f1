use std::collections::BTreeMap;

use crate::authority::{AuthorityError, Role};
use crate::config::GameConfig;
use crate::control::{ControlPointId, ControlPointState, ControlPointStateMachine};
use crate::event::HostEvent;
use crate::net::{
    ApplyOutcome, Broadcast, ChannelError, Outgoing, Packet, PacketError, PacketHeader,
    Recipient, ReplicationChannel, ReplicationStats,
};
use crate::presentation::Presentation;
use crate::score::{ScoreBoard, Scores};
use crate::team::{PlayerId, TeamAssignmentService};

pub type NodeId = u32;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    Authority(#[from] AuthorityError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Packet(#[from] PacketError),
}

/// Everything one process runs: the team service, one state machine per
/// control point, scoring and the local presentation.
pub struct GameNode<P> {
    id: NodeId,
    role: Role,
    local_player: Option<PlayerId>,
    config: GameConfig,
    teams: TeamAssignmentService,
    control_points: BTreeMap<ControlPointId, ControlPointStateMachine>,
    scores: ScoreBoard,
    presentation: P,
    next_sequence: u32,
    tick: u32,
    stats: ReplicationStats,
}

impl<P: Presentation> GameNode<P> {
    pub fn authority<I>(id: NodeId, config: GameConfig, control_points: I, presentation: P) -> Self
    where
        I: IntoIterator<Item = ControlPointId>,
    {
        Self::new(id, Role::Authority, None, config, control_points, presentation)
    }

    pub fn replica<I>(
        id: NodeId,
        local_player: PlayerId,
        config: GameConfig,
        control_points: I,
        presentation: P,
    ) -> Self
    where
        I: IntoIterator<Item = ControlPointId>,
    {
        Self::new(
            id,
            Role::Replica,
            Some(local_player),
            config,
            control_points,
            presentation,
        )
    }

    fn new<I>(
        id: NodeId,
        role: Role,
        local_player: Option<PlayerId>,
        config: GameConfig,
        control_points: I,
        presentation: P,
    ) -> Self
    where
        I: IntoIterator<Item = ControlPointId>,
    {
        let control_points = control_points
            .into_iter()
            .map(|cp| (cp, ControlPointStateMachine::new(cp, role)))
            .collect();

        Self {
            id,
            role,
            local_player,
            teams: TeamAssignmentService::new(role, config.replication_mode)
                .with_max_players(config.max_players),
            control_points,
            scores: ScoreBoard::new(role, &config),
            config,
            presentation,
            next_sequence: 0,
            tick: 0,
            stats: ReplicationStats::default(),
        }
    }

    pub fn handle_event(
        &mut self,
        event: HostEvent,
        channel: &mut dyn ReplicationChannel,
    ) -> Result<(), NodeError> {
        self.role.require_authority(event.operation())?;

        match event {
            HostEvent::PlayerJoined { player } => self.player_joined(player)?,
            HostEvent::PlayerLeft { player } => self.player_left(player)?,
            HostEvent::TriggerEnter {
                player,
                control_point,
            } => {
                let Some(machine) = self.control_points.get_mut(&control_point) else {
                    log::debug!(
                        "enter on unknown control point {} by player {}",
                        control_point,
                        player
                    );
                    return Ok(());
                };
                machine.on_enter(player, &self.teams)?;
            }
            HostEvent::TriggerExit {
                player,
                control_point,
            } => {
                let Some(machine) = self.control_points.get_mut(&control_point) else {
                    log::debug!(
                        "exit on unknown control point {} by player {}",
                        control_point,
                        player
                    );
                    return Ok(());
                };
                machine.on_exit(player)?;
            }
        }

        self.flush(channel)
    }

    fn player_joined(&mut self, player: PlayerId) -> Result<(), AuthorityError> {
        if self.teams.on_player_join(player)?.is_none() {
            return Ok(());
        }
        for machine in self.control_points.values_mut() {
            machine.on_late_join(player)?;
        }
        self.scores.on_late_join(player)?;
        Ok(())
    }

    fn player_left(&mut self, player: PlayerId) -> Result<(), AuthorityError> {
        self.teams.on_player_leave(player)?;
        if self.config.purge_occupancy_on_leave {
            for machine in self.control_points.values_mut() {
                machine.purge_player(player)?;
            }
        }
        Ok(())
    }

    pub fn tick(&mut self, channel: &mut dyn ReplicationChannel) -> Result<(), NodeError> {
        self.role.require_authority("tick")?;
        self.tick = self.tick.wrapping_add(1);

        let states: Vec<ControlPointState> = self
            .control_points
            .values()
            .map(|machine| machine.occupancy().state())
            .collect();
        self.scores.on_tick(states)?;

        if let Some(interval) = self.config.resync_interval_ticks {
            if interval > 0 && self.tick % interval == 0 {
                self.resync_all()?;
            }
        }

        self.flush(channel)
    }

    fn resync_all(&mut self) -> Result<(), AuthorityError> {
        log::debug!("periodic resync at tick {}", self.tick);
        self.teams.resync(Recipient::All)?;
        for machine in self.control_points.values_mut() {
            machine.resync()?;
        }
        self.scores.resync()?;
        Ok(())
    }

    /// The authority applies everything it sends to its own mirrors. A payload
    /// that fails to encode is never applied, and a failed send does not hold
    /// back the rest of the batch: the first error is returned at the end.
    pub fn flush(&mut self, channel: &mut dyn ReplicationChannel) -> Result<(), NodeError> {
        let mut outgoing: Vec<Outgoing> = self.teams.drain_outbox().collect();
        for machine in self.control_points.values_mut() {
            outgoing.extend(machine.drain_outbox());
        }
        outgoing.extend(self.scores.drain_outbox());

        let mut first_error = None;
        for message in outgoing {
            let sequence = self.next_sequence;
            self.next_sequence = self.next_sequence.wrapping_add(1);
            let kind = message.payload.kind();
            let packet = Packet::new(PacketHeader::new(sequence), message.payload);

            let data = match packet.encode() {
                Ok(data) => data,
                Err(e) => {
                    log::error!("node {} cannot encode {} packet: {}", self.id, kind, e);
                    first_error = first_error.or(Some(NodeError::from(e)));
                    continue;
                }
            };

            if message.recipient.includes(self.local_player) || self.role.is_authority() {
                self.apply_packet(&packet);
            }
            if let Err(e) = channel.send(self.id, message.recipient, &data) {
                log::error!("node {} failed to send {} packet: {}", self.id, kind, e);
                first_error = first_error.or(Some(NodeError::from(e)));
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub fn receive(&mut self, data: &[u8]) -> Result<ApplyOutcome, NodeError> {
        let packet = match Packet::deserialize(data) {
            Ok(packet) => packet,
            Err(e) => {
                self.stats.rejected += 1;
                return Err(e.into());
            }
        };

        self.stats.packets_received += 1;
        self.stats.bytes_received += data.len() as u64;
        Ok(self.apply_packet(&packet))
    }

    fn apply_packet(&mut self, packet: &Packet) -> ApplyOutcome {
        let sequence = packet.sequence();
        let outcome = match &packet.payload {
            Broadcast::TeamDelta(delta) => self.teams.apply_delta(sequence, delta),
            Broadcast::TeamSnapshot(snapshot) => self.teams.apply_snapshot(sequence, snapshot),
            Broadcast::ControlPoint(update) => {
                match self.control_points.get_mut(&update.control_point) {
                    Some(machine) => {
                        let outcome =
                            machine.apply_broadcast(sequence, update, &mut self.presentation);
                        if outcome.is_applied() {
                            let scores = self.scores.mirror().scores();
                            self.presentation.set_scores(scores.red, scores.blue);
                        }
                        outcome
                    }
                    None => {
                        log::debug!(
                            "node {} has no control point {}, dropping update",
                            self.id,
                            update.control_point
                        );
                        ApplyOutcome::Foreign
                    }
                }
            }
            Broadcast::Scores(update) => {
                self.scores
                    .apply_broadcast(sequence, update, &mut self.presentation)
            }
        };

        match outcome {
            ApplyOutcome::Applied => self.stats.packets_applied += 1,
            ApplyOutcome::Stale => self.stats.stale_ignored += 1,
            ApplyOutcome::Foreign => {}
        }
        outcome
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_player(&self) -> Option<PlayerId> {
        self.local_player
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn teams(&self) -> &TeamAssignmentService {
        &self.teams
    }

    pub fn control_point(&self, id: ControlPointId) -> Option<&ControlPointStateMachine> {
        self.control_points.get(&id)
    }

    pub fn control_points(&self) -> impl Iterator<Item = &ControlPointStateMachine> {
        self.control_points.values()
    }

    pub fn scores(&self) -> Scores {
        self.scores.mirror().scores()
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn stats(&self) -> &ReplicationStats {
        &self.stats
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::LoopbackHub;
    use crate::presentation::RecordingPresentation;
    use crate::team::Team;

    fn authority() -> GameNode<RecordingPresentation> {
        GameNode::authority(0, GameConfig::default(), [1], RecordingPresentation::new())
    }

    #[test]
    fn authority_applies_its_own_broadcasts() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        let mut node = authority();

        node.handle_event(HostEvent::PlayerJoined { player: 5 }, &mut hub)
            .unwrap();

        assert_eq!(node.teams().get_team(5), Some(Team::Red));
        assert_eq!(node.stats().packets_applied, 1);
    }

    #[test]
    fn replica_refuses_host_events() {
        let mut hub = LoopbackHub::new();
        let mut node = GameNode::replica(
            1,
            5,
            GameConfig::default(),
            [1],
            RecordingPresentation::new(),
        );

        let err = node
            .handle_event(HostEvent::PlayerJoined { player: 5 }, &mut hub)
            .unwrap_err();

        assert!(matches!(err, NodeError::Authority(_)));
        assert!(node.teams().roster().is_empty());
    }

    #[test]
    fn unknown_control_point_is_ignored() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        let mut node = authority();
        node.handle_event(HostEvent::PlayerJoined { player: 5 }, &mut hub)
            .unwrap();

        node.handle_event(
            HostEvent::TriggerEnter {
                player: 5,
                control_point: 99,
            },
            &mut hub,
        )
        .unwrap();

        assert_eq!(
            node.control_point(1).unwrap().occupancy().state(),
            ControlPointState::Neutral
        );
    }

    #[test]
    fn late_joiner_gets_targeted_control_point_state() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        let mut node = authority();
        node.handle_event(HostEvent::PlayerJoined { player: 5 }, &mut hub)
            .unwrap();
        node.handle_event(
            HostEvent::TriggerEnter {
                player: 5,
                control_point: 1,
            },
            &mut hub,
        )
        .unwrap();

        hub.connect(1, Some(6));
        node.handle_event(HostEvent::PlayerJoined { player: 6 }, &mut hub)
            .unwrap();

        let payloads: Vec<Broadcast> = hub
            .take_inbox(1)
            .iter()
            .map(|bytes| Packet::deserialize(bytes).unwrap().payload)
            .collect();
        assert_eq!(payloads.len(), 2);
        assert!(matches!(
            payloads[1],
            Broadcast::ControlPoint(update) if update.state == ControlPointState::RedControlled
        ));
    }

    /// Refuses every broadcast and forwards targeted sends.
    struct BroadcastRefusingHub(LoopbackHub);

    impl ReplicationChannel for BroadcastRefusingHub {
        fn send(
            &mut self,
            from: NodeId,
            recipient: Recipient,
            data: &[u8],
        ) -> Result<(), ChannelError> {
            match recipient {
                Recipient::All => Err(ChannelError::TooLarge {
                    size: data.len(),
                    max: 0,
                }),
                Recipient::Player(_) => self.0.send(from, recipient, data),
            }
        }
    }

    #[test]
    fn failed_send_does_not_drop_rest_of_batch() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        let mut node = authority();
        node.handle_event(HostEvent::PlayerJoined { player: 5 }, &mut hub)
            .unwrap();
        node.handle_event(
            HostEvent::TriggerEnter {
                player: 5,
                control_point: 1,
            },
            &mut hub,
        )
        .unwrap();

        hub.connect(1, Some(6));
        let mut refusing = BroadcastRefusingHub(hub);
        let err = node
            .handle_event(HostEvent::PlayerJoined { player: 6 }, &mut refusing)
            .unwrap_err();
        assert!(matches!(err, NodeError::Channel(ChannelError::TooLarge { .. })));

        // The roster broadcast failed but the catch-up behind it still went out.
        let payloads: Vec<Broadcast> = refusing
            .0
            .take_inbox(1)
            .iter()
            .map(|bytes| Packet::deserialize(bytes).unwrap().payload)
            .collect();
        assert_eq!(payloads.len(), 1);
        assert!(matches!(
            payloads[0],
            Broadcast::ControlPoint(update) if update.state == ControlPointState::RedControlled
        ));
    }

    #[test]
    fn full_roster_join_sends_nothing() {
        let mut hub = LoopbackHub::new();
        hub.connect(0, None);
        hub.connect(1, Some(6));
        let config = GameConfig {
            max_players: 1,
            ..Default::default()
        };
        let mut node = GameNode::authority(0, config, [1], RecordingPresentation::new());
        node.handle_event(HostEvent::PlayerJoined { player: 5 }, &mut hub)
            .unwrap();
        hub.take_inbox(1);

        node.handle_event(HostEvent::PlayerJoined { player: 6 }, &mut hub)
            .unwrap();

        assert_eq!(node.teams().get_team(6), None);
        assert_eq!(hub.pending(1), 0);
    }

    #[test]
    fn garbage_is_rejected_and_counted() {
        let mut node = authority();
        assert!(node.receive(&[0xFF; 4]).is_err());
        assert_eq!(node.stats().rejected, 1);
    }
}
