use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use holdpoint::{
    ControlPointId, ControlPointState, DeliverySimulation, EventQueue, GameNode, HostEvent,
    LogPresentation, LoopbackHub, NodeId, PlayerId, ReplicationMode, ReplicationStats, Scores,
    Team, TeamCounts,
};

use crate::arena::Arena;
use crate::config::ServerConfig;
use crate::events::ServerEvent;
use crate::simulation::BotDirector;

const AUTHORITY_NODE: NodeId = 0;

type Node = GameNode<LogPresentation>;

/// Runs one authority and a replica per connected bot inside this process.
pub struct MatchServer {
    config: ServerConfig,
    arena: Arena,
    director: BotDirector,
    hub: LoopbackHub,
    authority: Node,
    replicas: BTreeMap<PlayerId, Node>,
    diverged: BTreeSet<NodeId>,
    queue: EventQueue,
    next_node: NodeId,
    departed_stats: ReplicationStats,
    last_states: BTreeMap<ControlPointId, ControlPointState>,
    last_scores: Scores,
    tick_duration: Duration,
    last_tick_time: Instant,
    accumulator: Duration,
    running: Arc<AtomicBool>,
    start_time: Instant,
    pending_events: VecDeque<ServerEvent>,
}

impl MatchServer {
    pub fn new(config: ServerConfig) -> Self {
        let arena = Arena::from_config(&config.arena);
        let mut hub = LoopbackHub::with_simulation(config.delivery.clone(), config.seed);
        hub.connect(AUTHORITY_NODE, None);

        let authority = GameNode::authority(
            AUTHORITY_NODE,
            config.game.clone(),
            arena.ids(),
            LogPresentation::new("authority"),
        );
        let director = BotDirector::new(
            config.seed.wrapping_add(1),
            config.arena.bot_speed,
            config.churn_percent,
        );
        let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate.max(1) as f64);

        let mut server = Self {
            arena,
            director,
            hub,
            authority,
            replicas: BTreeMap::new(),
            diverged: BTreeSet::new(),
            queue: EventQueue::new(config.max_pending_events),
            next_node: AUTHORITY_NODE + 1,
            departed_stats: ReplicationStats::default(),
            last_states: BTreeMap::new(),
            last_scores: Scores::default(),
            tick_duration,
            last_tick_time: Instant::now(),
            accumulator: Duration::ZERO,
            running: Arc::new(AtomicBool::new(true)),
            start_time: Instant::now(),
            pending_events: VecDeque::new(),
            config,
        };

        for _ in 0..server.config.bots {
            server.add_bot();
        }
        server
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    /// Headless loop. Stops when `running` is cleared or `limit` elapses.
    pub fn run(&mut self, limit: Option<Duration>) {
        while self.running.load(Ordering::SeqCst) {
            self.tick_once();
            for event in self.pending_events.drain(..) {
                if event.is_problem() {
                    log::warn!("{}", event.describe());
                } else {
                    log::info!("{}", event.describe());
                }
            }
            if limit.is_some_and(|limit| self.start_time.elapsed() >= limit) {
                self.running.store(false, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        self.shutdown();
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_tick_time;
        self.last_tick_time = now;
        self.accumulator += delta;

        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.step();
        }
    }

    /// One authority tick: bot signals, scoring, delivery to every replica.
    pub fn step(&mut self) {
        let dt = 1.0 / self.config.tick_rate.max(1) as f32;
        let mut signals = Vec::new();
        self.director.step(&self.arena, dt, &mut signals);
        for signal in signals {
            self.enqueue(signal);
        }
        self.process_queue();

        if let Err(e) = self.authority.tick(&mut self.hub) {
            self.report(format!("Tick failed: {}", e));
        }

        self.deliver();
        self.observe();
    }

    pub fn add_bot(&mut self) {
        let event = self.director.spawn(&self.arena);
        self.enqueue(event);
    }

    pub fn remove_bot(&mut self) {
        let Some(player) = self.director.bots().next().map(|bot| bot.player) else {
            return;
        };
        if let Some(event) = self.director.remove(player) {
            self.enqueue(event);
        }
    }

    pub fn shutdown(&mut self) {
        let players: Vec<PlayerId> = self.director.bots().map(|bot| bot.player).collect();
        for player in players {
            if let Some(event) = self.director.remove(player) {
                self.enqueue(event);
            }
        }
        self.process_queue();
        self.deliver();
    }

    pub fn toggle_faults(&mut self) -> bool {
        let mut simulation = self.hub.simulation().clone();
        simulation.enabled = !simulation.enabled;
        let enabled = simulation.enabled;
        self.hub.set_simulation(simulation);
        enabled
    }

    fn enqueue(&mut self, event: HostEvent) {
        if let Err(e) = self.queue.push(event) {
            log::warn!("dropping {:?}: {}", event, e);
            self.report(format!("Dropped {:?}: {}", event, e));
        }
    }

    fn process_queue(&mut self) {
        while let Some(pending) = self.queue.pop() {
            self.dispatch(pending.event);
        }
    }

    fn dispatch(&mut self, event: HostEvent) {
        if let HostEvent::PlayerJoined { player } = event {
            self.attach_replica(player);
        }

        if let Err(e) = self.authority.handle_event(event, &mut self.hub) {
            self.report(format!("Failed to handle {:?}: {}", event, e));
        }

        match event {
            HostEvent::PlayerJoined { player } => {
                if let Some(team) = self.authority.teams().get_team(player) {
                    self.pending_events
                        .push_back(ServerEvent::PlayerJoined { player, team });
                }
            }
            HostEvent::PlayerLeft { player } => {
                self.detach_replica(player);
                self.pending_events
                    .push_back(ServerEvent::PlayerLeft { player });
            }
            HostEvent::TriggerEnter { .. } | HostEvent::TriggerExit { .. } => {}
        }
    }

    fn attach_replica(&mut self, player: PlayerId) {
        if self.replicas.contains_key(&player) {
            return;
        }
        let node = self.next_node;
        self.next_node += 1;
        self.hub.connect(node, Some(player));
        self.replicas.insert(
            player,
            GameNode::replica(
                node,
                player,
                self.config.game.clone(),
                self.arena.ids(),
                LogPresentation::new(format!("node {}", node)),
            ),
        );
    }

    fn detach_replica(&mut self, player: PlayerId) {
        if let Some(node) = self.replicas.remove(&player) {
            self.departed_stats.merge(node.stats());
            self.hub.disconnect(node.id());
            self.diverged.remove(&node.id());
        }
    }

    fn deliver(&mut self) {
        for replica in self.replicas.values_mut() {
            for bytes in self.hub.take_inbox(replica.id()) {
                if let Err(e) = replica.receive(&bytes) {
                    log::warn!("node {} rejected a packet: {}", replica.id(), e);
                    self.pending_events.push_back(ServerEvent::Error {
                        message: format!("Node {} rejected a packet: {}", replica.id(), e),
                    });
                }
            }
        }
    }

    fn observe(&mut self) {
        for machine in self.authority.control_points() {
            let state = machine.occupancy().state();
            let previous = self
                .last_states
                .insert(machine.id(), state)
                .unwrap_or_default();
            if previous != state {
                self.pending_events
                    .push_back(ServerEvent::ControlPointChanged {
                        control_point: machine.id(),
                        state,
                    });
            }
        }

        let scores = self.authority.scores();
        if scores != self.last_scores {
            self.last_scores = scores;
            self.pending_events.push_back(ServerEvent::ScoresChanged {
                red: scores.red,
                blue: scores.blue,
            });
        }

        for (&player, replica) in &self.replicas {
            let node = replica.id();
            let agrees = agrees_with(&self.authority, replica);
            if !agrees && self.diverged.insert(node) {
                self.pending_events
                    .push_back(ServerEvent::Diverged { node, player });
            } else if agrees && self.diverged.remove(&node) {
                self.pending_events
                    .push_back(ServerEvent::Resynced { node });
            }
        }
    }

    fn report(&mut self, message: String) {
        self.pending_events
            .push_back(ServerEvent::Error { message });
    }

    pub fn stats(&self) -> MatchStats {
        let mut received = self.departed_stats.clone();
        for replica in self.replicas.values() {
            received.merge(replica.stats());
        }

        MatchStats {
            tick: self.authority.current_tick(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            counts: self.authority.teams().get_counts(),
            scores: self.authority.scores(),
            replica_count: self.replicas.len(),
            in_sync: self.replicas.len() - self.diverged.len(),
            queue_len: self.queue.len(),
            mode: self.config.game.replication_mode,
            delivery: self.hub.simulation().clone(),
            hub: self.hub.stats().clone(),
            received,
        }
    }

    pub fn control_points(&self) -> Vec<ControlPointView> {
        self.authority
            .control_points()
            .map(|machine| {
                let id = machine.id();
                let state = machine.occupancy().state();
                let agreeing = self
                    .replicas
                    .values()
                    .filter(|replica| {
                        replica
                            .control_point(id)
                            .is_some_and(|cp| cp.mirror().state() == state)
                    })
                    .count();
                ControlPointView {
                    id,
                    state,
                    red: machine.occupancy().count(Team::Red),
                    blue: machine.occupancy().count(Team::Blue),
                    agreeing,
                }
            })
            .collect()
    }

    pub fn team_players(&self, team: Team) -> Vec<PlayerId> {
        self.authority.teams().roster().players(team)
    }

    pub fn authority(&self) -> &Node {
        &self.authority
    }

    #[cfg(test)]
    pub fn director(&self) -> &BotDirector {
        &self.director
    }
}

fn agrees_with(authority: &Node, replica: &Node) -> bool {
    if replica.teams().get_counts() != authority.teams().get_counts() {
        return false;
    }
    if replica.scores() != authority.scores() {
        return false;
    }
    authority.control_points().all(|machine| {
        replica
            .control_point(machine.id())
            .is_some_and(|cp| cp.mirror().state() == machine.occupancy().state())
    })
}

#[derive(Debug, Clone)]
pub struct MatchStats {
    pub tick: u32,
    pub uptime_secs: u64,
    pub counts: TeamCounts,
    pub scores: Scores,
    pub replica_count: usize,
    pub in_sync: usize,
    pub queue_len: usize,
    pub mode: ReplicationMode,
    pub delivery: DeliverySimulation,
    pub hub: ReplicationStats,
    pub received: ReplicationStats,
}

#[derive(Debug, Clone, Copy)]
pub struct ControlPointView {
    pub id: ControlPointId,
    pub state: ControlPointState,
    pub red: u32,
    pub blue: u32,
    pub agreeing: usize,
}
