use crate::authority::{AuthorityError, Role};
use crate::config::{MAX_PLAYERS, ReplicationMode};
use crate::net::{
    ApplyOutcome, Broadcast, Outbox, Outgoing, Recipient, TeamDelta, TeamSnapshot,
};

use super::{PlayerId, Team, TeamCounts, TeamLookup, TeamRoster, TeamRosterMirror};

pub struct TeamAssignmentService {
    role: Role,
    mode: ReplicationMode,
    capacity: usize,
    // Only ever populated on the authority.
    roster: TeamRoster,
    mirror: TeamRosterMirror,
    outbox: Outbox,
}

impl TeamAssignmentService {
    pub fn new(role: Role, mode: ReplicationMode) -> Self {
        Self {
            role,
            mode,
            capacity: MAX_PLAYERS as usize,
            roster: TeamRoster::new(),
            mirror: TeamRosterMirror::new(),
            outbox: Outbox::new(),
        }
    }

    pub fn with_max_players(mut self, max_players: u32) -> Self {
        self.capacity = max_players.min(MAX_PLAYERS) as usize;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mode(&self) -> ReplicationMode {
        self.mode
    }

    pub fn on_player_join(&mut self, player: PlayerId) -> Result<Option<Team>, AuthorityError> {
        self.role.require_authority("on_player_join")?;

        if self.roster.team_of(player).is_none() && self.roster.len() >= self.capacity {
            log::warn!(
                "roster full ({} players), refusing player {}",
                self.capacity,
                player
            );
            return Ok(None);
        }

        let Some(team) = self.roster.assign(player) else {
            log::debug!("player {} already has a team, ignoring join", player);
            return Ok(None);
        };

        let counts = self.roster.counts();
        log::info!(
            "player {} joined {} ({} red / {} blue)",
            player,
            team.as_str(),
            counts.red,
            counts.blue
        );

        self.publish(player);
        if self.mode == ReplicationMode::Delta {
            // A delta stream cannot bring a fresh observer up to date.
            self.outbox.push(
                Recipient::Player(player),
                Broadcast::TeamSnapshot(self.roster.snapshot()),
            );
        }
        Ok(Some(team))
    }

    pub fn on_player_leave(&mut self, player: PlayerId) -> Result<Option<Team>, AuthorityError> {
        self.role.require_authority("on_player_leave")?;

        let Some(team) = self.roster.remove(player) else {
            log::debug!("player {} left without a team", player);
            return Ok(None);
        };

        let counts = self.roster.counts();
        log::info!(
            "player {} left {} ({} red / {} blue)",
            player,
            team.as_str(),
            counts.red,
            counts.blue
        );

        self.publish(player);
        Ok(Some(team))
    }

    pub fn resync(&mut self, recipient: Recipient) -> Result<(), AuthorityError> {
        self.role.require_authority("team_resync")?;
        self.outbox
            .push(recipient, Broadcast::TeamSnapshot(self.roster.snapshot()));
        Ok(())
    }

    fn publish(&mut self, player: PlayerId) {
        let payload = match self.mode {
            ReplicationMode::Snapshot => Broadcast::TeamSnapshot(self.roster.snapshot()),
            ReplicationMode::Delta => Broadcast::TeamDelta(self.roster.delta(player)),
        };
        self.outbox.broadcast(payload);
    }

    pub fn get_team(&self, player: PlayerId) -> Option<Team> {
        self.mirror.team_of(player)
    }

    pub fn get_counts(&self) -> TeamCounts {
        self.mirror.counts()
    }

    pub fn apply_delta(&mut self, sequence: u32, delta: &TeamDelta) -> ApplyOutcome {
        self.mirror.apply_delta(sequence, delta)
    }

    pub fn apply_snapshot(&mut self, sequence: u32, snapshot: &TeamSnapshot) -> ApplyOutcome {
        self.mirror.apply_snapshot(sequence, snapshot)
    }

    pub fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    pub fn mirror(&self) -> &TeamRosterMirror {
        &self.mirror
    }

    pub fn drain_outbox(&mut self) -> impl Iterator<Item = Outgoing> + '_ {
        self.outbox.drain()
    }
}

/// Authoritative decisions read the roster; everyone else reads the mirror.
impl TeamLookup for TeamAssignmentService {
    fn team_of(&self, player: PlayerId) -> Option<Team> {
        if self.role.is_authority() {
            self.roster.team_of(player)
        } else {
            self.get_team(player)
        }
    }
}
