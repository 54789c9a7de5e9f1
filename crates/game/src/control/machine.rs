use crate::authority::{AuthorityError, Role};
use crate::net::{ApplyOutcome, Broadcast, ControlPointUpdate, Outbox, Outgoing, Recipient};
use crate::presentation::Presentation;
use crate::team::{PlayerId, Team, TeamLookup};

use super::{ControlPointId, ControlPointOccupancy, ControlPointState, ControlPointStateMirror};

/// One capture volume. The authority keeps the occupant sets and announces
/// state transitions; every process renders from its mirror.
pub struct ControlPointStateMachine {
    id: ControlPointId,
    role: Role,
    occupancy: ControlPointOccupancy,
    mirror: ControlPointStateMirror,
    outbox: Outbox,
}

impl ControlPointStateMachine {
    pub fn new(id: ControlPointId, role: Role) -> Self {
        Self {
            id,
            role,
            occupancy: ControlPointOccupancy::new(),
            mirror: ControlPointStateMirror::new(),
            outbox: Outbox::new(),
        }
    }

    pub fn id(&self) -> ControlPointId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn on_enter<T: TeamLookup + ?Sized>(
        &mut self,
        player: PlayerId,
        teams: &T,
    ) -> Result<Option<ControlPointState>, AuthorityError> {
        self.role.require_authority("on_enter")?;

        let Some(team) = teams.team_of(player) else {
            log::debug!(
                "player {} touched control point {} before getting a team, ignoring",
                player,
                self.id
            );
            return Ok(None);
        };

        let transition = self.occupancy.enter(player, team);
        if let Some(state) = transition {
            self.announce(Recipient::All, state);
        }
        Ok(transition)
    }

    /// Exits never consult the roster: the player may already be gone.
    pub fn on_exit(
        &mut self,
        player: PlayerId,
    ) -> Result<Option<ControlPointState>, AuthorityError> {
        self.role.require_authority("on_exit")?;

        let transition = self.occupancy.exit(player);
        if let Some(state) = transition {
            self.announce(Recipient::All, state);
        }
        Ok(transition)
    }

    pub fn purge_player(
        &mut self,
        player: PlayerId,
    ) -> Result<Option<ControlPointState>, AuthorityError> {
        self.role.require_authority("purge_player")?;

        if !self.occupancy.contains(player) {
            return Ok(None);
        }
        log::debug!(
            "purging departed player {} from control point {}",
            player,
            self.id
        );
        self.on_exit(player)
    }

    pub fn on_late_join(&mut self, player: PlayerId) -> Result<bool, AuthorityError> {
        self.role.require_authority("on_late_join")?;
        // Every observer starts Neutral.
        let state = self.occupancy.state();
        if state == ControlPointState::Neutral {
            return Ok(false);
        }
        self.announce(Recipient::Player(player), state);
        Ok(true)
    }

    /// Re-sends the current state to everyone, Neutral included, so a
    /// replica that missed the last transition converges.
    pub fn resync(&mut self) -> Result<(), AuthorityError> {
        self.role.require_authority("control_point_resync")?;
        let state = self.occupancy.state();
        self.announce(Recipient::All, state);
        Ok(())
    }

    fn announce(&mut self, recipient: Recipient, state: ControlPointState) {
        log::debug!("control point {} is now {}", self.id, state.as_str());
        self.outbox.push(
            recipient,
            Broadcast::ControlPoint(ControlPointUpdate {
                control_point: self.id,
                state,
                red_count: self.occupancy.count(Team::Red),
                blue_count: self.occupancy.count(Team::Blue),
            }),
        );
    }

    pub fn apply_broadcast<P: Presentation + ?Sized>(
        &mut self,
        sequence: u32,
        update: &ControlPointUpdate,
        presentation: &mut P,
    ) -> ApplyOutcome {
        if update.control_point != self.id {
            return ApplyOutcome::Foreign;
        }

        let outcome = self.mirror.apply(sequence, update);
        match outcome {
            ApplyOutcome::Applied => {
                presentation.set_control_point_color(self.id, self.mirror.state());
            }
            _ => log::debug!(
                "ignoring stale update {} for control point {}",
                sequence,
                self.id
            ),
        }
        outcome
    }

    pub fn occupancy(&self) -> &ControlPointOccupancy {
        &self.occupancy
    }

    pub fn mirror(&self) -> &ControlPointStateMirror {
        &self.mirror
    }

    pub fn drain_outbox(&mut self) -> impl Iterator<Item = Outgoing> + '_ {
        self.outbox.drain()
    }
}
