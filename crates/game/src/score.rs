use crate::authority::{AuthorityError, Role};
use crate::config::GameConfig;
use crate::control::ControlPointState;
use crate::net::{ApplyOutcome, Broadcast, Outbox, Outgoing, Recipient, ScoreUpdate, StreamCursor};
use crate::presentation::Presentation;
use crate::team::{PlayerId, Team};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub red: u32,
    pub blue: u32,
}

impl Scores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.red == 0 && self.blue == 0
    }

    fn add(&mut self, team: Team, points: u32) {
        let slot = match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        };
        *slot = slot.saturating_add(points);
    }

    fn to_update(self) -> ScoreUpdate {
        ScoreUpdate {
            red_score: self.red,
            blue_score: self.blue,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreMirror {
    scores: Scores,
    cursor: StreamCursor,
}

impl ScoreMirror {
    pub fn apply(&mut self, sequence: u32, update: &ScoreUpdate) -> ApplyOutcome {
        if !self.cursor.admit(sequence) {
            return ApplyOutcome::Stale;
        }
        self.scores = Scores {
            red: update.red_score,
            blue: update.blue_score,
        };
        ApplyOutcome::Applied
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }
}

/// Points accrue per interval of holding a point. Contested and neutral
/// points award nothing.
pub struct ScoreBoard {
    role: Role,
    interval_ticks: u32,
    points_per_interval: u32,
    ticks: u32,
    totals: Scores,
    mirror: ScoreMirror,
    outbox: Outbox,
}

impl ScoreBoard {
    pub fn new(role: Role, config: &GameConfig) -> Self {
        Self {
            role,
            interval_ticks: config.score_interval_ticks,
            points_per_interval: config.points_per_interval,
            ticks: 0,
            totals: Scores::default(),
            mirror: ScoreMirror::default(),
            outbox: Outbox::new(),
        }
    }

    pub fn on_tick<I>(&mut self, states: I) -> Result<bool, AuthorityError>
    where
        I: IntoIterator<Item = ControlPointState>,
    {
        self.role.require_authority("score_tick")?;

        self.ticks = self.ticks.wrapping_add(1);
        if self.interval_ticks == 0 || self.ticks % self.interval_ticks != 0 {
            return Ok(false);
        }

        let mut awarded = false;
        for state in states {
            if let Some(team) = state.controller() {
                self.totals.add(team, self.points_per_interval);
                awarded = true;
            }
        }

        if awarded && self.points_per_interval > 0 {
            self.outbox
                .broadcast(Broadcast::Scores(self.totals.to_update()));
            return Ok(true);
        }
        Ok(false)
    }

    pub fn on_late_join(&mut self, player: PlayerId) -> Result<bool, AuthorityError> {
        self.role.require_authority("score_late_join")?;
        if self.totals.is_zero() {
            return Ok(false);
        }
        self.outbox.push(
            Recipient::Player(player),
            Broadcast::Scores(self.totals.to_update()),
        );
        Ok(true)
    }

    pub fn resync(&mut self) -> Result<bool, AuthorityError> {
        self.role.require_authority("score_resync")?;
        if self.totals.is_zero() {
            return Ok(false);
        }
        self.outbox
            .broadcast(Broadcast::Scores(self.totals.to_update()));
        Ok(true)
    }

    pub fn apply_broadcast<P: Presentation + ?Sized>(
        &mut self,
        sequence: u32,
        update: &ScoreUpdate,
        presentation: &mut P,
    ) -> ApplyOutcome {
        let outcome = self.mirror.apply(sequence, update);
        if outcome.is_applied() {
            let scores = self.mirror.scores();
            presentation.set_scores(scores.red, scores.blue);
        }
        outcome
    }

    pub fn totals(&self) -> Scores {
        self.totals
    }

    pub fn mirror(&self) -> &ScoreMirror {
        &self.mirror
    }

    pub fn drain_outbox(&mut self) -> impl Iterator<Item = Outgoing> + '_ {
        self.outbox.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::RecordingPresentation;

    fn board(interval: u32) -> ScoreBoard {
        let config = GameConfig {
            score_interval_ticks: interval,
            points_per_interval: 2,
            ..Default::default()
        };
        ScoreBoard::new(Role::Authority, &config)
    }

    #[test]
    fn awards_only_on_interval() {
        let mut board = board(3);
        let held = [ControlPointState::RedControlled];

        assert_eq!(board.on_tick(held), Ok(false));
        assert_eq!(board.on_tick(held), Ok(false));
        assert_eq!(board.on_tick(held), Ok(true));
        assert_eq!(board.totals(), Scores { red: 2, blue: 0 });
        assert_eq!(board.drain_outbox().count(), 1);
    }

    #[test]
    fn contested_and_neutral_award_nothing() {
        let mut board = board(1);

        let awarded = board
            .on_tick([ControlPointState::Contested, ControlPointState::Neutral])
            .unwrap();

        assert!(!awarded);
        assert!(board.totals().is_zero());
        assert_eq!(board.drain_outbox().count(), 0);
    }

    #[test]
    fn each_held_point_counts() {
        let mut board = board(1);
        board
            .on_tick([
                ControlPointState::BlueControlled,
                ControlPointState::BlueControlled,
                ControlPointState::RedControlled,
            ])
            .unwrap();

        assert_eq!(board.totals(), Scores { red: 2, blue: 4 });
    }

    #[test]
    fn replica_cannot_score() {
        let mut board = ScoreBoard::new(Role::Replica, &GameConfig::default());
        assert!(board.on_tick([ControlPointState::RedControlled]).is_err());
        assert!(board.on_late_join(1).is_err());
    }

    #[test]
    fn late_join_skipped_at_zero() {
        let mut board = board(1);
        assert_eq!(board.on_late_join(9), Ok(false));

        board.on_tick([ControlPointState::RedControlled]).unwrap();
        board.drain_outbox().count();

        assert_eq!(board.on_late_join(9), Ok(true));
        let out: Vec<Outgoing> = board.drain_outbox().collect();
        assert_eq!(out[0].recipient, Recipient::Player(9));
    }

    #[test]
    fn apply_pushes_scores_to_presentation() {
        let mut board = ScoreBoard::new(Role::Replica, &GameConfig::default());
        let mut presentation = RecordingPresentation::new();
        let update = ScoreUpdate {
            red_score: 5,
            blue_score: 3,
        };

        board.apply_broadcast(4, &update, &mut presentation);
        let stale = board.apply_broadcast(
            2,
            &ScoreUpdate {
                red_score: 1,
                blue_score: 1,
            },
            &mut presentation,
        );

        assert_eq!(stale, ApplyOutcome::Stale);
        assert_eq!(board.mirror().scores(), Scores { red: 5, blue: 3 });
        assert_eq!(presentation.last_scores(), Some((5, 3)));
    }
}
