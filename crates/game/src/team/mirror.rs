use std::collections::HashMap;

use crate::net::{ApplyOutcome, StreamCursor, TeamDelta, TeamSnapshot};

use super::{PlayerId, Team, TeamCounts, TeamLookup};

/// Locally applied copy of the roster. Changes only through authority
/// broadcasts; counts are always taken from the payload, never recomputed.
#[derive(Debug, Clone, Default)]
pub struct TeamRosterMirror {
    members: HashMap<PlayerId, Team>,
    counts: TeamCounts,
    cursor: StreamCursor,
}

impl TeamRosterMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_delta(&mut self, sequence: u32, delta: &TeamDelta) -> ApplyOutcome {
        match delta.team {
            Some(team) => {
                self.members.insert(delta.player, team);
            }
            None => {
                self.members.remove(&delta.player);
            }
        }
        self.counts = TeamCounts::new(delta.red_count, delta.blue_count);
        self.cursor.observe(sequence);
        ApplyOutcome::Applied
    }

    pub fn apply_snapshot(&mut self, sequence: u32, snapshot: &TeamSnapshot) -> ApplyOutcome {
        if !self.cursor.admit(sequence) {
            log::debug!(
                "ignoring stale team snapshot {} (last applied {:?})",
                sequence,
                self.cursor.last_applied()
            );
            return ApplyOutcome::Stale;
        }

        self.members.clear();
        for team in Team::ALL {
            for &player in snapshot.players(team) {
                self.members.insert(player, team);
            }
        }
        self.counts = TeamCounts::new(snapshot.red_count, snapshot.blue_count);
        ApplyOutcome::Applied
    }

    pub fn counts(&self) -> TeamCounts {
        self.counts
    }

    pub fn players(&self, team: Team) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self
            .members
            .iter()
            .filter(|&(_, &t)| t == team)
            .map(|(&p, _)| p)
            .collect();
        players.sort_unstable();
        players
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn last_sequence(&self) -> Option<u32> {
        self.cursor.last_applied()
    }
}

impl TeamLookup for TeamRosterMirror {
    fn team_of(&self, player: PlayerId) -> Option<Team> {
        self.members.get(&player).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(red: &[PlayerId], blue: &[PlayerId]) -> TeamSnapshot {
        TeamSnapshot {
            red_players: red.to_vec(),
            blue_players: blue.to_vec(),
            red_count: red.len() as u32,
            blue_count: blue.len() as u32,
        }
    }

    #[test]
    fn snapshot_replaces_everything() {
        let mut mirror = TeamRosterMirror::new();
        mirror.apply_snapshot(1, &snapshot(&[1, 3], &[2]));
        mirror.apply_snapshot(2, &snapshot(&[3], &[4]));

        assert_eq!(mirror.team_of(1), None);
        assert_eq!(mirror.team_of(2), None);
        assert_eq!(mirror.team_of(3), Some(Team::Red));
        assert_eq!(mirror.team_of(4), Some(Team::Blue));
        assert_eq!(mirror.counts(), TeamCounts::new(1, 1));
    }

    #[test]
    fn snapshot_apply_is_idempotent() {
        let payload = snapshot(&[1, 3], &[2]);
        let mut once = TeamRosterMirror::new();
        once.apply_snapshot(5, &payload);

        let mut twice = TeamRosterMirror::new();
        twice.apply_snapshot(5, &payload);
        assert_eq!(twice.apply_snapshot(5, &payload), ApplyOutcome::Applied);

        assert_eq!(once.players(Team::Red), twice.players(Team::Red));
        assert_eq!(once.players(Team::Blue), twice.players(Team::Blue));
        assert_eq!(once.counts(), twice.counts());
    }

    #[test]
    fn stale_snapshot_is_ignored() {
        let mut mirror = TeamRosterMirror::new();
        mirror.apply_snapshot(8, &snapshot(&[1], &[2]));

        let outcome = mirror.apply_snapshot(6, &snapshot(&[1], &[]));
        assert_eq!(outcome, ApplyOutcome::Stale);
        assert_eq!(mirror.team_of(2), Some(Team::Blue));
    }

    #[test]
    fn delta_upserts_and_overwrites_counts() {
        let mut mirror = TeamRosterMirror::new();
        mirror.apply_delta(
            1,
            &TeamDelta {
                player: 7,
                team: Some(Team::Blue),
                red_count: 4,
                blue_count: 5,
            },
        );

        assert_eq!(mirror.team_of(7), Some(Team::Blue));
        assert_eq!(mirror.counts(), TeamCounts::new(4, 5));
    }

    #[test]
    fn removal_delta_drops_player() {
        let mut mirror = TeamRosterMirror::new();
        mirror.apply_snapshot(1, &snapshot(&[1], &[2]));
        mirror.apply_delta(
            2,
            &TeamDelta {
                player: 1,
                team: None,
                red_count: 0,
                blue_count: 1,
            },
        );

        assert_eq!(mirror.team_of(1), None);
        assert_eq!(mirror.counts(), TeamCounts::new(0, 1));
    }

    #[test]
    fn reordered_deltas_can_diverge() {
        // Join then leave, delivered leave first: the mirror ends up with a
        // ghost entry. Snapshot mode exists because of this.
        let join = TeamDelta {
            player: 1,
            team: Some(Team::Red),
            red_count: 1,
            blue_count: 0,
        };
        let leave = TeamDelta {
            player: 1,
            team: None,
            red_count: 0,
            blue_count: 0,
        };

        let mut mirror = TeamRosterMirror::new();
        mirror.apply_delta(2, &leave);
        mirror.apply_delta(1, &join);

        assert_eq!(mirror.team_of(1), Some(Team::Red));
        assert_eq!(mirror.counts(), TeamCounts::new(1, 0));
    }
}
