use std::collections::HashMap;

use crate::net::{TeamDelta, TeamSnapshot};

use super::{PlayerId, Team, TeamCounts, TeamLookup};

/// Authoritative player to team mapping. Only the authority mutates one.
#[derive(Debug, Clone, Default)]
pub struct TeamRoster {
    members: HashMap<PlayerId, Team>,
    counts: TeamCounts,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Team with the smaller population; ties go to Red.
    pub fn next_team(&self) -> Team {
        if self.counts.red <= self.counts.blue {
            Team::Red
        } else {
            Team::Blue
        }
    }

    pub fn assign(&mut self, player: PlayerId) -> Option<Team> {
        if self.members.contains_key(&player) {
            return None;
        }

        let team = self.next_team();
        self.members.insert(player, team);
        match team {
            Team::Red => self.counts.red += 1,
            Team::Blue => self.counts.blue += 1,
        }
        Some(team)
    }

    pub fn remove(&mut self, player: PlayerId) -> Option<Team> {
        let team = self.members.remove(&player)?;
        match team {
            Team::Red => self.counts.red = self.counts.red.saturating_sub(1),
            Team::Blue => self.counts.blue = self.counts.blue.saturating_sub(1),
        }
        Some(team)
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

    pub fn delta(&self, player: PlayerId) -> TeamDelta {
        TeamDelta {
            player,
            team: self.members.get(&player).copied(),
            red_count: self.counts.red,
            blue_count: self.counts.blue,
        }
    }

    pub fn snapshot(&self) -> TeamSnapshot {
        TeamSnapshot {
            red_players: self.players(Team::Red),
            blue_players: self.players(Team::Blue),
            red_count: self.counts.red,
            blue_count: self.counts.blue,
        }
    }
}

impl TeamLookup for TeamRoster {
    fn team_of(&self, player: PlayerId) -> Option<Team> {
        self.members.get(&player).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_player_goes_red() {
        let mut roster = TeamRoster::new();
        assert_eq!(roster.assign(1), Some(Team::Red));
        assert_eq!(roster.assign(2), Some(Team::Blue));
        assert_eq!(roster.assign(3), Some(Team::Red));
        assert_eq!(roster.counts(), TeamCounts::new(2, 1));
    }

    #[test]
    fn joins_stay_balanced() {
        let mut roster = TeamRoster::new();
        for player in 0..101 {
            roster.assign(player);
            assert!(roster.counts().imbalance() <= 1);
        }
        assert_eq!(roster.counts().total(), 101);
    }

    #[test]
    fn duplicate_join_keeps_counts() {
        let mut roster = TeamRoster::new();
        roster.assign(1);
        assert_eq!(roster.assign(1), None);
        assert_eq!(roster.counts(), TeamCounts::new(1, 0));
    }

    #[test]
    fn leave_frees_slot_for_next_join() {
        let mut roster = TeamRoster::new();
        roster.assign(1);
        roster.assign(2);
        roster.assign(3);

        assert_eq!(roster.remove(1), Some(Team::Red));
        assert_eq!(roster.counts(), TeamCounts::new(1, 1));
        assert_eq!(roster.assign(4), Some(Team::Red));
    }

    #[test]
    fn remove_unknown_player_is_noop() {
        let mut roster = TeamRoster::new();
        assert_eq!(roster.remove(42), None);
        assert_eq!(roster.counts(), TeamCounts::default());
    }

    #[test]
    fn existing_players_are_not_rebalanced() {
        let mut roster = TeamRoster::new();
        for player in 1..=4 {
            roster.assign(player);
        }
        roster.remove(2);
        roster.remove(4);

        assert_eq!(roster.counts(), TeamCounts::new(2, 0));
        assert_eq!(roster.team_of(1), Some(Team::Red));
        assert_eq!(roster.team_of(3), Some(Team::Red));
    }

    #[test]
    fn snapshot_lists_sorted_players() {
        let mut roster = TeamRoster::new();
        for player in [9, 4, 7, 1] {
            roster.assign(player);
        }

        let snapshot = roster.snapshot();
        assert_eq!(snapshot.red_players, vec![7, 9]);
        assert_eq!(snapshot.blue_players, vec![1, 4]);
        assert_eq!((snapshot.red_count, snapshot.blue_count), (2, 2));
    }
}
