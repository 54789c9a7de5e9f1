use serde::{Deserialize, Serialize};

/// Largest roster whose full snapshot still fits in one packet.
pub const MAX_PLAYERS: u32 = 4000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationMode {
    #[default]
    Snapshot,
    /// Roster changes ship single-player deltas. Only correct when delivery
    /// is ordered; joining players get a targeted snapshot.
    Delta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub replication_mode: ReplicationMode,
    pub score_interval_ticks: u32,
    pub points_per_interval: u32,
    /// Full team and control point resync period; `None` disables it.
    pub resync_interval_ticks: Option<u32>,
    /// Remove a leaving player from every control point it still occupies.
    pub purge_occupancy_on_leave: bool,
    /// Joins beyond this many assigned players are refused. Capped at
    /// [`MAX_PLAYERS`].
    pub max_players: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            replication_mode: ReplicationMode::Snapshot,
            score_interval_ticks: 60,
            points_per_interval: 1,
            resync_interval_ticks: None,
            purge_occupancy_on_leave: true,
            max_players: 2048,
        }
    }
}
