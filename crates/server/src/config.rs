use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use holdpoint::{ControlPointId, DeliverySimulation, GameConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    pub id: ControlPointId,
    pub center: Vec3,
    pub half_extents: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// The playable floor spans `-half_size..half_size` on x and z.
    pub half_size: f32,
    pub bot_speed: f32,
    pub control_points: Vec<VolumeConfig>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            half_size: 40.0,
            bot_speed: 6.0,
            control_points: vec![
                VolumeConfig {
                    id: 1,
                    center: Vec3::new(-20.0, 1.0, 0.0),
                    half_extents: Vec3::new(4.0, 2.0, 4.0),
                },
                VolumeConfig {
                    id: 2,
                    center: Vec3::new(0.0, 1.0, 0.0),
                    half_extents: Vec3::new(5.0, 2.0, 5.0),
                },
                VolumeConfig {
                    id: 3,
                    center: Vec3::new(20.0, 1.0, 0.0),
                    half_extents: Vec3::new(4.0, 2.0, 4.0),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub bots: u32,
    pub seed: u64,
    /// Chance per second, 0-100, that a bot disconnects and a new one joins.
    pub churn_percent: f32,
    pub max_pending_events: usize,
    pub delivery: DeliverySimulation,
    pub game: GameConfig,
    pub arena: ArenaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            bots: 8,
            seed: 1,
            churn_percent: 5.0,
            max_pending_events: 1024,
            delivery: DeliverySimulation::default(),
            game: GameConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let half_size = self.arena.half_size;
        if !(half_size.is_finite() && half_size > 0.0) {
            bail!("arena.half_size must be positive, got {}", half_size);
        }
        if !(self.arena.bot_speed.is_finite() && self.arena.bot_speed >= 0.0) {
            bail!("arena.bot_speed must not be negative, got {}", self.arena.bot_speed);
        }
        for volume in &self.arena.control_points {
            if volume.half_extents.cmplt(Vec3::ZERO).any() {
                bail!("control point {} has negative half extents", volume.id);
            }
        }
        Ok(())
    }
}
