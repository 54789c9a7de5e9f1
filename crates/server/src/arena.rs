use glam::Vec3;

use holdpoint::ControlPointId;

use crate::config::ArenaConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPointVolume {
    pub id: ControlPointId,
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl ControlPointVolume {
    pub fn new(id: ControlPointId, center: Vec3, half_extents: Vec3) -> Self {
        Self {
            id,
            center,
            half_extents,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let offset = (point - self.center).abs();
        offset.cmple(self.half_extents).all()
    }
}

/// Flat floor with the capture volumes standing on it.
#[derive(Debug, Clone)]
pub struct Arena {
    half_size: f32,
    volumes: Vec<ControlPointVolume>,
}

impl Arena {
    pub fn new(half_size: f32, volumes: Vec<ControlPointVolume>) -> Self {
        Self { half_size, volumes }
    }

    pub fn from_config(config: &ArenaConfig) -> Self {
        let volumes = config
            .control_points
            .iter()
            .map(|cp| ControlPointVolume::new(cp.id, cp.center, cp.half_extents))
            .collect();
        Self::new(config.half_size, volumes)
    }

    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    pub fn volumes(&self) -> &[ControlPointVolume] {
        &self.volumes
    }

    pub fn ids(&self) -> impl Iterator<Item = ControlPointId> + '_ {
        self.volumes.iter().map(|volume| volume.id)
    }

    pub fn volumes_containing(&self, point: Vec3) -> impl Iterator<Item = ControlPointId> + '_ {
        self.volumes
            .iter()
            .filter(move |volume| volume.contains(point))
            .map(|volume| volume.id)
    }

    pub fn clamp(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(-self.half_size, self.half_size),
            point.y,
            point.z.clamp(-self.half_size, self.half_size),
        )
    }
}
