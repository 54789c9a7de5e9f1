use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use holdpoint::{ControlPointId, HostEvent, PlayerId};

use crate::arena::Arena;

const ARRIVE_DISTANCE: f32 = 0.5;
const SEEK_POINT_PERCENT: f32 = 70.0;
const BOT_HEIGHT: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct Bot {
    pub player: PlayerId,
    pub position: Vec3,
    target: Vec3,
    inside: BTreeSet<ControlPointId>,
}

impl Bot {
    pub fn is_inside(&self, control_point: ControlPointId) -> bool {
        self.inside.contains(&control_point)
    }
}

/// Stands in for the host platform: moves bots around the arena and reports
/// join, leave and trigger overlap changes as host signals.
pub struct BotDirector {
    rng: StdRng,
    bots: BTreeMap<PlayerId, Bot>,
    next_player: PlayerId,
    speed: f32,
    churn_percent: f32,
}

impl BotDirector {
    pub fn new(seed: u64, speed: f32, churn_percent: f32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            bots: BTreeMap::new(),
            next_player: 1,
            speed,
            churn_percent,
        }
    }

    pub fn bots(&self) -> impl Iterator<Item = &Bot> {
        self.bots.values()
    }

    pub fn spawn(&mut self, arena: &Arena) -> HostEvent {
        let player = self.next_player;
        self.next_player += 1;

        let position = self.random_floor_point(arena);
        let target = self.pick_target(arena);
        self.bots.insert(
            player,
            Bot {
                player,
                position,
                target,
                inside: BTreeSet::new(),
            },
        );
        HostEvent::PlayerJoined { player }
    }

    /// Disconnects a bot without reporting exits for the volumes it was in.
    pub fn remove(&mut self, player: PlayerId) -> Option<HostEvent> {
        self.bots
            .remove(&player)
            .map(|_| HostEvent::PlayerLeft { player })
    }

    pub fn step(&mut self, arena: &Arena, dt: f32, out: &mut Vec<HostEvent>) {
        let players: Vec<PlayerId> = self.bots.keys().copied().collect();
        for player in players {
            let arrived = match self.bots.get(&player) {
                Some(bot) => bot.position.distance(bot.target) <= ARRIVE_DISTANCE,
                None => continue,
            };
            let next_target = if arrived {
                Some(self.pick_target(arena))
            } else {
                None
            };
            let Some(bot) = self.bots.get_mut(&player) else {
                continue;
            };
            if let Some(target) = next_target {
                bot.target = target;
            }

            let to_target = bot.target - bot.position;
            let step = self.speed * dt;
            bot.position = if to_target.length() <= step {
                bot.target
            } else {
                arena.clamp(bot.position + to_target.normalize() * step)
            };

            let now: BTreeSet<ControlPointId> = arena.volumes_containing(bot.position).collect();
            for &control_point in now.difference(&bot.inside) {
                out.push(HostEvent::TriggerEnter {
                    player,
                    control_point,
                });
            }
            for &control_point in bot.inside.difference(&now) {
                out.push(HostEvent::TriggerExit {
                    player,
                    control_point,
                });
            }
            bot.inside = now;
        }

        if self.bots.is_empty() || self.churn_percent <= 0.0 {
            return;
        }
        let chance = self.churn_percent * dt;
        if self.rng.gen_range(0.0f32..100.0) < chance {
            let index = self.rng.gen_range(0..self.bots.len());
            let leaving = self.bots.keys().nth(index).copied();
            if let Some(event) = leaving.and_then(|player| self.remove(player)) {
                out.push(event);
            }
            out.push(self.spawn(arena));
        }
    }

    fn pick_target(&mut self, arena: &Arena) -> Vec3 {
        let volumes = arena.volumes();
        if !volumes.is_empty() && self.rng.gen_range(0.0f32..100.0) < SEEK_POINT_PERCENT {
            let volume = volumes[self.rng.gen_range(0..volumes.len())];
            let jitter = Vec3::new(
                self.rng.gen_range(-1.0f32..=1.0) * volume.half_extents.x,
                0.0,
                self.rng.gen_range(-1.0f32..=1.0) * volume.half_extents.z,
            );
            return Vec3::new(volume.center.x, BOT_HEIGHT, volume.center.z) + jitter;
        }
        self.random_floor_point(arena)
    }

    fn random_floor_point(&mut self, arena: &Arena) -> Vec3 {
        let half = arena.half_size();
        Vec3::new(
            self.rng.gen_range(-half..=half),
            BOT_HEIGHT,
            self.rng.gen_range(-half..=half),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ControlPointVolume;

    fn arena() -> Arena {
        Arena::new(
            20.0,
            vec![ControlPointVolume::new(
                1,
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(2.0, 2.0, 2.0),
            )],
        )
    }

    #[test]
    fn spawn_assigns_fresh_ids() {
        let arena = arena();
        let mut director = BotDirector::new(3, 5.0, 0.0);

        assert_eq!(director.spawn(&arena), HostEvent::PlayerJoined { player: 1 });
        assert_eq!(director.spawn(&arena), HostEvent::PlayerJoined { player: 2 });
        assert_eq!(director.bots().count(), 2);
        assert_eq!(director.remove(1), Some(HostEvent::PlayerLeft { player: 1 }));
        assert_eq!(director.remove(1), None);
    }

    #[test]
    fn entering_and_leaving_a_volume_pairs_up() {
        let arena = arena();
        let mut director = BotDirector::new(11, 8.0, 0.0);
        director.spawn(&arena);

        let mut events = Vec::new();
        for _ in 0..2000 {
            director.step(&arena, 0.05, &mut events);
        }

        let enters = events
            .iter()
            .filter(|e| matches!(e, HostEvent::TriggerEnter { .. }))
            .count();
        let exits = events
            .iter()
            .filter(|e| matches!(e, HostEvent::TriggerExit { .. }))
            .count();
        assert!(enters > 0);
        let inside = director.bots().next().unwrap().inside.len();
        assert_eq!(enters, exits + inside);
    }

    #[test]
    fn bots_stay_on_the_floor() {
        let arena = arena();
        let mut director = BotDirector::new(5, 50.0, 0.0);
        for _ in 0..4 {
            director.spawn(&arena);
        }

        let mut events = Vec::new();
        for _ in 0..200 {
            director.step(&arena, 0.1, &mut events);
        }

        for bot in director.bots() {
            assert!(bot.position.x.abs() <= 20.0 && bot.position.z.abs() <= 20.0);
        }
    }

    #[test]
    fn churn_replaces_bots() {
        let arena = arena();
        let mut director = BotDirector::new(9, 5.0, 100.0);
        director.spawn(&arena);

        let mut events = Vec::new();
        for _ in 0..10 {
            director.step(&arena, 1.0, &mut events);
        }

        assert_eq!(director.bots().count(), 1);
        assert!(events.iter().any(|e| matches!(e, HostEvent::PlayerLeft { .. })));
    }
}
