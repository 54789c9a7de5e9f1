use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fault injection for the loopback hub. Percentages are 0-100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySimulation {
    pub enabled: bool,
    pub loss_percent: f32,
    pub duplicate_percent: f32,
    pub reorder_percent: f32,
}

impl DeliverySimulation {
    pub fn should_drop<R: Rng>(&self, rng: &mut R) -> bool {
        self.roll(rng, self.loss_percent)
    }

    pub fn should_duplicate<R: Rng>(&self, rng: &mut R) -> bool {
        self.roll(rng, self.duplicate_percent)
    }

    pub fn should_reorder<R: Rng>(&self, rng: &mut R) -> bool {
        self.roll(rng, self.reorder_percent)
    }

    fn roll<R: Rng>(&self, rng: &mut R, percent: f32) -> bool {
        if !self.enabled || percent <= 0.0 {
            return false;
        }
        rng.gen_range(0.0f32..100.0) < percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn disabled_never_interferes() {
        let sim = DeliverySimulation {
            enabled: false,
            loss_percent: 100.0,
            duplicate_percent: 100.0,
            reorder_percent: 100.0,
        };
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..100 {
            assert!(!sim.should_drop(&mut rng));
            assert!(!sim.should_duplicate(&mut rng));
            assert!(!sim.should_reorder(&mut rng));
        }
    }

    #[test]
    fn full_loss_always_drops() {
        let sim = DeliverySimulation {
            enabled: true,
            loss_percent: 100.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);

        assert!((0..100).all(|_| sim.should_drop(&mut rng)));
        assert!((0..100).all(|_| !sim.should_duplicate(&mut rng)));
    }
}
