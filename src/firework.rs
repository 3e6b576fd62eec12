//! A single firework burst.
//!
//! Integration is per step, not per second: every call to
//! [`FireworkBurst::integrate`] advances one rendered frame.

use glam::{vec3, Vec3};
use rand::prelude::*;

use crate::{
    config::FireworksConfig,
    math::{rand_range, random_direction},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BurstId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BurstState {
    Alive,
    Completed,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BurstParticle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Base colour plus this particle's jitter.
    pub color: Vec3,
    pub size: f32,
}

/// Per-step constants shared by every burst.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BurstDynamics {
    pub life_decay: f32,
    pub gravity: f32,
    pub drag: f32,
}

impl From<&FireworksConfig> for BurstDynamics {
    fn from(config: &FireworksConfig) -> Self {
        Self {
            life_decay: config.life_decay,
            gravity: config.gravity,
            drag: config.drag,
        }
    }
}

impl Default for BurstDynamics {
    fn default() -> Self {
        (&FireworksConfig::default()).into()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireworkBurst {
    id: BurstId,
    origin: Vec3,
    base_color: Vec3,
    particles: Vec<BurstParticle>,
    life: f32,
    dynamics: BurstDynamics,
}

impl FireworkBurst {
    /// Explodes `config.particle_count` particles from `origin`, each flying
    /// off in a uniformly random direction.
    pub fn new(
        id: BurstId,
        origin: Vec3,
        base_color: Vec3,
        config: &FireworksConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let jitter = config.color_jitter;
        let particles = (0..config.particle_count)
            .map(|_| {
                let speed = rand_range(rng, config.speed_range.0, config.speed_range.1);
                let velocity = random_direction(rng) * speed;
                let color = base_color
                    + vec3(
                        rand_range(rng, -jitter, jitter),
                        rand_range(rng, -jitter, jitter),
                        rand_range(rng, -jitter, jitter),
                    );
                let size = rand_range(rng, config.size_range.0, config.size_range.1);
                BurstParticle {
                    position: origin,
                    velocity,
                    color,
                    size,
                }
            })
            .collect();

        Self {
            id,
            origin,
            base_color,
            particles,
            life: 1.,
            dynamics: config.into(),
        }
    }

    pub fn id(&self) -> BurstId {
        self.id
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn base_color(&self) -> Vec3 {
        self.base_color
    }

    pub fn particles(&self) -> &[BurstParticle] {
        &self.particles
    }

    pub fn life(&self) -> f32 {
        self.life
    }

    /// Rendered opacity, a linear fade with the remaining life.
    pub fn opacity(&self) -> f32 {
        self.life.max(0.)
    }

    pub fn is_completed(&self) -> bool {
        self.life <= 0.
    }

    /// Advances one step. Once completed the burst is left untouched.
    pub fn integrate(&mut self) -> BurstState {
        if self.is_completed() {
            return BurstState::Completed;
        }

        self.life -= self.dynamics.life_decay;
        if self.is_completed() {
            return BurstState::Completed;
        }

        let BurstDynamics { gravity, drag, .. } = self.dynamics;
        for particle in &mut self.particles {
            particle.position += particle.velocity;
            particle.velocity.y -= gravity;
            particle.velocity *= drag;
        }

        BurstState::Alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::Palette, rng::SceneRng};

    fn gold_burst() -> FireworkBurst {
        let gold = Palette::parse(&["#FFD700"]).unwrap().colors()[0];
        FireworkBurst::new(
            BurstId(0),
            vec3(0., 10., -30.),
            gold,
            &FireworksConfig::default(),
            &mut SceneRng::seed_from_u64(11),
        )
    }

    #[test]
    fn construction_samples_every_particle() {
        let burst = gold_burst();
        assert_eq!(burst.particles().len(), 150);
        assert_eq!(burst.life(), 1.);
        for p in burst.particles() {
            assert_eq!(p.position, vec3(0., 10., -30.));
            let speed = p.velocity.length();
            assert!((0.1 - 1e-4..0.4 + 1e-4).contains(&speed), "{}", speed);
            assert!((p.color - burst.base_color()).abs().max_element() <= 0.1 + 1e-6);
            assert!((1.5..3.5).contains(&p.size));
        }
    }

    #[test]
    fn completes_after_84_steps() {
        let mut burst = gold_burst();
        for step in 1..=83 {
            assert_eq!(burst.integrate(), BurstState::Alive, "step {}", step);
        }
        assert_eq!(burst.integrate(), BurstState::Completed);
        assert!(burst.is_completed());
    }

    #[test]
    fn life_decreases_by_a_fixed_rate() {
        let mut burst = gold_burst();
        let mut previous = burst.life();
        while burst.integrate() == BurstState::Alive {
            assert!((previous - burst.life() - 0.012).abs() < 1e-5);
            previous = burst.life();
        }
    }

    #[test]
    fn completed_bursts_are_never_integrated_again() {
        let mut burst = gold_burst();
        while burst.integrate() == BurstState::Alive {}
        let frozen = burst.clone();
        for _ in 0..10 {
            assert_eq!(burst.integrate(), BurstState::Completed);
        }
        assert_eq!(burst, frozen);
    }

    #[test]
    fn drag_shrinks_horizontal_speed() {
        let mut burst = gold_burst();
        let mut previous = burst.particles().to_vec();
        while burst.integrate() == BurstState::Alive {
            for (before, after) in previous.iter().zip(burst.particles()) {
                assert!(after.velocity.x.abs() <= before.velocity.x.abs());
                assert!(after.velocity.z.abs() <= before.velocity.z.abs());
                assert!(after.velocity.x.abs() < before.velocity.x.abs() || before.velocity.x == 0.);
            }
            previous = burst.particles().to_vec();
        }
    }

    #[test]
    fn particles_move_then_fall() {
        let mut burst = gold_burst();
        let initial = burst.particles().to_vec();
        burst.integrate();
        for (before, after) in initial.iter().zip(burst.particles()) {
            assert_eq!(after.position, before.position + before.velocity);
            let expected = (before.velocity - vec3(0., 0.005, 0.)) * 0.96;
            assert!((after.velocity - expected).abs().max_element() < 1e-6);
        }
    }

    #[test]
    fn opacity_tracks_life() {
        let mut burst = gold_burst();
        burst.integrate();
        assert!((burst.opacity() - 0.988).abs() < 1e-5);
    }
}
