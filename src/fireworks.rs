//! Spawning and retiring firework bursts.
//!
//! Bursts spawn on an explicit trigger or from the ambient timer, and only
//! while fireworks are enabled. Disabling never cuts a live burst short.

use std::time::Duration;

use glam::vec3;
use log::{debug, info};
use rand::prelude::*;

use crate::{
    config::FireworksConfig,
    firework::{BurstId, BurstState, FireworkBurst},
    math::rand_range,
    rng::SceneRng,
};

pub struct Fireworks {
    config: FireworksConfig,
    /// Live bursts in spawn order.
    bursts: Vec<FireworkBurst>,
    next_id: u64,
    enabled: bool,
    /// Time accumulated towards the next ambient interval.
    timer: Duration,
    rng: SceneRng,
}

impl Fireworks {
    /// Starts disabled.
    pub fn new(config: FireworksConfig, seed: u64) -> Self {
        Self {
            config,
            bursts: Vec::new(),
            next_id: 0,
            enabled: false,
            timer: Duration::ZERO,
            rng: SceneRng::seed_from_u64(seed),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Gates every new spawn. Bursts already in flight keep going. Enabling
    /// starts a fresh ambient interval.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.timer = Duration::ZERO;
        info!(
            "Fireworks {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Spawns one burst right away. Each call spawns independently.
    pub fn trigger_manual_burst(&mut self) -> Option<BurstId> {
        if !self.enabled {
            debug!("Manual burst ignored, fireworks are disabled");
            return None;
        }
        Some(self.spawn())
    }

    fn spawn(&mut self) -> BurstId {
        let id = BurstId(self.next_id);
        self.next_id += 1;

        let (min, max) = (self.config.origin_min, self.config.origin_max);
        let origin = vec3(
            rand_range(&mut self.rng, min.x, max.x),
            rand_range(&mut self.rng, min.y, max.y),
            rand_range(&mut self.rng, min.z, max.z),
        );
        let color = self.config.palette.choose(&mut self.rng);

        self.bursts.push(FireworkBurst::new(
            id,
            origin,
            color,
            &self.config,
            &mut self.rng,
        ));
        debug!("Spawned burst {:?} at {:?}", id, origin);
        id
    }

    /// Per-frame hook: integrates every live burst, drops the ones that
    /// completed, then runs the ambient timer. Bursts spawned here get their
    /// first step on the next frame.
    pub fn tick(&mut self, delta: Duration) {
        self.bursts.retain_mut(|burst| match burst.integrate() {
            BurstState::Alive => true,
            BurstState::Completed => {
                debug!("Retired burst {:?}", burst.id());
                false
            }
        });

        if !self.enabled {
            return;
        }

        let interval = self.config.spawn_interval;
        self.timer += delta;
        if self.timer < interval {
            return;
        }
        // Intervals missed during a long stall are dropped, not replayed.
        let remainder = self.timer.as_nanos() % interval.as_nanos().max(1);
        self.timer = Duration::from_nanos(remainder as u64);
        if self.rng.gen::<f64>() < self.config.spawn_probability {
            self.spawn();
        }
    }

    pub fn bursts(&self) -> &[FireworkBurst] {
        &self.bursts
    }

    pub fn len(&self) -> usize {
        self.bursts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    /// Total number of bursts ever spawned.
    pub fn spawned(&self) -> u64 {
        self.next_id
    }

    /// Teardown: stop spawning and drop every burst.
    pub fn shutdown(&mut self) {
        self.set_enabled(false);
        self.bursts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(1200);
    const FRAME: Duration = Duration::from_millis(16);

    fn fireworks(probability: f64) -> Fireworks {
        Fireworks::new(
            FireworksConfig {
                spawn_probability: probability,
                ..Default::default()
            },
            5,
        )
    }

    #[test]
    fn disabled_fireworks_never_spawn() {
        let mut fw = fireworks(1.);
        for _ in 0..3 {
            assert_eq!(fw.trigger_manual_burst(), None);
        }
        for _ in 0..100 {
            fw.tick(INTERVAL);
        }
        assert!(fw.is_empty());
        assert_eq!(fw.spawned(), 0);
    }

    #[test]
    fn three_triggers_three_bursts() {
        let mut fw = fireworks(0.);
        fw.set_enabled(true);
        let ids: Vec<_> = (0..3).filter_map(|_| fw.trigger_manual_burst()).collect();
        assert_eq!(ids, vec![BurstId(0), BurstId(1), BurstId(2)]);
        assert_eq!(fw.len(), 3);
        fw.tick(FRAME);
        assert_eq!(fw.len(), 3);
    }

    #[test]
    fn spawned_bursts_stay_within_bounds() {
        let mut fw = fireworks(0.);
        fw.set_enabled(true);
        for _ in 0..50 {
            fw.trigger_manual_burst();
        }
        let config = FireworksConfig::default();
        for burst in fw.bursts() {
            let o = burst.origin();
            assert!(o.cmpge(config.origin_min).all() && o.cmple(config.origin_max).all());
            assert!(config.palette.colors().contains(&burst.base_color()));
        }
    }

    #[test]
    fn ambient_timer_fires_once_per_interval() {
        let mut fw = fireworks(1.);
        fw.set_enabled(true);
        fw.tick(INTERVAL - Duration::from_millis(1));
        assert_eq!(fw.spawned(), 0);
        fw.tick(Duration::from_millis(1));
        assert_eq!(fw.spawned(), 1);
        for _ in 0..3 {
            fw.tick(INTERVAL);
        }
        assert_eq!(fw.spawned(), 4);
    }

    #[test]
    fn long_stall_spawns_at_most_once() {
        let mut fw = fireworks(1.);
        fw.set_enabled(true);
        for _ in 0..10 {
            fw.tick(FRAME);
        }
        fw.tick(Duration::from_secs(600));
        assert_eq!(fw.spawned(), 1);
        assert_eq!(fw.len(), 1);

        // The carried remainder stays below one interval.
        fw.tick(FRAME);
        assert_eq!(fw.spawned(), 1);
    }

    #[test]
    fn ambient_spawns_are_probabilistic() {
        let mut fw = fireworks(0.6);
        fw.set_enabled(true);
        for _ in 0..200 {
            fw.tick(INTERVAL);
        }
        let spawned = fw.spawned();
        assert!((80..160).contains(&spawned), "{}", spawned);
    }

    #[test]
    fn zero_probability_never_spawns_ambiently() {
        let mut fw = fireworks(0.);
        fw.set_enabled(true);
        for _ in 0..100 {
            fw.tick(INTERVAL);
        }
        assert_eq!(fw.spawned(), 0);
    }

    #[test]
    fn re_enabling_resumes_ambient_spawns() {
        let mut fw = fireworks(1.);
        fw.set_enabled(true);
        fw.set_enabled(false);
        fw.tick(INTERVAL * 5);
        assert_eq!(fw.spawned(), 0);

        fw.set_enabled(true);
        fw.tick(INTERVAL);
        assert_eq!(fw.spawned(), 1);
    }

    #[test]
    fn disabling_restarts_the_interval() {
        let mut fw = fireworks(1.);
        fw.set_enabled(true);
        fw.tick(Duration::from_millis(1000));
        fw.set_enabled(false);
        fw.set_enabled(true);
        fw.tick(Duration::from_millis(500));
        assert_eq!(fw.spawned(), 0);
    }

    #[test]
    fn disabling_lets_live_bursts_finish() {
        let mut fw = fireworks(0.);
        fw.set_enabled(true);
        fw.trigger_manual_burst();
        fw.trigger_manual_burst();
        fw.set_enabled(false);

        for _ in 0..83 {
            fw.tick(FRAME);
            assert_eq!(fw.len(), 2);
        }
        fw.tick(FRAME);
        assert!(fw.is_empty());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut fw = fireworks(0.);
        fw.set_enabled(true);
        let first = fw.trigger_manual_burst().unwrap();
        for _ in 0..84 {
            fw.tick(FRAME);
        }
        assert!(fw.is_empty());
        let second = fw.trigger_manual_burst().unwrap();
        assert!(second > first);
    }

    #[test]
    fn bursts_integrate_independently() {
        let mut fw = fireworks(0.);
        fw.set_enabled(true);
        fw.trigger_manual_burst();
        fw.trigger_manual_burst();
        let mut standalone = fw.bursts()[1].clone();

        for _ in 0..10 {
            fw.tick(FRAME);
            standalone.integrate();
        }
        assert_eq!(fw.bursts()[1], standalone);
    }

    #[test]
    fn shutdown_clears_everything() {
        let mut fw = fireworks(1.);
        fw.set_enabled(true);
        fw.trigger_manual_burst();
        fw.shutdown();
        assert!(!fw.is_enabled());
        assert!(fw.is_empty());
        fw.tick(INTERVAL * 10);
        assert!(fw.is_empty());
    }

    #[test]
    fn same_seed_same_show() {
        let run = || {
            let mut fw = fireworks(0.6);
            fw.set_enabled(true);
            for _ in 0..20 {
                fw.tick(INTERVAL / 2);
            }
            fw.bursts().to_vec()
        };
        assert_eq!(run(), run());
    }
}
