//! Composition root of the animated scene.

use std::panic::{self, AssertUnwindSafe};

use log::{error, info};
use rand::prelude::*;

use crate::{
    config::SceneConfig,
    entity::Camera,
    firework::BurstId,
    fireworks::Fireworks,
    forest::{Forest, FrameTime},
    rng::SceneRng,
};

pub struct Scene {
    config: SceneConfig,
    camera: Camera,
    forest: Forest,
    fireworks: Fireworks,
    frames: u64,
}

impl Scene {
    pub fn new(config: SceneConfig, seed: u64, aspect_ratio: f32) -> Self {
        info!("Building scene with seed {}", seed);
        let mut rng = SceneRng::seed_from_u64(seed);
        let forest = Forest::new(&config, &mut rng);
        let fireworks = Fireworks::new(config.fireworks.clone(), rng.gen());
        let camera = Camera::new(&config.camera, aspect_ratio);

        Self {
            config,
            camera,
            forest,
            fireworks,
            frames: 0,
        }
    }

    /// Per-frame hook. A failing frame is logged and skipped; it never takes
    /// the render loop down with it.
    pub fn tick(&mut self, frame: &FrameTime) {
        let Self {
            forest, fireworks, ..
        } = self;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            forest.tick(frame);
            fireworks.tick(frame.delta);
        }));
        if result.is_err() {
            error!("Frame {} failed, skipping", self.frames);
        }
        self.frames += 1;
    }

    pub fn trigger_manual_burst(&mut self) -> Option<BurstId> {
        self.fireworks.trigger_manual_burst()
    }

    pub fn set_fireworks_enabled(&mut self, enabled: bool) {
        self.fireworks.set_enabled(enabled);
    }

    pub fn fireworks_enabled(&self) -> bool {
        self.fireworks.is_enabled()
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.camera.aspect_ratio = aspect_ratio;
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn fireworks(&self) -> &Fireworks {
        &self.fireworks
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.fireworks.shutdown();
        info!("Scene torn down after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{GroundConfig, SnowConfig, TreeConfig};

    fn scene() -> Scene {
        let config = SceneConfig {
            tree: TreeConfig {
                count: 32,
                ..Default::default()
            },
            snow: SnowConfig {
                count: 4,
                ..Default::default()
            },
            ground: GroundConfig {
                count: 8,
                ..Default::default()
            },
            ..Default::default()
        };
        Scene::new(config, 1234, 16. / 9.)
    }

    fn frame(n: u64) -> FrameTime {
        FrameTime {
            elapsed: Duration::from_millis(16 * n),
            delta: Duration::from_millis(16),
            wall_clock_ms: 16. * n as f64,
        }
    }

    #[test]
    fn fireworks_wait_for_the_intro() {
        let mut scene = scene();
        assert!(!scene.fireworks_enabled());
        assert_eq!(scene.trigger_manual_burst(), None);

        scene.set_fireworks_enabled(true);
        assert!(scene.trigger_manual_burst().is_some());
        assert_eq!(scene.fireworks().len(), 1);
    }

    #[test]
    fn tick_drives_both_animators() {
        let mut scene = scene();
        scene.set_fireworks_enabled(true);
        scene.trigger_manual_burst();
        for n in 1..=10 {
            scene.tick(&frame(n));
        }
        assert_eq!(scene.frames(), 10);
        assert_eq!(scene.forest().uniforms().step(), 10);
        let life = scene.fireworks().bursts()[0].life();
        assert!((life - (1. - 10. * 0.012)).abs() < 1e-5);
    }
}
