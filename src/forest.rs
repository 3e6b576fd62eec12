//! The forest avenue: static point clouds plus the uniforms that animate
//! them.
//!
//! [`SharedUniforms`] is the read-only view handed to the shading programs.
//! Only [`Forest::tick`] obtains a [`UniformsWriter`].

use std::time::Duration;

use glam::{vec3, Vec3};
use log::{debug, trace};
use rand::prelude::*;

use crate::{
    config::SceneConfig,
    field::{self, PointCloud},
    rng::{self, SceneRng},
};

/// The step counter wraps back to zero at this value.
pub const STEP_PERIOD: u32 = 1000;

/// Timing handed to every per-frame hook.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FrameTime {
    /// Time since the scene was mounted.
    pub elapsed: Duration,
    /// Time since the previous frame.
    pub delta: Duration,
    /// Wall-clock milliseconds since the Unix epoch.
    pub wall_clock_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SharedUniforms {
    elapsed_ms: f32,
    step: u32,
    amplitude: Vec<f32>,
}

impl SharedUniforms {
    pub fn new(bins: usize) -> Self {
        Self {
            elapsed_ms: 0.,
            step: 0,
            amplitude: vec![0.; bins],
        }
    }

    #[cfg(test)]
    pub(crate) fn with_levels(levels: Vec<f32>) -> Self {
        Self {
            amplitude: levels,
            ..Self::new(0)
        }
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Raw 8-bit levels, one per frequency bin.
    pub fn amplitude(&self) -> &[f32] {
        &self.amplitude
    }

    /// Normalised amplitude of the bin `m_index` (in `[0, 1]`) falls into.
    pub fn amplitude_at(&self, m_index: f32) -> f32 {
        let bins = self.amplitude.len();
        if bins == 0 {
            return 0.;
        }
        let bin = ((m_index.max(0.) * bins as f32) as usize).min(bins - 1);
        self.amplitude[bin] / 255.
    }
}

/// Write access to [`SharedUniforms`]. Only the forest can create one.
pub struct UniformsWriter<'a> {
    uniforms: &'a mut SharedUniforms,
}

impl<'a> UniformsWriter<'a> {
    fn new(uniforms: &'a mut SharedUniforms) -> Self {
        Self { uniforms }
    }

    /// Never moves time backwards.
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        let ms = elapsed.as_secs_f32() * 1000.;
        self.uniforms.elapsed_ms = self.uniforms.elapsed_ms.max(ms);
    }

    pub fn advance_step(&mut self) {
        self.uniforms.step = (self.uniforms.step + 1) % STEP_PERIOD;
    }

    /// Synthetic spectrum: a slow travelling sine in `[0, 100]` plus uniform
    /// noise in `[0, 50)`, truncated to 8-bit levels.
    pub fn regenerate_amplitude(&mut self, wall_clock_ms: f64, rng: &mut impl Rng) {
        let time = wall_clock_ms * 0.002;
        for (i, value) in self.uniforms.amplitude.iter_mut().enumerate() {
            let wave = (i as f64 * 0.01 + time).sin() * 0.5 + 0.5;
            let level = wave * 100. + rng.gen::<f64>() * 50.;
            *value = level.floor() as f32;
        }
    }
}

pub struct Forest {
    uniforms: SharedUniforms,
    tree: PointCloud,
    tree_offsets: Vec<Vec3>,
    snow: Vec<PointCloud>,
    ground: PointCloud,
    ground_offset: Vec3,
    rng: SceneRng,
}

impl Forest {
    pub fn new(config: &SceneConfig, rng: &mut SceneRng) -> Self {
        let tree = field::build_tree(&config.tree, rng);
        let snow = field::build_snow_batches(&config.snow, rng);
        let ground = field::build_ground(&config.ground, rng);

        let tree_offsets = (0..config.tree.rows)
            .flat_map(|row| {
                let z = -config.tree.row_spacing * row as f32;
                let x = config.tree.avenue_half_width;
                [vec3(x, 0., z), vec3(-x, 0., z)]
            })
            .collect::<Vec<_>>();

        debug!(
            "Forest: {} trees of {} points, {} snow batches, {} ground points",
            tree_offsets.len(),
            tree.len(),
            snow.len(),
            ground.len()
        );

        Self {
            uniforms: SharedUniforms::new(config.audio_bins),
            tree,
            tree_offsets,
            snow,
            ground,
            ground_offset: vec3(0., config.ground.y_offset, 0.),
            rng: rng::fork(rng),
        }
    }

    /// Per-frame hook. Advances time, the step counter and the spectrum.
    pub fn tick(&mut self, frame: &FrameTime) {
        let mut writer = UniformsWriter::new(&mut self.uniforms);
        writer.set_elapsed(frame.elapsed);
        writer.advance_step();
        writer.regenerate_amplitude(frame.wall_clock_ms, &mut self.rng);
        trace!(
            "Forest tick: elapsed {:.0}ms, step {}",
            self.uniforms.elapsed_ms,
            self.uniforms.step
        );
    }

    pub fn uniforms(&self) -> &SharedUniforms {
        &self.uniforms
    }

    pub fn tree(&self) -> &PointCloud {
        &self.tree
    }

    /// Model translation of every tree instance along the avenue.
    pub fn tree_offsets(&self) -> &[Vec3] {
        &self.tree_offsets
    }

    pub fn snow(&self) -> &[PointCloud] {
        &self.snow
    }

    pub fn ground(&self) -> &PointCloud {
        &self.ground
    }

    pub fn ground_offset(&self) -> Vec3 {
        self.ground_offset
    }
}
