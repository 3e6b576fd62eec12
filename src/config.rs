use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use glam::{const_vec3, Vec3};
use log::{info, warn};
use serde::Deserialize;

use crate::math::Palette;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeConfig {
    pub count: usize,
    pub y_range: (f32, f32),
    pub turns: f32,
    pub base_radius: f32,
    pub jitter: f32,
    pub rows: u32,
    pub row_spacing: f32,
    pub avenue_half_width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnowConfig {
    /// Points per snowflake shape.
    pub count: usize,
    pub x_range: (f32, f32),
    pub z_range: (f32, f32),
    pub size_range: (f32, f32),
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundConfig {
    pub count: usize,
    pub x_range: (f32, f32),
    pub z_range: (f32, f32),
    pub size: f32,
    pub y_offset: f32,
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireworksConfig {
    pub particle_count: usize,
    pub speed_range: (f32, f32),
    pub size_range: (f32, f32),
    pub color_jitter: f32,
    pub life_decay: f32,
    pub gravity: f32,
    pub drag: f32,
    pub spawn_interval: Duration,
    pub spawn_probability: f64,
    pub origin_min: Vec3,
    pub origin_max: Vec3,
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Euler angles (XYZ order), radians.
    pub rotation: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub background: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub tree: TreeConfig,
    pub snow: SnowConfig,
    pub ground: GroundConfig,
    pub fireworks: FireworksConfig,
    pub audio_bins: usize,
    pub camera: CameraConfig,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            count: 4000,
            y_range: (-8., 10.),
            turns: 6.,
            base_radius: 5.,
            jitter: 0.3,
            rows: 10,
            row_spacing: 20.,
            avenue_half_width: 20.,
        }
    }
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            count: 300,
            x_range: (-25., 25.),
            z_range: (-150., 15.),
            size_range: (2., 4.),
            // #f1d4d4 #f1f6f9 #eeeeee
            palette: Palette::from_rgb8(&[
                [0xf1, 0xd4, 0xd4],
                [0xf1, 0xf6, 0xf9],
                [0xee, 0xee, 0xee],
            ]),
        }
    }
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            count: 3000,
            x_range: (-25., 25.),
            z_range: (-150., 15.),
            size: 1.,
            y_offset: -8.,
            // #93abd3 #f2f4c0 #9ddfd3
            palette: Palette::from_rgb8(&[
                [0x93, 0xab, 0xd3],
                [0xf2, 0xf4, 0xc0],
                [0x9d, 0xdf, 0xd3],
            ]),
        }
    }
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            particle_count: 150,
            speed_range: (0.1, 0.4),
            size_range: (1.5, 3.5),
            color_jitter: 0.1,
            life_decay: 0.012,
            gravity: 0.005,
            drag: 0.96,
            spawn_interval: Duration::from_millis(1200),
            spawn_probability: 0.6,
            origin_min: const_vec3!([-15., 5., -50.]),
            origin_max: const_vec3!([15., 20., -10.]),
            // Gold, silver, teal, light pink, lavender, orange red
            palette: Palette::from_rgb8(&[
                [0xFF, 0xD7, 0x00],
                [0xC0, 0xC0, 0xC0],
                [0x00, 0xFF, 0xFF],
                [0xFF, 0xB6, 0xC1],
                [0xE6, 0xE6, 0xFA],
                [0xFF, 0x45, 0x00],
            ]),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: const_vec3!([-0.09, -2.55, 24.42]),
            rotation: const_vec3!([0.10, -0.003, 0.0004]),
            fov: 60.,
            near: 0.1,
            far: 1000.,
            // #020205
            background: const_vec3!([2. / 255., 2. / 255., 5. / 255.]),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            tree: TreeConfig::default(),
            snow: SnowConfig::default(),
            ground: GroundConfig::default(),
            fireworks: FireworksConfig::default(),
            // FFT size 2048, half of it as frequency bins
            audio_bins: 1024,
            camera: CameraConfig::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlData {
    pub tree_count: Option<i64>,
    pub tree_rows: Option<u32>,
    pub snow_count: Option<i64>,
    pub ground_count: Option<i64>,
    pub firework_particle_count: Option<i64>,

    pub spawn_interval_ms: Option<u64>,
    pub spawn_probability: Option<f64>,
    pub life_decay: Option<f32>,
    pub gravity: Option<f32>,
    pub drag: Option<f32>,

    pub audio_bins: Option<i64>,
    pub vertical_fov: Option<f32>,

    pub firework_colors: Option<Vec<String>>,
    pub snow_colors: Option<Vec<String>>,
    pub ground_colors: Option<Vec<String>>,
}

/// Negative counts are a programming error: loud in debug builds, clamped to
/// zero in release builds.
pub fn particle_count(name: &str, requested: i64) -> usize {
    debug_assert!(
        requested >= 0,
        "`{}` must not be negative, was given: {}",
        name,
        requested
    );
    if requested < 0 {
        warn!("`{}` was negative ({}), clamping to 0", name, requested);
        0
    } else {
        requested as usize
    }
}

impl SceneConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        info!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let data: TomlData = toml::from_str(contents)?;
        let mut config = Self::default();

        if let Some(count) = data.tree_count {
            config.tree.count = particle_count("tree_count", count);
        }
        if let Some(rows) = data.tree_rows {
            config.tree.rows = rows;
        }
        if let Some(count) = data.snow_count {
            config.snow.count = particle_count("snow_count", count);
        }
        if let Some(count) = data.ground_count {
            config.ground.count = particle_count("ground_count", count);
        }
        if let Some(count) = data.firework_particle_count {
            config.fireworks.particle_count = particle_count("firework_particle_count", count);
        }
        if let Some(bins) = data.audio_bins {
            config.audio_bins = particle_count("audio_bins", bins);
        }

        if let Some(ms) = data.spawn_interval_ms {
            if ms == 0 {
                anyhow::bail!("`spawn_interval_ms` must be a positive number");
            }
            config.fireworks.spawn_interval = Duration::from_millis(ms);
        }
        if let Some(p) = data.spawn_probability {
            if !(0. ..=1.).contains(&p) {
                anyhow::bail!("`spawn_probability` must be within [0, 1], was given: {}", p);
            }
            config.fireworks.spawn_probability = p;
        }
        if let Some(decay) = data.life_decay {
            if !(decay > 0. && decay.is_finite()) {
                anyhow::bail!("`life_decay` must be a positive number, was given: {}", decay);
            }
            config.fireworks.life_decay = decay;
        }
        if let Some(gravity) = data.gravity {
            if !gravity.is_finite() {
                anyhow::bail!("`gravity` must be a finite number, was given: {}", gravity);
            }
            config.fireworks.gravity = gravity;
        }
        if let Some(drag) = data.drag {
            if !(drag > 0. && drag <= 1.) {
                anyhow::bail!("`drag` must be within (0, 1], was given: {}", drag);
            }
            config.fireworks.drag = drag;
        }
        if let Some(fov) = data.vertical_fov {
            if !fov.is_finite() {
                anyhow::bail!("`vertical_fov` must be a finite number, was given: {}", fov);
            }
            config.camera.fov = fov.clamp(1., 179.);
        }

        if let Some(colors) = &data.firework_colors {
            config.fireworks.palette = Palette::parse(colors).context("`firework_colors`")?;
        }
        if let Some(colors) = &data.snow_colors {
            config.snow.palette = Palette::parse(colors).context("`snow_colors`")?;
        }
        if let Some(colors) = &data.ground_colors {
            config.ground.palette = Palette::parse(colors).context("`ground_colors`")?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(SceneConfig::from_toml_str("").unwrap(), SceneConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = SceneConfig::from_toml_str(
            r##"
tree_count = 100
snow_count = 10
spawn_interval_ms = 500
spawn_probability = 1.0
firework_colors = ["#ff0000"]
"##,
        )
        .unwrap();
        assert_eq!(config.tree.count, 100);
        assert_eq!(config.snow.count, 10);
        assert_eq!(config.ground.count, 3000);
        assert_eq!(config.fireworks.spawn_interval, Duration::from_millis(500));
        assert_eq!(config.fireworks.spawn_probability, 1.0);
        assert_eq!(config.fireworks.palette.colors(), &[Vec3::X]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(SceneConfig::from_toml_str("spawn_probability = 1.5").is_err());
        assert!(SceneConfig::from_toml_str("drag = 0.0").is_err());
        assert!(SceneConfig::from_toml_str("spawn_interval_ms = 0").is_err());
        assert!(SceneConfig::from_toml_str("snow_colors = [\"nope\"]").is_err());
        assert!(SceneConfig::from_toml_str("unknown_key = 1").is_err());
        assert!(SceneConfig::from_toml_str("life_decay = nan").is_err());
        assert!(SceneConfig::from_toml_str("life_decay = inf").is_err());
        assert!(SceneConfig::from_toml_str("life_decay = -0.5").is_err());
        assert!(SceneConfig::from_toml_str("gravity = nan").is_err());
        assert!(SceneConfig::from_toml_str("gravity = -inf").is_err());
        assert!(SceneConfig::from_toml_str("spawn_probability = nan").is_err());
        assert!(SceneConfig::from_toml_str("vertical_fov = nan").is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn negative_count_fails_fast_in_debug() {
        particle_count("tree_count", -1);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn negative_count_clamps_in_release() {
        assert_eq!(particle_count("tree_count", -5), 0);
    }
}
