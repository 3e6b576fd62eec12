//! Static point layouts for the trees, the snow and the ground sparkle.
//!
//! Every builder runs once when the scene is mounted; the resulting clouds are
//! never resized.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{vec3, Vec3, Vec4};
use log::debug;
use rand::prelude::*;

use crate::{
    config::{GroundConfig, SnowConfig, TreeConfig},
    math::{hsl_to_rgb, map, polar, rand_range},
    texture::SnowflakeShape,
};

/// Upper bound (exclusive) of the snow and tree phase attributes.
pub const PHASE_RANGE: f32 = 1000.;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CloudKind {
    Tree,
    Snow(SnowflakeShape),
    Ground,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScalarAttribute {
    Phase,
    PhaseSecondary,
    MIndex,
}

impl ScalarAttribute {
    pub fn name(self) -> &'static str {
        match self {
            Self::Phase => "phase",
            Self::PhaseSecondary => "phaseSecondary",
            Self::MIndex => "mIndex",
        }
    }
}

/// GPU-side layout of one point, shared by all point programs.
#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
pub struct PointInstance {
    /// xyz = position, w = size
    pub position_size: Vec4,
    /// rgb = color, w = phase
    pub color_phase: Vec4,
    /// x = phaseSecondary, y = mIndex
    pub extra: Vec4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    kind: CloudKind,
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
    sizes: Vec<f32>,
    scalars: Vec<(ScalarAttribute, Vec<f32>)>,
}

impl PointCloud {
    fn with_capacity(kind: CloudKind, count: usize, scalars: &[ScalarAttribute]) -> Self {
        Self {
            kind,
            positions: Vec::with_capacity(count),
            colors: Vec::with_capacity(count),
            sizes: Vec::with_capacity(count),
            scalars: scalars
                .iter()
                .map(|&attr| (attr, Vec::with_capacity(count)))
                .collect(),
        }
    }

    fn push(&mut self, position: Vec3, color: Vec3, size: f32, scalars: &[f32]) {
        debug_assert_eq!(scalars.len(), self.scalars.len());
        self.positions.push(position);
        self.colors.push(color);
        self.sizes.push(size);
        for ((_, values), &value) in self.scalars.iter_mut().zip(scalars) {
            values.push(value);
        }
    }

    pub fn kind(&self) -> CloudKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn scalar(&self, attr: ScalarAttribute) -> Option<&[f32]> {
        self.scalars
            .iter()
            .find(|(a, _)| *a == attr)
            .map(|(_, values)| values.as_slice())
    }

    /// Names of the attribute buffers handed to the renderer.
    pub fn attribute_names(&self) -> Vec<&'static str> {
        ["position", "color", "size"]
            .into_iter()
            .chain(self.scalars.iter().map(|(a, _)| a.name()))
            .collect()
    }

    /// Packs the parallel attribute arrays into instances. Attributes a
    /// batch does not carry are zero.
    pub fn instances(&self) -> Vec<PointInstance> {
        let phase = self.scalar(ScalarAttribute::Phase);
        let phase_secondary = self.scalar(ScalarAttribute::PhaseSecondary);
        let m_index = self.scalar(ScalarAttribute::MIndex);
        let at = |values: Option<&[f32]>, i: usize| values.map_or(0., |v| v[i]);

        (0..self.len())
            .map(|i| PointInstance {
                position_size: self.positions[i].extend(self.sizes[i]),
                color_phase: self.colors[i].extend(at(phase, i)),
                extra: Vec4::new(at(phase_secondary, i), at(m_index, i), 0., 0.),
            })
            .collect()
    }
}

/// Hue of the `i`-th of `count` tree points: a full sweep from 1 down to 0.
pub fn tree_hue(i: usize, count: usize) -> f32 {
    map(i as f32, 0., count as f32, 1., 0.)
}

/// Double helix narrowing towards the top. Each point draws its own height
/// at random; odd points sit on the opposite strand.
pub fn build_tree(config: &TreeConfig, rng: &mut impl Rng) -> PointCloud {
    let count = config.count;
    let mut cloud = PointCloud::with_capacity(
        CloudKind::Tree,
        count,
        &[ScalarAttribute::Phase, ScalarAttribute::MIndex],
    );
    let (y_min, y_max) = config.y_range;

    for i in 0..count {
        let t: f32 = rng.gen();
        let y = map(t, 0., 1., y_min, y_max);
        let ang = map(t, 0., 1., 0., config.turns * TAU) + TAU / 2. * (i % 2) as f32;
        let (z, x) = polar(ang, map(t, 0., 1., config.base_radius, 0.));
        let jitter = config.jitter * map(t, 0., 1., 1., 0.);

        let position = vec3(
            x + rand_range(rng, -jitter, jitter),
            y + rand_range(rng, -jitter, jitter),
            z + rand_range(rng, -jitter, jitter),
        );
        let color = hsl_to_rgb(tree_hue(i, count), 1., 0.5);
        let phase = rand_range(rng, 0., PHASE_RANGE);
        let m_index = map(i as f32, 0., count as f32, 1., 0.);

        cloud.push(position, color, 1., &[phase, m_index]);
    }

    debug!("Built tree cloud with {} points", cloud.len());
    cloud
}

/// One batch of falling snow. The stored y is a placeholder; the snow
/// program derives the height from the phase and the step counter.
pub fn build_snow(shape: SnowflakeShape, config: &SnowConfig, rng: &mut impl Rng) -> PointCloud {
    let mut cloud = PointCloud::with_capacity(
        CloudKind::Snow(shape),
        config.count,
        &[ScalarAttribute::Phase, ScalarAttribute::PhaseSecondary],
    );

    for _ in 0..config.count {
        let position = vec3(
            rand_range(rng, config.x_range.0, config.x_range.1),
            0.,
            rand_range(rng, config.z_range.0, config.z_range.1),
        );
        let color = config.palette.choose(rng);
        let phase = rand_range(rng, 0., PHASE_RANGE);
        let phase_secondary = rand_range(rng, 0., PHASE_RANGE);
        let size = rand_range(rng, config.size_range.0, config.size_range.1);

        cloud.push(position, color, size, &[phase, phase_secondary]);
    }

    debug!("Built {:?} snow cloud with {} points", shape, cloud.len());
    cloud
}

/// One snow batch per snowflake shape.
pub fn build_snow_batches(config: &SnowConfig, rng: &mut impl Rng) -> Vec<PointCloud> {
    SnowflakeShape::ALL
        .iter()
        .map(|&shape| build_snow(shape, config, rng))
        .collect()
}

/// Flat sparkle field. Points lie at y = 0; the scene lowers the whole cloud
/// by `y_offset`.
pub fn build_ground(config: &GroundConfig, rng: &mut impl Rng) -> PointCloud {
    let mut cloud = PointCloud::with_capacity(CloudKind::Ground, config.count, &[]);

    for _ in 0..config.count {
        let position = vec3(
            rand_range(rng, config.x_range.0, config.x_range.1),
            0.,
            rand_range(rng, config.z_range.0, config.z_range.1),
        );
        let color = config.palette.choose(rng);
        cloud.push(position, color, config.size, &[]);
    }

    debug!("Built ground cloud with {} points", cloud.len());
    cloud
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SceneRng;

    fn rng() -> SceneRng {
        SceneRng::seed_from_u64(42)
    }

    fn assert_parallel(cloud: &PointCloud, n: usize) {
        assert_eq!(cloud.len(), n);
        assert_eq!(cloud.colors().len(), n);
        assert_eq!(cloud.sizes().len(), n);
        for (_, values) in &cloud.scalars {
            assert_eq!(values.len(), n);
        }
        assert_eq!(cloud.instances().len(), n);
    }

    #[test]
    fn tree_attributes_are_parallel() {
        let config = TreeConfig::default();
        let cloud = build_tree(&config, &mut rng());
        assert_parallel(&cloud, 4000);
        assert_eq!(
            cloud.attribute_names(),
            vec!["position", "color", "size", "phase", "mIndex"]
        );
        assert!(cloud.scalar(ScalarAttribute::PhaseSecondary).is_none());
    }

    #[test]
    fn tree_hue_sweeps_the_rainbow() {
        let n = 4000;
        assert_eq!(tree_hue(0, n), 1.0);
        assert!(tree_hue(n - 1, n).abs() < 1e-3);
        assert!(tree_hue(n - 1, n) > 0.);

        let cloud = build_tree(&TreeConfig::default(), &mut rng());
        let first = cloud.colors()[0];
        assert!((first - vec3(1., 0., 0.)).abs().max_element() < 1e-5);
        let m_index = cloud.scalar(ScalarAttribute::MIndex).unwrap();
        assert_eq!(m_index[0], 1.0);
        assert!(m_index.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn tree_stays_inside_its_cone() {
        let config = TreeConfig::default();
        let cloud = build_tree(&config, &mut rng());
        let max_radius = config.base_radius + config.jitter * 2f32.sqrt();
        for p in cloud.positions() {
            assert!(p.y >= -8. - 0.3 && p.y <= 10. + 0.3, "{:?}", p);
            assert!((p.x * p.x + p.z * p.z).sqrt() <= max_radius + 1e-4, "{:?}", p);
        }
        for phase in cloud.scalar(ScalarAttribute::Phase).unwrap() {
            assert!((0. ..PHASE_RANGE).contains(phase));
        }
    }

    #[test]
    fn tree_without_jitter_lies_on_the_helix() {
        let config = TreeConfig {
            count: 200,
            jitter: 0.,
            ..Default::default()
        };
        let cloud = build_tree(&config, &mut rng());
        for p in cloud.positions() {
            let t = (p.y + 8.) / 18.;
            let radius = (p.x * p.x + p.z * p.z).sqrt();
            assert!((radius - 5. * (1. - t)).abs() < 1e-3, "{:?}", p);
        }
    }

    #[test]
    fn snow_batches_cover_every_shape() {
        let config = SnowConfig::default();
        let batches = build_snow_batches(&config, &mut rng());
        assert_eq!(batches.len(), 3);
        for (batch, shape) in batches.iter().zip(SnowflakeShape::ALL) {
            assert_eq!(batch.kind(), CloudKind::Snow(shape));
            assert_parallel(batch, 300);
            for p in batch.positions() {
                assert!((-25. ..25.).contains(&p.x));
                assert!((-150. ..15.).contains(&p.z));
                assert_eq!(p.y, 0.);
            }
            for s in batch.sizes() {
                assert!((2. ..4.).contains(s));
            }
            for c in batch.colors() {
                assert!(config.palette.colors().contains(c));
            }
            for attr in [ScalarAttribute::Phase, ScalarAttribute::PhaseSecondary] {
                for v in batch.scalar(attr).unwrap() {
                    assert!((0. ..PHASE_RANGE).contains(v));
                }
            }
        }
    }

    #[test]
    fn ground_is_a_flat_field() {
        let config = GroundConfig::default();
        let cloud = build_ground(&config, &mut rng());
        assert_parallel(&cloud, 3000);
        assert_eq!(cloud.attribute_names(), vec!["position", "color", "size"]);
        assert!(cloud.sizes().iter().all(|&s| s == 1.));
        assert!(cloud.positions().iter().all(|p| p.y == 0.));
        let instances = cloud.instances();
        assert_eq!(instances[0].extra, Vec4::ZERO);
        assert_eq!(instances[0].color_phase.w, 0.);
    }

    #[test]
    fn builders_are_reproducible() {
        let config = TreeConfig::default();
        assert_eq!(build_tree(&config, &mut rng()), build_tree(&config, &mut rng()));
    }

    #[test]
    fn empty_clouds_are_allowed() {
        let config = GroundConfig {
            count: 0,
            ..Default::default()
        };
        let cloud = build_ground(&config, &mut rng());
        assert!(cloud.is_empty());
        assert!(cloud.instances().is_empty());
    }
}
