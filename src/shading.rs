//! Point shading programs.
//!
//! Each program exists twice: as WGSL under `src/shaders/` for the GPU, and
//! as a CPU reference here with the same formulas. The reference is what the
//! tests pin down; keep the two in step.

use glam::{Mat4, Vec3};

use crate::{
    field::CloudKind,
    forest::{SharedUniforms, STEP_PERIOD},
    math::map,
};

/// View-space z range faded from transparent (far) to opaque (near).
pub const TREE_DEPTH_FADE: (f32, f32) = (-200., 15.);
/// Model-space z range of the snow fade.
pub const SNOW_DEPTH_FADE: (f32, f32) = (-150., 15.);
/// Heights a snowflake falls between over one step period.
pub const SNOW_FALL: (f32, f32) = (25., -8.);
pub const SNOW_SWAY_SPEED: f32 = 0.0006;

pub const TREE_ATTENUATION: f32 = 100.;
pub const SNOW_ATTENUATION: f32 = 100.;
pub const GROUND_ATTENUATION: f32 = 300.;
pub const FIREWORK_ATTENUATION: f32 = 100.;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Program {
    Tree,
    Snow,
    Ground,
    Firework,
}

impl Program {
    pub fn for_cloud(kind: CloudKind) -> Self {
        match kind {
            CloudKind::Tree => Self::Tree,
            CloudKind::Snow(_) => Self::Snow,
            CloudKind::Ground => Self::Ground,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tree => "Tree Program",
            Self::Snow => "Snow Program",
            Self::Ground => "Ground Program",
            Self::Firework => "Firework Program",
        }
    }

    pub fn wgsl(self) -> &'static str {
        match self {
            Self::Tree => include_str!("shaders/tree.wgsl"),
            Self::Snow => include_str!("shaders/snow.wgsl"),
            Self::Ground => include_str!("shaders/ground.wgsl"),
            Self::Firework => include_str!("shaders/firework.wgsl"),
        }
    }
}

/// What a program decides for one point in one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadedPoint {
    /// Model-space position after animation.
    pub position: Vec3,
    /// On-screen size in pixels.
    pub size: f32,
    pub opacity: f32,
}

/// Perspective foreshortening of a point sprite.
pub fn attenuated_size(size: f32, attenuation: f32, view_z: f32) -> f32 {
    size * (attenuation / -view_z)
}

pub fn depth_fade(z: f32, (far, near): (f32, f32)) -> f32 {
    map(z, far, near, 0., 1.).clamp(0., 1.)
}

/// Height of a snowflake: falls from top to bottom once per step period and
/// wraps.
pub fn snow_height(phase: f32, step: u32) -> f32 {
    let period = STEP_PERIOD as f32;
    map((phase + step as f32) % period, 0., period, SNOW_FALL.0, SNOW_FALL.1)
}

pub fn tree_point(
    uniforms: &SharedUniforms,
    model_view: &Mat4,
    position: Vec3,
    m_index: f32,
) -> ShadedPoint {
    let view = model_view.transform_point3(position);
    let amplitude = (uniforms.amplitude_at(m_index) - 0.2).clamp(0., 1.);
    let size = map(amplitude, 0., 1., 1., 20.);

    ShadedPoint {
        position,
        size: attenuated_size(size, TREE_ATTENUATION, view.z),
        opacity: depth_fade(view.z, TREE_DEPTH_FADE),
    }
}

pub fn snow_point(
    uniforms: &SharedUniforms,
    model_view: &Mat4,
    position: Vec3,
    size: f32,
    phase: f32,
    phase_secondary: f32,
) -> ShadedPoint {
    let t = uniforms.elapsed_ms() * SNOW_SWAY_SPEED;
    let mut p = position;
    p.y = snow_height(phase, uniforms.step());
    p.x += (t + phase).sin();
    p.z += (t + phase_secondary).sin();

    let view = model_view.transform_point3(p);

    ShadedPoint {
        position: p,
        size: attenuated_size(size, SNOW_ATTENUATION, view.z),
        opacity: depth_fade(p.z, SNOW_DEPTH_FADE),
    }
}

pub fn ground_point(model_view: &Mat4, position: Vec3, size: f32) -> ShadedPoint {
    let view = model_view.transform_point3(position);
    ShadedPoint {
        position,
        size: attenuated_size(size, GROUND_ATTENUATION, view.z),
        opacity: 1.,
    }
}

/// Burst particles fade with the remaining life of their burst.
pub fn firework_point(model_view: &Mat4, position: Vec3, size: f32, life: f32) -> ShadedPoint {
    let view = model_view.transform_point3(position);
    ShadedPoint {
        position,
        size: attenuated_size(size, FIREWORK_ATTENUATION, view.z),
        opacity: life.clamp(0., 1.),
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn snow_height_stays_in_range_and_wraps_smoothly() {
        let range = SNOW_FALL.0 - SNOW_FALL.1;
        let max_jump = range / STEP_PERIOD as f32 + EPSILON;
        for phase in [0., 0.5, 123.4, 999.9] {
            let mut previous = snow_height(phase, 0);
            for step in 1..STEP_PERIOD * 2 {
                let y = snow_height(phase, step % STEP_PERIOD);
                assert!((SNOW_FALL.1..=SNOW_FALL.0).contains(&y), "{}", y);
                let jump = (y - previous).abs();
                // falling is continuous apart from the single top-to-bottom wrap
                assert!(jump <= max_jump || jump >= range - max_jump, "{} -> {}", previous, y);
                previous = y;
            }
        }
        assert!((snow_height(0., 0) - 25.).abs() < EPSILON);
        assert!((snow_height(500., 0) - 8.5).abs() < EPSILON);
    }

    #[test]
    fn tree_size_follows_amplitude() {
        let uniforms = SharedUniforms::new(0);
        let mv = Mat4::from_translation(vec3(0., 0., -100.));
        let shaded = tree_point(&uniforms, &mv, Vec3::ZERO, 0.5);
        // silent spectrum gives the base size of 1, foreshortened at z = -100
        assert!((shaded.size - 1.).abs() < EPSILON);
        assert!((shaded.opacity - map(-100., -200., 15., 0., 1.)).abs() < EPSILON);
    }

    #[test]
    fn tree_size_maps_spectrum_levels() {
        let uniforms = SharedUniforms::with_levels(vec![10., 127.5, 255., 0.]);
        let mv = Mat4::from_translation(vec3(0., 0., -100.));
        let size_at = |m_index: f32| tree_point(&uniforms, &mv, Vec3::ZERO, m_index).size;

        // below the 0.2 threshold
        assert!((size_at(0.1) - 1.).abs() < EPSILON);
        // 0.5 - 0.2 = 0.3 of the way from 1 to 20
        assert!((size_at(0.3) - 6.7).abs() < EPSILON);
        assert!((size_at(0.6) - 16.2).abs() < EPSILON);
        // m_index 1 falls into the last bin
        assert!((size_at(1.) - 1.).abs() < EPSILON);

        let near = Mat4::from_translation(vec3(0., 0., -50.));
        let shaded = tree_point(&uniforms, &near, Vec3::ZERO, 0.6);
        assert!((shaded.size - 16.2 * 2.).abs() < EPSILON);
    }

    #[test]
    fn depth_fade_is_clamped() {
        assert_eq!(depth_fade(-500., TREE_DEPTH_FADE), 0.);
        assert_eq!(depth_fade(50., TREE_DEPTH_FADE), 1.);
        assert!((depth_fade(-92.5, TREE_DEPTH_FADE) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn snow_sways_and_fades_with_its_own_depth() {
        let uniforms = SharedUniforms::new(0);
        let mv = Mat4::from_translation(vec3(0., 0., -10.));
        let shaded = snow_point(&uniforms, &mv, vec3(1., 0., -67.5), 3., 0., 0.);
        assert!((shaded.position.y - 25.).abs() < EPSILON);
        assert!((shaded.position.x - 1.).abs() < EPSILON);
        assert!((shaded.opacity - 0.5).abs() < EPSILON);
    }

    #[test]
    fn ground_is_opaque_and_only_foreshortened() {
        let mv = Mat4::from_translation(vec3(0., -8., -30.));
        let shaded = ground_point(&mv, Vec3::ZERO, 1.);
        assert_eq!(shaded.opacity, 1.);
        assert!((shaded.size - 10.).abs() < EPSILON);
    }

    #[test]
    fn firework_opacity_is_life() {
        let mv = Mat4::from_translation(vec3(0., 0., -50.));
        assert!((firework_point(&mv, Vec3::ZERO, 2., 0.25).opacity - 0.25).abs() < EPSILON);
        assert_eq!(firework_point(&mv, Vec3::ZERO, 2., -0.1).opacity, 0.);
    }

    #[test]
    fn every_program_has_both_entry_points() {
        for program in [Program::Tree, Program::Snow, Program::Ground, Program::Firework] {
            let source = program.wgsl();
            assert!(source.contains("fn vs_main"), "{}", program.label());
            assert!(source.contains("fn fs_main"), "{}", program.label());
        }
    }
}
