use std::f32::consts::TAU;

use anyhow::{Context, Result};
use css_color_parser::Color as CssColor;
use glam::{vec3, Vec3};
use rand::prelude::*;

pub fn norm(value: f32, min: f32, max: f32) -> f32 {
    (value - min) / (max - min)
}

pub fn lerp(norm: f32, min: f32, max: f32) -> f32 {
    (max - min) * norm + min
}

/// Linearly remaps `value` from `[s_min, s_max]` onto `[d_min, d_max]`.
/// Not clamped: values outside the source range extrapolate.
pub fn map(value: f32, s_min: f32, s_max: f32, d_min: f32, d_max: f32) -> f32 {
    lerp(norm(value, s_min, s_max), d_min, d_max)
}

/// Uniform sample in `[min, max)`. Unlike `gen_range` an empty range is fine
/// and yields `min`.
pub fn rand_range(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    min + rng.gen::<f32>() * (max - min)
}

/// `(r cos a, r sin a)`
pub fn polar(ang: f32, r: f32) -> (f32, f32) {
    (r * ang.cos(), r * ang.sin())
}

/// HSL to RGB with the hue wrapped into `[0, 1)`, so a hue of `1.0` is red
/// just like `0.0`.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
        if t < 0. {
            t += 1.;
        }
        if t > 1. {
            t -= 1.;
        }
        if t < 1. / 6. {
            p + (q - p) * 6. * t
        } else if t < 0.5 {
            q
        } else if t < 2. / 3. {
            p + (q - p) * 6. * (2. / 3. - t)
        } else {
            p
        }
    }

    let h = h.rem_euclid(1.);
    let s = s.clamp(0., 1.);
    let l = l.clamp(0., 1.);

    if s == 0. {
        return Vec3::splat(l);
    }

    let p = if l <= 0.5 { l * (1. + s) } else { l + s - l * s };
    let q = 2. * l - p;

    vec3(
        hue_to_rgb(q, p, h + 1. / 3.),
        hue_to_rgb(q, p, h),
        hue_to_rgb(q, p, h - 1. / 3.),
    )
}

/// Uniformly distributed unit vector.
pub fn random_direction(rng: &mut impl Rng) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let phi = rng.gen_range(-1.0f32..=1.0).acos();
    vec3(
        phi.sin() * theta.cos(),
        phi.sin() * theta.sin(),
        phi.cos(),
    )
}

fn u8_to_f32_color(uc: u8) -> f32 {
    f32::from(uc) / 255.
}

/// A fixed set of colours sampled uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette(Vec<Vec3>);

impl Palette {
    pub fn from_rgb8(colors: &[[u8; 3]]) -> Self {
        Self(
            colors
                .iter()
                .map(|[r, g, b]| {
                    vec3(u8_to_f32_color(*r), u8_to_f32_color(*g), u8_to_f32_color(*b))
                })
                .collect(),
        )
    }

    /// Parses CSS colour strings such as `"#FFD700"`.
    pub fn parse<S: AsRef<str>>(colors: &[S]) -> Result<Self> {
        if colors.is_empty() {
            anyhow::bail!("A palette needs at least one color");
        }
        colors
            .iter()
            .map(|css| {
                let css = css.as_ref();
                let c = css
                    .parse::<CssColor>()
                    .map_err(|e| anyhow::anyhow!("{:?}", e))
                    .with_context(|| format!("Invalid palette color `{}`", css))?;
                Ok(vec3(
                    u8_to_f32_color(c.r),
                    u8_to_f32_color(c.g),
                    u8_to_f32_color(c.b),
                ))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.0
    }

    pub fn choose(&self, rng: &mut impl Rng) -> Vec3 {
        self.0.choose(rng).copied().unwrap_or(Vec3::ONE)
    }
}
