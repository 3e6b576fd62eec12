//! Procedural point-sprite bitmaps.
//!
//! Sprites are drawn in a 32×32 design space and scaled to the requested
//! size. Shapes are supersampled 4×4 per pixel for soft edges.

use std::f32::consts::PI;

use glam::{vec2, Vec2, Vec4};

pub const SPRITE_SIZE: u32 = 32;

const SUPERSAMPLES: u32 = 4;

/// Square RGBA8 bitmap, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteBitmap {
    size: u32,
    pixels: Vec<[u8; 4]>,
}

impl SpriteBitmap {
    /// Fully transparent 1×1 sprite, the fallback whenever nothing can be drawn.
    pub fn blank() -> Self {
        Self {
            size: 1,
            pixels: vec![[0; 4]],
        }
    }

    fn rasterize(size: u32, shade: impl Fn(Vec2) -> Vec4) -> Self {
        if size == 0 {
            return Self::blank();
        }
        let scale = SPRITE_SIZE as f32 / size as f32;
        let pixels = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                let design = vec2(x as f32 + 0.5, y as f32 + 0.5) * scale;
                let c = shade(design).clamp(Vec4::ZERO, Vec4::ONE) * 255.;
                [
                    c.x.round() as u8,
                    c.y.round() as u8,
                    c.z.round() as u8,
                    c.w.round() as u8,
                ]
            })
            .collect();
        Self { size, pixels }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.size + x) as usize]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SnowflakeShape {
    Circle,
    Star,
    Diamond,
}

impl SnowflakeShape {
    pub const ALL: [SnowflakeShape; 3] = [Self::Circle, Self::Star, Self::Diamond];

    /// 0 is a circle, 1 a star, anything else a diamond.
    pub fn from_selector(selector: u32) -> Self {
        match selector {
            0 => Self::Circle,
            1 => Self::Star,
            _ => Self::Diamond,
        }
    }

    fn outline(self) -> Vec<Vec2> {
        match self {
            Self::Circle => (0..64)
                .map(|i| {
                    let a = i as f32 / 64. * 2. * PI;
                    vec2(a.cos(), a.sin()) * 8.
                })
                .collect(),
            Self::Star => (0..5)
                .flat_map(|i| {
                    let outer = (18. + i as f32 * 72.).to_radians();
                    let inner = (54. + i as f32 * 72.).to_radians();
                    [
                        vec2(outer.cos(), -outer.sin()) * 10.,
                        vec2(inner.cos(), -inner.sin()) * 4.,
                    ]
                })
                .collect(),
            Self::Diamond => vec![
                vec2(0., -10.),
                vec2(8., 0.),
                vec2(0., 10.),
                vec2(-8., 0.),
            ],
        }
    }
}

/// Soft radial glow used by trees, ground and fireworks. Premultiplied alpha.
pub fn spark(size: u32) -> SpriteBitmap {
    // (offset, rgba)
    const STOPS: [(f32, Vec4); 4] = [
        (0., glam::const_vec4!([1., 1., 1., 1.])),
        (0.2, glam::const_vec4!([1., 1., 1., 0.8])),
        (0.5, glam::const_vec4!([1., 1., 1., 0.2])),
        (1., glam::const_vec4!([0., 0., 0., 0.])),
    ];

    let center = Vec2::splat(SPRITE_SIZE as f32 / 2.);
    let radius = SPRITE_SIZE as f32 / 2.;

    SpriteBitmap::rasterize(size, |p| {
        let t = (p.distance(center) / radius).min(1.);
        let color = STOPS
            .windows(2)
            .find(|w| t <= w[1].0)
            .map(|w| {
                let (t0, c0) = w[0];
                let (t1, c1) = w[1];
                c0.lerp(c1, (t - t0) / (t1 - t0))
            })
            .unwrap_or(STOPS[3].1);
        (color.truncate() * color.w).extend(color.w)
    })
}

/// White snowflake silhouette on a transparent background.
pub fn snowflake(shape: SnowflakeShape, size: u32) -> SpriteBitmap {
    let outline = shape.outline();
    let center = Vec2::splat(SPRITE_SIZE as f32 / 2.);
    let scale = SPRITE_SIZE as f32 / size.max(1) as f32;
    let step = scale / SUPERSAMPLES as f32;

    SpriteBitmap::rasterize(size, |p| {
        let origin = p - center - Vec2::splat(scale / 2. - step / 2.);
        let hits = (0..SUPERSAMPLES * SUPERSAMPLES)
            .filter(|i| {
                let offset = vec2((i % SUPERSAMPLES) as f32, (i / SUPERSAMPLES) as f32) * step;
                contains(&outline, origin + offset)
            })
            .count();
        let coverage = hits as f32 / (SUPERSAMPLES * SUPERSAMPLES) as f32;
        Vec4::new(1., 1., 1., coverage)
    })
}

/// Even-odd point-in-polygon test.
fn contains(polygon: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
