use log::debug;
use wgpu::util::DeviceExt;

use forest_avenue::texture::{self, SnowflakeShape, SpriteBitmap, SPRITE_SIZE};

pub struct SpriteTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl SpriteTexture {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, bitmap: &SpriteBitmap) -> Self {
        let size = bitmap.size();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            },
            bitmap.as_bytes(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        debug!("Uploaded sprite {} ({}x{})", label, size, size);

        Self {
            _texture: texture,
            view,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Every sprite the scene draws with, uploaded once.
pub struct Sprites {
    pub spark: SpriteTexture,
    pub snowflakes: Vec<(SnowflakeShape, SpriteTexture)>,
}

impl Sprites {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let spark = SpriteTexture::new(device, queue, "Spark Sprite", &texture::spark(SPRITE_SIZE));
        let snowflakes = SnowflakeShape::ALL
            .iter()
            .map(|&shape| {
                let label = format!("{:?} Snowflake Sprite", shape);
                let bitmap = texture::snowflake(shape, SPRITE_SIZE);
                (shape, SpriteTexture::new(device, queue, &label, &bitmap))
            })
            .collect();
        Self { spark, snowflakes }
    }

    pub fn snowflake(&self, shape: SnowflakeShape) -> &SpriteTexture {
        self.snowflakes
            .iter()
            .find(|(s, _)| *s == shape)
            .map(|(_, texture)| texture)
            .unwrap_or(&self.spark)
    }
}
