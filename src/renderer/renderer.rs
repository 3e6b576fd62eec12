use anyhow::{Context, Result};
use log::{info, warn};

use forest_avenue::{field::CloudKind, Scene};

use crate::{
    renderer::{
        fireworks::FireworkRenderer,
        points::{PointRenderer, PointRendererBuilder},
        samplers::Samplers,
        sprite::Sprites,
    },
    window::{HasSize, Size},
};

pub struct Renderer {
    surface: wgpu::Surface,
    surface_format: wgpu::TextureFormat,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: Size,
    background: wgpu::Color,
    sprites: Sprites,
    samplers: Samplers,
    point_renderers: Vec<PointRenderer>,
    firework_renderer: FireworkRenderer,
}

impl Renderer {
    pub async fn new(window: &winit::window::Window, scene: &Scene) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
        let surface = unsafe { instance.create_surface(window) };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No adapter found")?;
        info!("Using adapter {:?}", adapter.get_info());

        let surface_format = surface
            .get_preferred_format(&adapter)
            .context("No preferred format found")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .context("No device found")?;

        let size = window.size();
        Self::configure_surface(&surface, &device, surface_format, size);

        let background = {
            let c = scene.config().camera.background;
            wgpu::Color {
                r: c.x as f64,
                g: c.y as f64,
                b: c.z as f64,
                a: 1.0,
            }
        };

        let sprites = Sprites::new(&device, &queue);
        let samplers = Samplers::new(&device);

        let forest = scene.forest();
        let mut point_renderers = Vec::new();

        point_renderers.push(
            PointRendererBuilder::new(forest.ground())
                .offsets(&[forest.ground_offset()])
                .sprite(&sprites.spark, &samplers.bilinear)
                .color_target_format(surface_format)
                .build(&device)?,
        );
        point_renderers.push(
            PointRendererBuilder::new(forest.tree())
                .offsets(forest.tree_offsets())
                .spectrum_bins(forest.uniforms().amplitude().len())
                .sprite(&sprites.spark, &samplers.bilinear)
                .color_target_format(surface_format)
                .build(&device)?,
        );
        for batch in forest.snow() {
            let sprite = match batch.kind() {
                CloudKind::Snow(shape) => sprites.snowflake(shape),
                _ => &sprites.spark,
            };
            point_renderers.push(
                PointRendererBuilder::new(batch)
                    .sprite(sprite, &samplers.bilinear)
                    .color_target_format(surface_format)
                    .build(&device)?,
            );
        }

        let firework_renderer =
            FireworkRenderer::new(&device, surface_format, &sprites.spark, &samplers.bilinear);

        Ok(Self {
            surface,
            surface_format,
            device,
            queue,
            size,
            background,
            sprites,
            samplers,
            point_renderers,
            firework_renderer,
        })
    }

    fn configure_surface(
        surface: &wgpu::Surface,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: Size,
    ) {
        surface.configure(
            device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: size.width.max(1),
                height: size.height.max(1),
                present_mode: wgpu::PresentMode::Fifo,
            },
        )
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
        Self::configure_surface(&self.surface, &self.device, self.surface_format, size);
    }

    pub fn render(&mut self, scene: &Scene) -> Result<()> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                self.resize(self.size);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to get next surface texture"),
        };

        for renderer in &self.point_renderers {
            renderer.update(&self.queue, scene, self.size);
        }
        self.firework_renderer.update(
            &self.device,
            &self.queue,
            scene,
            self.size,
            &self.sprites.spark,
            &self.samplers.bilinear,
        );

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Command Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Render Pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: true,
                    },
                }],
                depth_stencil_attachment: None,
            });
            for renderer in &self.point_renderers {
                renderer.draw(&mut rpass);
            }
            self.firework_renderer.draw(&mut rpass);
        }

        self.queue.submit(Some(encoder.finish()));
        surface_texture.present();

        Ok(())
    }
}
