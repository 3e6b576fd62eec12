use std::mem::size_of;

use anyhow::{Context, Result};
use bytemuck::{bytes_of, cast_slice};
use glam::{Vec3, Vec4};
use log::debug;
use wgpu::util::DeviceExt;

use forest_avenue::{
    field::{CloudKind, PointCloud},
    shading::Program,
    Scene,
};

use super::{
    make_render_pipeline, sprite::SpriteTexture, sprite_entries, storage_entry, uniform_entry,
    Uniforms, QUAD_INDICES, QUAD_VERTICES,
};
use crate::window::Size;

/// Draws one point cloud, instanced once per model offset.
pub struct PointRenderer {
    kind: CloudKind,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    spectrum_buffer: wgpu::Buffer,
    _point_buffer: wgpu::Buffer,
    _offset_buffer: wgpu::Buffer,
    point_count: u32,
    instance_count: u32,
    bins: u32,
    bind_group: wgpu::BindGroup,
    render_pipeline: wgpu::RenderPipeline,
}

impl PointRenderer {
    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene, viewport: Size) {
        let uniforms = Uniforms::new(scene, viewport, self.point_count, self.bins);
        queue.write_buffer(&self.uniform_buffer, 0, bytes_of(&uniforms));

        if self.kind == CloudKind::Tree {
            let amplitude = scene.forest().uniforms().amplitude();
            if !amplitude.is_empty() {
                queue.write_buffer(&self.spectrum_buffer, 0, cast_slice(amplitude));
            }
        }
    }

    pub fn draw<'rpass>(&'rpass self, rpass: &mut impl wgpu::util::RenderEncoder<'rpass>) {
        if self.instance_count == 0 {
            return;
        }
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..(QUAD_INDICES.len() as _), 0, 0..self.instance_count);
    }
}

pub struct PointRendererBuilder<'a> {
    cloud: &'a PointCloud,
    offsets: Vec<Vec3>,
    bins: usize,
    sprite: Option<&'a SpriteTexture>,
    sampler: Option<&'a wgpu::Sampler>,
    color_format: Option<wgpu::TextureFormat>,
}

impl<'a> PointRendererBuilder<'a> {
    pub fn new(cloud: &'a PointCloud) -> Self {
        Self {
            cloud,
            offsets: vec![Vec3::ZERO],
            bins: 0,
            sprite: None,
            sampler: None,
            color_format: None,
        }
    }

    /// Model translations, one instance of the whole cloud each.
    pub fn offsets(mut self, offsets: &[Vec3]) -> Self {
        self.offsets = offsets.to_vec();
        self
    }

    pub fn spectrum_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn sprite(mut self, sprite: &'a SpriteTexture, sampler: &'a wgpu::Sampler) -> Self {
        self.sprite = Some(sprite);
        self.sampler = Some(sampler);
        self
    }

    pub fn color_target_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.color_format = Some(format);
        self
    }

    pub fn build(self, device: &wgpu::Device) -> Result<PointRenderer> {
        let cloud = self.cloud;
        let color_format = self.color_format.context("No color format provided")?;
        let sprite = self.sprite.context("No sprite provided")?;
        let sampler = self.sampler.context("No sampler provided")?;
        let program = Program::for_cloud(cloud.kind());

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Vertex Buffer"),
            contents: bytes_of(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Index Buffer"),
            contents: bytes_of(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Storage bindings must not be empty, so empty clouds get one
        // zeroed point that is never drawn.
        let mut instances = cloud.instances();
        if instances.is_empty() {
            instances.push(Default::default());
        }
        let point_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Instance Buffer"),
            contents: cast_slice(instances.as_slice()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let offsets = self
            .offsets
            .iter()
            .map(|o| o.extend(0.))
            .chain(std::iter::once(Vec4::ZERO))
            .collect::<Vec<_>>();
        let offset_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Offset Buffer"),
            contents: cast_slice(offsets.as_slice()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let spectrum_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Spectrum Buffer"),
            size: (self.bins.max(1) * size_of::<f32>()) as _,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Uniform Buffer"),
            size: size_of::<Uniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let [texture_entry, sampler_entry] = sprite_entries();
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                texture_entry,
                sampler_entry,
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Point Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: point_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: offset_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: spectrum_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(sprite.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let render_pipeline =
            make_render_pipeline(device, &bind_group_layout, program, color_format);

        let point_count = cloud.len() as u32;
        let instance_count = point_count * self.offsets.len() as u32;
        debug!(
            "{}: {} points x {} offsets",
            program.label(),
            point_count,
            self.offsets.len()
        );

        Ok(PointRenderer {
            kind: cloud.kind(),
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            spectrum_buffer,
            _point_buffer: point_buffer,
            _offset_buffer: offset_buffer,
            point_count,
            instance_count,
            bins: self.bins as u32,
            bind_group,
            render_pipeline,
        })
    }
}
