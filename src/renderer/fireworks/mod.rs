use std::mem::size_of;

use bytemuck::{bytes_of, cast_slice, Pod, Zeroable};
use glam::Vec4;
use log::debug;
use wgpu::util::DeviceExt;

use forest_avenue::{shading::Program, Scene};

use super::{
    make_render_pipeline, sprite::SpriteTexture, sprite_entries, storage_entry, uniform_entry,
    Uniforms, QUAD_INDICES, QUAD_VERTICES,
};
use crate::window::Size;

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct FireworkInstance {
    position_size: Vec4,
    color_opacity: Vec4,
}

fn instances(scene: &Scene) -> Vec<FireworkInstance> {
    scene
        .fireworks()
        .bursts()
        .iter()
        .flat_map(|burst| {
            let opacity = burst.opacity();
            burst.particles().iter().map(move |p| FireworkInstance {
                position_size: p.position.extend(p.size),
                color_opacity: p.color.extend(opacity),
            })
        })
        .collect()
}

/// Re-packs every live burst into one instance buffer each frame.
pub struct FireworkRenderer {
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    instance_count: u32,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    render_pipeline: wgpu::RenderPipeline,
}

impl FireworkRenderer {
    const INITIAL_CAPACITY: usize = 1024;

    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        sprite: &SpriteTexture,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Firework Vertex Buffer"),
            contents: bytes_of(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Firework Index Buffer"),
            contents: bytes_of(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Firework Uniform Buffer"),
            size: size_of::<Uniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let [texture_entry, sampler_entry] = sprite_entries();
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Firework Bind Group Layout"),
            entries: &[uniform_entry(0), storage_entry(1), texture_entry, sampler_entry],
        });

        let capacity = Self::INITIAL_CAPACITY;
        let instance_buffer = Self::make_instance_buffer(device, capacity);
        let bind_group = Self::make_bind_group(
            device,
            &bind_group_layout,
            &uniform_buffer,
            &instance_buffer,
            sprite.view(),
            sampler,
        );

        let render_pipeline =
            make_render_pipeline(device, &bind_group_layout, Program::Firework, color_format);

        Self {
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            capacity,
            instance_count: 0,
            bind_group_layout,
            bind_group,
            render_pipeline,
        }
    }

    fn make_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Firework Instance Buffer"),
            size: (capacity * size_of::<FireworkInstance>()) as _,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn make_bind_group(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        instance_buffer: &wgpu::Buffer,
        sprite_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Firework Bind Group"),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: instance_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(sprite_view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// `sprite` and `sampler` must be the ones given to [`FireworkRenderer::new`];
    /// the bind group is rebuilt with them whenever the instance buffer grows.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        viewport: Size,
        sprite: &SpriteTexture,
        sampler: &wgpu::Sampler,
    ) {
        let instances = instances(scene);
        self.instance_count = instances.len() as u32;

        let uniforms = Uniforms::new(scene, viewport, self.instance_count, 0);
        queue.write_buffer(&self.uniform_buffer, 0, bytes_of(&uniforms));

        if instances.is_empty() {
            return;
        }

        if instances.len() > self.capacity {
            while self.capacity < instances.len() {
                self.capacity *= 2;
            }
            debug!("Growing firework instance buffer to {}", self.capacity);
            self.instance_buffer = Self::make_instance_buffer(device, self.capacity);
            self.bind_group = Self::make_bind_group(
                device,
                &self.bind_group_layout,
                &self.uniform_buffer,
                &self.instance_buffer,
                sprite.view(),
                sampler,
            );
        }

        queue.write_buffer(&self.instance_buffer, 0, cast_slice(instances.as_slice()));
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
