// SPDX-License-Identifier: GPL-3.0-only

//! wgpu render pipeline for the viewfinder quad
//!
//! Owns the frame texture, the sampler, and the rotation uniform. The texture
//! is reallocated lazily when an incoming frame's dimensions differ from the
//! previous one; uploads otherwise reuse it.

use crate::capture::PackedFrame;
use crate::errors::{PipelineError, PipelineResult};
use crate::render::gpu::CachedDimensions;
use tracing::debug;

/// Rotation uniform handed to the shader
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ViewParams {
    rotation_index: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

/// GPU state for the current frame texture
struct FrameTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Render pipeline drawing the latest frame as a full-surface quad
pub struct ViewPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    entry: Option<FrameTexture>,
    dims: CachedDimensions,
    max_dimension: u32,
}

impl ViewPipeline {
    /// Compile the shader and set up the pipeline for `target_format`
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("edgeview quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("view_shader.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("edgeview bind group layout"),
            entries: &[
                // Frame texture
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Rotation uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("edgeview pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("edgeview quad pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("edgeview frame sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("edgeview view params"),
            size: std::mem::size_of::<ViewParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let max_dimension = device.limits().max_texture_dimension_2d;

        Self {
            pipeline,
            bind_group_layout,
            sampler,
            uniform_buffer,
            entry: None,
            dims: CachedDimensions::default(),
            max_dimension,
        }
    }

    /// True once at least one frame has been uploaded
    pub fn has_frame(&self) -> bool {
        self.entry.is_some()
    }

    /// Upload `frame` to the GPU, reallocating the texture when its
    /// dimensions changed, and update the rotation uniform
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &PackedFrame,
    ) -> PipelineResult<()> {
        frame.validate()?;

        if frame.width > self.max_dimension || frame.height > self.max_dimension {
            return Err(PipelineError::GpuResourceFailure(format!(
                "frame {}x{} exceeds device texture limit {}",
                frame.width, frame.height, self.max_dimension
            )));
        }

        if self.entry.is_none() || self.dims.needs_update(frame.width, frame.height) {
            debug!(
                width = frame.width,
                height = frame.height,
                "Allocating frame texture"
            );
            self.entry = Some(self.create_frame_texture(device, frame.width, frame.height));
            self.dims.update(frame.width, frame.height);
        }

        let entry = self.entry.as_ref().expect("frame texture just ensured");

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.stride),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );

        let params = ViewParams {
            rotation_index: frame.rotation.uniform_index(),
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&params));

        Ok(())
    }

    fn create_frame_texture(
        &self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> FrameTexture {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("edgeview frame texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("edgeview frame bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        FrameTexture {
            texture,
            bind_group,
        }
    }

    /// Draw the quad with the current frame texture into `target`
    ///
    /// Clears to black and returns without drawing when no frame has been
    /// uploaded yet.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("edgeview render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(entry) = &self.entry {
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &entry.bind_group, &[]);
            render_pass.draw(0..6, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_view_shader_is_valid_wgsl() {
        let source = include_str!("view_shader.wgsl");
        let module = naga::front::wgsl::parse_str(source).expect("shader parses");

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .expect("shader validates");
    }
}
