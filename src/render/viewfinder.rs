// SPDX-License-Identifier: GPL-3.0-only

//! On-demand render loop for the display surface
//!
//! The loop is an explicit state machine rather than a free-running redraw:
//! a tick only renders after a publish or a surface event raised the redraw
//! signal, so no GPU work happens while the feed is idle. The render target
//! is an offscreen color attachment; a windowing host presents it, the
//! snapshot path reads it back.

use crate::errors::{PipelineError, PipelineResult};
use crate::render::bridge::FrameBridge;
use crate::render::gpu::{self, read_buffer_async};
use crate::render::pipeline::ViewPipeline;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Render-loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// No pending redraw
    Idle,
    /// A publish or surface event signaled a redraw
    RedrawRequested,
    /// Actively uploading and drawing (transient within a tick)
    Rendering,
}

/// Offscreen color target standing in for the platform surface
struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("edgeview surface target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }
}

/// GPU-side render loop drawing the latest published frame
pub struct Viewfinder {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: ViewPipeline,
    bridge: Arc<FrameBridge>,
    target: RenderTarget,
    phase: RenderPhase,
    paused: bool,
    last_error: Option<PipelineError>,
}

impl Viewfinder {
    /// Create the render context and an offscreen surface of the given size
    ///
    /// Fails with [`PipelineError::GpuResourceFailure`] when no adapter or
    /// device is available; the capture side of the pipeline is unaffected.
    pub async fn new(bridge: Arc<FrameBridge>, width: u32, height: u32) -> PipelineResult<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::GpuResourceFailure(format!(
                "surface size {}x{} is empty",
                width, height
            )));
        }

        let (device, queue, info) = gpu::create_render_device("edgeview viewfinder").await?;
        info!(
            adapter = %info.adapter_name,
            width,
            height,
            "Viewfinder render context ready"
        );

        let pipeline = ViewPipeline::new(&device, wgpu::TextureFormat::Rgba8Unorm);
        let target = RenderTarget::new(&device, width, height);

        Ok(Self {
            device,
            queue,
            pipeline,
            bridge,
            target,
            phase: RenderPhase::Idle,
            paused: false,
            last_error: None,
        })
    }

    /// Current state of the render loop
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Surface dimensions
    pub fn surface_size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    /// The bridge this viewfinder consumes from
    pub fn bridge(&self) -> &Arc<FrameBridge> {
        &self.bridge
    }

    /// Reallocate the render target for a new surface size and request a redraw
    pub fn resize(&mut self, width: u32, height: u32) -> PipelineResult<()> {
        if width == 0 || height == 0 {
            return Err(PipelineError::GpuResourceFailure(format!(
                "surface size {}x{} is empty",
                width, height
            )));
        }
        debug!(width, height, "Surface resized");
        self.target = RenderTarget::new(&self.device, width, height);
        self.phase = RenderPhase::RedrawRequested;
        Ok(())
    }

    /// Stop issuing GPU calls until [`resume`](Self::resume)
    pub fn pause(&mut self) {
        debug!("Viewfinder paused");
        self.paused = true;
    }

    /// Re-enable rendering and redraw whatever is current
    pub fn resume(&mut self) {
        debug!("Viewfinder resumed");
        self.paused = false;
        self.phase = RenderPhase::RedrawRequested;
    }

    /// Whether the loop is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// One draw tick; returns true when something was rendered
    ///
    /// Consumes the redraw signal, takes the latest pending frame if any,
    /// uploads it, and draws the quad. With no pending frame the previous
    /// texture is drawn unchanged. Upload failures are recorded as a one-shot
    /// error and leave the last good frame on screen.
    pub fn tick(&mut self) -> bool {
        if self.paused {
            return false;
        }

        if self.bridge.take_redraw_signal() {
            self.phase = RenderPhase::RedrawRequested;
        }
        if self.phase != RenderPhase::RedrawRequested {
            return false;
        }
        self.phase = RenderPhase::Rendering;

        if let Some(frame) = self.bridge.take_latest() {
            if let Err(e) = self.pipeline.upload(&self.device, &self.queue, &frame) {
                warn!(error = %e, "Frame upload failed; keeping previous texture");
                self.last_error = Some(e);
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("edgeview draw tick"),
            });
        self.pipeline.draw(&mut encoder, &self.target.view);
        self.queue.submit(Some(encoder.finish()));

        self.phase = RenderPhase::Idle;
        true
    }

    /// Take the most recent render-context error, if one occurred
    ///
    /// One-shot notification for the host application; returns `None` until
    /// the next failure after a take.
    pub fn take_error(&mut self) -> Option<PipelineError> {
        self.last_error.take()
    }

    /// Read the rendered surface back as tightly packed RGBA rows
    pub async fn read_pixels(&self) -> PipelineResult<Vec<u8>> {
        let width = self.target.width;
        let height = self.target.height;
        let padded_row = gpu::padded_bytes_per_row(width);
        let buffer_size = padded_row as u64 * height as u64;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("edgeview readback buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("edgeview readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let padded = read_buffer_async(&self.device, &staging).await?;

        // Strip the copy alignment padding
        let row_bytes = width as usize * 4;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * padded_row as usize;
            pixels.extend_from_slice(&padded[start..start + row_bytes]);
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{PackedFrame, Rotation};

    fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> PackedFrame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgba);
        }
        PackedFrame {
            width,
            height,
            stride: width * 4,
            rotation: Rotation::Deg0,
            data,
        }
    }

    async fn viewfinder_or_skip(width: u32, height: u32) -> Option<Viewfinder> {
        let bridge = Arc::new(FrameBridge::new());
        match Viewfinder::new(bridge, width, height).await {
            Ok(vf) => Some(vf),
            Err(e) => {
                // Skip if no GPU available
                println!("Skipping test (no GPU): {}", e);
                None
            }
        }
    }

    #[tokio::test]
    async fn test_tick_without_publish_is_idle() {
        let Some(mut vf) = viewfinder_or_skip(8, 8).await else {
            return;
        };
        assert_eq!(vf.phase(), RenderPhase::Idle);
        assert!(!vf.tick(), "nothing published, nothing to render");
    }

    #[tokio::test]
    async fn test_publish_then_tick_renders() {
        let Some(mut vf) = viewfinder_or_skip(4, 4).await else {
            return;
        };

        vf.bridge().publish(solid_frame(4, 4, [0, 255, 0, 255]));
        assert!(vf.tick());
        assert_eq!(vf.phase(), RenderPhase::Idle);
        assert!(!vf.tick(), "redraw signal consumed by previous tick");

        let pixels = vf.read_pixels().await.unwrap();
        assert_eq!(pixels.len(), 4 * 4 * 4);
        for chunk in pixels.chunks_exact(4) {
            assert!(chunk[1] > 200, "green channel: {:?}", chunk);
        }
    }

    #[tokio::test]
    async fn test_superseded_frame_never_rendered() {
        let Some(mut vf) = viewfinder_or_skip(4, 4).await else {
            return;
        };

        // B1 then B2 before any tick: B1 must never reach the surface
        vf.bridge().publish(solid_frame(4, 4, [255, 0, 0, 255]));
        vf.bridge().publish(solid_frame(4, 4, [0, 255, 0, 255]));
        assert!(vf.tick());

        let pixels = vf.read_pixels().await.unwrap();
        for chunk in pixels.chunks_exact(4) {
            assert!(chunk[0] < 50, "red leaked through: {:?}", chunk);
            assert!(chunk[1] > 200, "expected green: {:?}", chunk);
        }
    }

    #[tokio::test]
    async fn test_pause_suppresses_rendering() {
        let Some(mut vf) = viewfinder_or_skip(4, 4).await else {
            return;
        };

        vf.pause();
        vf.bridge().publish(solid_frame(4, 4, [255, 255, 255, 255]));
        assert!(!vf.tick(), "paused loop must not issue GPU calls");

        vf.resume();
        assert!(vf.tick(), "resume triggers a redraw");
    }

    #[tokio::test]
    async fn test_resize_redraws_previous_texture() {
        let Some(mut vf) = viewfinder_or_skip(4, 4).await else {
            return;
        };

        vf.bridge().publish(solid_frame(4, 4, [0, 0, 255, 255]));
        assert!(vf.tick());

        vf.resize(8, 8).unwrap();
        assert_eq!(vf.surface_size(), (8, 8));
        assert!(vf.tick(), "resize requests a redraw with the old frame");

        let pixels = vf.read_pixels().await.unwrap();
        assert_eq!(pixels.len(), 8 * 8 * 4);
    }

    #[tokio::test]
    async fn test_oversized_frame_reports_one_shot_error() {
        let Some(mut vf) = viewfinder_or_skip(4, 4).await else {
            return;
        };

        // 16384 wide exceeds the default max_texture_dimension_2d of 8192;
        // the buffer itself is consistent, so only the limit check can refuse
        let wide = solid_frame(16384, 2, [1, 2, 3, 255]);

        vf.bridge().publish(wide);
        vf.tick();

        let err = vf.take_error();
        assert!(err.is_some(), "upload failure must surface once");
        assert!(vf.take_error().is_none(), "notification is one-shot");
    }
}
