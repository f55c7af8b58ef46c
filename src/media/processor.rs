// SPDX-License-Identifier: GPL-3.0-only

//! In-place frame processing on packed RGBA buffers
//!
//! The processor applies at most one transform per frame: the edge-detection
//! kernel when the filter is enabled, nothing otherwise. The rotation hint is
//! recorded on the buffer and applied later by the GPU; rotating pixels here
//! would cost a full image transpose per frame for no benefit.

use crate::capture::{PackedFrame, Rotation};
use crate::errors::PipelineResult;
use tracing::trace;

/// An edge-detection kernel operating in place on packed RGBA pixels
///
/// The exact kernel is a pluggable strategy; the processor only requires that
/// the transform stays within the buffer and preserves its dimensions.
pub trait EdgeKernel: Send + Sync {
    /// Kernel name for logging
    fn name(&self) -> &'static str;

    /// Transform `rgba` (row-major, `stride` bytes per row) in place
    fn apply(&self, rgba: &mut [u8], width: usize, height: usize, stride: usize);
}

/// Sobel gradient-magnitude kernel
///
/// Computes the luminance gradient with the 3x3 Sobel operator and writes the
/// inverted magnitude back as grayscale: dark edges on a light field, the
/// look of the classic edge-overlay camera mode. Applying it twice detects
/// edges of edges, so it is deliberately not idempotent.
#[derive(Debug, Default)]
pub struct SobelEdges;

impl EdgeKernel for SobelEdges {
    fn name(&self) -> &'static str {
        "sobel"
    }

    fn apply(&self, rgba: &mut [u8], width: usize, height: usize, stride: usize) {
        // Grayscale snapshot first; the kernel must not read half-written output
        let mut gray = vec![0f32; width * height];
        for row in 0..height {
            for col in 0..width {
                let offset = row * stride + col * 4;
                let r = rgba[offset] as f32;
                let g = rgba[offset + 1] as f32;
                let b = rgba[offset + 2] as f32;
                gray[row * width + col] = (0.299 * r + 0.587 * g + 0.114 * b) / 255.0;
            }
        }

        let sample = |x: isize, y: isize| -> f32 {
            let x = x.clamp(0, width as isize - 1) as usize;
            let y = y.clamp(0, height as isize - 1) as usize;
            gray[y * width + x]
        };

        for py in 0..height {
            for px in 0..width {
                let x = px as isize;
                let y = py as isize;

                let tl = sample(x - 1, y - 1);
                let tm = sample(x, y - 1);
                let tr = sample(x + 1, y - 1);
                let ml = sample(x - 1, y);
                let mr = sample(x + 1, y);
                let bl = sample(x - 1, y + 1);
                let bm = sample(x, y + 1);
                let br = sample(x + 1, y + 1);

                let gx = -tl - 2.0 * ml - bl + tr + 2.0 * mr + br;
                let gy = -tl - 2.0 * tm - tr + bl + 2.0 * bm + br;
                let edge = (gx * gx + gy * gy).sqrt();

                // Invert: strong edges go dark on a light background
                let value = ((1.0 - edge).clamp(0.0, 1.0) * 255.0) as u8;

                let offset = py * stride + px * 4;
                rgba[offset] = value;
                rgba[offset + 1] = value;
                rgba[offset + 2] = value;
                rgba[offset + 3] = 255;
            }
        }
    }
}

/// Frame processor applying the optional edge filter in place
pub struct FrameProcessor {
    kernel: Box<dyn EdgeKernel>,
}

impl Default for FrameProcessor {
    fn default() -> Self {
        Self::new(Box::new(SobelEdges))
    }
}

impl FrameProcessor {
    /// Create a processor with the given edge kernel
    pub fn new(kernel: Box<dyn EdgeKernel>) -> Self {
        Self { kernel }
    }

    /// Process `frame` in place
    ///
    /// Records `rotation` on the buffer for the render stage and runs the
    /// edge kernel when `apply_filter` is set. With the filter off this is
    /// the identity on pixel data. Fails with
    /// [`crate::errors::PipelineError::InvalidBuffer`] when the byte length
    /// disagrees with the dimensions, leaving the buffer untouched.
    pub fn process(
        &self,
        frame: &mut PackedFrame,
        rotation: Rotation,
        apply_filter: bool,
    ) -> PipelineResult<()> {
        frame.validate()?;
        frame.rotation = rotation;

        if apply_filter {
            trace!(
                kernel = self.kernel.name(),
                width = frame.width,
                height = frame.height,
                "Applying edge filter"
            );
            let width = frame.width as usize;
            let height = frame.height as usize;
            let stride = frame.stride as usize;
            self.kernel.apply(&mut frame.data, width, height, stride);
        }
        Ok(())
    }
}
