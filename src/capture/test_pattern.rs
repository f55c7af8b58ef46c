// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic frame source for the headless demo and the test suite
//!
//! Generates YUV 4:2:0 frames into an internal buffer pool that is reused
//! across frames, the same recycling discipline a real capture driver has.

use crate::capture::{FrameSource, PlaneView, RawFrame, Rotation};
use crate::errors::PipelineResult;

/// Pattern rendered by the source
#[derive(Debug, Clone, Copy)]
enum Pattern {
    /// Constant luma/chroma values everywhere
    Solid { y: u8, u: u8, v: u8 },
    /// Diagonal luma gradient that shifts every frame, neutral chroma
    MovingGradient,
}

/// Synthetic capture source producing YUV 4:2:0 frames
pub struct TestPatternSource {
    width: u32,
    height: u32,
    rotation: Rotation,
    pattern: Pattern,
    frame_index: u64,
    // Recycled plane buffers; overwritten on every delivery
    luma: Vec<u8>,
    chroma_u: Vec<u8>,
    chroma_v: Vec<u8>,
}

impl TestPatternSource {
    /// A source that emits the same solid-color frame forever
    pub fn solid(width: u32, height: u32, y: u8, u: u8, v: u8) -> Self {
        Self::with_pattern(width, height, Rotation::Deg0, Pattern::Solid { y, u, v })
    }

    /// A source that emits a diagonal gradient scrolling one pixel per frame
    pub fn moving_gradient(width: u32, height: u32, rotation: Rotation) -> Self {
        Self::with_pattern(width, height, rotation, Pattern::MovingGradient)
    }

    fn with_pattern(width: u32, height: u32, rotation: Rotation, pattern: Pattern) -> Self {
        let luma_len = width as usize * height as usize;
        let chroma_len = (width as usize / 2) * (height as usize / 2);
        Self {
            width,
            height,
            rotation,
            pattern,
            frame_index: 0,
            luma: vec![0; luma_len],
            chroma_u: vec![128; chroma_len],
            chroma_v: vec![128; chroma_len],
        }
    }

    /// Number of frames delivered so far
    pub fn frames_delivered(&self) -> u64 {
        self.frame_index
    }

    fn fill(&mut self) {
        match self.pattern {
            Pattern::Solid { y, u, v } => {
                self.luma.fill(y);
                self.chroma_u.fill(u);
                self.chroma_v.fill(v);
            }
            Pattern::MovingGradient => {
                let width = self.width as usize;
                let shift = self.frame_index as usize;
                for row in 0..self.height as usize {
                    for col in 0..width {
                        self.luma[row * width + col] = ((row + col + shift) & 0xff) as u8;
                    }
                }
                self.chroma_u.fill(128);
                self.chroma_v.fill(128);
            }
        }
    }
}

impl FrameSource for TestPatternSource {
    fn next_frame(&mut self, sink: &mut dyn FnMut(&RawFrame<'_>)) -> PipelineResult<()> {
        self.fill();
        self.frame_index += 1;

        let chroma_width = self.width as usize / 2;
        let frame = RawFrame {
            width: self.width,
            height: self.height,
            luma: PlaneView::packed(&self.luma, self.width as usize),
            chroma_u: PlaneView::packed(&self.chroma_u, chroma_width),
            chroma_v: PlaneView::packed(&self.chroma_v, chroma_width),
            rotation: self.rotation,
        };
        sink(&frame);
        Ok(())
    }
}
