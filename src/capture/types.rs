// SPDX-License-Identifier: GPL-3.0-only

//! Shared frame types for the capture and processing pipeline

use crate::errors::{PipelineError, PipelineResult};

/// Sensor-to-display rotation hint in degrees (clockwise)
///
/// Supplied per-frame by the capture driver. The pipeline never rotates pixel
/// data on the CPU; the hint is carried with the frame and applied by the GPU
/// as a UV remap at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// No rotation
    #[default]
    Deg0,
    /// 90 degrees clockwise
    Deg90,
    /// 180 degrees
    Deg180,
    /// 270 degrees clockwise
    Deg270,
}

impl Rotation {
    /// Parse a rotation hint in degrees. Only the four quadrant values are valid.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Rotation in degrees
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Index used by the render shader to select the UV remap (0..=3)
    pub fn uniform_index(self) -> u32 {
        self.degrees() / 90
    }
}

/// A borrowed view of one image plane
///
/// `row_stride` is the distance in bytes between the starts of consecutive
/// rows; `pixel_stride` the distance between consecutive samples within a
/// row. Both may exceed the packed size when the driver pads its buffers.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    /// Plane bytes, valid only for the duration of the delivery call
    pub data: &'a [u8],
    /// Bytes between row starts
    pub row_stride: usize,
    /// Bytes between samples within a row
    pub pixel_stride: usize,
}

impl<'a> PlaneView<'a> {
    /// A tightly packed plane (pixel stride 1, row stride = width)
    pub fn packed(data: &'a [u8], width: usize) -> Self {
        Self {
            data,
            row_stride: width,
            pixel_stride: 1,
        }
    }

    /// Minimum byte length required to address a `rows` x `cols` grid
    pub fn required_len(&self, rows: usize, cols: usize) -> usize {
        if rows == 0 || cols == 0 {
            return 0;
        }
        (rows - 1) * self.row_stride + (cols - 1) * self.pixel_stride + 1
    }

    /// Sample at (row, col); caller guarantees bounds via `required_len`
    #[inline]
    pub fn sample(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.row_stride + col * self.pixel_stride]
    }
}

/// One captured sensor frame in planar luma/chroma (YUV 4:2:0) layout
///
/// Borrows the capture driver's plane buffers; the borrow ends when the
/// delivery call returns, at which point the driver is free to recycle them.
/// Nothing in the pipeline may retain a reference past that call.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Full-resolution luma plane
    pub luma: PlaneView<'a>,
    /// Half-resolution U chroma plane
    pub chroma_u: PlaneView<'a>,
    /// Half-resolution V chroma plane
    pub chroma_v: PlaneView<'a>,
    /// Sensor-to-display rotation at capture time
    pub rotation: Rotation,
}

/// A packed RGBA frame owned by the pipeline
///
/// One contiguous plane, row-major, 4 bytes per pixel in R,G,B,A order.
/// Ownership transfers to the render bridge when processing completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Bytes per row (currently always `width * 4`)
    pub stride: u32,
    /// Rotation to apply at draw time
    pub rotation: Rotation,
    /// Pixel bytes, `height * stride` long
    pub data: Vec<u8>,
}

impl PackedFrame {
    /// Expected byte length for the declared dimensions
    pub fn expected_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    /// Check byte length against declared dimensions
    pub fn validate(&self) -> PipelineResult<()> {
        if self.stride < self.width * 4 {
            return Err(PipelineError::InvalidBuffer(format!(
                "stride {} shorter than row of {} pixels",
                self.stride, self.width
            )));
        }
        if self.data.len() != self.expected_len() {
            return Err(PipelineError::InvalidBuffer(format!(
                "{} bytes for {}x{} (expected {})",
                self.data.len(),
                self.width,
                self.height,
                self.expected_len()
            )));
        }
        Ok(())
    }

    /// RGBA channel values at (x, y)
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = y as usize * self.stride as usize + x as usize * 4;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }
}
