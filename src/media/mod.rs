// SPDX-License-Identifier: GPL-3.0-only

//! Color conversion and frame processing

pub mod convert;
pub mod processor;

pub use convert::convert;
pub use processor::{EdgeKernel, FrameProcessor, SobelEdges};
