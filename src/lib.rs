// SPDX-License-Identifier: GPL-3.0-only

//! EdgeView - a real-time camera frame pipeline with GPU preview
//!
//! Raw planar YUV 4:2:0 frames from a capture driver are converted to packed
//! RGBA, optionally run through an edge-detection filter, handed across a
//! single-slot bridge, and drawn by a wgpu render loop with the capture
//! rotation applied at draw time.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`capture`]: Frame source seam, frame types, and the capture loop
//! - [`media`]: Color conversion and frame processing
//! - [`render`]: GPU device plumbing, the frame bridge, and the viewfinder
//! - [`pipeline`]: Glue wiring capture through to the bridge
//! - [`config`]: User configuration handling

pub mod capture;
pub mod config;
pub mod errors;
pub mod media;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use capture::{FrameSource, PackedFrame, RawFrame, Rotation};
pub use config::Config;
pub use errors::{PipelineError, PipelineResult};
pub use pipeline::FramePipeline;
pub use render::{FrameBridge, Viewfinder};
