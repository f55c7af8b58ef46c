// SPDX-License-Identifier: GPL-3.0-only

//! Render context: GPU device plumbing, the frame bridge, and the
//! viewfinder pipeline

pub mod bridge;
pub mod gpu;
pub mod pipeline;
pub mod viewfinder;

pub use bridge::FrameBridge;
pub use gpu::{CachedDimensions, GpuDeviceInfo, create_render_device};
pub use pipeline::ViewPipeline;
pub use viewfinder::{RenderPhase, Viewfinder};
