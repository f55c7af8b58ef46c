// SPDX-License-Identifier: GPL-3.0-only

//! Capture driver seam
//!
//! The platform camera is an external collaborator: it delivers raw planar
//! frames one at a time and expects each to be released promptly so its
//! buffer pool can be recycled. [`FrameSource`] models that contract with a
//! borrowed [`RawFrame`] handed to a sink closure; the borrow ends when the
//! sink returns, which is the release.

pub mod frame_loop;
pub mod test_pattern;
pub mod types;

pub use frame_loop::{CaptureLoopController, LoopAction};
pub use test_pattern::TestPatternSource;
pub use types::{PackedFrame, PlaneView, RawFrame, Rotation};

use crate::errors::PipelineResult;

/// A source of raw camera frames with serialized, one-at-a-time delivery
///
/// Implementations must not call `sink` more than once per `next_frame` call
/// and must keep the plane buffers valid until `sink` returns. Delivery is
/// serialized by construction: the next frame is produced only after the
/// previous call has returned, which is the backpressure the capture driver
/// guarantees.
pub trait FrameSource {
    /// Produce the next frame and deliver it to `sink`
    fn next_frame(&mut self, sink: &mut dyn FnMut(&RawFrame<'_>)) -> PipelineResult<()>;
}
