// SPDX-License-Identifier: GPL-3.0-only

//! Single-slot hand-off between the capture/processing context and the
//! render context
//!
//! Not a queue: a newly published frame replaces whatever is pending, so the
//! render side always sees the most recent frame and nothing ever backlogs.
//! Discarding a superseded frame is correct behavior, not loss.

use crate::capture::PackedFrame;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

/// Pending-buffer slot shared by the two pipeline contexts
///
/// The slot lock is held only for the swap itself; `publish` never waits on
/// the render context's GPU work, and the render context never observes a
/// partially written frame.
#[derive(Debug, Default)]
pub struct FrameBridge {
    slot: Mutex<Option<PackedFrame>>,
    redraw: AtomicBool,
    discarded: AtomicU64,
}

impl FrameBridge {
    /// Create an empty bridge
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending slot with `frame` and raise the redraw signal
    ///
    /// Any frame the render loop had not yet consumed is dropped here.
    pub fn publish(&self, frame: PackedFrame) {
        let displaced = {
            let mut slot = self.slot.lock().expect("frame slot poisoned");
            slot.replace(frame)
        };

        if displaced.is_some() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            trace!("Superseded pending frame discarded");
        }
        self.redraw.store(true, Ordering::Release);
    }

    /// Remove and return the pending frame, if any
    ///
    /// Called only from the render context. Returns `None` when no new frame
    /// arrived since the last take, in which case the render loop redraws
    /// the previous texture unchanged.
    pub fn take_latest(&self) -> Option<PackedFrame> {
        self.slot.lock().expect("frame slot poisoned").take()
    }

    /// Consume the redraw signal; true when a publish or surface event
    /// happened since the last call
    pub fn take_redraw_signal(&self) -> bool {
        self.redraw.swap(false, Ordering::AcqRel)
    }

    /// Raise the redraw signal without publishing (surface events)
    pub fn request_redraw(&self) {
        self.redraw.store(true, Ordering::Release);
    }

    /// Number of frames discarded because a newer one replaced them
    pub fn discarded_count(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Rotation;

    fn frame(tag: u8) -> PackedFrame {
        PackedFrame {
            width: 2,
            height: 2,
            stride: 8,
            rotation: Rotation::Deg0,
            data: vec![tag; 16],
        }
    }

    #[test]
    fn test_latest_wins() {
        let bridge = FrameBridge::new();
        bridge.publish(frame(1));
        bridge.publish(frame(2));

        let taken = bridge.take_latest().unwrap();
        assert_eq!(taken.data[0], 2, "only the second publish survives");
        assert!(bridge.take_latest().is_none());
        assert_eq!(bridge.discarded_count(), 1);
    }

    #[test]
    fn test_take_twice_returns_once() {
        let bridge = FrameBridge::new();
        bridge.publish(frame(7));

        assert!(bridge.take_latest().is_some());
        assert!(bridge.take_latest().is_none());
    }

    #[test]
    fn test_redraw_signal_is_one_shot() {
        let bridge = FrameBridge::new();
        assert!(!bridge.take_redraw_signal());

        bridge.publish(frame(1));
        assert!(bridge.take_redraw_signal());
        assert!(!bridge.take_redraw_signal());

        bridge.request_redraw();
        assert!(bridge.take_redraw_signal());
    }

    #[test]
    fn test_publish_from_capture_thread() {
        use std::sync::Arc;

        let bridge = Arc::new(FrameBridge::new());
        let publisher = Arc::clone(&bridge);
        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                publisher.publish(frame(i));
            }
        });
        handle.join().unwrap();

        let taken = bridge.take_latest().unwrap();
        assert_eq!(taken.data[0], 99);
        assert_eq!(bridge.discarded_count(), 99);
    }
}
