//! Per-vehicle frame buffer

use async_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use contracts::RgbFrame;

/// Frames buffered per vehicle
pub const FRAME_BUFFER_CAPACITY: usize = 2;

/// Bounded frame queue between a camera callback and the main loop
///
/// Neither side ever blocks. When full, new frames are dropped and the queued
/// ones kept, so under load the buffer lags behind real time.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    tx: Sender<RgbFrame>,
    rx: Receiver<RgbFrame>,
}

impl FrameBuffer {
    /// Create buffer with [`FRAME_BUFFER_CAPACITY`]
    pub fn new() -> Self {
        Self::with_capacity(FRAME_BUFFER_CAPACITY)
    }

    /// Create buffer with a fixed capacity (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Enqueue without blocking
    ///
    /// # Returns
    /// `false` if the frame was dropped because the buffer is full
    pub fn try_push(&self, frame: RgbFrame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            // both ends live in `self`, so Closed cannot happen
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Dequeue the oldest frame without blocking
    pub fn try_pop(&self) -> Option<RgbFrame> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rx.is_full()
    }

    /// Fixed capacity
    pub fn capacity(&self) -> usize {
        // bounded channels always report Some
        self.rx.capacity().unwrap_or(FRAME_BUFFER_CAPACITY)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
