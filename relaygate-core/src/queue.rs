//! Inbound Frame Queue Between Radio Callback and Control Loop
//!
//! ## Overview
//!
//! The radio delivers frames through a receive callback that can fire between
//! any two instructions of the main loop. If the callback decoded straight into
//! the sensor store, the loop could read a sample that is half old and half
//! new. Instead the callback only copies the raw bytes into a bounded
//! single-producer single-consumer queue, and the loop drains it once per tick:
//!
//! ```text
//! Receive callback                      Main loop (tick)
//!      ↓                                     ↓
//!  FrameProducer ────→ [ ring ] ────→ FrameConsumer → decode → store
//!      ↓                                     ↓
//!  never blocks                        sole store writer
//! ```
//!
//! ## Why `heapless::spsc`?
//!
//! There is exactly one producer (the receive callback) and one consumer (the
//! loop), which is the case `heapless::spsc::Queue` is built for: lock-free,
//! `const`-constructible so it can live in a `static`, and no `unsafe` in this
//! crate. Splitting the queue hands each side its own handle, so the type
//! system enforces the single-producer rule.
//!
//! ## Overflow
//!
//! A full queue or an oversize frame drops the new frame. Nothing blocks and
//! nothing is retried; the counters in [`QueueStats`] record what was lost.
//! The queue only fills when the loop stalls, e.g. during a blocking actuator
//! ramp.
//!
//! ## Example Usage
//!
//! ```rust
//! use relaygate_core::constants::FRAME_QUEUE_CAPACITY;
//! use relaygate_core::queue::FrameQueue;
//! use relaygate_core::link::PeerAddress;
//!
//! let mut queue: FrameQueue<FRAME_QUEUE_CAPACITY> = FrameQueue::new();
//! let (mut producer, mut consumer) = queue.split();
//!
//! // Receive callback
//! producer.on_receive(PeerAddress::default(), &[1, 2, 3, 4, 5, 6]).ok();
//!
//! // Main loop
//! for frame in consumer.drain() {
//!     assert_eq!(frame.payload.len(), 6);
//! }
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

use crate::constants::link::MAX_FRAME_LEN;
use crate::errors::{GatewayError, GatewayResult};
use crate::link::PeerAddress;

/// Raw frame bytes
pub type FramePayload = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Frame as delivered by the radio
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    /// Sender address
    pub source: PeerAddress,
    /// Payload exactly as received
    pub payload: FramePayload,
}

/// Queue statistics
///
/// Relaxed atomics; readable from either side.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Frames accepted
    pub pushed: AtomicU32,
    /// Frames handed to the loop
    pub popped: AtomicU32,
    /// Frames dropped because the queue was full
    pub dropped: AtomicU32,
    /// Frames dropped for exceeding `MAX_FRAME_LEN`
    pub oversize: AtomicU32,
    /// Maximum queue depth seen
    pub max_depth: AtomicU32,
}

impl QueueStats {
    const fn new() -> Self {
        Self {
            pushed: AtomicU32::new(0),
            popped: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            oversize: AtomicU32::new(0),
            max_depth: AtomicU32::new(0),
        }
    }

    /// Frames currently queued
    pub fn depth(&self) -> u32 {
        self.pushed
            .load(Ordering::Relaxed)
            .saturating_sub(self.popped.load(Ordering::Relaxed))
    }

    /// Update max depth if current is higher
    fn update_max_depth(&self, current: u32) {
        let mut max = self.max_depth.load(Ordering::Relaxed);
        while current > max {
            match self.max_depth.compare_exchange_weak(
                max,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => max = actual,
            }
        }
    }
}

/// Bounded frame queue; holds `N - 1` frames
pub struct FrameQueue<const N: usize> {
    queue: Queue<InboundFrame, N>,
    stats: QueueStats,
}

impl<const N: usize> FrameQueue<N> {
    /// Empty queue; usable in a `static`
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
            stats: QueueStats::new(),
        }
    }

    /// Split into the callback-side producer and the loop-side consumer
    pub fn split(&mut self) -> (FrameProducer<'_, N>, FrameConsumer<'_, N>) {
        let stats = &self.stats;
        let (producer, consumer) = self.queue.split();
        (
            FrameProducer { inner: producer, stats },
            FrameConsumer { inner: consumer, stats },
        )
    }
}

impl<const N: usize> Default for FrameQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive-callback side of the queue
pub struct FrameProducer<'a, const N: usize> {
    inner: Producer<'a, InboundFrame, N>,
    stats: &'a QueueStats,
}

impl<'a, const N: usize> FrameProducer<'a, N> {
    /// Copy a received frame into the queue
    ///
    /// Safe to call from the receive callback; never blocks. Full queue and
    /// oversize frames are dropped and counted.
    pub fn on_receive(&mut self, source: PeerAddress, bytes: &[u8]) -> GatewayResult<()> {
        let payload = match FramePayload::from_slice(bytes) {
            Ok(payload) => payload,
            Err(()) => {
                self.stats.oversize.fetch_add(1, Ordering::Relaxed);
                return Err(GatewayError::FrameTooLarge { len: bytes.len(), max: MAX_FRAME_LEN });
            }
        };

        if self.inner.enqueue(InboundFrame { source, payload }).is_err() {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(GatewayError::QueueFull);
        }

        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        self.stats.update_max_depth(self.stats.depth());
        Ok(())
    }

    /// Queue statistics
    pub fn stats(&self) -> &QueueStats {
        self.stats
    }
}

/// Control-loop side of the queue
pub struct FrameConsumer<'a, const N: usize> {
    inner: Consumer<'a, InboundFrame, N>,
    stats: &'a QueueStats,
}

impl<'a, const N: usize> FrameConsumer<'a, N> {
    /// Take the oldest frame
    pub fn pop(&mut self) -> Option<InboundFrame> {
        let frame = self.inner.dequeue()?;
        self.stats.popped.fetch_add(1, Ordering::Relaxed);
        Some(frame)
    }

    /// Drain all frames queued right now
    pub fn drain(&mut self) -> FrameDrain<'_, 'a, N> {
        FrameDrain { consumer: self }
    }

    /// Queue statistics
    pub fn stats(&self) -> &QueueStats {
        self.stats
    }
}

/// Iterator returned by [`FrameConsumer::drain`]
pub struct FrameDrain<'c, 'a, const N: usize> {
    consumer: &'c mut FrameConsumer<'a, N>,
}

impl<'c, 'a, const N: usize> Iterator for FrameDrain<'c, 'a, N> {
    type Item = InboundFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.consumer.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FRAME_QUEUE_CAPACITY;

    const NODE: PeerAddress = PeerAddress::new([1, 2, 3, 4, 5, 6]);

    #[test]
    fn queue_basic() {
        let mut queue = FrameQueue::<4>::new();
        let (mut producer, mut consumer) = queue.split();

        producer.on_receive(NODE, &[9, 8, 7]).unwrap();
        let frame = consumer.pop().unwrap();
        assert_eq!(frame.source, NODE);
        assert_eq!(frame.payload.as_slice(), &[9, 8, 7]);
        assert!(consumer.pop().is_none());
    }

    #[test]
    fn queue_full_drops_newest() {
        let mut queue = FrameQueue::<4>::new();
        let (mut producer, mut consumer) = queue.split();

        // Capacity is N - 1
        for i in 0..3u8 {
            producer.on_receive(NODE, &[i]).unwrap();
        }
        assert_eq!(producer.on_receive(NODE, &[99]), Err(GatewayError::QueueFull));
        assert_eq!(producer.stats().dropped.load(Ordering::Relaxed), 1);
        assert_eq!(producer.stats().max_depth.load(Ordering::Relaxed), 3);

        let firsts: heapless::Vec<u8, 4> = consumer.drain().map(|f| f.payload[0]).collect();
        assert_eq!(firsts.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn oversize_frame_rejected() {
        let mut queue = FrameQueue::<4>::new();
        let (mut producer, _consumer) = queue.split();

        let big = [0u8; MAX_FRAME_LEN + 1];
        assert_eq!(
            producer.on_receive(NODE, &big),
            Err(GatewayError::FrameTooLarge { len: MAX_FRAME_LEN + 1, max: MAX_FRAME_LEN })
        );
        assert_eq!(producer.stats().oversize.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn default_capacity_holds_seven_frames() {
        let mut queue = FrameQueue::<FRAME_QUEUE_CAPACITY>::new();
        let (mut producer, _consumer) = queue.split();

        for i in 0..(FRAME_QUEUE_CAPACITY - 1) as u8 {
            producer.on_receive(NODE, &[i]).unwrap();
        }
        assert_eq!(producer.on_receive(NODE, &[7]), Err(GatewayError::QueueFull));
    }

    #[test]
    fn drain_empties_queue() {
        let mut queue = FrameQueue::<FRAME_QUEUE_CAPACITY>::new();
        let (mut producer, mut consumer) = queue.split();

        for i in 0..5u8 {
            producer.on_receive(NODE, &[i; 8]).unwrap();
        }
        assert_eq!(consumer.drain().count(), 5);
        assert_eq!(consumer.stats().depth(), 0);
        assert!(consumer.pop().is_none());
    }
}
