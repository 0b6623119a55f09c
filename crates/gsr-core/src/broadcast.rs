//! Hand-off between the sampling loop and the wireless link task
//!
//! The sampler never waits on the radio. It publishes each record into a
//! bounded [`BroadcastQueue`]; the link task marks the queue connected while a
//! central is attached and drains it into notifications. Records published
//! while nobody is connected are discarded, the same as writing to an
//! unpaired serial link.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use crate::channels::{BroadcastChannel, ChannelError};
use crate::record::BroadcastLine;

/// Records buffered while the link is busy notifying.
/// At one record per ~110 ms a handful covers a slow connection interval.
pub const BROADCAST_QUEUE_DEPTH: usize = 4;

/// Global queue between the sampler and the wireless link task
pub static BROADCAST_QUEUE: BroadcastQueue<BROADCAST_QUEUE_DEPTH> = BroadcastQueue::new();

/// What happened to a published record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    Queued,
    /// No central connected
    NotConnected,
    /// Link task is behind; record dropped
    Full,
}

pub struct BroadcastQueue<const N: usize> {
    lines: Channel<CriticalSectionRawMutex, BroadcastLine, N>,
    connected: AtomicBool,
}

impl<const N: usize> BroadcastQueue<N> {
    pub const fn new() -> Self {
        Self {
            lines: Channel::new(),
            connected: AtomicBool::new(false),
        }
    }

    /// Called by the link task when a central connects or disconnects.
    /// Disconnecting discards anything still queued.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
        if !connected {
            self.lines.clear();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn publish(&self, line: BroadcastLine) -> Publish {
        if !self.is_connected() {
            return Publish::NotConnected;
        }

        match self.lines.try_send(line) {
            Ok(()) => Publish::Queued,
            Err(_) => Publish::Full,
        }
    }

    /// Wait for the next record (link task side).
    pub async fn receive(&self) -> BroadcastLine {
        self.lines.receive().await
    }

    /// Take the next record without waiting.
    pub fn try_receive(&self) -> Option<BroadcastLine> {
        self.lines.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<const N: usize> Default for BroadcastQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`BroadcastChannel`] that publishes into a [`BroadcastQueue`].
pub struct QueuedBroadcast<'a, const N: usize> {
    queue: &'a BroadcastQueue<N>,
}

impl<'a, const N: usize> QueuedBroadcast<'a, N> {
    pub const fn new(queue: &'a BroadcastQueue<N>) -> Self {
        Self { queue }
    }
}

impl<const N: usize> BroadcastChannel for QueuedBroadcast<'_, N> {
    async fn send_line(&mut self, line: &str) -> Result<(), ChannelError> {
        let line = BroadcastLine::try_from(line).map_err(|_| ChannelError::LineTooLong {
            channel: "broadcast",
            len: line.len(),
        })?;

        match self.queue.publish(line) {
            Publish::Queued => {}
            Publish::NotConnected => debug!("[broadcast] no central connected, record dropped"),
            Publish::Full => warn!("[broadcast] queue full ({} records), record dropped", N),
        }

        Ok(())
    }
}
