//! Byte Sink (serial receive context)

use ring_buffer::Producer;
use std::sync::Arc;
use tokio::sync::Notify;

/// Entry point for received bytes
///
/// Owned by the serial transport and driven from its receive context. Each
/// call is bounded: one queue push and, on a terminator, one wakeup. Wakeups
/// coalesce into a single stored permit when the reader is busy.
pub struct ByteSink {
    producer: Producer,
    line_ready: Arc<Notify>,
    terminator: u8,
}

impl ByteSink {
    pub(crate) fn new(producer: Producer, line_ready: Arc<Notify>, terminator: u8) -> Self {
        Self {
            producer,
            line_ready,
            terminator,
        }
    }

    /// Handle one received byte
    pub fn on_byte(&mut self, byte: u8) {
        self.producer.push(byte);
        if byte == self.terminator {
            self.line_ready.notify_one();
        }
    }

    /// Handle a burst of received bytes
    pub fn on_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.on_byte(byte);
        }
    }

    /// Bytes lost because the reader fell behind
    pub fn dropped(&self) -> usize {
        self.producer.dropped()
    }
}
