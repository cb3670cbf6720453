//! Lock-Free Byte Ring Buffer
//!
//! Provides a fixed-capacity SPSC byte queue that decouples an
//! interrupt-paced serial receiver from line-oriented processing.
//! The queue is split once into a [`Producer`] and a [`Consumer`];
//! ownership of those handles is what guarantees a single writer and a
//! single reader.

mod buffer;

pub use buffer::{ByteQueue, Consumer, Producer, DEFAULT_CAPACITY};

use thiserror::Error;

/// Errors raised when building a queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Capacity must be at least one byte
    #[error("Ring buffer capacity must be non-zero")]
    ZeroCapacity,
}
