//! Sentence Assembler (reader task)
//!
//! Drains the raw byte queue one terminated line at a time into a reusable
//! line buffer. Only the reader task touches the line buffer.

use ring_buffer::Consumer;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Start-of-sentence delimiter
const SENTENCE_START: u8 = b'$';

/// Reassembles terminated sentences from the byte queue
pub struct SentenceAssembler {
    consumer: Consumer,
    line_ready: Arc<Notify>,
    /// Current sentence, never longer than `max_len` plus a pending CR
    line: Vec<u8>,
    max_len: usize,
    terminator: u8,
    /// Skipping the tail of an overlong sentence
    discarding: bool,
    /// `line` holds a sentence already handed out
    complete: bool,
    overlong: u64,
}

impl SentenceAssembler {
    pub(crate) fn new(consumer: Consumer, line_ready: Arc<Notify>, max_len: usize, terminator: u8) -> Self {
        Self {
            consumer,
            line_ready,
            line: Vec::with_capacity(max_len + 1),
            max_len,
            terminator,
            discarding: false,
            complete: false,
            overlong: 0,
        }
    }

    /// Wait for the next complete sentence and return it without its
    /// terminator
    ///
    /// Cancel-safe: bytes already drained stay in the line buffer.
    pub async fn next_line(&mut self) -> &[u8] {
        self.ready().await;
        self.line()
    }

    /// Wait until a complete sentence is in the line buffer
    pub async fn ready(&mut self) {
        loop {
            if self.drain() {
                return;
            }
            // Wakeups may be stale or batched; draining again sorts it out
            self.line_ready.notified().await;
        }
    }

    /// The last completed sentence (empty until one has been assembled)
    pub fn line(&self) -> &[u8] {
        if self.complete {
            &self.line
        } else {
            &[]
        }
    }

    /// Number of sentences dropped for exceeding the line buffer
    pub fn overlong(&self) -> u64 {
        self.overlong
    }

    /// Move queued bytes into the line buffer until a terminator is seen.
    /// Returns true when a complete sentence is available.
    pub fn drain(&mut self) -> bool {
        if self.complete {
            self.line.clear();
            self.complete = false;
        }

        while let Some(byte) = self.consumer.try_pop() {
            if byte == self.terminator {
                if self.discarding {
                    self.discarding = false;
                    continue;
                }
                // CR of a CR/LF pair when LF terminates
                while matches!(self.line.last(), Some(b'\r' | b'\n')) {
                    self.line.pop();
                }
                if self.line.is_empty() {
                    continue;
                }
                self.complete = true;
                return true;
            }

            if byte == SENTENCE_START {
                // A start marker mid-line means bytes were lost; resync on it
                if !self.line.is_empty() || self.discarding {
                    debug!("Sentence restarted after {} bytes, dropping fragment", self.line.len());
                }
                self.line.clear();
                self.discarding = false;
            } else if self.discarding {
                continue;
            } else if self.line.is_empty() && (byte == b'\r' || byte == b'\n') {
                // LF of a CR/LF pair when CR terminates
                continue;
            }

            // The CR of a CR/LF pair may sit one past the bound until LF arrives
            let limit = if byte == b'\r' { self.max_len + 1 } else { self.max_len };
            if self.line.len() >= limit {
                warn!("Sentence exceeds {} bytes, discarding", self.max_len);
                self.overlong += 1;
                self.line.clear();
                self.discarding = true;
                continue;
            }

            self.line.push(byte);
        }

        false
    }
}
