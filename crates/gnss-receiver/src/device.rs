//! GNSS Device Handle and Reader Task
//!
//! [`GnssDevice::open`] wires one module: it builds the byte queue, gives
//! the producer half to the transport and returns the command handle plus
//! the [`FixReader`] that owns the consumer half.

use crate::assembler::SentenceAssembler;
use crate::command::{Command, PeriodicSchedule, PowerSaveMode};
use crate::config::ReceiverConfig;
use crate::dispatcher::FixDispatcher;
use crate::error::GnssError;
use crate::sink::ByteSink;
use crate::transport::SerialTransport;
use nmea_parser::{FixRecord, ParseError, RmcParser};
use ring_buffer::ByteQueue;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, trace, warn};

/// Counters kept by the reader task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    /// Sentences assembled
    pub sentences: u64,
    /// RMC sentences turned into fixes
    pub fixes: u64,
    /// Sentences of other types
    pub ignored: u64,
    /// RMC sentences discarded as malformed
    pub rejected: u64,
}

/// Command side of one GNSS module
pub struct GnssDevice<T: SerialTransport> {
    transport: T,
    baud_rate: u32,
}

impl<T: SerialTransport> GnssDevice<T> {
    /// Build the pipeline for one module and start the transport
    pub fn open(config: &ReceiverConfig, mut transport: T) -> Result<(Self, FixReader), GnssError> {
        config.validate()?;

        let (producer, consumer) = ByteQueue::new(config.ring_capacity)?.split();
        let line_ready = Arc::new(Notify::new());
        let terminator = config.terminator_byte();

        let sink = ByteSink::new(producer, Arc::clone(&line_ready), terminator);
        let assembler = SentenceAssembler::new(consumer, line_ready, config.max_sentence_len, terminator);
        let parser = RmcParser::new().with_checksum_verification(config.verify_checksum);

        transport.init(config.baud_rate, sink)?;
        info!(
            "GNSS device opened at {} baud (queue {} bytes, max sentence {} bytes)",
            config.baud_rate, config.ring_capacity, config.max_sentence_len
        );

        Ok((
            Self {
                transport,
                baud_rate: config.baud_rate,
            },
            FixReader::new(assembler, parser),
        ))
    }

    /// Frame and send a raw command body
    pub fn send_command(&mut self, body: &str) -> Result<usize, GnssError> {
        let command = Command::new(body).map_err(|e| {
            warn!("Refusing command {:?}: {}", body, e);
            e
        })?;
        self.send(&command)
    }

    /// Send an already framed command
    pub fn send(&mut self, command: &Command) -> Result<usize, GnssError> {
        debug!("GNSS command: {}", command);
        Ok(self.transport.write(command.as_bytes())?)
    }

    /// Move the module and the local port to a new baud rate
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), GnssError> {
        self.send(&Command::set_baud_rate(baud_rate)?)?;
        self.transport.set_baud_rate(baud_rate)?;
        self.baud_rate = baud_rate;
        Ok(())
    }

    /// Enable or disable GLP low-power tracking
    pub fn set_glp(&mut self, enabled: bool) -> Result<(), GnssError> {
        self.send(&Command::set_glp(enabled)?)?;
        Ok(())
    }

    /// Enter a power-save state
    pub fn set_power_save(&mut self, mode: PowerSaveMode) -> Result<(), GnssError> {
        info!("Setting GNSS power-save mode to {:?}", mode);
        self.send(&Command::power_save(mode)?)?;
        Ok(())
    }

    /// Configure periodic run/sleep cycling
    pub fn set_periodic(&mut self, schedule: &PeriodicSchedule) -> Result<(), GnssError> {
        info!("Setting GNSS periodic schedule to {:?}", schedule);
        self.send(&Command::periodic(schedule)?)?;
        Ok(())
    }

    /// Current baud rate
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the transport mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Reader side of one GNSS module: assembles, parses and dispatches
pub struct FixReader {
    assembler: SentenceAssembler,
    parser: RmcParser,
    dispatcher: FixDispatcher,
    stats: ReaderStats,
}

impl FixReader {
    fn new(assembler: SentenceAssembler, parser: RmcParser) -> Self {
        Self {
            assembler,
            parser,
            dispatcher: FixDispatcher::new(),
            stats: ReaderStats::default(),
        }
    }

    /// Register (or replace) the fix callback
    pub fn on_fix<F>(&mut self, callback: F)
    where
        F: FnMut(&FixRecord) + Send + 'static,
    {
        self.dispatcher.register(callback);
    }

    /// Parse one line and dispatch the fix if it yields one
    pub fn process_line(&mut self, line: &[u8]) -> Option<FixRecord> {
        handle_line(&self.parser, &mut self.dispatcher, &mut self.stats, line)
    }

    /// Wait for sentences until one yields a fix
    pub async fn next_fix(&mut self) -> FixRecord {
        loop {
            if let Some(fix) = self.process_next().await {
                return fix;
            }
        }
    }

    /// Run forever, stopping only when `shutdown` completes
    ///
    /// Shutdown is checked at the wait point, never mid-sentence.
    pub async fn run<S>(mut self, shutdown: S) -> ReaderStats
    where
        S: Future<Output = ()>,
    {
        info!("GNSS reader started");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.assembler.ready() => {}
            }
            self.process_current();
        }

        info!("GNSS reader stopped: {:?}", self.stats);
        self.stats
    }

    /// Counters so far
    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    /// Sentences dropped for exceeding the line buffer
    pub fn overlong(&self) -> u64 {
        self.assembler.overlong()
    }

    async fn process_next(&mut self) -> Option<FixRecord> {
        self.assembler.ready().await;
        self.process_current()
    }

    fn process_current(&mut self) -> Option<FixRecord> {
        handle_line(&self.parser, &mut self.dispatcher, &mut self.stats, self.assembler.line())
    }
}

fn handle_line(
    parser: &RmcParser,
    dispatcher: &mut FixDispatcher,
    stats: &mut ReaderStats,
    line: &[u8],
) -> Option<FixRecord> {
    stats.sentences += 1;
    match parser.parse(line) {
        Ok(fix) => {
            stats.fixes += 1;
            dispatcher.dispatch(&fix);
            Some(fix)
        }
        Err(ParseError::NotRmc) => {
            stats.ignored += 1;
            trace!("Ignoring sentence {:?}", String::from_utf8_lossy(line));
            None
        }
        Err(e) => {
            stats.rejected += 1;
            debug!("Discarding sentence {:?}: {}", String::from_utf8_lossy(line), e);
            None
        }
    }
}
