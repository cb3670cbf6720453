//! Serial Transport Boundary
//!
//! A transport owns the wire. `init` hands it the [`ByteSink`] that its
//! receive context feeds; `write` carries outbound configuration commands.

use crate::error::TransportError;
use crate::sink::ByteSink;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio_serial::SerialPort;
use tracing::{debug, error, info};

/// Read timeout so the receive thread can notice shutdown
const READ_TIMEOUT_MS: u64 = 100;

/// Serial link to the GNSS module
pub trait SerialTransport: Send {
    /// Open the link at `baud_rate` and start feeding `sink`
    fn init(&mut self, baud_rate: u32, sink: ByteSink) -> Result<(), TransportError>;

    /// Write raw bytes, returning how many were written
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Change the link speed without replacing the sink
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), TransportError>;
}

/// Transport backed by a host serial port
///
/// A dedicated thread reads the port and drives the sink, standing in for
/// the UART receive interrupt.
pub struct SerialPortTransport {
    /// Serial port device path (e.g., "/dev/ttyUSB0" or "COM3")
    device: String,
    port: Option<Box<dyn SerialPort>>,
    reader: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl SerialPortTransport {
    /// Create a transport for the given device; nothing is opened until `init`
    pub fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            port: None,
            reader: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Device path
    pub fn device(&self) -> &str {
        &self.device
    }

    fn receive_loop(mut port: Box<dyn SerialPort>, mut sink: ByteSink, stop: Arc<AtomicBool>) {
        let mut buf = [0u8; 64];
        while !stop.load(Ordering::Relaxed) {
            match port.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => sink.on_bytes(&buf[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => continue,
                Err(e) => {
                    error!("Serial read failed, stopping receiver: {}", e);
                    break;
                }
            }
        }
        debug!("Serial receive thread exiting ({} bytes dropped)", sink.dropped());
    }
}

impl SerialTransport for SerialPortTransport {
    fn init(&mut self, baud_rate: u32, sink: ByteSink) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Err(TransportError::AlreadyInitialized);
        }

        info!("Opening serial port {} at {} baud", self.device, baud_rate);
        let port = tokio_serial::new(self.device.as_str(), baud_rate)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()?;
        let reader_port = port.try_clone()?;

        let stop = Arc::clone(&self.stop);
        let reader = std::thread::Builder::new()
            .name("gnss-rx".to_string())
            .spawn(move || Self::receive_loop(reader_port, sink, stop))?;

        self.port = Some(port);
        self.reader = Some(reader);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotInitialized)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(bytes.len())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotInitialized)?;
        port.set_baud_rate(baud_rate)?;
        info!("Serial port {} switched to {} baud", self.device, baud_rate);
        Ok(())
    }
}

impl Drop for SerialPortTransport {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                error!("Serial receive thread panicked");
            }
        }
    }
}

/// In-memory transport for tests and replay (no hardware required)
#[derive(Default)]
pub struct MockTransport {
    sink: Option<ByteSink>,
    baud_rate: Option<u32>,
    written: Vec<u8>,
}

impl MockTransport {
    /// Create a mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver bytes as if they had arrived on the wire, one at a time
    pub fn inject(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let sink = self.sink.as_mut().ok_or(TransportError::NotInitialized)?;
        for &byte in bytes {
            sink.on_byte(byte);
        }
        Ok(())
    }

    /// Take the sink to drive it from another thread
    pub fn take_sink(&mut self) -> Option<ByteSink> {
        self.sink.take()
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Current link speed, if initialized
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }
}

impl SerialTransport for MockTransport {
    fn init(&mut self, baud_rate: u32, sink: ByteSink) -> Result<(), TransportError> {
        if self.baud_rate.is_some() {
            return Err(TransportError::AlreadyInitialized);
        }
        debug!("Mock transport initialized at {} baud", baud_rate);
        self.baud_rate = Some(baud_rate);
        self.sink = Some(sink);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        if self.baud_rate.is_none() {
            return Err(TransportError::NotInitialized);
        }
        self.written.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), TransportError> {
        if self.baud_rate.is_none() {
            return Err(TransportError::NotInitialized);
        }
        self.baud_rate = Some(baud_rate);
        Ok(())
    }
}
