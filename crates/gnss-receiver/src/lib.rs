//! GNSS Receiver Pipeline
//!
//! Acquisition path for MT3333-class GNSS modules on a serial link:
//!
//! serial receive context → [`ByteSink`] → byte queue → (wakeup) →
//! [`SentenceAssembler`] → RMC parser → [`FixDispatcher`] → callback
//!
//! Only the byte queue is shared between the two contexts. Everything after
//! it is owned by the [`FixReader`] task.

mod assembler;
mod command;
mod config;
mod device;
mod dispatcher;
mod error;
mod sink;
mod transport;

pub use assembler::SentenceAssembler;
pub use command::{Command, PeriodicMode, PeriodicSchedule, PowerSaveMode, MAX_COMMAND_LEN};
pub use config::ReceiverConfig;
pub use device::{FixReader, GnssDevice, ReaderStats};
pub use dispatcher::{FixCallback, FixDispatcher};
pub use error::{CommandError, GnssError, TransportError};
pub use sink::ByteSink;
pub use transport::{MockTransport, SerialPortTransport, SerialTransport};

pub use nmea_parser::FixRecord;

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: &str) -> Result<(), GnssError> {
    let level = Level::from_str(level)
        .map_err(|_| GnssError::InvalidConfig(format!("unknown log level {:?}", level)))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| GnssError::Logging(e.to_string()))
}
