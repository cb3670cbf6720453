//! Outbound Configuration Commands
//!
//! MT3333 modules accept `$<body>*<hh>\r\n` where `hh` is the XOR of the
//! body bytes. Bodies use the PQ (Quectel) and PMTK command sets.

use crate::error::CommandError;
use nmea_parser::checksum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Receiver input budget for one framed command
pub const MAX_COMMAND_LEN: usize = 100;

/// `$`, `*`, two hex digits, CR, LF and the receiver's string terminator
const FRAMING_OVERHEAD: usize = 7;

/// Power-save states reachable with a single command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerSaveMode {
    /// Continuous tracking
    FullOn,
    /// Standby until the next byte on the serial line
    Standby,
    /// Perpetual backup, woken by the FORCE_ON pin
    Backup,
}

impl PowerSaveMode {
    fn body(&self) -> &'static str {
        match self {
            PowerSaveMode::FullOn => "PMTK225,0",
            PowerSaveMode::Standby => "PMTK161,0",
            PowerSaveMode::Backup => "PMTK225,4",
        }
    }
}

impl Default for PowerSaveMode {
    fn default() -> Self {
        PowerSaveMode::FullOn
    }
}

/// Sleep flavour used between runs in periodic mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PeriodicMode {
    /// Periodic backup
    Backup = 1,
    /// Periodic standby
    Standby = 2,
}

/// Run/sleep durations for periodic mode, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicSchedule {
    pub mode: PeriodicMode,
    /// Full-power time per cycle
    pub run_ms: u32,
    /// Sleep time per cycle
    pub sleep_ms: u32,
    /// Run time used while no fix is available
    pub run_ext_ms: u32,
    /// Sleep time used while no fix is available
    pub sleep_ext_ms: u32,
}

/// A framed command ready to be written to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    frame: String,
}

impl Command {
    /// Frame a raw command body (without `$` or checksum)
    ///
    /// Refused outright if the framed result would not fit the receiver's
    /// input budget; nothing partial is ever produced.
    pub fn new(body: &str) -> Result<Self, CommandError> {
        let len = body.len() + FRAMING_OVERHEAD;
        if len > MAX_COMMAND_LEN {
            return Err(CommandError::TooLong {
                len,
                max: MAX_COMMAND_LEN,
            });
        }

        if let Some(c) = body.chars().find(|c| matches!(c, '$' | '*' | '\r' | '\n')) {
            return Err(CommandError::ReservedCharacter(c));
        }

        Ok(Self {
            frame: format!("${}*{:02x}\r\n", body, checksum(body.as_bytes())),
        })
    }

    /// Switch the module's UART speed
    pub fn set_baud_rate(baud_rate: u32) -> Result<Self, CommandError> {
        Self::new(&format!("PQBAUD,W,{}", baud_rate))
    }

    /// Enable or disable GLP (low-power tracking), saved to flash
    pub fn set_glp(enabled: bool) -> Result<Self, CommandError> {
        Self::new(if enabled { "PQGLP,W,1,1" } else { "PQGLP,W,0,1" })
    }

    /// Enter a power-save state
    pub fn power_save(mode: PowerSaveMode) -> Result<Self, CommandError> {
        Self::new(mode.body())
    }

    /// Configure periodic run/sleep cycling
    pub fn periodic(schedule: &PeriodicSchedule) -> Result<Self, CommandError> {
        Self::new(&format!(
            "PMTK225,{},{},{},{},{}",
            schedule.mode as u8,
            schedule.run_ms,
            schedule.sleep_ms,
            schedule.run_ext_ms,
            schedule.sleep_ext_ms
        ))
    }

    /// Framed bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.frame.as_bytes()
    }

    /// Framed text
    pub fn as_str(&self) -> &str {
        &self.frame
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.frame.trim_end())
    }
}
