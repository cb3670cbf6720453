//! NMEA Parse Error Types

use thiserror::Error;

/// Reasons a sentence is discarded instead of producing a fix
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Sentence is not an RMC sentence
    #[error("Not an RMC sentence")]
    NotRmc,

    /// Field index past the final comma
    #[error("Missing field {index} ({name})")]
    MissingField { index: usize, name: &'static str },

    /// Field does not match its numeric pattern
    #[error("Malformed {0} field")]
    Malformed(&'static str),

    /// Hemisphere letter outside the allowed pair
    #[error("Invalid {field} hemisphere '{found}'")]
    InvalidHemisphere { field: &'static str, found: char },

    /// Date or time fields do not form a calendar value
    #[error("Invalid calendar {0}")]
    InvalidCalendar(&'static str),

    /// Converted value does not fit the fix field
    #[error("{0} value out of range")]
    OutOfRange(&'static str),

    /// Checksum required but not present
    #[error("Checksum missing")]
    ChecksumMissing,

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}
