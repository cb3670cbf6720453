//! NMEA Sentence Parsing
//!
//! Turns terminated NMEA lines into fixed-point GNSS fixes. Only the RMC
//! (Recommended Minimum) sentence is interpreted; every conversion uses
//! integer arithmetic.

mod checksum;
mod error;
mod fields;
mod rmc;

pub use checksum::{checksum, split_checksum, verify_checksum};
pub use error::ParseError;
pub use fields::{field, fields};
pub use rmc::{parse, FixRecord, RmcParser};

/// RMC field positions (field 0 is the `$xxRMC` address)
pub mod rmc_field {
    /// UTC time, `HHMMSS[.sss]`
    pub const TIME: usize = 1;
    /// Status, `A` = valid, `V` = warning
    pub const STATUS: usize = 2;
    /// Latitude, `DDMM.MMMM`
    pub const LATITUDE: usize = 3;
    /// `N` or `S`
    pub const NORTH_SOUTH: usize = 4;
    /// Longitude, `DDDMM.MMMM`
    pub const LONGITUDE: usize = 5;
    /// `E` or `W`
    pub const EAST_WEST: usize = 6;
    /// Speed over ground in knots
    pub const SPEED: usize = 7;
    /// Course over ground in degrees
    pub const COURSE: usize = 8;
    /// UTC date, `DDMMYY`
    pub const DATE: usize = 9;
}
