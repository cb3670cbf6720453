//! RMC Sentence Parsing and Fixed-Point Conversion
//!
//! Coordinates arrive as `DDMM.MMMM` / `DDDMM.MMMM` and leave as signed
//! microdegrees; speed leaves as mm/s and course as millidegrees. No
//! floating point is involved anywhere in the conversion.

use crate::checksum::verify_checksum;
use crate::error::ParseError;
use crate::fields::field;
use crate::rmc_field;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Knots to m/s (0.514444) scaled by 1000, truncated
const KNOTS_TO_MM_PER_S: u64 = 514;

/// Decimal places of a minute carried by latitude/longitude fields
const MINUTE_FRACTION_DIGITS: u32 = 4;

/// Decimal places carried by speed and course fields
const VELOCITY_FRACTION_DIGITS: u32 = 2;

/// One parsed GNSS fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRecord {
    /// Receiver reported status `A`
    pub valid: bool,
    /// Latitude in microdegrees, negative south of the equator
    pub latitude_microdegrees: i32,
    /// Longitude in microdegrees, negative west of Greenwich
    pub longitude_microdegrees: i32,
    /// UTC date and time of the fix
    pub timestamp: NaiveDateTime,
    /// Speed over ground (mm/s)
    pub speed_mm_per_s: u32,
    /// Course over ground (degrees * 1000)
    pub course_millidegrees: u32,
}

impl FixRecord {
    /// Seconds since the Unix epoch
    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp.and_utc().timestamp()
    }
}

/// Parser for RMC sentences
#[derive(Debug, Clone, Default)]
pub struct RmcParser {
    /// Reject sentences whose `*hh` suffix is absent or wrong
    verify_checksum: bool,
}

impl RmcParser {
    /// Create a parser that accepts sentences without checking the checksum
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable checksum verification
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    /// Parse one terminated line into a fix
    ///
    /// The status field only decides `valid`; every other field must parse
    /// or the whole sentence is rejected.
    pub fn parse(&self, line: &[u8]) -> Result<FixRecord, ParseError> {
        if !line.windows(3).any(|w| w == b"RMC") {
            return Err(ParseError::NotRmc);
        }

        if self.verify_checksum {
            verify_checksum(line)?;
        }

        let valid = required(line, rmc_field::STATUS, "status")? == b"A";

        let latitude_microdegrees = parse_coordinate(
            required(line, rmc_field::LATITUDE, "latitude")?,
            required(line, rmc_field::NORTH_SOUTH, "north/south")?,
            (b'N', b'S'),
            "latitude",
        )?;

        let longitude_microdegrees = parse_coordinate(
            required(line, rmc_field::LONGITUDE, "longitude")?,
            required(line, rmc_field::EAST_WEST, "east/west")?,
            (b'E', b'W'),
            "longitude",
        )?;

        let date = parse_date(required(line, rmc_field::DATE, "date")?)?;
        let time = parse_time(required(line, rmc_field::TIME, "time")?)?;

        let (knots, hundredths) = parse_decimal(
            required(line, rmc_field::SPEED, "speed")?,
            VELOCITY_FRACTION_DIGITS,
            "speed",
        )?;
        let speed_mm_per_s = knots
            .checked_mul(1000)
            .and_then(|v| v.checked_add(10 * hundredths))
            .and_then(|v| v.checked_mul(KNOTS_TO_MM_PER_S))
            .map(|v| v / 1000)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(ParseError::OutOfRange("speed"))?;

        let (degrees, hundredths) = parse_decimal(
            required(line, rmc_field::COURSE, "course")?,
            VELOCITY_FRACTION_DIGITS,
            "course",
        )?;
        let course_millidegrees = degrees
            .checked_mul(1000)
            .and_then(|v| v.checked_add(10 * hundredths))
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(ParseError::OutOfRange("course"))?;

        let fix = FixRecord {
            valid,
            latitude_microdegrees,
            longitude_microdegrees,
            timestamp: NaiveDateTime::new(date, time),
            speed_mm_per_s,
            course_millidegrees,
        };

        debug!(
            "RMC fix: valid={} lat={} lon={} time={} speed={}mm/s course={}mdeg",
            fix.valid,
            fix.latitude_microdegrees,
            fix.longitude_microdegrees,
            fix.timestamp,
            fix.speed_mm_per_s,
            fix.course_millidegrees
        );

        Ok(fix)
    }
}

/// Parse a line with default options, discarding the reason on failure
pub fn parse(line: &[u8]) -> Option<FixRecord> {
    match RmcParser::default().parse(line) {
        Ok(fix) => Some(fix),
        Err(e) => {
            debug!("Discarding sentence: {}", e);
            None
        }
    }
}

fn required<'a>(line: &'a [u8], index: usize, name: &'static str) -> Result<&'a [u8], ParseError> {
    field(line, index).ok_or(ParseError::MissingField { index, name })
}

/// Parse a run of ASCII digits
fn parse_digits(text: &[u8]) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    text.iter().try_fold(0u64, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
    })
}

/// Parse `<int>.<frac>` with the fraction read as `digits` decimal places
///
/// Short fractions are right-padded with zeros (`.4` is 40 hundredths),
/// extra digits are truncated.
fn parse_decimal(text: &[u8], digits: u32, name: &'static str) -> Result<(u64, u64), ParseError> {
    let dot = text
        .iter()
        .position(|&b| b == b'.')
        .ok_or(ParseError::Malformed(name))?;
    let (whole, fraction) = (&text[..dot], &text[dot + 1..]);

    let whole = parse_digits(whole).ok_or(ParseError::Malformed(name))?;
    if fraction.is_empty() || !fraction.iter().all(u8::is_ascii_digit) {
        return Err(ParseError::Malformed(name));
    }

    let scaled = (0..digits as usize).fold(0u64, |acc, i| {
        acc * 10 + fraction.get(i).map_or(0, |&b| u64::from(b - b'0'))
    });

    Ok((whole, scaled))
}

/// Degrees-minutes to signed microdegrees
fn parse_coordinate(
    text: &[u8],
    hemisphere: &[u8],
    (positive, negative): (u8, u8),
    name: &'static str,
) -> Result<i32, ParseError> {
    let (whole, fraction) = parse_decimal(text, MINUTE_FRACTION_DIGITS, name)?;

    let degrees = whole / 100;
    let minutes = whole % 100;

    let microdegrees = degrees
        .checked_mul(1_000_000)
        .and_then(|v| v.checked_add(minutes * 1_000_000 / 60))
        .and_then(|v| v.checked_add(fraction * 10 / 6))
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(ParseError::OutOfRange(name))?;

    match hemisphere {
        [b] if *b == positive => Ok(microdegrees),
        [b] if *b == negative => Ok(-microdegrees),
        other => Err(ParseError::InvalidHemisphere {
            field: name,
            found: other.first().map_or(' ', |&b| char::from(b)),
        }),
    }
}

/// Split exactly `2 * N` digits into two-digit groups
fn two_digit_groups<const N: usize>(text: &[u8], name: &'static str) -> Result<[u32; N], ParseError> {
    if text.len() != 2 * N {
        return Err(ParseError::Malformed(name));
    }
    let mut groups = [0u32; N];
    for (group, pair) in groups.iter_mut().zip(text.chunks(2)) {
        *group = parse_digits(pair).ok_or(ParseError::Malformed(name))? as u32;
    }
    Ok(groups)
}

/// `DDMMYY`, years counted from 2000
fn parse_date(text: &[u8]) -> Result<NaiveDate, ParseError> {
    let [day, month, year] = two_digit_groups::<3>(text, "date")?;
    NaiveDate::from_ymd_opt(2000 + year as i32, month, day).ok_or(ParseError::InvalidCalendar("date"))
}

/// `HHMMSS` with optional fractional seconds
fn parse_time(text: &[u8]) -> Result<NaiveTime, ParseError> {
    let (clock, millis) = match text.iter().position(|&b| b == b'.') {
        Some(dot) => {
            let (_, millis) = parse_decimal(text, 3, "time")?;
            (&text[..dot], millis as u32)
        }
        None => (text, 0),
    };

    let [hour, minute, second] = two_digit_groups::<3>(clock, "time")?;

    // Leap second: chrono folds it into the 59th second
    let (second, millis) = if second == 60 {
        (59, millis + 1000)
    } else {
        (second, millis)
    };

    NaiveTime::from_hms_milli_opt(hour, minute, second, millis).ok_or(ParseError::InvalidCalendar("time"))
}
