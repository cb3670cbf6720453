//! NMEA Checksum Helpers

use crate::error::ParseError;

/// XOR of every byte, the NMEA 0183 checksum
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Split a sentence into its data part and the hex digits after `*`
///
/// Trailing CR/LF is trimmed first. The data part keeps the leading `$`.
pub fn split_checksum(line: &[u8]) -> (&[u8], Option<&[u8]>) {
    let end = line
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |i| i + 1);
    let line = &line[..end];

    match line.iter().rposition(|&b| b == b'*') {
        Some(star) => (&line[..star], Some(&line[star + 1..])),
        None => (line, None),
    }
}

/// Verify the `*hh` suffix against the sentence body
pub fn verify_checksum(line: &[u8]) -> Result<(), ParseError> {
    let (data, digits) = split_checksum(line);
    let digits = digits.ok_or(ParseError::ChecksumMissing)?;

    let expected = std::str::from_utf8(digits)
        .ok()
        .filter(|s| s.len() == 2)
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .ok_or(ParseError::Malformed("checksum"))?;

    let body = match data.first() {
        Some(b'$') | Some(b'!') => &data[1..],
        _ => data,
    };
    let actual = checksum(body);

    if actual != expected {
        return Err(ParseError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}
