//! Comma-Delimited Field Extraction

use crate::checksum::split_checksum;

/// Iterate over the comma-separated fields of a sentence
///
/// A trailing `*hh` checksum and any CR/LF are not part of the last field.
pub fn fields(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    let (data, _) = split_checksum(line);
    data.split(|&b| b == b',')
}

/// Get field `index` (zero-based, field 0 is the sentence address)
///
/// Returns `Some(&[])` for a field that exists but is empty and `None`
/// when the index lies past the final comma.
pub fn field(line: &[u8], index: usize) -> Option<&[u8]> {
    fields(line).nth(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LINE: &[u8] = b"$GPRMC,123519,A,,N,,";

    #[test]
    fn test_field_by_index() {
        assert_eq!(field(LINE, 0), Some(&b"$GPRMC"[..]));
        assert_eq!(field(LINE, 1), Some(&b"123519"[..]));
        assert_eq!(field(LINE, 4), Some(&b"N"[..]));
    }

    #[test]
    fn test_empty_field_is_present() {
        assert_eq!(field(LINE, 3), Some(&b""[..]));
        // Trailing comma opens one last empty field
        assert_eq!(field(LINE, 6), Some(&b""[..]));
    }

    #[test]
    fn test_index_past_final_comma() {
        assert_eq!(field(LINE, 7), None);
        assert_eq!(field(b"", 1), None);
    }

    #[test]
    fn test_checksum_not_in_last_field() {
        let line = b"$GPRMC,1,2,W*6A\r";
        assert_eq!(field(line, 3), Some(&b"W"[..]));
        assert_eq!(field(line, 4), None);
    }

    proptest! {
        #[test]
        fn prop_fields_round_trip(parts in prop::collection::vec("[A-Z0-9.]{0,8}", 1..20)) {
            let line = parts.join(",");
            for (i, part) in parts.iter().enumerate() {
                prop_assert_eq!(field(line.as_bytes(), i), Some(part.as_bytes()));
            }
            prop_assert_eq!(field(line.as_bytes(), parts.len()), None);
        }
    }
}
