//! User string heap (`#US`) reader and builder.
//!
//! Entries are a compressed length prefix followed by UTF-16LE code units
//! and a single trailing flag byte. The length counts the flag byte, so a
//! length of exactly 1 is the empty string, and the UTF-16 payload is
//! always `length - 1` bytes. The flag byte records whether any code unit
//! needs special handling when the runtime materializes the literal.
//!
//! ## Reference
//! * ECMA-335 6th edition, II.24.2.4

use widestring::U16String;

use crate::compressed::{compressed_u32_len, read_compressed_u32, write_compressed_u32};
use crate::{Error::OutOfBounds, Result};

/// Reader over a `#US` heap.
///
/// Payloads are returned as owned [`U16String`]s since the heap bytes give
/// no alignment guarantee for a `u16` view.
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Create a `UserStrings` reader from the heap bytes.
    ///
    /// # Errors
    /// Returns an error if the data is empty or doesn't start with a nul
    /// byte.
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #US heap"));
        }

        Ok(UserStrings { data })
    }

    /// Get the string literal stored at `index`.
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds, the entry runs past
    /// the heap, or the payload length is not consistent with whole UTF-16
    /// code units plus the flag byte.
    pub fn get(&self, index: usize) -> Result<U16String> {
        if index > self.data.len() {
            return Err(OutOfBounds);
        }

        let mut cursor = index;
        let len = read_compressed_u32(self.data, &mut cursor)? as usize;

        // The length includes the trailing flag byte; exactly 1 (or the
        // reserved 0 entry) is the empty string.
        if len <= 1 {
            return Ok(U16String::new());
        }

        let payload_len = len - 1;
        if payload_len % 2 != 0 {
            return Err(malformed_error!(
                "Invalid user string length at index - {}",
                index
            ));
        }

        let Some(entry_end) = cursor.checked_add(len) else {
            return Err(OutOfBounds);
        };
        if entry_end > self.data.len() {
            return Err(OutOfBounds);
        }

        let units = self.data[cursor..cursor + payload_len]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<_>>();

        Ok(U16String::from_vec(units))
    }

    /// Iterate over all entries as `(offset, literal)` pairs.
    #[must_use]
    pub fn iter(&self) -> UserStringsIterator<'a> {
        UserStringsIterator { data: self.data, offset: 1 }
    }
}

impl<'a> IntoIterator for &UserStrings<'a> {
    type Item = Result<(usize, U16String)>;
    type IntoIter = UserStringsIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator walking `#US` entries front to back, starting after the
/// leading nul.
pub struct UserStringsIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl Iterator for UserStringsIterator<'_> {
    type Item = Result<(usize, U16String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        let entry_offset = self.offset;
        let mut cursor = self.offset;
        let len = match read_compressed_u32(self.data, &mut cursor) {
            Ok(len) => len as usize,
            Err(error) => {
                // Stop after surfacing the malformed prefix once.
                self.offset = self.data.len();
                return Some(Err(error));
            }
        };

        if cursor + len > self.data.len() {
            self.offset = self.data.len();
            return Some(Err(OutOfBounds));
        }

        // The length counts the trailing flag byte, so the next entry
        // starts right past it.
        self.offset = cursor + len;

        if len <= 1 {
            return Some(Ok((entry_offset, U16String::new())));
        }

        let payload_len = len - 1;
        if payload_len % 2 != 0 {
            return Some(Err(malformed_error!(
                "Invalid user string length at index - {}",
                entry_offset
            )));
        }

        let units = self.data[cursor..cursor + payload_len]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<_>>();

        Some(Ok((entry_offset, U16String::from_vec(units))))
    }
}

/// Builder producing a `#US` heap byte buffer. No deduplication.
pub struct UserStringsBuilder {
    data: Vec<u8>,
}

impl UserStringsBuilder {
    /// Create an empty builder holding only the reserved leading nul.
    #[must_use]
    pub fn new() -> Self {
        UserStringsBuilder { data: vec![0] }
    }

    /// Append a string literal and return the index a token should store.
    ///
    /// The empty string maps to index 0, the reserved leading nul entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::CompressedOverflow`] if the literal is too
    /// long for the compressed length prefix.
    pub fn register(&mut self, value: &str) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }

        let units: Vec<u16> = value.encode_utf16().collect();
        let len = u32::try_from(units.len() * 2 + 1)
            .map_err(|_| crate::Error::CompressedOverflow(u32::MAX))?;

        let index = self.data.len();
        let prefix_len = compressed_u32_len(len);
        self.data.resize(index + prefix_len, 0);

        let mut cursor = index;
        write_compressed_u32(&mut self.data, &mut cursor, len)?;

        for unit in &units {
            self.data.extend_from_slice(&unit.to_le_bytes());
        }
        self.data.push(flag_byte(&units));

        #[allow(clippy::cast_possible_truncation)]
        Ok(index as u32)
    }

    /// Consume the builder and return the heap bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

impl Default for UserStringsBuilder {
    fn default() -> Self {
        UserStringsBuilder::new()
    }
}

/// Trailing flag byte per II.24.2.4: 1 when any code unit has a non-zero
/// high byte or a low byte in the ranges the runtime treats specially.
fn flag_byte(units: &[u16]) -> u8 {
    let special = units.iter().any(|&unit| {
        unit > 0xFF
            || matches!(
                unit as u8,
                0x01..=0x08 | 0x0E..=0x1F | 0x27 | 0x2D | 0x7F
            )
    });
    u8::from(special)
}

#[cfg(test)]
mod tests {
    use widestring::u16str;

    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data: [u8; 16] = [
            0x00,
            // "Hello" - length 11 (5 units * 2 + flag byte)
            0x0B, 0x48, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00, 0x00,
            // length 1: empty string, flag byte only
            0x01,
            0x00, 0x00,
        ];

        let strings = UserStrings::from(&data).unwrap();
        assert_eq!(strings.get(1).unwrap().as_ustr(), u16str!("Hello"));
        assert!(strings.get(13).unwrap().is_empty());
        assert!(strings.get(0).unwrap().is_empty());
    }

    #[test]
    fn invalid() {
        assert!(UserStrings::from(&[]).is_err());
        assert!(UserStrings::from(&[0x41]).is_err());

        let strings = UserStrings::from(&[0x00, 0xCC, 0xCC, 0xCC]).unwrap();
        assert!(strings.get(1).is_err());

        // Even length: payload would not be whole UTF-16 units plus flag.
        let strings = UserStrings::from(&[0x00, 0x04, 0x41, 0x00, 0x42, 0x00]).unwrap();
        assert!(strings.get(1).is_err());
    }

    #[test]
    fn iteration() {
        #[rustfmt::skip]
        let data: [u8; 9] = [
            0x00,
            // "AB" - length 5 (2 units * 2 + flag byte)
            0x05, 0x41, 0x00, 0x42, 0x00, 0x00,
            // length 1: empty string, flag byte only
            0x01, 0x00,
        ];

        let strings = UserStrings::from(&data).unwrap();
        let entries: Vec<_> = strings.iter().map(Result::unwrap).collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 1);
        assert_eq!(entries[0].1.as_ustr(), u16str!("AB"));
        assert_eq!(entries[1].0, 7);
        assert!(entries[1].1.is_empty());
    }

    #[test]
    fn iteration_stops_on_truncated_entry() {
        let strings = UserStrings::from(&[0x00, 0x7F, 0x41]).unwrap();
        let mut iter = strings.iter();
        assert!(matches!(iter.next(), Some(Err(_))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn builder_round_trip() {
        let mut builder = UserStringsBuilder::new();
        let hello = builder.register("Hello, World!").unwrap();
        let unicode = builder.register("caf\u{e9}").unwrap();
        assert_eq!(builder.register("").unwrap(), 0);

        let heap = builder.finish();
        let strings = UserStrings::from(&heap).unwrap();
        assert_eq!(strings.get(hello as usize).unwrap().as_ustr(), u16str!("Hello, World!"));
        assert_eq!(strings.get(unicode as usize).unwrap().as_ustr(), u16str!("caf\u{e9}"));
    }

    #[test]
    fn flag_bytes() {
        assert_eq!(flag_byte(&[0x41, 0x42]), 0);
        // High byte set
        assert_eq!(flag_byte(&[0x0100]), 1);
        // Apostrophe
        assert_eq!(flag_byte(&[0x27]), 1);
        // Control character
        assert_eq!(flag_byte(&[0x08]), 1);
    }
}
