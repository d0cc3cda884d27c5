//! System string heap (`#Strings`) reader and builder.
//!
//! Entries are nul-terminated UTF-8; index 0 is the mandatory leading nul
//! and doubles as the empty string.
//!
//! ## Reference
//! * ECMA-335 6th edition, II.24.2.3

use std::ffi::CStr;

use crate::{Error::OutOfBounds, Result};

/// Zero-copy reader over a `#Strings` heap.
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Create a `Strings` reader from the heap bytes.
    ///
    /// # Errors
    /// Returns an error if the data is empty or doesn't start with a nul
    /// byte.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Strings heap"));
        }

        Ok(Strings { data })
    }

    /// Get the string starting at `index`, up to its nul terminator.
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds, the terminator is
    /// missing, or the bytes are not valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index > self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => match result.to_str() {
                Ok(result) => Ok(result),
                Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
            },
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }

    /// Iterate over all entries as `(offset, string)` pairs.
    #[must_use]
    pub fn iter(&self) -> StringsIterator<'a> {
        StringsIterator { data: self.data, offset: 1 }
    }
}

/// Iterator walking `#Strings` entries front to back, starting after the
/// leading nul.
pub struct StringsIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for StringsIterator<'a> {
    type Item = Result<(usize, &'a str)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        let entry_offset = self.offset;
        match CStr::from_bytes_until_nul(&self.data[self.offset..]) {
            Ok(entry) => {
                self.offset += entry.to_bytes_with_nul().len();
                match entry.to_str() {
                    Ok(string) => Some(Ok((entry_offset, string))),
                    Err(_) => Some(Err(malformed_error!(
                        "Invalid string at index - {}",
                        entry_offset
                    ))),
                }
            }
            Err(_) => {
                self.offset = self.data.len();
                Some(Err(malformed_error!(
                    "Unterminated string at index - {}",
                    entry_offset
                )))
            }
        }
    }
}

/// Builder producing a `#Strings` heap byte buffer. No deduplication.
pub struct StringsBuilder {
    data: Vec<u8>,
}

impl StringsBuilder {
    /// Create an empty builder holding only the reserved leading nul.
    #[must_use]
    pub fn new() -> Self {
        StringsBuilder { data: vec![0] }
    }

    /// Append a string and return the index a table column should store.
    ///
    /// The empty string maps to index 0, the reserved leading nul entry.
    #[must_use]
    pub fn register(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }

        let index = self.data.len();
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);

        #[allow(clippy::cast_possible_truncation)]
        {
            index as u32
        }
    }

    /// Consume the builder and return the heap bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

impl Default for StringsBuilder {
    fn default() -> Self {
        StringsBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data: [u8; 17] = [
            0x00,
            0x3c, 0x4d, 0x6f, 0x64, 0x75, 0x6c, 0x65, 0x3e, 0x00,
            0x48, 0x65, 0x6c, 0x6c, 0x6f, 0x21, 0x00,
        ];

        let strings = Strings::from(&data).unwrap();
        assert_eq!(strings.get(1).unwrap(), "<Module>");
        assert_eq!(strings.get(10).unwrap(), "Hello!");
        // Mid-entry index is legal and yields the suffix.
        assert_eq!(strings.get(4).unwrap(), "dule>");
        assert_eq!(strings.get(0).unwrap(), "");
    }

    #[test]
    fn invalid() {
        assert!(Strings::from(&[]).is_err());
        assert!(Strings::from(&[0x41, 0x00]).is_err());

        let strings = Strings::from(&[0x00, 0x41, 0x42]).unwrap();
        assert!(strings.get(1).is_err());
        assert!(strings.get(50).is_err());
    }

    #[test]
    fn iteration() {
        let data = [0x00, 0x41, 0x00, 0x42, 0x43, 0x00];
        let strings = Strings::from(&data).unwrap();

        let entries: Vec<_> = strings.iter().map(Result::unwrap).collect();
        assert_eq!(entries, vec![(1, "A"), (3, "BC")]);
    }

    #[test]
    fn builder_round_trip() {
        let mut builder = StringsBuilder::new();
        let module = builder.register("<Module>");
        let name = builder.register("Program");
        assert_eq!(builder.register(""), 0);

        let heap = builder.finish();
        let strings = Strings::from(&heap).unwrap();
        assert_eq!(strings.get(module as usize).unwrap(), "<Module>");
        assert_eq!(strings.get(name as usize).unwrap(), "Program");
    }
}
