//! Blob heap (`#Blob`) reader and builder.
//!
//! Each blob entry is a compressed length prefix (§II.23.2) followed by
//! that many bytes of payload, with no terminator. Offset 0 is the
//! mandatory leading nul byte, which doubles as the empty blob.
//!
//! ## Reference
//! * ECMA-335 6th edition, II.24.2.4

use crate::compressed::{compressed_u32_len, read_compressed_u32, write_compressed_u32};
use crate::{Error::OutOfBounds, Result};

/// Zero-copy reader over a `#Blob` heap.
///
/// Indices handed to [`Blob::get`] come straight out of metadata table
/// columns; not every byte range in the heap is a reachable entry.
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Create a `Blob` reader from the heap bytes.
    ///
    /// # Errors
    /// Returns an error if the data is empty or doesn't start with a nul
    /// byte.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get the payload of the entry at `index`.
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the length prefix
    /// runs past the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index > self.data.len() {
            return Err(OutOfBounds);
        }

        let mut cursor = index;
        let len = read_compressed_u32(self.data, &mut cursor)? as usize;

        let Some(data_end) = cursor.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if data_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[cursor..data_end])
    }

    /// Iterate over all entries as `(offset, payload)` pairs.
    #[must_use]
    pub fn iter(&self) -> BlobIterator<'a> {
        BlobIterator { data: self.data, offset: 1 }
    }
}

impl<'a> IntoIterator for &Blob<'a> {
    type Item = Result<(usize, &'a [u8])>;
    type IntoIter = BlobIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator walking `#Blob` entries front to back, starting after the
/// leading nul.
pub struct BlobIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = Result<(usize, &'a [u8])>;

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

        self.offset = cursor + len;
        Some(Ok((entry_offset, &self.data[cursor..cursor + len])))
    }
}

/// Builder producing a `#Blob` heap byte buffer.
///
/// No deduplication is performed: registering the same payload twice
/// produces two entries with distinct indices.
pub struct BlobBuilder {
    data: Vec<u8>,
}

impl BlobBuilder {
    /// Create an empty builder holding only the reserved leading nul.
    #[must_use]
    pub fn new() -> Self {
        BlobBuilder { data: vec![0] }
    }

    /// Append a payload and return the index a table column should store.
    ///
    /// The empty payload maps to index 0, the reserved leading nul entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::CompressedOverflow`] if the payload is too
    /// long for the compressed length prefix.
    pub fn register(&mut self, payload: &[u8]) -> Result<u32> {
        if payload.is_empty() {
            return Ok(0);
        }

        let len = u32::try_from(payload.len())
            .map_err(|_| crate::Error::CompressedOverflow(u32::MAX))?;

        let index = self.data.len();
        let prefix_len = compressed_u32_len(len);
        self.data.resize(index + prefix_len, 0);

        let mut cursor = index;
        write_compressed_u32(&mut self.data, &mut cursor, len)?;
        self.data.extend_from_slice(payload);

        #[allow(clippy::cast_possible_truncation)]
        Ok(index as u32)
    }

    /// Consume the builder and return the heap bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

impl Default for BlobBuilder {
    fn default() -> Self {
        BlobBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        let data = &[0u8, 0x03, 0x41, 0x42, 0x43];
        let blob = Blob::from(data).unwrap();
        assert_eq!(blob.get(1).unwrap(), &[0x41, 0x42, 0x43]);
        assert_eq!(blob.get(0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn invalid() {
        assert!(Blob::from(&[]).is_err());
        assert!(Blob::from(&[0x22, 0x01, 0x41]).is_err());

        let blob = Blob::from(&[0x00, 0x05, 0x41]).unwrap();
        assert!(blob.get(1).is_err());
        assert!(blob.get(100).is_err());
    }

    #[test]
    fn iteration() {
        let data = &[0u8, 0x03, 0x41, 0x42, 0x43, 0x02, 0x44, 0x45];
        let blob = Blob::from(data).unwrap();

        let entries: Vec<_> = blob.iter().map(Result::unwrap).collect();
        assert_eq!(
            entries,
            vec![(1, &[0x41, 0x42, 0x43][..]), (5, &[0x44, 0x45][..])]
        );
    }

    #[test]
    fn builder_round_trip() {
        let mut builder = BlobBuilder::new();
        let first = builder.register(&[0x41, 0x42, 0x43]).unwrap();
        let second = builder.register(&[0x44, 0x45]).unwrap();
        let empty = builder.register(&[]).unwrap();

        assert_eq!(empty, 0);
        assert_ne!(first, second);

        let heap = builder.finish();
        let blob = Blob::from(&heap).unwrap();
        assert_eq!(blob.get(first as usize).unwrap(), &[0x41, 0x42, 0x43]);
        assert_eq!(blob.get(second as usize).unwrap(), &[0x44, 0x45]);
        assert_eq!(blob.get(0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn builder_no_dedup() {
        let mut builder = BlobBuilder::new();
        let first = builder.register(&[0x01]).unwrap();
        let second = builder.register(&[0x01]).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn builder_wide_prefix() {
        // 0x80 bytes needs the 2-byte length form.
        let payload = vec![0xAB_u8; 0x80];
        let mut builder = BlobBuilder::new();
        let index = builder.register(&payload).unwrap();

        let heap = builder.finish();
        let blob = Blob::from(&heap).unwrap();
        assert_eq!(blob.get(index as usize).unwrap(), &payload[..]);
    }
}
