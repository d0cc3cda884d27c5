//! GUID heap (`#GUID`) reader and builder.
//!
//! The heap is a plain array of 16-byte GUIDs referenced by 1-based
//! ordinal; index 0 means "absent". There is no leading reserved byte and
//! an empty heap is legal.
//!
//! ## Reference
//! * ECMA-335 6th edition, II.24.2.5

use crate::{Error::OutOfBounds, Result};

/// Reader over a `#GUID` heap.
pub struct GuidHeap<'a> {
    data: &'a [u8],
}

impl<'a> GuidHeap<'a> {
    /// Create a `GuidHeap` reader from the heap bytes.
    ///
    /// # Errors
    /// Returns an error if the data is not a whole number of 16-byte
    /// entries.
    pub fn from(data: &'a [u8]) -> Result<GuidHeap<'a>> {
        if data.len() % 16 != 0 {
            return Err(malformed_error!(
                "Invalid #GUID heap size - {}",
                data.len()
            ));
        }

        Ok(GuidHeap { data })
    }

    /// Returns the GUID at the 1-based `index`.
    ///
    /// # Errors
    /// Returns an error for index 0 or an index past the end of the heap.
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index < 1 || index * 16 > self.data.len() {
            return Err(OutOfBounds);
        }

        let offset = (index - 1) * 16;
        let mut buffer = [0_u8; 16];
        buffer.copy_from_slice(&self.data[offset..offset + 16]);

        Ok(uguid::Guid::from_bytes(buffer))
    }

    /// Number of GUIDs in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / 16
    }

    /// Whether the heap holds no GUIDs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all GUIDs with their 1-based ordinals.
    pub fn iter(&self) -> impl Iterator<Item = (usize, uguid::Guid)> + 'a {
        self.data.chunks_exact(16).enumerate().map(|(position, chunk)| {
            let mut buffer = [0_u8; 16];
            buffer.copy_from_slice(chunk);
            (position + 1, uguid::Guid::from_bytes(buffer))
        })
    }
}

/// Builder producing a `#GUID` heap byte buffer.
#[derive(Default)]
pub struct GuidBuilder {
    data: Vec<u8>,
}

impl GuidBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        GuidBuilder { data: Vec::new() }
    }

    /// Append a GUID and return its 1-based ordinal.
    #[must_use]
    pub fn register(&mut self, guid: uguid::Guid) -> u32 {
        self.data.extend_from_slice(&guid.to_bytes());

        #[allow(clippy::cast_possible_truncation)]
        {
            (self.data.len() / 16) as u32
        }
    }

    /// Consume the builder and return the heap bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data: [u8; 32] = [
            0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6, 0x99, 0xbe, 0xa5,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
        ];

        let guids = GuidHeap::from(&data).unwrap();
        assert_eq!(guids.len(), 2);
        assert_eq!(
            guids.get(1).unwrap(),
            uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5")
        );
        assert_eq!(
            guids.get(2).unwrap(),
            uguid::guid!("AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA")
        );
    }

    #[test]
    fn invalid() {
        assert!(GuidHeap::from(&[0xAA; 15]).is_err());

        let guids = GuidHeap::from(&[0xAA; 16]).unwrap();
        assert!(guids.get(0).is_err());
        assert!(guids.get(2).is_err());
    }

    #[test]
    fn empty_heap() {
        let guids = GuidHeap::from(&[]).unwrap();
        assert!(guids.is_empty());
        assert!(guids.get(1).is_err());
    }

    #[test]
    fn builder_round_trip() {
        let mvid = uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5");

        let mut builder = GuidBuilder::new();
        let first = builder.register(mvid);
        let second = builder.register(uguid::Guid::ZERO);
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let heap = builder.finish();
        let guids = GuidHeap::from(&heap).unwrap();
        assert_eq!(guids.get(1).unwrap(), mvid);
        assert_eq!(guids.get(2).unwrap(), uguid::Guid::ZERO);
    }
}
