//! Seams to the collaborators the stream codec does not own.
//!
//! Raw-value columns store logical addresses (method body RVAs, field
//! data RVAs, resource offsets) whose mapping to file layout belongs to
//! the PE reader, and some blob payloads are structured signatures whose
//! grammar belongs to a signature layer. Both stay behind traits so the
//! codec can be driven without either.

use crate::Result;

/// Maps logical addresses to absolute buffer offsets during the second
/// decode pass over raw-value columns.
pub trait OffsetResolver {
    /// Translate `address`, or `None` when it maps to no content.
    fn to_offset(&self, address: u32) -> Option<usize>;
}

/// Codec for the structured signatures stored in `#Blob` payloads.
///
/// The signature grammar is opaque to the table codec; columns only carry
/// the heap index.
pub trait SignatureCodec {
    /// The structured signature representation.
    type Signature;

    /// Parse a signature from its blob payload.
    ///
    /// # Errors
    /// Returns an error when the payload is not a well-formed signature.
    fn read_signature(&self, payload: &[u8]) -> Result<Self::Signature>;

    /// Serialize a signature back into blob payload bytes.
    ///
    /// # Errors
    /// Returns an error when the signature cannot be represented.
    fn write_signature(&self, signature: &Self::Signature) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_backed_resolver() {
        struct TwoSections;
        impl OffsetResolver for TwoSections {
            fn to_offset(&self, address: u32) -> Option<usize> {
                match address {
                    0x2000..=0x2FFF => Some(address as usize - 0x2000 + 0x200),
                    0x4000..=0x4FFF => Some(address as usize - 0x4000 + 0x1200),
                    _ => None,
                }
            }
        }

        let resolver = TwoSections;
        assert_eq!(resolver.to_offset(0x2010), Some(0x210));
        assert_eq!(resolver.to_offset(0x4000), Some(0x1200));
        assert_eq!(resolver.to_offset(0x9999), None);
    }
}
