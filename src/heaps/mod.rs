//! Metadata heap codecs.
//!
//! The four ECMA-335 heaps each get a zero-copy reader over an in-memory
//! byte slice and a builder that appends payloads and hands back the index
//! a table row stores. Index 0 means "absent" for the `#Strings`, `#US` and
//! `#Blob` heaps (their first byte is a mandatory nul); the `#GUID` heap is
//! 1-based with fixed 16-byte entries and has no reserved leading byte.
//!
//! Cached, fault-tolerant lookup across all four heaps lives in
//! [`HeapResolver`].

mod blob;
mod guid;
mod resolver;
mod strings;
mod userstrings;

pub use blob::{Blob, BlobBuilder, BlobIterator};
pub use guid::{GuidBuilder, GuidHeap};
pub use resolver::{HeapPayload, HeapResolver};
pub use strings::{Strings, StringsBuilder, StringsIterator};
pub use userstrings::{UserStrings, UserStringsBuilder, UserStringsIterator};

/// The four heap families a metadata column can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapKind {
    /// `#Blob` - length-prefixed binary payloads.
    Blob,
    /// `#Strings` - nul-terminated UTF-8 system strings.
    Strings,
    /// `#US` - length-prefixed UTF-16 user string literals.
    UserStrings,
    /// `#GUID` - fixed 16-byte entries, 1-based index.
    Guid,
}
