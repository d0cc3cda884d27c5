//! Cached heap lookup shared by the row decoder.
//!
//! [`HeapResolver`] fronts the four heap readers with a per-index cache.
//! The first resolution of an index wins; extraction failures are cached as
//! absent rather than retried, so a malformed entry costs one failed parse
//! per pass instead of one per referencing row. Failures are surfaced to the
//! caller as `None` and reported through the row decoder's diagnostics, not
//! retried here.
//!
//! A resolver instance is single-reader/single-writer: decode or encode
//! passes that run concurrently must each own their own resolver.

use std::collections::HashMap;

use widestring::U16String;

use super::{Blob, GuidHeap, HeapKind, Strings, UserStrings};

/// A resolved heap payload, one variant per heap family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeapPayload {
    /// `#Blob` payload bytes.
    Blob(Vec<u8>),
    /// `#Strings` entry.
    Str(String),
    /// `#US` literal.
    UserStr(U16String),
    /// `#GUID` entry.
    Guid(uguid::Guid),
}

/// Fault-tolerant, caching front over the heaps of one metadata image.
#[derive(Default)]
pub struct HeapResolver<'a> {
    blob: Option<Blob<'a>>,
    strings: Option<Strings<'a>>,
    user_strings: Option<UserStrings<'a>>,
    guids: Option<GuidHeap<'a>>,
    cache: HashMap<(HeapKind, u32), Option<HeapPayload>>,
}

impl<'a> HeapResolver<'a> {
    /// Create a resolver with no heaps attached.
    #[must_use]
    pub fn new() -> Self {
        HeapResolver::default()
    }

    /// Attach a `#Blob` heap reader.
    #[must_use]
    pub fn with_blob(mut self, blob: Blob<'a>) -> Self {
        self.blob = Some(blob);
        self
    }

    /// Attach a `#Strings` heap reader.
    #[must_use]
    pub fn with_strings(mut self, strings: Strings<'a>) -> Self {
        self.strings = Some(strings);
        self
    }

    /// Attach a `#US` heap reader.
    #[must_use]
    pub fn with_user_strings(mut self, user_strings: UserStrings<'a>) -> Self {
        self.user_strings = Some(user_strings);
        self
    }

    /// Attach a `#GUID` heap reader.
    #[must_use]
    pub fn with_guids(mut self, guids: GuidHeap<'a>) -> Self {
        self.guids = Some(guids);
        self
    }

    /// Resolve a heap index to its payload.
    ///
    /// Index 0 is the absent marker for every heap kind and always yields
    /// `None`. A missing heap or a failed extraction also yields `None`;
    /// failed extractions are cached so they are not retried.
    pub fn resolve(&mut self, kind: HeapKind, index: u32) -> Option<HeapPayload> {
        if index == 0 {
            return None;
        }

        if let Some(cached) = self.cache.get(&(kind, index)) {
            return cached.clone();
        }

        let resolved = self.extract(kind, index);
        self.cache.insert((kind, index), resolved.clone());
        resolved
    }

    fn extract(&self, kind: HeapKind, index: u32) -> Option<HeapPayload> {
        let index = index as usize;
        match kind {
            HeapKind::Blob => self
                .blob
                .as_ref()?
                .get(index)
                .ok()
                .map(|bytes| HeapPayload::Blob(bytes.to_vec())),
            HeapKind::Strings => self
                .strings
                .as_ref()?
                .get(index)
                .ok()
                .map(|value| HeapPayload::Str(value.to_string())),
            HeapKind::UserStrings => self
                .user_strings
                .as_ref()?
                .get(index)
                .ok()
                .map(HeapPayload::UserStr),
            HeapKind::Guid => self.guids.as_ref()?.get(index).ok().map(HeapPayload::Guid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_each_kind() {
        let blob_data = [0x00, 0x02, 0xAB, 0xCD];
        let strings_data = [0x00, 0x41, 0x42, 0x00];
        let guid_data = [0xAA; 16];

        let mut resolver = HeapResolver::new()
            .with_blob(Blob::from(&blob_data).unwrap())
            .with_strings(Strings::from(&strings_data).unwrap())
            .with_guids(GuidHeap::from(&guid_data).unwrap());

        assert_eq!(
            resolver.resolve(HeapKind::Blob, 1),
            Some(HeapPayload::Blob(vec![0xAB, 0xCD]))
        );
        assert_eq!(
            resolver.resolve(HeapKind::Strings, 1),
            Some(HeapPayload::Str("AB".to_string()))
        );
        assert!(matches!(
            resolver.resolve(HeapKind::Guid, 1),
            Some(HeapPayload::Guid(_))
        ));
    }

    #[test]
    fn zero_is_absent() {
        let mut resolver = HeapResolver::new();
        assert_eq!(resolver.resolve(HeapKind::Blob, 0), None);
        assert_eq!(resolver.resolve(HeapKind::Guid, 0), None);
    }

    #[test]
    fn missing_heap_is_absent() {
        let mut resolver = HeapResolver::new();
        assert_eq!(resolver.resolve(HeapKind::Strings, 1), None);
    }

    #[test]
    fn failures_cached_as_absent() {
        // Length prefix runs past the heap end.
        let blob_data = [0x00, 0x7F, 0x01];
        let mut resolver = HeapResolver::new().with_blob(Blob::from(&blob_data).unwrap());

        assert_eq!(resolver.resolve(HeapKind::Blob, 1), None);
        // Second lookup is served from the cache, still absent.
        assert_eq!(resolver.resolve(HeapKind::Blob, 1), None);
        assert!(resolver.cache.contains_key(&(HeapKind::Blob, 1)));
    }

    #[test]
    fn cache_first_resolution_wins() {
        let blob_data = [0x00, 0x01, 0x5A];
        let mut resolver = HeapResolver::new().with_blob(Blob::from(&blob_data).unwrap());

        let first = resolver.resolve(HeapKind::Blob, 1);
        let second = resolver.resolve(HeapKind::Blob, 1);
        assert_eq!(first, second);
        assert_eq!(first, Some(HeapPayload::Blob(vec![0x5A])));
    }
}
