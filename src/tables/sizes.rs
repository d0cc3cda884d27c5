//! Global size context for column width resolution.
//!
//! Column widths in the tables stream are not fixed: simple and coded
//! references widen to 4 bytes when a target table has too many rows for a
//! `u16`, and heap indices widen when the header's heap-size flags say the
//! heap outgrew 16 bits. [`TableSizes`] captures the row counts of every
//! table plus the heap flags once, caches the bit width of every coded
//! reference family, and answers all width queries during row decode and
//! encode.

use bitflags::bitflags;
use strum::{EnumCount, IntoEnumIterator};

use super::coded::CodedRefKind;
use super::tableid::TableId;
use crate::heaps::HeapKind;

bitflags! {
    /// Heap-size flags from byte 6 of the tables stream header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeapSizeFlags: u8 {
        /// `#Strings` indices are 4 bytes.
        const WIDE_STRINGS = 0x01;
        /// `#GUID` indices are 4 bytes.
        const WIDE_GUIDS = 0x02;
        /// `#Blob` indices are 4 bytes.
        const WIDE_BLOBS = 0x04;
    }
}

impl HeapSizeFlags {
    /// Derive the header flags from final heap byte lengths.
    ///
    /// A heap larger than 0xFFFF bytes holds offsets that no longer fit a
    /// 2-byte index, so its flag is set and every column indexing it
    /// widens to 4 bytes.
    #[must_use]
    pub fn from_heap_sizes(strings: usize, guids: usize, blobs: usize) -> Self {
        let mut flags = HeapSizeFlags::empty();
        if strings > 0xFFFF {
            flags |= HeapSizeFlags::WIDE_STRINGS;
        }
        if guids > 0xFFFF {
            flags |= HeapSizeFlags::WIDE_GUIDS;
        }
        if blobs > 0xFFFF {
            flags |= HeapSizeFlags::WIDE_BLOBS;
        }
        flags
    }
}

/// Row count of one table together with its derived index widths.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TableRows {
    /// The count of rows in this table.
    pub rows: u32,
    /// Number of bits required to represent any valid row index.
    pub bits: u8,
    /// Whether references into this table need 4 bytes instead of 2.
    pub is_large: bool,
}

impl TableRows {
    /// Compute the index widths for a table with `rows` rows.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            // 0xFFFF rows already collide with the narrow null encoding.
            is_large: rows > 0xFFFE,
        }
    }
}

/// Row counts and heap widths for one tables stream.
#[derive(Clone)]
pub struct TableSizes {
    rows: Vec<TableRows>,
    coded_bits: Vec<u8>,
    heap_flags: HeapSizeFlags,
}

impl TableSizes {
    /// Build the size context from `(table, row count)` pairs and the
    /// header heap flags. Tables not listed are absent with zero rows.
    #[must_use]
    pub fn new(tables: &[(TableId, u32)], heap_flags: HeapSizeFlags) -> Self {
        let mut sizes = TableSizes {
            rows: vec![TableRows::new(0); TableId::COUNT],
            coded_bits: vec![0; CodedRefKind::COUNT],
            heap_flags,
        };

        for (table, rows) in tables {
            sizes.rows[*table as usize] = TableRows::new(*rows);
        }

        sizes.cache_coded_bits();
        sizes
    }

    fn cache_coded_bits(&mut self) {
        for kind in CodedRefKind::iter() {
            let max_bits = kind
                .candidates()
                .iter()
                .flatten()
                .map(|table| self.rows[*table as usize].bits)
                .max()
                .unwrap_or(1);

            self.coded_bits[kind as usize] = max_bits + kind.tag_bits();
        }
    }

    /// Per-table row metadata.
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRows {
        &self.rows[table as usize]
    }

    /// Number of rows in `table`; 0 when absent.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Whether references into `table` need 4 bytes.
    #[must_use]
    pub fn is_large(&self, table: TableId) -> bool {
        self.rows[table as usize].is_large
    }

    /// Byte width of a simple reference into `table`.
    #[must_use]
    pub fn table_ref_bytes(&self, table: TableId) -> u8 {
        if self.rows[table as usize].is_large {
            4
        } else {
            2
        }
    }

    /// The header heap-size flags.
    #[must_use]
    pub fn heap_flags(&self) -> HeapSizeFlags {
        self.heap_flags
    }

    /// Whether indices into `kind` are 4 bytes wide.
    ///
    /// `#US` is never indexed from table columns; it always reports narrow.
    #[must_use]
    pub fn is_wide_heap(&self, kind: HeapKind) -> bool {
        match kind {
            HeapKind::Strings => self.heap_flags.contains(HeapSizeFlags::WIDE_STRINGS),
            HeapKind::Guid => self.heap_flags.contains(HeapSizeFlags::WIDE_GUIDS),
            HeapKind::Blob => self.heap_flags.contains(HeapSizeFlags::WIDE_BLOBS),
            HeapKind::UserStrings => false,
        }
    }

    /// Byte width of a heap index column for `kind`.
    #[must_use]
    pub fn heap_bytes(&self, kind: HeapKind) -> u8 {
        if self.is_wide_heap(kind) {
            4
        } else {
            2
        }
    }

    /// Cached total bit width (tag + row index) of a coded reference.
    #[must_use]
    pub fn coded_bits(&self, kind: CodedRefKind) -> u8 {
        self.coded_bits[kind as usize]
    }

    /// Byte width of a coded reference column.
    #[must_use]
    pub fn coded_bytes(&self, kind: CodedRefKind) -> u8 {
        if self.coded_bits[kind as usize] > 16 {
            4
        } else {
            2
        }
    }
}
