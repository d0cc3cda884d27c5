//! The `#~` tables stream: header parsing, table placement and the write
//! path.
//!
//! Stream layout (II.24.2.6): 4 reserved bytes, 1-byte major and minor
//! version, the heap-size flags byte, 1 reserved byte, the 8-byte valid
//! bitmask, the 8-byte sorted bitmask, one 4-byte row count per set valid
//! bit in ascending bit order, then the row data of every present table in
//! the same order.
//!
//! Parsing is a single linear pass: read the header, build the
//! [`TableSizes`] context, then derive every table's start offset from the
//! cumulative row widths. Row decoding itself is on demand per table via
//! [`TablesStream::read_table`] or [`TablesStream::raw_row`].

use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use super::row::{Row, RowDecoder, RowEncoder};
use super::schema::schema_for;
use super::sizes::{HeapSizeFlags, TableSizes};
use super::tableid::TableId;
use crate::heaps::HeapResolver;
use crate::io::{read_le_at, read_le_at_dyn, write_le_at};
use crate::{Error::OutOfBounds, Result};

/// Byte length of the fixed header before the row counts.
const HEADER_LEN: usize = 24;

/// A parsed `#~` tables stream over an in-memory buffer.
pub struct TablesStream<'a> {
    data: &'a [u8],
    major_version: u8,
    minor_version: u8,
    valid: u64,
    sorted: u64,
    sizes: TableSizes,
    offsets: Vec<usize>,
}

impl<'a> TablesStream<'a> {
    /// Parse the stream header and compute every table's start offset.
    ///
    /// Valid bits above the last known table are tolerated: their row
    /// counts are consumed to keep the cursor in sync, but the tables are
    /// treated as absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than
    /// the header plus its row-count array.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(OutOfBounds);
        }

        let mut offset = 4;
        let major_version = read_le_at::<u8>(data, &mut offset)?;
        let minor_version = read_le_at::<u8>(data, &mut offset)?;
        let heap_flags = HeapSizeFlags::from_bits_truncate(read_le_at::<u8>(data, &mut offset)?);

        offset = 8;
        let valid = read_le_at::<u64>(data, &mut offset)?;
        let sorted = read_le_at::<u64>(data, &mut offset)?;

        let mut row_counts = Vec::new();
        for bit in 0..64_u8 {
            if (valid & (1_u64 << bit)) == 0 {
                continue;
            }

            let rows = read_le_at::<u32>(data, &mut offset)?;
            if let Ok(table) = TableId::from_tag(bit) {
                row_counts.push((table, rows));
            }
        }

        let sizes = TableSizes::new(&row_counts, heap_flags);

        // Row data follows the row-count array; tables are laid out in
        // ascending tag order, each occupying rows * row_width bytes.
        let mut offsets = vec![0_usize; TableId::iter().count()];
        let mut cursor = offset;
        for table in TableId::iter() {
            offsets[table as usize] = cursor;
            let rows = sizes.row_count(table) as usize;
            if rows > 0 {
                cursor += rows * schema_for(table).row_width(&sizes) as usize;
            }
        }

        Ok(TablesStream {
            data,
            major_version,
            minor_version,
            valid,
            sorted,
            sizes,
            offsets,
        })
    }

    /// Major version byte of the stream header.
    #[must_use]
    pub fn major_version(&self) -> u8 {
        self.major_version
    }

    /// Minor version byte of the stream header.
    #[must_use]
    pub fn minor_version(&self) -> u8 {
        self.minor_version
    }

    /// The size context derived from the header.
    #[must_use]
    pub fn sizes(&self) -> &TableSizes {
        &self.sizes
    }

    /// Tables marked present in the valid bitmask, in ascending tag order.
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        TableId::iter().filter(|table| self.is_present(*table))
    }

    /// Whether `table` is marked valid and has at least one row.
    #[must_use]
    pub fn is_present(&self, table: TableId) -> bool {
        (self.valid & (1_u64 << (table as u8))) != 0 && self.sizes.row_count(table) > 0
    }

    /// Whether the header's sorted bitmask marks `table` as sorted.
    #[must_use]
    pub fn is_sorted(&self, table: TableId) -> bool {
        (self.sorted & (1_u64 << (table as u8))) != 0
    }

    /// Number of rows in `table`; 0 when absent.
    #[must_use]
    pub fn table_row_count(&self, table: TableId) -> u32 {
        self.sizes.row_count(table)
    }

    /// Start offset of `table`'s row data, or `None` when absent.
    #[must_use]
    pub fn table_offset(&self, table: TableId) -> Option<usize> {
        self.is_present(table).then(|| self.offsets[table as usize])
    }

    /// Decode every row of `table` through the given decoder and heap
    /// resolver.
    ///
    /// An absent table decodes to no rows.
    ///
    /// # Errors
    /// Propagates decode errors per the decoder's strictness.
    pub fn read_table(
        &self,
        table: TableId,
        decoder: &mut RowDecoder<'_>,
        resolver: &mut HeapResolver<'_>,
    ) -> Result<Vec<Row>> {
        let Some(start) = self.table_offset(table) else {
            return Ok(Vec::new());
        };

        let mut offset = start;
        decoder.read_rows(
            schema_for(table),
            self.data,
            &mut offset,
            self.sizes.row_count(table),
            resolver,
        )
    }

    /// Raw column values of one row, without heap resolution or reference
    /// interpretation.
    ///
    /// `rid` is 1-based. Returns `None` for an absent table, an
    /// out-of-range row, or a truncated buffer; this accessor never errors.
    #[must_use]
    pub fn raw_row(&self, table: TableId, rid: u32) -> Option<Vec<u32>> {
        let start = self.table_offset(table)?;
        if rid == 0 || rid > self.sizes.row_count(table) {
            return None;
        }

        let schema = schema_for(table);
        let row_width = schema.row_width(&self.sizes) as usize;
        let mut offset = start + (rid as usize - 1) * row_width;

        let mut values = Vec::with_capacity(schema.columns.len());
        for column in schema.columns {
            let width = column.kind.byte_width(&self.sizes);
            let raw = match width {
                1 => read_le_at::<u8>(self.data, &mut offset).map(u32::from),
                _ => read_le_at_dyn(self.data, &mut offset, width == 4),
            };
            values.push(raw.ok()?);
        }

        Some(values)
    }
}

/// Serializer for a `#~` tables stream.
///
/// Rows are supplied per table via [`TablesStreamBuilder::add_table`];
/// heap indices inside the rows must come from the heap builders that
/// produced the companion heaps. [`TablesStreamBuilder::finish`] derives
/// the size context from the accumulated row counts, so column widths on
/// disk always agree with the header.
pub struct TablesStreamBuilder {
    major_version: u8,
    minor_version: u8,
    heap_flags: HeapSizeFlags,
    sorted: u64,
    tables: BTreeMap<TableId, Vec<Row>>,
}

impl TablesStreamBuilder {
    /// Create an empty builder with stream version 2.0.
    #[must_use]
    pub fn new() -> Self {
        TablesStreamBuilder {
            major_version: 2,
            minor_version: 0,
            heap_flags: HeapSizeFlags::default(),
            sorted: 0,
            tables: BTreeMap::new(),
        }
    }

    /// Override the header version bytes.
    #[must_use]
    pub fn with_versions(mut self, major: u8, minor: u8) -> Self {
        self.major_version = major;
        self.minor_version = minor;
        self
    }

    /// Set the heap-size flags the header and column widths follow, as
    /// derived by [`HeapSizeFlags::from_heap_sizes`] from the final heaps.
    #[must_use]
    pub fn with_heap_flags(mut self, heap_flags: HeapSizeFlags) -> Self {
        self.heap_flags = heap_flags;
        self
    }

    /// Mark `table` in the sorted bitmask.
    pub fn mark_sorted(&mut self, table: TableId) {
        self.sorted |= 1_u64 << (table as u8);
    }

    /// Set the rows of `table`. An empty row list removes the table from
    /// the stream.
    pub fn add_table(&mut self, table: TableId, rows: Vec<Row>) {
        if rows.is_empty() {
            self.tables.remove(&table);
        } else {
            self.tables.insert(table, rows);
        }
    }

    /// Serialize header, row counts and row data.
    ///
    /// # Errors
    /// Propagates row encoding errors (kind mismatches, values that do not
    /// fit their column width).
    pub fn finish(self) -> Result<Vec<u8>> {
        let row_counts: Vec<(TableId, u32)> = self
            .tables
            .iter()
            .map(|(table, rows)| {
                #[allow(clippy::cast_possible_truncation)]
                (*table, rows.len() as u32)
            })
            .collect();
        let sizes = TableSizes::new(&row_counts, self.heap_flags);

        let mut valid = 0_u64;
        let mut total = HEADER_LEN + 4 * self.tables.len();
        for table in self.tables.keys() {
            valid |= 1_u64 << (*table as u8);
            total += sizes.row_count(*table) as usize
                * schema_for(*table).row_width(&sizes) as usize;
        }

        let mut data = vec![0_u8; total];
        let mut offset = 4;
        write_le_at::<u8>(&mut data, &mut offset, self.major_version)?;
        write_le_at::<u8>(&mut data, &mut offset, self.minor_version)?;
        write_le_at::<u8>(&mut data, &mut offset, self.heap_flags.bits())?;

        offset = 8;
        write_le_at::<u64>(&mut data, &mut offset, valid)?;
        write_le_at::<u64>(&mut data, &mut offset, self.sorted)?;

        for (_, rows) in &self.tables {
            #[allow(clippy::cast_possible_truncation)]
            write_le_at::<u32>(&mut data, &mut offset, rows.len() as u32)?;
        }

        let encoder = RowEncoder::new(&sizes);
        for (table, rows) in &self.tables {
            encoder.write_rows(schema_for(*table), rows, &mut data, &mut offset)?;
        }

        Ok(data)
    }
}

impl Default for TablesStreamBuilder {
    fn default() -> Self {
        TablesStreamBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heaps::HeapKind;
    use crate::tables::row::{FieldValue, Strictness};

    fn module_row() -> Row {
        Row::new(
            1,
            vec![
                FieldValue::Fixed(0),
                FieldValue::HeapRef { kind: HeapKind::Strings, index: 0 },
                FieldValue::HeapRef { kind: HeapKind::Guid, index: 1 },
                FieldValue::HeapRef { kind: HeapKind::Guid, index: 0 },
                FieldValue::HeapRef { kind: HeapKind::Guid, index: 0 },
            ],
        )
    }

    fn typedef_row(rid: u32) -> Row {
        Row::new(
            rid,
            vec![
                FieldValue::Fixed(0x0010_0001),
                FieldValue::HeapRef { kind: HeapKind::Strings, index: 0 },
                FieldValue::HeapRef { kind: HeapKind::Strings, index: 0 },
                FieldValue::CodedRef(None),
                FieldValue::TableRef(None),
                FieldValue::TableRef(Some(0)),
            ],
        )
    }

    fn methoddef_row(rid: u32) -> Row {
        Row::new(
            rid,
            vec![
                FieldValue::Raw { address: 0x2000 + rid, offset: None },
                FieldValue::Fixed(0),
                FieldValue::Fixed(0x0006),
                FieldValue::HeapRef { kind: HeapKind::Strings, index: 0 },
                FieldValue::HeapRef { kind: HeapKind::Blob, index: 0 },
                FieldValue::TableRef(None),
            ],
        )
    }

    fn sample_stream() -> Vec<u8> {
        let mut builder = TablesStreamBuilder::new();
        builder.add_table(TableId::Module, vec![module_row()]);
        builder.add_table(TableId::TypeDef, (1..=3).map(typedef_row).collect());
        builder.add_table(TableId::MethodDef, (1..=10).map(methoddef_row).collect());
        builder.mark_sorted(TableId::TypeDef);
        builder.finish().unwrap()
    }

    #[test]
    fn header_fields() {
        let data = sample_stream();
        let stream = TablesStream::parse(&data).unwrap();

        assert_eq!(stream.major_version(), 2);
        assert_eq!(stream.minor_version(), 0);
        assert_eq!(
            stream.present_tables().collect::<Vec<_>>(),
            vec![TableId::Module, TableId::TypeDef, TableId::MethodDef]
        );
        assert_eq!(stream.table_row_count(TableId::Module), 1);
        assert_eq!(stream.table_row_count(TableId::TypeDef), 3);
        assert_eq!(stream.table_row_count(TableId::MethodDef), 10);
        assert!(stream.is_sorted(TableId::TypeDef));
        assert!(!stream.is_sorted(TableId::Module));
    }

    #[test]
    fn table_offsets_are_cumulative() {
        let data = sample_stream();
        let stream = TablesStream::parse(&data).unwrap();

        // Header: 24 bytes + 3 row counts.
        let header_end = 24 + 3 * 4;
        let module_width = schema_for(TableId::Module).row_width(stream.sizes()) as usize;
        let typedef_width = schema_for(TableId::TypeDef).row_width(stream.sizes()) as usize;

        assert_eq!(stream.table_offset(TableId::Module), Some(header_end));
        assert_eq!(
            stream.table_offset(TableId::TypeDef),
            Some(header_end + module_width)
        );
        assert_eq!(
            stream.table_offset(TableId::MethodDef),
            Some(header_end + module_width + 3 * typedef_width)
        );
        assert_eq!(stream.table_offset(TableId::Field), None);
    }

    #[test]
    fn builder_carries_derived_heap_flags() {
        let flags = HeapSizeFlags::from_heap_sizes(0x2_0000, 0x10, 0x10);
        let mut builder = TablesStreamBuilder::new().with_heap_flags(flags);
        builder.add_table(TableId::Module, vec![module_row()]);
        let data = builder.finish().unwrap();

        let stream = TablesStream::parse(&data).unwrap();
        assert!(stream.sizes().is_wide_heap(HeapKind::Strings));
        assert!(!stream.sizes().is_wide_heap(HeapKind::Guid));
        // Module row widens: 2 + 4 (name) + 3 * 2 (guids) = 12 bytes.
        assert_eq!(schema_for(TableId::Module).row_width(stream.sizes()), 12);
    }

    #[test]
    fn round_trip_rows() {
        let data = sample_stream();
        let stream = TablesStream::parse(&data).unwrap();

        let mut decoder = RowDecoder::new(stream.sizes(), Strictness::Strict);
        let mut resolver = HeapResolver::new();

        let typedefs = stream
            .read_table(TableId::TypeDef, &mut decoder, &mut resolver)
            .unwrap();
        assert_eq!(typedefs, (1..=3).map(typedef_row).collect::<Vec<_>>());

        let methods = stream
            .read_table(TableId::MethodDef, &mut decoder, &mut resolver)
            .unwrap();
        assert_eq!(methods.len(), 10);
        assert_eq!(decoder.pending_raw().len(), 10);
    }

    #[test]
    fn raw_row_access() {
        let data = sample_stream();
        let stream = TablesStream::parse(&data).unwrap();

        // MethodDef row 4: RVA column is raw address 0x2004.
        let values = stream.raw_row(TableId::MethodDef, 4).unwrap();
        assert_eq!(values[0], 0x2004);
        // Flags column.
        assert_eq!(values[2], 0x0006);
    }

    #[test]
    fn raw_row_not_found() {
        let data = sample_stream();
        let stream = TablesStream::parse(&data).unwrap();

        assert_eq!(stream.raw_row(TableId::Field, 1), None);
        assert_eq!(stream.raw_row(TableId::MethodDef, 0), None);
        assert_eq!(stream.raw_row(TableId::MethodDef, 11), None);
    }

    #[test]
    fn absent_table_reads_empty() {
        let data = sample_stream();
        let stream = TablesStream::parse(&data).unwrap();

        let mut decoder = RowDecoder::new(stream.sizes(), Strictness::Strict);
        let mut resolver = HeapResolver::new();
        let rows = stream
            .read_table(TableId::Event, &mut decoder, &mut resolver)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn truncated_header() {
        assert!(matches!(TablesStream::parse(&[0_u8; 10]), Err(OutOfBounds)));

        // Valid bitmask announces a table but the row count is missing.
        let mut data = vec![0_u8; 24];
        data[8] = 0x01;
        assert!(matches!(TablesStream::parse(&data), Err(OutOfBounds)));
    }

    #[test]
    fn unknown_valid_bits_are_tolerated() {
        // Bit 0x30 is outside the defined tables; its row count must be
        // consumed without shifting later tables.
        let mut builder = TablesStreamBuilder::new();
        builder.add_table(TableId::Module, vec![module_row()]);
        let mut data = builder.finish().unwrap();

        // Set bit 0x30 and append its row count after Module's.
        data[14] |= 0x01; // bit 48 of the valid mask at bytes 8..16
        let insert_at = 24 + 4;
        for (position, byte) in 7_u32.to_le_bytes().iter().enumerate() {
            data.insert(insert_at + position, *byte);
        }

        let stream = TablesStream::parse(&data).unwrap();
        assert_eq!(stream.table_row_count(TableId::Module), 1);
        assert_eq!(stream.table_offset(TableId::Module), Some(24 + 2 * 4));
    }
}
