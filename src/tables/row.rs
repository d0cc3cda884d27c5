//! Schema-driven row decoding and encoding.
//!
//! One decoder and one encoder interpret every table through its
//! [`TableSchema`]; there is no per-table parsing code. Malformed columns
//! are handled per the configured [`Strictness`]: `Strict` propagates the
//! first error, `Lenient` records a [`DecodeDiagnostic`], leaves the field
//! [`FieldValue::Absent`] and keeps going, so one bad heap index does not
//! discard an otherwise readable image.
//!
//! Columns of kind [`ColumnKind::RawValue`] store logical addresses that
//! cannot be interpreted while walking the row bytes; the decoder collects
//! them as [`PendingRaw`] entries for a second pass driven by an external
//! [`OffsetResolver`].

use super::coded::{decode_coded, encode_coded, CodedRef};
use super::schema::{ColumnKind, TableSchema};
use super::sizes::TableSizes;
use super::tableid::TableId;
use crate::heaps::{HeapKind, HeapResolver};
use crate::io::{read_le_at, read_le_at_dyn, write_le_at, write_le_at_dyn};
use crate::resolve::OffsetResolver;
use crate::Result;

/// Error policy for per-column decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Propagate the first malformed column.
    Strict,
    /// Default the field, record a diagnostic, continue.
    #[default]
    Lenient,
}

/// A decoded column value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    /// The column failed to decode (lenient mode) or is genuinely null.
    #[default]
    Absent,
    /// A fixed-width constant.
    Fixed(u32),
    /// Zero-based row index into the column's target table; `None` when
    /// the stored value was the null index 0.
    TableRef(Option<u32>),
    /// A coded reference, `None` for the null reference.
    CodedRef(Option<CodedRef>),
    /// A heap index, kept raw; payloads come from the [`HeapResolver`].
    HeapRef {
        /// Which heap the index points into.
        kind: HeapKind,
        /// The raw heap index.
        index: u32,
    },
    /// A logical address awaiting second-pass resolution.
    Raw {
        /// The logical address as stored.
        address: u32,
        /// The resolved offset, once second-pass resolution has run.
        offset: Option<usize>,
    },
}

/// One decoded table row: the 1-based row id and one field per schema
/// column, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// The 1-based row id.
    pub rid: u32,
    /// One field per schema column, in schema order.
    pub fields: Vec<FieldValue>,
}

impl Row {
    /// Create a row from its id and fields.
    #[must_use]
    pub fn new(rid: u32, fields: Vec<FieldValue>) -> Row {
        Row { rid, fields }
    }

    /// The field at `column`, if present.
    #[must_use]
    pub fn field(&self, column: usize) -> Option<&FieldValue> {
        self.fields.get(column)
    }
}

/// A column that failed to decode in lenient mode, with enough context to
/// locate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeDiagnostic {
    /// The table holding the bad column.
    pub table: TableId,
    /// The 1-based row id.
    pub rid: u32,
    /// The schema name of the column.
    pub column: &'static str,
    /// What went wrong.
    pub message: String,
}

/// A raw-value column noted during the first pass, waiting for offset
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRaw {
    /// The table the row belongs to.
    pub table: TableId,
    /// The 1-based row id.
    pub rid: u32,
    /// The column position within the schema.
    pub column: usize,
    /// The stored logical address.
    pub address: u32,
}

/// Schema interpreter for the read side.
pub struct RowDecoder<'s> {
    sizes: &'s TableSizes,
    strictness: Strictness,
    diagnostics: Vec<DecodeDiagnostic>,
    pending_raw: Vec<PendingRaw>,
}

impl<'s> RowDecoder<'s> {
    /// Create a decoder over the given size context and error policy.
    #[must_use]
    pub fn new(sizes: &'s TableSizes, strictness: Strictness) -> Self {
        RowDecoder {
            sizes,
            strictness,
            diagnostics: Vec::new(),
            pending_raw: Vec::new(),
        }
    }

    /// Diagnostics collected so far (lenient mode only).
    #[must_use]
    pub fn diagnostics(&self) -> &[DecodeDiagnostic] {
        &self.diagnostics
    }

    /// Raw-value columns still waiting for [`RowDecoder::resolve_raw`].
    #[must_use]
    pub fn pending_raw(&self) -> &[PendingRaw] {
        &self.pending_raw
    }

    /// Read `row_count` rows of `schema` starting at `offset`.
    ///
    /// # Errors
    /// In strict mode, returns the first malformed column. In lenient mode
    /// only a structurally impossible request fails; malformed columns
    /// become diagnostics.
    pub fn read_rows(
        &mut self,
        schema: &TableSchema,
        data: &[u8],
        offset: &mut usize,
        row_count: u32,
        resolver: &mut HeapResolver<'_>,
    ) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(row_count as usize);

        for rid in 1..=row_count {
            let mut fields = Vec::with_capacity(schema.columns.len());
            for column_index in 0..schema.columns.len() {
                let field =
                    self.read_column(schema, column_index, rid, data, offset, resolver)?;
                fields.push(field);
            }
            rows.push(Row::new(rid, fields));
        }

        Ok(rows)
    }

    fn read_column(
        &mut self,
        schema: &TableSchema,
        column_index: usize,
        rid: u32,
        data: &[u8],
        offset: &mut usize,
        resolver: &mut HeapResolver<'_>,
    ) -> Result<FieldValue> {
        let column = &schema.columns[column_index];
        let width = column.kind.byte_width(self.sizes);

        let raw = match width {
            1 => read_le_at::<u8>(data, offset).map(u32::from),
            _ => read_le_at_dyn(data, offset, width == 4),
        };

        let raw = match raw {
            Ok(raw) => raw,
            Err(error) => {
                // Keep the cursor in sync so later rows fail with their own
                // diagnostics instead of misaligned garbage.
                *offset = (*offset + width as usize).min(data.len());
                return self.column_failure(schema.id, rid, column.name, &error.to_string());
            }
        };

        match column.kind {
            ColumnKind::Fixed8 | ColumnKind::Fixed16 | ColumnKind::Fixed32 => {
                Ok(FieldValue::Fixed(raw))
            }
            ColumnKind::SimpleRef(target) => {
                if raw == 0 {
                    return Ok(FieldValue::TableRef(None));
                }
                if raw > self.sizes.row_count(target) {
                    return self.column_failure(
                        schema.id,
                        rid,
                        column.name,
                        &format!("row index {raw} exceeds {target:?} row count"),
                    );
                }
                Ok(FieldValue::TableRef(Some(raw - 1)))
            }
            ColumnKind::CodedRef(kind) => match decode_coded(kind, raw) {
                Ok(reference) => Ok(FieldValue::CodedRef(reference)),
                Err(error) => {
                    self.column_failure(schema.id, rid, column.name, &error.to_string())
                }
            },
            ColumnKind::HeapIdx(kind) => {
                if raw != 0 && resolver.resolve(kind, raw).is_none() {
                    return self.column_failure(
                        schema.id,
                        rid,
                        column.name,
                        &format!("heap index {raw} did not resolve in {kind:?}"),
                    );
                }
                Ok(FieldValue::HeapRef { kind, index: raw })
            }
            ColumnKind::RawValue => {
                self.pending_raw.push(PendingRaw {
                    table: schema.id,
                    rid,
                    column: column_index,
                    address: raw,
                });
                Ok(FieldValue::Raw { address: raw, offset: None })
            }
        }
    }

    fn column_failure(
        &mut self,
        table: TableId,
        rid: u32,
        column: &'static str,
        message: &str,
    ) -> Result<FieldValue> {
        match self.strictness {
            Strictness::Strict => Err(malformed_error!(
                "{:?} row {} column {}: {}",
                table,
                rid,
                column,
                message
            )),
            Strictness::Lenient => {
                self.diagnostics.push(DecodeDiagnostic {
                    table,
                    rid,
                    column,
                    message: message.to_string(),
                });
                Ok(FieldValue::Absent)
            }
        }
    }

    /// Second pass: resolve the pending raw values of `table` against an
    /// external offset resolver, patching `rows` in place.
    ///
    /// Pending entries of other tables are retained for their own pass.
    ///
    /// # Errors
    /// In strict mode, returns the first address the resolver rejects. In
    /// lenient mode a rejected address becomes a diagnostic and the field
    /// keeps `offset: None`.
    pub fn resolve_raw(
        &mut self,
        table: TableId,
        rows: &mut [Row],
        resolver: &dyn OffsetResolver,
    ) -> Result<()> {
        let pending = std::mem::take(&mut self.pending_raw);
        let mut failures = Vec::new();

        for entry in pending {
            if entry.table != table {
                self.pending_raw.push(entry);
                continue;
            }

            // Address 0 marks abstract/extern entries with no payload.
            if entry.address == 0 {
                continue;
            }

            let resolved = resolver.to_offset(entry.address);
            if resolved.is_none() {
                failures.push(entry);
                continue;
            }

            if let Some(row) = rows.get_mut((entry.rid - 1) as usize) {
                if let Some(field) = row.fields.get_mut(entry.column) {
                    *field = FieldValue::Raw { address: entry.address, offset: resolved };
                }
            }
        }

        for failure in failures {
            let column = super::schema::schema_for(table).columns[failure.column].name;
            self.column_failure(
                table,
                failure.rid,
                column,
                &format!("address {:#010x} did not resolve", failure.address),
            )?;
        }

        Ok(())
    }
}

/// Schema interpreter for the write side.
///
/// Heap indices are expected to already be registered with the heap
/// builders; rows carry the indices those registrations returned.
pub struct RowEncoder<'s> {
    sizes: &'s TableSizes,
}

impl<'s> RowEncoder<'s> {
    /// Create an encoder over the given size context.
    #[must_use]
    pub fn new(sizes: &'s TableSizes) -> Self {
        RowEncoder { sizes }
    }

    /// Write `rows` of `schema` at `offset`, columns in schema order.
    ///
    /// # Errors
    /// Returns an error when a field does not match its column's kind, a
    /// value does not fit the column's resolved width, or the buffer is too
    /// short.
    pub fn write_rows(
        &self,
        schema: &TableSchema,
        rows: &[Row],
        data: &mut [u8],
        offset: &mut usize,
    ) -> Result<()> {
        for row in rows {
            if row.fields.len() != schema.columns.len() {
                return Err(malformed_error!(
                    "{:?} row {} has {} fields, schema expects {}",
                    schema.id,
                    row.rid,
                    row.fields.len(),
                    schema.columns.len()
                ));
            }

            for (column_index, column) in schema.columns.iter().enumerate() {
                let raw = self.raw_value(schema, row, column_index)?;
                let width = column.kind.byte_width(self.sizes);

                match width {
                    1 => {
                        if raw > u32::from(u8::MAX) {
                            return Err(malformed_error!(
                                "{:?} column {} value {:#x} exceeds 1 byte",
                                schema.id,
                                column.name,
                                raw
                            ));
                        }
                        #[allow(clippy::cast_possible_truncation)]
                        write_le_at::<u8>(data, offset, raw as u8)?;
                    }
                    2 => {
                        if raw > u32::from(u16::MAX) {
                            return Err(malformed_error!(
                                "{:?} column {} value {:#x} exceeds 2 bytes",
                                schema.id,
                                column.name,
                                raw
                            ));
                        }
                        write_le_at_dyn(data, offset, raw, false)?;
                    }
                    _ => write_le_at_dyn(data, offset, raw, true)?,
                }
            }
        }

        Ok(())
    }

    /// The raw integer a field serializes to under its column's kind.
    fn raw_value(&self, schema: &TableSchema, row: &Row, column_index: usize) -> Result<u32> {
        let column = &schema.columns[column_index];

        let mismatch = || {
            malformed_error!(
                "{:?} row {} column {}: field does not match column kind",
                schema.id,
                row.rid,
                column.name
            )
        };

        match (&column.kind, &row.fields[column_index]) {
            // Absent fields serialize as the column's null value.
            (_, FieldValue::Absent) => Ok(0),
            (
                ColumnKind::Fixed8 | ColumnKind::Fixed16 | ColumnKind::Fixed32,
                FieldValue::Fixed(value),
            ) => Ok(*value),
            (ColumnKind::SimpleRef(_), FieldValue::TableRef(reference)) => {
                Ok(reference.map_or(0, |index| index + 1))
            }
            (ColumnKind::CodedRef(kind), FieldValue::CodedRef(reference)) => {
                encode_coded(*kind, *reference)
            }
            (ColumnKind::HeapIdx(kind), FieldValue::HeapRef { kind: field_kind, index }) => {
                if kind == field_kind {
                    Ok(*index)
                } else {
                    Err(mismatch())
                }
            }
            (ColumnKind::RawValue, FieldValue::Raw { address, .. }) => Ok(*address),
            _ => Err(mismatch()),
        }
    }
}
