//! The `#~` tables stream codec.
//!
//! Split along the concerns of the on-disk format:
//! - [`tableid`]: the table tag enumeration
//! - [`schema`]: static per-table column layouts and the [`ColumnKind`]
//!   interpretation of each column
//! - [`coded`]: tagged multi-table references
//! - [`sizes`]: the global size context that resolves column widths
//! - [`row`]: the schema-driven row decoder/encoder
//! - [`stream`]: header parsing, table placement and stream serialization

pub mod coded;
pub mod row;
pub mod schema;
pub mod sizes;
pub mod stream;
pub mod tableid;

pub use coded::{decode_coded, encode_coded, CodedRef, CodedRefKind};
pub use row::{
    DecodeDiagnostic, FieldValue, PendingRaw, Row, RowDecoder, RowEncoder, Strictness,
};
pub use schema::{schema_for, Column, ColumnKind, TableSchema};
pub use sizes::{HeapSizeFlags, TableRows, TableSizes};
pub use stream::{TablesStream, TablesStreamBuilder};
pub use tableid::TableId;
