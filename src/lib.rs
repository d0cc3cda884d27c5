// Copyright 2025 the cilstream contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # cilstream
//!
//! Serialization engine for ECMA-335 CIL metadata: the `#~` tables stream,
//! the four metadata heaps, the compressed integer wire format, and the
//! big-integer kernel backing strong-name computations. Everything operates
//! on in-memory byte buffers; no file or network I/O happens inside the
//! crate.
//!
//! ## Components
//!
//! - [`tables`] - schema-driven decoding and encoding of the `#~` tables
//!   stream: header, row counts, column width resolution, coded references
//!   and random row access
//! - [`heaps`] - `#Strings`, `#US`, `#Blob` and `#GUID` readers and
//!   builders, plus cached fault-tolerant lookup
//! - [`compressed`] - the variable-width integer encoding used by heap
//!   entries and signatures (II.23.2)
//! - [`bigint`] - sign-magnitude arbitrary-precision arithmetic with
//!   modular exponentiation, sized for RSA strong-name moduli
//! - [`resolve`] - traits for the collaborators the codec does not own
//!   (PE offset resolution, signature parsing)
//!
//! ## Reading a tables stream
//!
//! ```rust,no_run
//! use cilstream::tables::{RowDecoder, Strictness, TableId, TablesStream};
//! use cilstream::heaps::HeapResolver;
//!
//! # fn main() -> cilstream::Result<()> {
//! # let stream_bytes: &[u8] = &[];
//! let stream = TablesStream::parse(stream_bytes)?;
//! let mut decoder = RowDecoder::new(stream.sizes(), Strictness::Lenient);
//! let mut resolver = HeapResolver::new();
//!
//! let type_defs = stream.read_table(TableId::TypeDef, &mut decoder, &mut resolver)?;
//! for diagnostic in decoder.diagnostics() {
//!     eprintln!("{}: {}", diagnostic.column, diagnostic.message);
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
pub(crate) mod error;

pub mod bigint;
pub mod compressed;
pub mod heaps;
pub mod io;
pub mod resolve;
pub mod tables;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

pub use bigint::{BigInt, Endian};
pub use error::Error;
