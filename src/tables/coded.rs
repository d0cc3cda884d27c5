//! Coded table references.
//!
//! A coded reference packs a table selector and a row index into one
//! integer: the low bits carry the tag (an index into a fixed candidate
//! table list), the high bits carry the 1-based row index. A raw value
//! whose row part is 0 is the null reference. Some candidate lists carry
//! reserved slots that no conforming writer emits; decoding such a tag
//! yields the null reference rather than a bogus table.
//!
//! ## Reference
//! * ECMA-335 6th edition, II.24.2.6

use strum::{EnumCount, EnumIter};

use super::tableid::TableId;
use crate::Result;

/// The coded reference families of ECMA-335 II.24.2.6.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedRefKind {
    /// `TypeDef`, `TypeRef` or `TypeSpec`.
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`.
    HasConstant,
    /// Any of the 22 tables that can carry custom attributes.
    HasCustomAttribute,
    /// `Field` or `Param`.
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`.
    HasDeclSecurity,
    /// `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef` or `TypeSpec`.
    MemberRefParent,
    /// `Event` or `Property`.
    HasSemantics,
    /// `MethodDef` or `MemberRef`.
    MethodDefOrRef,
    /// `Field` or `MethodDef`.
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`.
    Implementation,
    /// `MethodDef` or `MemberRef`, with reserved slots 0, 1 and 4.
    CustomAttributeType,
    /// `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef`.
    ResolutionScope,
    /// `TypeDef` or `MethodDef`.
    TypeOrMethodDef,
}

impl CodedRefKind {
    /// The candidate tables in tag order. `None` marks a reserved slot the
    /// encoding supports but no table occupies.
    #[must_use]
    pub fn candidates(&self) -> &'static [Option<TableId>] {
        match self {
            CodedRefKind::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedRefKind::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedRefKind::HasCustomAttribute => &[
                Some(TableId::MethodDef),
                Some(TableId::Field),
                Some(TableId::TypeRef),
                Some(TableId::TypeDef),
                Some(TableId::Param),
                Some(TableId::InterfaceImpl),
                Some(TableId::MemberRef),
                Some(TableId::Module),
                Some(TableId::DeclSecurity),
                Some(TableId::Property),
                Some(TableId::Event),
                Some(TableId::StandAloneSig),
                Some(TableId::ModuleRef),
                Some(TableId::TypeSpec),
                Some(TableId::Assembly),
                Some(TableId::AssemblyRef),
                Some(TableId::File),
                Some(TableId::ExportedType),
                Some(TableId::ManifestResource),
                Some(TableId::GenericParam),
                Some(TableId::GenericParamConstraint),
                Some(TableId::MethodSpec),
            ],
            CodedRefKind::HasFieldMarshal => {
                &[Some(TableId::Field), Some(TableId::Param)]
            }
            CodedRefKind::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedRefKind::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedRefKind::HasSemantics => {
                &[Some(TableId::Event), Some(TableId::Property)]
            }
            CodedRefKind::MethodDefOrRef => {
                &[Some(TableId::MethodDef), Some(TableId::MemberRef)]
            }
            CodedRefKind::MemberForwarded => {
                &[Some(TableId::Field), Some(TableId::MethodDef)]
            }
            CodedRefKind::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            // Slots 0 ("Not used"), 1 ("Not used") and 4 ("Not used") are
            // reserved by II.24.2.6.
            CodedRefKind::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedRefKind::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedRefKind::TypeOrMethodDef => {
                &[Some(TableId::TypeDef), Some(TableId::MethodDef)]
            }
        }
    }

    /// Number of tag bits: the smallest width that can index every
    /// candidate slot.
    #[must_use]
    pub fn tag_bits(&self) -> u8 {
        let len = self.candidates().len() as u32;
        #[allow(clippy::cast_possible_truncation)]
        {
            (32 - (len - 1).leading_zeros()) as u8
        }
    }
}

/// A decoded coded reference: a concrete table and a 1-based row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodedRef {
    /// The referenced table.
    pub table: TableId,
    /// The 1-based row index within that table.
    pub row: u32,
}

impl CodedRef {
    /// Create a reference to `row` of `table`.
    #[must_use]
    pub fn new(table: TableId, row: u32) -> CodedRef {
        CodedRef { table, row }
    }
}

/// Decode a raw coded value into its table and row.
///
/// Returns `Ok(None)` for the null reference (row part 0) and for tags
/// that land on a reserved candidate slot.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] when the tag exceeds the candidate
/// list.
pub fn decode_coded(kind: CodedRefKind, raw: u32) -> Result<Option<CodedRef>> {
    let candidates = kind.candidates();
    let tag_bits = kind.tag_bits();
    let tag = (raw & ((1 << tag_bits) - 1)) as usize;
    let row = raw >> tag_bits;

    if tag >= candidates.len() {
        return Err(malformed_error!(
            "Coded reference tag out of range - {} for {:?}",
            tag,
            kind
        ));
    }

    if row == 0 {
        return Ok(None);
    }

    Ok(candidates[tag].map(|table| CodedRef { table, row }))
}

/// Encode a coded reference, or `None` for the null reference (raw 0).
///
/// # Errors
/// Returns [`crate::Error::Malformed`] when the table is not a candidate
/// of `kind` or the row index does not fit next to the tag bits.
pub fn encode_coded(kind: CodedRefKind, value: Option<CodedRef>) -> Result<u32> {
    let Some(value) = value else {
        return Ok(0);
    };

    let candidates = kind.candidates();
    let Some(tag) = candidates.iter().position(|slot| *slot == Some(value.table)) else {
        return Err(malformed_error!(
            "Table {:?} is not a candidate of {:?}",
            value.table,
            kind
        ));
    };

    let tag_bits = kind.tag_bits();
    if value.row >= (1 << (32 - tag_bits)) {
        return Err(malformed_error!(
            "Row index too large for coded reference - {}",
            value.row
        ));
    }

    #[allow(clippy::cast_possible_truncation)]
    Ok((value.row << tag_bits) | tag as u32)
}
