//! Static column schemas for every metadata table.
//!
//! Each table's on-disk row layout is a fixed column sequence; the only
//! thing that varies between images is the byte width of reference and
//! heap-index columns. A [`ColumnKind`] describes how one column is
//! interpreted, and a single width dispatch over the global [`TableSizes`]
//! replaces per-table row readers: the row codec walks the schema instead
//! of every table carrying its own parsing code.
//!
//! ## Reference
//! * ECMA-335 6th edition, II.22

use super::coded::CodedRefKind;
use super::sizes::TableSizes;
use super::tableid::TableId;
use crate::heaps::HeapKind;

/// How a column's raw integer is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// 1-byte constant.
    Fixed8,
    /// 2-byte constant.
    Fixed16,
    /// 4-byte constant.
    Fixed32,
    /// 1-based row index into one fixed target table; 0 is absent.
    SimpleRef(TableId),
    /// Tagged reference into one of several candidate tables.
    CodedRef(CodedRefKind),
    /// Index into a heap; 0 is absent for `#Strings` and `#Blob`.
    HeapIdx(HeapKind),
    /// 4-byte logical address whose payload needs an external offset
    /// resolver; interpreted in a second pass.
    RawValue,
}

impl ColumnKind {
    /// Byte width of this column under the given size context.
    #[must_use]
    pub fn byte_width(&self, sizes: &TableSizes) -> u8 {
        match self {
            ColumnKind::Fixed8 => 1,
            ColumnKind::Fixed16 => 2,
            ColumnKind::Fixed32 | ColumnKind::RawValue => 4,
            ColumnKind::SimpleRef(table) => sizes.table_ref_bytes(*table),
            ColumnKind::CodedRef(kind) => sizes.coded_bytes(*kind),
            ColumnKind::HeapIdx(kind) => sizes.heap_bytes(*kind),
        }
    }
}

/// One column: its name (for diagnostics) and interpretation.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Column name as II.22 spells it.
    pub name: &'static str,
    /// How the column's raw integer is interpreted.
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

/// The fixed column list of one table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    /// The table this schema describes.
    pub id: TableId,
    /// The columns in on-disk order.
    pub columns: &'static [Column],
}

impl TableSchema {
    /// Byte width of one row under the given size context.
    #[must_use]
    pub fn row_width(&self, sizes: &TableSizes) -> u32 {
        self.columns
            .iter()
            .map(|column| u32::from(column.kind.byte_width(sizes)))
            .sum()
    }
}

use ColumnKind::{CodedRef, Fixed16, Fixed32, Fixed8, HeapIdx, RawValue, SimpleRef};
use HeapKind::{Blob, Guid, Strings};

/// Column layouts per II.22, indexed by table tag.
static SCHEMAS: [TableSchema; 0x2D] = [
    TableSchema {
        id: TableId::Module,
        columns: &[
            col("Generation", Fixed16),
            col("Name", HeapIdx(Strings)),
            col("Mvid", HeapIdx(Guid)),
            col("EncId", HeapIdx(Guid)),
            col("EncBaseId", HeapIdx(Guid)),
        ],
    },
    TableSchema {
        id: TableId::TypeRef,
        columns: &[
            col("ResolutionScope", CodedRef(CodedRefKind::ResolutionScope)),
            col("TypeName", HeapIdx(Strings)),
            col("TypeNamespace", HeapIdx(Strings)),
        ],
    },
    TableSchema {
        id: TableId::TypeDef,
        columns: &[
            col("Flags", Fixed32),
            col("TypeName", HeapIdx(Strings)),
            col("TypeNamespace", HeapIdx(Strings)),
            col("Extends", CodedRef(CodedRefKind::TypeDefOrRef)),
            col("FieldList", SimpleRef(TableId::Field)),
            col("MethodList", SimpleRef(TableId::MethodDef)),
        ],
    },
    TableSchema {
        id: TableId::FieldPtr,
        columns: &[col("Field", SimpleRef(TableId::Field))],
    },
    TableSchema {
        id: TableId::Field,
        columns: &[
            col("Flags", Fixed16),
            col("Name", HeapIdx(Strings)),
            col("Signature", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::MethodPtr,
        columns: &[col("Method", SimpleRef(TableId::MethodDef))],
    },
    TableSchema {
        id: TableId::MethodDef,
        columns: &[
            col("RVA", RawValue),
            col("ImplFlags", Fixed16),
            col("Flags", Fixed16),
            col("Name", HeapIdx(Strings)),
            col("Signature", HeapIdx(Blob)),
            col("ParamList", SimpleRef(TableId::Param)),
        ],
    },
    TableSchema {
        id: TableId::ParamPtr,
        columns: &[col("Param", SimpleRef(TableId::Param))],
    },
    TableSchema {
        id: TableId::Param,
        columns: &[
            col("Flags", Fixed16),
            col("Sequence", Fixed16),
            col("Name", HeapIdx(Strings)),
        ],
    },
    TableSchema {
        id: TableId::InterfaceImpl,
        columns: &[
            col("Class", SimpleRef(TableId::TypeDef)),
            col("Interface", CodedRef(CodedRefKind::TypeDefOrRef)),
        ],
    },
    TableSchema {
        id: TableId::MemberRef,
        columns: &[
            col("Class", CodedRef(CodedRefKind::MemberRefParent)),
            col("Name", HeapIdx(Strings)),
            col("Signature", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::Constant,
        columns: &[
            col("Type", Fixed8),
            col("Padding", Fixed8),
            col("Parent", CodedRef(CodedRefKind::HasConstant)),
            col("Value", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::CustomAttribute,
        columns: &[
            col("Parent", CodedRef(CodedRefKind::HasCustomAttribute)),
            col("Type", CodedRef(CodedRefKind::CustomAttributeType)),
            col("Value", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::FieldMarshal,
        columns: &[
            col("Parent", CodedRef(CodedRefKind::HasFieldMarshal)),
            col("NativeType", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::DeclSecurity,
        columns: &[
            col("Action", Fixed16),
            col("Parent", CodedRef(CodedRefKind::HasDeclSecurity)),
            col("PermissionSet", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::ClassLayout,
        columns: &[
            col("PackingSize", Fixed16),
            col("ClassSize", Fixed32),
            col("Parent", SimpleRef(TableId::TypeDef)),
        ],
    },
    TableSchema {
        id: TableId::FieldLayout,
        columns: &[
            col("Offset", Fixed32),
            col("Field", SimpleRef(TableId::Field)),
        ],
    },
    TableSchema {
        id: TableId::StandAloneSig,
        columns: &[col("Signature", HeapIdx(Blob))],
    },
    TableSchema {
        id: TableId::EventMap,
        columns: &[
            col("Parent", SimpleRef(TableId::TypeDef)),
            col("EventList", SimpleRef(TableId::Event)),
        ],
    },
    TableSchema {
        id: TableId::EventPtr,
        columns: &[col("Event", SimpleRef(TableId::Event))],
    },
    TableSchema {
        id: TableId::Event,
        columns: &[
            col("EventFlags", Fixed16),
            col("Name", HeapIdx(Strings)),
            col("EventType", CodedRef(CodedRefKind::TypeDefOrRef)),
        ],
    },
    TableSchema {
        id: TableId::PropertyMap,
        columns: &[
            col("Parent", SimpleRef(TableId::TypeDef)),
            col("PropertyList", SimpleRef(TableId::Property)),
        ],
    },
    TableSchema {
        id: TableId::PropertyPtr,
        columns: &[col("Property", SimpleRef(TableId::Property))],
    },
    TableSchema {
        id: TableId::Property,
        columns: &[
            col("Flags", Fixed16),
            col("Name", HeapIdx(Strings)),
            col("Type", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::MethodSemantics,
        columns: &[
            col("Semantics", Fixed16),
            col("Method", SimpleRef(TableId::MethodDef)),
            col("Association", CodedRef(CodedRefKind::HasSemantics)),
        ],
    },
    TableSchema {
        id: TableId::MethodImpl,
        columns: &[
            col("Class", SimpleRef(TableId::TypeDef)),
            col("MethodBody", CodedRef(CodedRefKind::MethodDefOrRef)),
            col("MethodDeclaration", CodedRef(CodedRefKind::MethodDefOrRef)),
        ],
    },
    TableSchema {
        id: TableId::ModuleRef,
        columns: &[col("Name", HeapIdx(Strings))],
    },
    TableSchema {
        id: TableId::TypeSpec,
        columns: &[col("Signature", HeapIdx(Blob))],
    },
    TableSchema {
        id: TableId::ImplMap,
        columns: &[
            col("MappingFlags", Fixed16),
            col("MemberForwarded", CodedRef(CodedRefKind::MemberForwarded)),
            col("ImportName", HeapIdx(Strings)),
            col("ImportScope", SimpleRef(TableId::ModuleRef)),
        ],
    },
    TableSchema {
        id: TableId::FieldRVA,
        columns: &[
            col("RVA", RawValue),
            col("Field", SimpleRef(TableId::Field)),
        ],
    },
    TableSchema {
        id: TableId::EncLog,
        columns: &[col("Token", Fixed32), col("FuncCode", Fixed32)],
    },
    TableSchema {
        id: TableId::EncMap,
        columns: &[col("Token", Fixed32)],
    },
    TableSchema {
        id: TableId::Assembly,
        columns: &[
            col("HashAlgId", Fixed32),
            col("MajorVersion", Fixed16),
            col("MinorVersion", Fixed16),
            col("BuildNumber", Fixed16),
            col("RevisionNumber", Fixed16),
            col("Flags", Fixed32),
            col("PublicKey", HeapIdx(Blob)),
            col("Name", HeapIdx(Strings)),
            col("Culture", HeapIdx(Strings)),
        ],
    },
    TableSchema {
        id: TableId::AssemblyProcessor,
        columns: &[col("Processor", Fixed32)],
    },
    TableSchema {
        id: TableId::AssemblyOS,
        columns: &[
            col("OSPlatformID", Fixed32),
            col("OSMajorVersion", Fixed32),
            col("OSMinorVersion", Fixed32),
        ],
    },
    TableSchema {
        id: TableId::AssemblyRef,
        columns: &[
            col("MajorVersion", Fixed16),
            col("MinorVersion", Fixed16),
            col("BuildNumber", Fixed16),
            col("RevisionNumber", Fixed16),
            col("Flags", Fixed32),
            col("PublicKeyOrToken", HeapIdx(Blob)),
            col("Name", HeapIdx(Strings)),
            col("Culture", HeapIdx(Strings)),
            col("HashValue", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::AssemblyRefProcessor,
        columns: &[
            col("Processor", Fixed32),
            col("AssemblyRef", SimpleRef(TableId::AssemblyRef)),
        ],
    },
    TableSchema {
        id: TableId::AssemblyRefOS,
        columns: &[
            col("OSPlatformID", Fixed32),
            col("OSMajorVersion", Fixed32),
            col("OSMinorVersion", Fixed32),
            col("AssemblyRef", SimpleRef(TableId::AssemblyRef)),
        ],
    },
    TableSchema {
        id: TableId::File,
        columns: &[
            col("Flags", Fixed32),
            col("Name", HeapIdx(Strings)),
            col("HashValue", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::ExportedType,
        columns: &[
            col("Flags", Fixed32),
            col("TypeDefId", Fixed32),
            col("TypeName", HeapIdx(Strings)),
            col("TypeNamespace", HeapIdx(Strings)),
            col("Implementation", CodedRef(CodedRefKind::Implementation)),
        ],
    },
    TableSchema {
        id: TableId::ManifestResource,
        columns: &[
            col("Offset", RawValue),
            col("Flags", Fixed32),
            col("Name", HeapIdx(Strings)),
            col("Implementation", CodedRef(CodedRefKind::Implementation)),
        ],
    },
    TableSchema {
        id: TableId::NestedClass,
        columns: &[
            col("NestedClass", SimpleRef(TableId::TypeDef)),
            col("EnclosingClass", SimpleRef(TableId::TypeDef)),
        ],
    },
    TableSchema {
        id: TableId::GenericParam,
        columns: &[
            col("Number", Fixed16),
            col("Flags", Fixed16),
            col("Owner", CodedRef(CodedRefKind::TypeOrMethodDef)),
            col("Name", HeapIdx(Strings)),
        ],
    },
    TableSchema {
        id: TableId::MethodSpec,
        columns: &[
            col("Method", CodedRef(CodedRefKind::MethodDefOrRef)),
            col("Instantiation", HeapIdx(Blob)),
        ],
    },
    TableSchema {
        id: TableId::GenericParamConstraint,
        columns: &[
            col("Owner", SimpleRef(TableId::GenericParam)),
            col("Constraint", CodedRef(CodedRefKind::TypeDefOrRef)),
        ],
    },
];

/// The static schema of `table`.
#[must_use]
pub fn schema_for(table: TableId) -> &'static TableSchema {
    &SCHEMAS[table as usize]
}
