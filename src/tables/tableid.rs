//! Metadata table identifiers.

use strum::{EnumCount, EnumIter};

/// The metadata tables of the `#~` stream, numbered by their bit position
/// in the header's valid bitmask.
///
/// ## Reference
/// * ECMA-335 6th edition, II.22
#[derive(Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, EnumIter, EnumCount)]
#[repr(u8)]
pub enum TableId {
    /// `Module` table (II.22.30).
    Module = 0x00,
    /// `TypeRef` table (II.22.38).
    TypeRef = 0x01,
    /// `TypeDef` table (II.22.37).
    TypeDef = 0x02,
    /// `FieldPtr` indirection table (edit-and-continue only).
    FieldPtr = 0x03,
    /// `Field` table (II.22.15).
    Field = 0x04,
    /// `MethodPtr` indirection table (edit-and-continue only).
    MethodPtr = 0x05,
    /// `MethodDef` table (II.22.26).
    MethodDef = 0x06,
    /// `ParamPtr` indirection table (edit-and-continue only).
    ParamPtr = 0x07,
    /// `Param` table (II.22.33).
    Param = 0x08,
    /// `InterfaceImpl` table (II.22.23).
    InterfaceImpl = 0x09,
    /// `MemberRef` table (II.22.25).
    MemberRef = 0x0A,
    /// `Constant` table (II.22.9).
    Constant = 0x0B,
    /// `CustomAttribute` table (II.22.10).
    CustomAttribute = 0x0C,
    /// `FieldMarshal` table (II.22.17).
    FieldMarshal = 0x0D,
    /// `DeclSecurity` table (II.22.11).
    DeclSecurity = 0x0E,
    /// `ClassLayout` table (II.22.8).
    ClassLayout = 0x0F,
    /// `FieldLayout` table (II.22.16).
    FieldLayout = 0x10,
    /// `StandAloneSig` table (II.22.36).
    StandAloneSig = 0x11,
    /// `EventMap` table (II.22.12).
    EventMap = 0x12,
    /// `EventPtr` indirection table (edit-and-continue only).
    EventPtr = 0x13,
    /// `Event` table (II.22.13).
    Event = 0x14,
    /// `PropertyMap` table (II.22.35).
    PropertyMap = 0x15,
    /// `PropertyPtr` indirection table (edit-and-continue only).
    PropertyPtr = 0x16,
    /// `Property` table (II.22.34).
    Property = 0x17,
    /// `MethodSemantics` table (II.22.28).
    MethodSemantics = 0x18,
    /// `MethodImpl` table (II.22.27).
    MethodImpl = 0x19,
    /// `ModuleRef` table (II.22.31).
    ModuleRef = 0x1A,
    /// `TypeSpec` table (II.22.39).
    TypeSpec = 0x1B,
    /// `ImplMap` table (II.22.22).
    ImplMap = 0x1C,
    /// `FieldRVA` table (II.22.18).
    FieldRVA = 0x1D,
    /// `ENCLog` table (edit-and-continue only).
    EncLog = 0x1E,
    /// `ENCMap` table (edit-and-continue only).
    EncMap = 0x1F,
    /// `Assembly` table (II.22.2).
    Assembly = 0x20,
    /// `AssemblyProcessor` table (II.22.4).
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` table (II.22.3).
    AssemblyOS = 0x22,
    /// `AssemblyRef` table (II.22.5).
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` table (II.22.7).
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` table (II.22.6).
    AssemblyRefOS = 0x25,
    /// `File` table (II.22.19).
    File = 0x26,
    /// `ExportedType` table (II.22.14).
    ExportedType = 0x27,
    /// `ManifestResource` table (II.22.24).
    ManifestResource = 0x28,
    /// `NestedClass` table (II.22.32).
    NestedClass = 0x29,
    /// `GenericParam` table (II.22.20).
    GenericParam = 0x2A,
    /// `MethodSpec` table (II.22.29).
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` table (II.22.21).
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Convert a raw table tag into a `TableId`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownTable`] for tags outside the range of
    /// defined tables.
    pub fn from_tag(tag: u8) -> crate::Result<TableId> {
        use strum::IntoEnumIterator;

        TableId::iter()
            .find(|id| *id as u8 == tag)
            .ok_or(crate::Error::UnknownTable(tag))
    }
}
