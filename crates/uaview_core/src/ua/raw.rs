//! `#[repr(C)]` memory layouts of the builtin types.
//!
//! Every builtin descriptor in [`TypeSchema::standard`](crate::ua::TypeSchema::standard)
//! takes its size and alignment from the matching definition here, and the
//! structured standard types are checked against the mirrors with
//! `offset_of!` in the schema tests.

use std::ptr;

use crate::ua::Guid;

/// Data-pointer value marking an allocated array (or string) with no elements.
pub const EMPTY_ARRAY_SENTINEL: usize = 0x01;

/// Node identifier discriminant for numeric identifiers.
pub const NODEID_NUMERIC: u32 = 0;
/// Node identifier discriminant for string identifiers.
pub const NODEID_STRING: u32 = 3;
/// Node identifier discriminant for guid identifiers.
pub const NODEID_GUID: u32 = 4;
/// Node identifier discriminant for byte string identifiers.
pub const NODEID_BYTESTRING: u32 = 5;

/// Return the empty-array sentinel pointer.
pub fn empty_sentinel() -> *mut u8 {
	ptr::without_provenance_mut(EMPTY_ARRAY_SENTINEL)
}

/// True when `data` points at real element storage (neither null nor the sentinel).
pub fn is_allocated(data: *const u8) -> bool {
	data.addr() > EMPTY_ARRAY_SENTINEL
}

/// Length-prefixed byte buffer used by `String`, `ByteString` and `XmlElement`.
///
/// A null `data` is the null string; the sentinel with length 0 is the empty
/// string.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawString {
	/// Byte count; negative or 0 when `data` is not allocated.
	pub length: i32,
	/// Heap bytes, null, or the empty sentinel.
	pub data: *mut u8,
}

/// Identifier storage of a [`RawNodeId`], selected by `identifier_type`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawNodeIdentifier {
	/// [`NODEID_NUMERIC`] payload.
	pub numeric: u32,
	/// [`NODEID_STRING`] payload.
	pub string: RawString,
	/// [`NODEID_GUID`] payload.
	pub guid: Guid,
	/// [`NODEID_BYTESTRING`] payload.
	pub byte_string: RawString,
}

/// In-memory `NodeId`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawNodeId {
	/// Namespace table index.
	pub namespace_index: u16,
	/// One of the `NODEID_*` discriminants.
	pub identifier_type: u32,
	/// Identifier payload.
	pub identifier: RawNodeIdentifier,
}

/// Mirror of the structured `QualifiedName` layout.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawQualifiedName {
	/// Namespace table index.
	pub namespace_index: u16,
	/// Browse name text.
	pub name: RawString,
}

/// Mirror of the structured `LocalizedText` layout.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawLocalizedText {
	/// Locale id text.
	pub locale: RawString,
	/// Localized text.
	pub text: RawString,
}

/// Mirror of the structured `ExpandedNodeId` layout.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawExpandedNodeId {
	/// Local node id.
	pub node_id: RawNodeId,
	/// Namespace URI overriding the index.
	pub namespace_uri: RawString,
	/// Server table index.
	pub server_index: u32,
}

/// In-memory `Variant`.
///
/// `type_ref` is the element type index plus one; 0 marks an empty variant.
/// A scalar has `array_length == 0` and an allocated `data` pointer.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVariant {
	/// Element type index + 1, or 0.
	pub type_ref: u32,
	/// Element count for array content.
	pub array_length: i32,
	/// Scalar or array storage.
	pub data: *mut u8,
	/// Number of entries in `array_dimensions`.
	pub array_dimensions_size: i32,
	/// Optional `UInt32` dimension lengths.
	pub array_dimensions: *mut u32,
}

/// In-memory `DataValue`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawDataValue {
	/// [`DataValueFlags`](crate::ua::DataValueFlags) bits.
	pub flags: u8,
	/// Attribute value.
	pub value: RawVariant,
	/// Status code.
	pub status: u32,
	/// Source timestamp in ticks.
	pub source_timestamp: i64,
	/// Server timestamp in ticks.
	pub server_timestamp: i64,
}

/// In-memory `ExtensionObject` carrying an encoded body.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawExtensionObject {
	/// Body encoding marker.
	pub encoding: u32,
	/// Encoding type id.
	pub type_id: RawNodeId,
	/// Encoded body bytes.
	pub body: RawString,
}

/// Length field and data pointer of an array, laid out as inside a structure
/// without mid padding.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawArrayCell {
	/// Element count, `-1` for a never-allocated standalone array.
	pub length: i32,
	/// Element storage, null, or the empty sentinel.
	pub data: *mut u8,
}
