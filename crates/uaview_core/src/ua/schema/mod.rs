use std::alloc::Layout;
use std::collections::HashMap;
use std::fmt;
use std::mem::{align_of, size_of};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::ua::raw::{RawDataValue, RawExtensionObject, RawNodeId, RawString, RawVariant};
use crate::ua::{Guid, Result, UaError};

/// Position of a type in its [`TypeSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(pub u16);

impl TypeIndex {
	/// Table slot as `usize`.
	pub fn as_usize(self) -> usize {
		usize::from(self.0)
	}
}

impl fmt::Display for TypeIndex {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Stable indices of the standard type table.
pub mod types {
	use super::TypeIndex;

	/// `Boolean`.
	pub const BOOLEAN: TypeIndex = TypeIndex(0);
	/// `SByte`.
	pub const SBYTE: TypeIndex = TypeIndex(1);
	/// `Byte`.
	pub const BYTE: TypeIndex = TypeIndex(2);
	/// `Int16`.
	pub const INT16: TypeIndex = TypeIndex(3);
	/// `UInt16`.
	pub const UINT16: TypeIndex = TypeIndex(4);
	/// `Int32`.
	pub const INT32: TypeIndex = TypeIndex(5);
	/// `UInt32`.
	pub const UINT32: TypeIndex = TypeIndex(6);
	/// `Int64`.
	pub const INT64: TypeIndex = TypeIndex(7);
	/// `UInt64`.
	pub const UINT64: TypeIndex = TypeIndex(8);
	/// `Float`.
	pub const FLOAT: TypeIndex = TypeIndex(9);
	/// `Double`.
	pub const DOUBLE: TypeIndex = TypeIndex(10);
	/// `String`.
	pub const STRING: TypeIndex = TypeIndex(11);
	/// `DateTime`.
	pub const DATE_TIME: TypeIndex = TypeIndex(12);
	/// `Guid`.
	pub const GUID: TypeIndex = TypeIndex(13);
	/// `ByteString`.
	pub const BYTE_STRING: TypeIndex = TypeIndex(14);
	/// `XmlElement`.
	pub const XML_ELEMENT: TypeIndex = TypeIndex(15);
	/// `NodeId`.
	pub const NODE_ID: TypeIndex = TypeIndex(16);
	/// `StatusCode`.
	pub const STATUS_CODE: TypeIndex = TypeIndex(17);
	/// `Variant`.
	pub const VARIANT: TypeIndex = TypeIndex(18);
	/// `DataValue`.
	pub const DATA_VALUE: TypeIndex = TypeIndex(19);
	/// `ExtensionObject`.
	pub const EXTENSION_OBJECT: TypeIndex = TypeIndex(20);
	/// `QualifiedName`.
	pub const QUALIFIED_NAME: TypeIndex = TypeIndex(21);
	/// `LocalizedText`.
	pub const LOCALIZED_TEXT: TypeIndex = TypeIndex(22);
	/// `ExpandedNodeId`.
	pub const EXPANDED_NODE_ID: TypeIndex = TypeIndex(23);
	/// `ReadValueId`.
	pub const READ_VALUE_ID: TypeIndex = TypeIndex(24);
	/// `WriteValue`.
	pub const WRITE_VALUE: TypeIndex = TypeIndex(25);
	/// `BrowseDescription`.
	pub const BROWSE_DESCRIPTION: TypeIndex = TypeIndex(26);
	/// `Argument`.
	pub const ARGUMENT: TypeIndex = TypeIndex(27);
	/// `CallMethodRequest`.
	pub const CALL_METHOD_REQUEST: TypeIndex = TypeIndex(28);
}

/// Builtin type formatted and managed directly rather than member by member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
	/// One byte, 0 or 1.
	Boolean,
	/// `i8`.
	SByte,
	/// `u8`.
	Byte,
	/// `i16`.
	Int16,
	/// `u16`.
	UInt16,
	/// `i32`.
	Int32,
	/// `u32`.
	UInt32,
	/// `i64`.
	Int64,
	/// `u64`.
	UInt64,
	/// `f32`.
	Float,
	/// `f64`.
	Double,
	/// Length-prefixed text.
	String,
	/// `i64` ticks.
	DateTime,
	/// 16-byte identifier.
	Guid,
	/// Length-prefixed bytes.
	ByteString,
	/// Length-prefixed XML text.
	XmlElement,
	/// Namespace-scoped identifier.
	NodeId,
	/// `u32` status.
	StatusCode,
	/// Tagged union over any schema type.
	Variant,
	/// Value with optional status and timestamps.
	DataValue,
	/// Encoded structure body.
	ExtensionObject,
}

impl BuiltinKind {
	/// Builtins in standard table order.
	pub const ALL: [BuiltinKind; 21] = [
		Self::Boolean,
		Self::SByte,
		Self::Byte,
		Self::Int16,
		Self::UInt16,
		Self::Int32,
		Self::UInt32,
		Self::Int64,
		Self::UInt64,
		Self::Float,
		Self::Double,
		Self::String,
		Self::DateTime,
		Self::Guid,
		Self::ByteString,
		Self::XmlElement,
		Self::NodeId,
		Self::StatusCode,
		Self::Variant,
		Self::DataValue,
		Self::ExtensionObject,
	];

	/// Canonical type name.
	pub fn name(self) -> &'static str {
		match self {
			Self::Boolean => "Boolean",
			Self::SByte => "SByte",
			Self::Byte => "Byte",
			Self::Int16 => "Int16",
			Self::UInt16 => "UInt16",
			Self::Int32 => "Int32",
			Self::UInt32 => "UInt32",
			Self::Int64 => "Int64",
			Self::UInt64 => "UInt64",
			Self::Float => "Float",
			Self::Double => "Double",
			Self::String => "String",
			Self::DateTime => "DateTime",
			Self::Guid => "Guid",
			Self::ByteString => "ByteString",
			Self::XmlElement => "XmlElement",
			Self::NodeId => "NodeId",
			Self::StatusCode => "StatusCode",
			Self::Variant => "Variant",
			Self::DataValue => "DataValue",
			Self::ExtensionObject => "ExtensionObject",
		}
	}

	/// Memory layout of the builtin.
	pub fn layout(self) -> Layout {
		match self {
			Self::Boolean => Layout::new::<bool>(),
			Self::SByte => Layout::new::<i8>(),
			Self::Byte => Layout::new::<u8>(),
			Self::Int16 => Layout::new::<i16>(),
			Self::UInt16 => Layout::new::<u16>(),
			Self::Int32 => Layout::new::<i32>(),
			Self::UInt32 | Self::StatusCode => Layout::new::<u32>(),
			Self::Int64 | Self::DateTime => Layout::new::<i64>(),
			Self::UInt64 => Layout::new::<u64>(),
			Self::Float => Layout::new::<f32>(),
			Self::Double => Layout::new::<f64>(),
			Self::String | Self::ByteString | Self::XmlElement => Layout::new::<RawString>(),
			Self::Guid => Layout::new::<Guid>(),
			Self::NodeId => Layout::new::<RawNodeId>(),
			Self::Variant => Layout::new::<RawVariant>(),
			Self::DataValue => Layout::new::<RawDataValue>(),
			Self::ExtensionObject => Layout::new::<RawExtensionObject>(),
		}
	}

	/// True when the builtin owns no heap memory.
	pub fn is_fixed_size(self) -> bool {
		!matches!(
			self,
			Self::String | Self::ByteString | Self::XmlElement | Self::NodeId | Self::Variant | Self::DataValue | Self::ExtensionObject
		)
	}
}

/// Builtin or structured classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
	/// Formatted directly, no members.
	Builtin(BuiltinKind),
	/// Ordered members in memory order.
	Structured,
}

/// Runtime description of one data type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
	/// Type name, unique case-insensitively within the schema.
	pub name: Box<str>,
	/// Position in the owning schema.
	pub index: TypeIndex,
	/// Total size and alignment.
	pub layout: Layout,
	/// Builtin or structured.
	pub kind: TypeKind,
	/// True when a byte copy is a deep copy.
	pub fixed_size: bool,
	/// Members in memory order; empty for builtins.
	pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
	/// Total size in bytes.
	pub fn size(&self) -> usize {
		self.layout.size()
	}

	/// Alignment in bytes.
	pub fn align(&self) -> usize {
		self.layout.align()
	}

	/// Builtin kind, `None` for structured types.
	pub fn builtin(&self) -> Option<BuiltinKind> {
		match self.kind {
			TypeKind::Builtin(kind) => Some(kind),
			TypeKind::Structured => None,
		}
	}

	/// True for structured types.
	pub fn is_structured(&self) -> bool {
		matches!(self.kind, TypeKind::Structured)
	}
}

/// One member of a structured type.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
	/// Member name.
	pub name: Box<str>,
	/// Member (or element) type.
	pub type_index: TypeIndex,
	/// True when the member is an `i32` length followed by a data pointer.
	pub is_array: bool,
	/// Scalar: bytes before the member. Array: `(pre << 3) | mid`.
	pub padding: u8,
}

impl MemberDescriptor {
	/// Bytes between the end of the previous member and this member (or its length field).
	pub fn pre_padding(&self) -> usize {
		if self.is_array { usize::from(self.padding >> 3) } else { usize::from(self.padding) }
	}

	/// Bytes between an array length field and its data pointer.
	pub fn mid_padding(&self) -> usize {
		if self.is_array { usize::from(self.padding & 0x07) } else { 0 }
	}
}

/// Bytes occupied by an array length field.
pub(crate) const ARRAY_LENGTH_SIZE: usize = size_of::<i32>();
/// Bytes occupied by an array data pointer.
pub(crate) const ARRAY_POINTER_SIZE: usize = size_of::<*mut u8>();

/// Immutable type table.
#[derive(Debug)]
pub struct TypeSchema {
	types: Vec<TypeDescriptor>,
	by_name: HashMap<Box<str>, TypeIndex>,
}

impl TypeSchema {
	/// Shared standard table, built once per process.
	pub fn standard() -> Arc<TypeSchema> {
		static STANDARD: OnceLock<Arc<TypeSchema>> = OnceLock::new();
		STANDARD
			.get_or_init(|| {
				let schema = SchemaBuilder::standard().build();
				debug!(types = schema.len(), "built standard type schema");
				Arc::new(schema)
			})
			.clone()
	}

	/// Number of types.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// True when the schema has no types.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Look up a type by index.
	pub fn get(&self, index: TypeIndex) -> Option<&TypeDescriptor> {
		self.types.get(index.as_usize())
	}

	/// Look up a type by index that is known to be valid.
	///
	/// Panics on an out-of-range index; indices only come from this schema.
	pub fn descriptor(&self, index: TypeIndex) -> &TypeDescriptor {
		match self.types.get(index.as_usize()) {
			Some(desc) => desc,
			None => panic!("type index {index} outside schema of {} types", self.types.len()),
		}
	}

	/// Look up a type by name (ASCII case-insensitive, exact length).
	pub fn find(&self, name: &str) -> Option<&TypeDescriptor> {
		self.by_name.get(name.to_ascii_lowercase().as_str()).map(|index| self.descriptor(*index))
	}

	/// Look up a type by name or report [`UaError::TypeNotFound`].
	pub fn require(&self, name: &str) -> Result<&TypeDescriptor> {
		self.find(name).ok_or_else(|| UaError::TypeNotFound { name: name.to_owned() })
	}

	/// Iterate types in index order.
	pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
		self.types.iter()
	}
}

/// Incremental schema construction with C ABI layout computation.
///
/// Every builder starts from the standard table, so the [`types`] indices
/// hold in every schema.
#[derive(Debug)]
pub struct SchemaBuilder {
	types: Vec<TypeDescriptor>,
	by_name: HashMap<Box<str>, TypeIndex>,
}

impl SchemaBuilder {
	fn empty() -> Self {
		Self {
			types: Vec::new(),
			by_name: HashMap::new(),
		}
	}

	/// Builder seeded with the standard builtin and structured types.
	pub fn standard() -> Self {
		let mut builder = Self::empty();
		for kind in BuiltinKind::ALL {
			if let Err(err) = builder.push_builtin(kind) {
				panic!("standard builtin {} rejected: {err}", kind.name());
			}
		}
		for (name, members) in STANDARD_STRUCTS {
			if let Err(err) = builder.define(name, members.iter().copied()) {
				panic!("standard type {name} rejected: {err}");
			}
		}
		builder
	}

	fn push_builtin(&mut self, kind: BuiltinKind) -> Result<TypeIndex> {
		let key: Box<str> = kind.name().to_ascii_lowercase().into();
		if self.by_name.contains_key(&key) {
			return Err(UaError::SchemaDuplicateType { name: kind.name().to_owned() });
		}
		let index = next_index(self.types.len())?;
		self.by_name.insert(key, index);
		self.types.push(TypeDescriptor {
			name: kind.name().into(),
			index,
			layout: kind.layout(),
			kind: TypeKind::Builtin(kind),
			fixed_size: kind.is_fixed_size(),
			members: Vec::new(),
		});
		Ok(index)
	}

	/// Add a structured type from `(member name, member type name, is array)` triples.
	///
	/// Member types must already be defined.
	pub fn define<'a>(&mut self, name: &str, members: impl IntoIterator<Item = (&'a str, &'a str, bool)>) -> Result<TypeIndex> {
		let key: Box<str> = name.to_ascii_lowercase().into();
		if self.by_name.contains_key(&key) {
			return Err(UaError::SchemaDuplicateType { name: name.to_owned() });
		}

		let mut out = Vec::new();
		let mut offset = 0_usize;
		let mut align = 1_usize;
		let mut fixed_size = true;

		for (member_name, type_name, is_array) in members {
			if out.iter().any(|item: &MemberDescriptor| item.name.eq_ignore_ascii_case(member_name)) {
				return Err(UaError::SchemaDuplicateMember {
					type_name: name.to_owned(),
					member: member_name.to_owned(),
				});
			}

			let Some(member_index) = self.by_name.get(type_name.to_ascii_lowercase().as_str()).copied() else {
				return Err(UaError::SchemaUnknownMemberType {
					type_name: name.to_owned(),
					member: member_name.to_owned(),
					member_type: type_name.to_owned(),
				});
			};
			let member_type = &self.types[member_index.as_usize()];

			let padding = if is_array {
				let length_at = offset.next_multiple_of(align_of::<i32>());
				let pre = length_at - offset;
				let pointer_at = (length_at + ARRAY_LENGTH_SIZE).next_multiple_of(align_of::<*mut u8>());
				let mid = pointer_at - length_at - ARRAY_LENGTH_SIZE;
				if pre > 0x1f || mid > 0x07 {
					return Err(UaError::SchemaPaddingOverflow {
						type_name: name.to_owned(),
						member: member_name.to_owned(),
						pre,
						mid,
					});
				}
				offset = pointer_at + ARRAY_POINTER_SIZE;
				align = align.max(align_of::<i32>()).max(align_of::<*mut u8>());
				fixed_size = false;
				((pre << 3) | mid) as u8
			} else {
				let start = offset.next_multiple_of(member_type.align());
				let pre = start - offset;
				if pre > usize::from(u8::MAX) {
					return Err(UaError::SchemaPaddingOverflow {
						type_name: name.to_owned(),
						member: member_name.to_owned(),
						pre,
						mid: 0,
					});
				}
				offset = start + member_type.size();
				align = align.max(member_type.align());
				fixed_size &= member_type.fixed_size;
				pre as u8
			};

			out.push(MemberDescriptor {
				name: member_name.into(),
				type_index: member_index,
				is_array,
				padding,
			});
		}

		if out.is_empty() {
			return Err(UaError::SchemaEmptyStruct { name: name.to_owned() });
		}

		let size = offset.next_multiple_of(align);
		let layout = Layout::from_size_align(size, align).map_err(|_| UaError::ArrayTooLarge { count: size as u64 })?;

		let index = next_index(self.types.len())?;
		self.by_name.insert(key, index);
		self.types.push(TypeDescriptor {
			name: name.into(),
			index,
			layout,
			kind: TypeKind::Structured,
			fixed_size,
			members: out,
		});
		debug!(type_name = name, size, align, "defined structured type");
		Ok(index)
	}

	/// Freeze into an immutable schema.
	pub fn build(self) -> TypeSchema {
		TypeSchema {
			types: self.types,
			by_name: self.by_name,
		}
	}
}

fn next_index(len: usize) -> Result<TypeIndex> {
	u16::try_from(len).map(TypeIndex).map_err(|_| UaError::SchemaTooLarge { count: len + 1 })
}

type StandardStruct = (&'static str, &'static [(&'static str, &'static str, bool)]);

const STANDARD_STRUCTS: &[StandardStruct] = &[
	("QualifiedName", &[("namespaceIndex", "UInt16", false), ("name", "String", false)]),
	("LocalizedText", &[("locale", "String", false), ("text", "String", false)]),
	(
		"ExpandedNodeId",
		&[("nodeId", "NodeId", false), ("namespaceUri", "String", false), ("serverIndex", "UInt32", false)],
	),
	(
		"ReadValueId",
		&[
			("nodeId", "NodeId", false),
			("attributeId", "UInt32", false),
			("indexRange", "String", false),
			("dataEncoding", "QualifiedName", false),
		],
	),
	(
		"WriteValue",
		&[
			("nodeId", "NodeId", false),
			("attributeId", "UInt32", false),
			("indexRange", "String", false),
			("value", "DataValue", false),
		],
	),
	(
		"BrowseDescription",
		&[
			("nodeId", "NodeId", false),
			("browseDirection", "Int32", false),
			("referenceTypeId", "NodeId", false),
			("includeSubtypes", "Boolean", false),
			("nodeClassMask", "UInt32", false),
			("resultMask", "UInt32", false),
		],
	),
	(
		"Argument",
		&[
			("name", "String", false),
			("dataType", "NodeId", false),
			("valueRank", "Int32", false),
			("arrayDimensions", "UInt32", true),
			("description", "LocalizedText", false),
		],
	),
	(
		"CallMethodRequest",
		&[("objectId", "NodeId", false), ("methodId", "NodeId", false), ("inputArguments", "Variant", true)],
	),
];

#[cfg(test)]
mod tests;
