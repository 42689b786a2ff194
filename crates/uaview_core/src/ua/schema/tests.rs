use std::mem::{offset_of, size_of};

use crate::ua::raw::{RawExpandedNodeId, RawLocalizedText, RawNodeId, RawQualifiedName, RawString, RawVariant};
use super::next_index;
use crate::ua::{BuiltinKind, MemberLocation, SchemaBuilder, TypeIndex, TypeSchema, UaError, member_offsets, types};

#[repr(C)]
struct ArgumentMirror {
	name: RawString,
	data_type: RawNodeId,
	value_rank: i32,
	array_dimensions_size: i32,
	array_dimensions: *mut u32,
	description: RawLocalizedText,
}

#[repr(C)]
struct CallMethodRequestMirror {
	object_id: RawNodeId,
	method_id: RawNodeId,
	input_arguments_size: i32,
	input_arguments: *mut RawVariant,
}

#[repr(C)]
struct BrowseDescriptionMirror {
	node_id: RawNodeId,
	browse_direction: i32,
	reference_type_id: RawNodeId,
	include_subtypes: bool,
	node_class_mask: u32,
	result_mask: u32,
}

#[repr(C)]
struct PaddedArrayMirror {
	flag: u8,
	items_size: i32,
	items: *mut i16,
	tail: u16,
}

fn offset(schema: &TypeSchema, ty: TypeIndex, index: usize) -> MemberLocation {
	member_offsets(schema, schema.descriptor(ty), index)
}

#[test]
fn standard_indices_match_names() {
	let schema = TypeSchema::standard();
	assert_eq!(&*schema.descriptor(types::BOOLEAN).name, "Boolean");
	assert_eq!(&*schema.descriptor(types::NODE_ID).name, "NodeId");
	assert_eq!(&*schema.descriptor(types::EXTENSION_OBJECT).name, "ExtensionObject");
	assert_eq!(&*schema.descriptor(types::QUALIFIED_NAME).name, "QualifiedName");
	assert_eq!(&*schema.descriptor(types::CALL_METHOD_REQUEST).name, "CallMethodRequest");
	assert_eq!(schema.len(), 29);

	for (slot, desc) in schema.iter().enumerate() {
		assert_eq!(desc.index.as_usize(), slot);
	}
}

#[test]
fn find_is_case_insensitive_and_exact_length() {
	let schema = TypeSchema::standard();
	assert_eq!(schema.find("localizedtext").map(|desc| desc.index), Some(types::LOCALIZED_TEXT));
	assert_eq!(schema.find("NODEID").map(|desc| desc.index), Some(types::NODE_ID));
	assert!(schema.find("NodeI").is_none());
	assert!(schema.find("NodeIdx").is_none());
	assert!(matches!(schema.require("Nope"), Err(UaError::TypeNotFound { name }) if name == "Nope"));
}

#[test]
fn builtin_sizes_follow_raw_layouts() {
	let schema = TypeSchema::standard();
	assert_eq!(schema.descriptor(types::STRING).size(), size_of::<RawString>());
	assert_eq!(schema.descriptor(types::GUID).size(), 16);
	assert_eq!(schema.descriptor(types::NODE_ID).size(), size_of::<RawNodeId>());
	assert_eq!(schema.descriptor(types::VARIANT).size(), size_of::<RawVariant>());
	assert!(schema.descriptor(types::DOUBLE).fixed_size);
	assert!(!schema.descriptor(types::STRING).fixed_size);
}

#[test]
fn qualified_name_layout_matches_repr_c() {
	let schema = TypeSchema::standard();
	let desc = schema.descriptor(types::QUALIFIED_NAME);
	assert_eq!(desc.size(), size_of::<RawQualifiedName>());
	assert_eq!(offset(&schema, types::QUALIFIED_NAME, 0).offset, offset_of!(RawQualifiedName, namespace_index));
	assert_eq!(offset(&schema, types::QUALIFIED_NAME, 1).offset, offset_of!(RawQualifiedName, name));
	assert_eq!(desc.members[1].padding as usize, offset_of!(RawQualifiedName, name) - size_of::<u16>());
}

#[test]
fn localized_text_and_expanded_node_id_match_repr_c() {
	let schema = TypeSchema::standard();
	assert_eq!(schema.descriptor(types::LOCALIZED_TEXT).size(), size_of::<RawLocalizedText>());
	assert_eq!(offset(&schema, types::LOCALIZED_TEXT, 1).offset, offset_of!(RawLocalizedText, text));

	assert_eq!(schema.descriptor(types::EXPANDED_NODE_ID).size(), size_of::<RawExpandedNodeId>());
	assert_eq!(
		offset(&schema, types::EXPANDED_NODE_ID, 1).offset,
		offset_of!(RawExpandedNodeId, namespace_uri)
	);
	assert_eq!(
		offset(&schema, types::EXPANDED_NODE_ID, 2).offset,
		offset_of!(RawExpandedNodeId, server_index)
	);
}

#[test]
fn browse_description_scalar_padding_matches_repr_c() {
	let schema = TypeSchema::standard();
	assert_eq!(schema.descriptor(types::BROWSE_DESCRIPTION).size(), size_of::<BrowseDescriptionMirror>());
	assert_eq!(
		offset(&schema, types::BROWSE_DESCRIPTION, 2).offset,
		offset_of!(BrowseDescriptionMirror, reference_type_id)
	);
	assert_eq!(
		offset(&schema, types::BROWSE_DESCRIPTION, 4).offset,
		offset_of!(BrowseDescriptionMirror, node_class_mask)
	);
	assert_eq!(offset(&schema, types::BROWSE_DESCRIPTION, 5).offset, offset_of!(BrowseDescriptionMirror, result_mask));
}

#[test]
fn array_members_record_length_and_pointer_offsets() {
	let schema = TypeSchema::standard();
	let desc = schema.descriptor(types::ARGUMENT);
	assert_eq!(desc.size(), size_of::<ArgumentMirror>());
	assert!(desc.members[3].is_array);
	assert!(!desc.fixed_size);

	let dims = offset(&schema, types::ARGUMENT, 3);
	assert_eq!(dims.length_offset, Some(offset_of!(ArgumentMirror, array_dimensions_size)));
	assert_eq!(dims.offset, offset_of!(ArgumentMirror, array_dimensions));
	assert_eq!(offset(&schema, types::ARGUMENT, 4).offset, offset_of!(ArgumentMirror, description));

	let call = offset(&schema, types::CALL_METHOD_REQUEST, 2);
	assert_eq!(call.length_offset, Some(offset_of!(CallMethodRequestMirror, input_arguments_size)));
	assert_eq!(call.offset, offset_of!(CallMethodRequestMirror, input_arguments));
	assert_eq!(schema.descriptor(types::CALL_METHOD_REQUEST).size(), size_of::<CallMethodRequestMirror>());
}

#[test]
fn array_padding_encodes_pre_and_mid() {
	let mut builder = SchemaBuilder::standard();
	let ty = builder
		.define("Padded", [("flag", "Byte", false), ("items", "Int16", true), ("tail", "UInt16", false)])
		.expect("define padded");
	let schema = builder.build();
	let desc = schema.descriptor(ty);

	let items = &desc.members[1];
	let pre = offset_of!(PaddedArrayMirror, items_size) - 1;
	let mid = offset_of!(PaddedArrayMirror, items) - offset_of!(PaddedArrayMirror, items_size) - 4;
	assert_eq!(items.pre_padding(), pre);
	assert_eq!(items.mid_padding(), mid);
	assert_eq!(items.padding as usize, (pre << 3) | mid);

	let location = member_offsets(&schema, desc, 1);
	assert_eq!(location.length_offset, Some(offset_of!(PaddedArrayMirror, items_size)));
	assert_eq!(location.offset, offset_of!(PaddedArrayMirror, items));
	assert_eq!(member_offsets(&schema, desc, 2).offset, offset_of!(PaddedArrayMirror, tail));
	assert_eq!(desc.size(), size_of::<PaddedArrayMirror>());
}

#[test]
fn builder_rejects_bad_definitions() {
	let mut builder = SchemaBuilder::standard();

	assert!(matches!(
		builder.define("qualifiedname", [("x", "Int32", false)]),
		Err(UaError::SchemaDuplicateType { .. })
	));
	assert!(matches!(builder.define("Empty", []), Err(UaError::SchemaEmptyStruct { .. })));
	assert!(matches!(
		builder.define("Twice", [("a", "Int32", false), ("A", "Int32", false)]),
		Err(UaError::SchemaDuplicateMember { member, .. }) if member == "A"
	));
	assert!(matches!(
		builder.define("Forward", [("later", "NotYetDefined", false)]),
		Err(UaError::SchemaUnknownMemberType { member_type, .. }) if member_type == "NotYetDefined"
	));
}

#[test]
fn extended_schemas_keep_standard_builtin_slots() {
	let mut builder = SchemaBuilder::standard();
	assert!(matches!(builder.push_builtin(BuiltinKind::String), Err(UaError::SchemaDuplicateType { name }) if name == "String"));
	assert!(matches!(
		builder.define("statuscode", [("code", "NodeId", false)]),
		Err(UaError::SchemaDuplicateType { .. })
	));
	builder.define("Extra", [("id", "NodeId", false)]).expect("extra type");

	let schema = builder.build();
	for (slot, kind) in BuiltinKind::ALL.into_iter().enumerate() {
		let desc = schema.descriptor(TypeIndex(slot as u16));
		assert_eq!(desc.builtin(), Some(kind), "slot {slot}");
	}
	assert_eq!(&*schema.descriptor(types::CALL_METHOD_REQUEST).name, "CallMethodRequest");
	assert_eq!(schema.len(), TypeSchema::standard().len() + 1);
}

#[test]
fn type_indices_are_bounded_by_u16() {
	assert_eq!(next_index(0).expect("first"), TypeIndex(0));
	assert_eq!(next_index(usize::from(u16::MAX)).expect("last"), TypeIndex(u16::MAX));
	assert!(matches!(next_index(usize::from(u16::MAX) + 1), Err(UaError::SchemaTooLarge { count: 65_537 })));
}

#[test]
#[should_panic(expected = "outside schema")]
fn descriptor_panics_on_foreign_index() {
	let schema = TypeSchema::standard();
	let _ = schema.descriptor(TypeIndex(900));
}
