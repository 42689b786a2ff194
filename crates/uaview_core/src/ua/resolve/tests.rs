use crate::ua::{SchemaBuilder, TypeSchema, find_member_index, locate_member, member_offsets, types};

#[test]
fn member_lookup_ignores_ascii_case() {
	let schema = TypeSchema::standard();
	let ty = schema.descriptor(types::READ_VALUE_ID);

	assert_eq!(find_member_index(ty, "nodeId"), Some(0));
	assert_eq!(find_member_index(ty, "NODEID"), Some(0));
	assert_eq!(find_member_index(ty, "indexrange"), Some(2));
	assert_eq!(find_member_index(ty, "DataEncoding"), Some(3));
}

#[test]
fn member_lookup_requires_exact_length() {
	let schema = TypeSchema::standard();
	let ty = schema.descriptor(types::READ_VALUE_ID);

	assert_eq!(find_member_index(ty, "node"), None);
	assert_eq!(find_member_index(ty, "nodeIds"), None);
	assert_eq!(find_member_index(ty, ""), None);
}

#[test]
fn lookup_is_deterministic_across_calls() {
	let schema = TypeSchema::standard();
	let ty = schema.descriptor(types::ARGUMENT);
	let first = member_offsets(&schema, ty, 4);
	for _ in 0..8 {
		assert_eq!(member_offsets(&schema, ty, 4), first);
		assert_eq!(find_member_index(ty, "Description"), Some(4));
	}
}

#[test]
fn builtin_types_have_no_members() {
	let schema = TypeSchema::standard();
	assert_eq!(find_member_index(schema.descriptor(types::VARIANT), "value"), None);
	assert_eq!(find_member_index(schema.descriptor(types::INT32), "value"), None);
}

#[test]
fn locate_member_offsets_from_base() {
	let schema = TypeSchema::standard();
	let ty = schema.descriptor(types::ARGUMENT);
	let mut backing = vec![0_u8; ty.size()];
	let base = backing.as_mut_ptr();

	let (value_rank, value_rank_len) = locate_member(base, &schema, ty, 2);
	assert_eq!(value_rank as usize - base as usize, member_offsets(&schema, ty, 2).offset);
	assert!(value_rank_len.is_none());

	let (dims_data, dims_len) = locate_member(base, &schema, ty, 3);
	let dims_len = dims_len.expect("array member has a length field");
	assert!(dims_len < dims_data);
	assert_eq!(dims_data as usize - dims_len as usize, 4 + ty.members[3].mid_padding());
}

#[test]
fn custom_nested_types_walk_through_structured_members() {
	let mut builder = SchemaBuilder::standard();
	let inner = builder
		.define("Inner", [("flag", "Boolean", false), ("value", "Double", false)])
		.expect("define inner");
	let outer = builder
		.define("Outer", [("head", "Byte", false), ("inner", "Inner", false), ("tail", "Byte", false)])
		.expect("define outer");
	let schema = builder.build();

	assert_eq!(schema.descriptor(inner).size(), 16);
	assert_eq!(member_offsets(&schema, schema.descriptor(outer), 1).offset, 8);
	assert_eq!(member_offsets(&schema, schema.descriptor(outer), 2).offset, 24);
	assert_eq!(schema.descriptor(outer).size(), 32);
}

#[test]
#[should_panic(expected = "member index 9")]
fn out_of_range_member_index_panics() {
	let schema = TypeSchema::standard();
	let _ = member_offsets(&schema, schema.descriptor(types::QUALIFIED_NAME), 9);
}
