use super::*;
use crate::ua::{ArrayState, NodeId, TypeSchema, types};

fn text(value: &str) -> Literal {
	Literal::Text(value.to_owned())
}

#[test]
fn parses_fields_and_indices() {
	let path = FieldPath::parse("inputArguments[2].value").expect("path parses");
	assert_eq!(
		path.steps,
		vec![
			PathStep::Field("inputArguments".to_owned()),
			PathStep::Index(2),
			PathStep::Field("value".to_owned()),
		]
	);
	assert_eq!(path.to_string(), "inputArguments[2].value");
}

#[test]
fn rejects_malformed_paths() {
	for input in ["", ".name", "name.", "items[", "items[]", "items[x]", "a..b", "a b"] {
		let err = FieldPath::parse(input).expect_err("invalid path");
		assert!(matches!(err, UaError::InvalidFieldPath { .. }), "{input:?}");
	}
}

#[test]
fn lookup_walks_nested_members() {
	let schema = TypeSchema::standard();
	let request = ValueView::new(&schema, types::READ_VALUE_ID);
	let path = FieldPath::parse("dataEncoding.name").expect("path");
	request.assign_path(&path, &[text("Default Binary")]).expect("assign");

	let found = request.lookup(&path).expect("lookup").and_then(Member::into_value).expect("scalar");
	assert_eq!(found.text().as_deref(), Some("Default Binary"));
	assert!(request.lookup(&FieldPath::parse("dataEncoding.missing").expect("path")).expect("lookup").is_none());
}

#[test]
fn index_steps_write_back_into_the_array() {
	let schema = TypeSchema::standard();
	let argument = ValueView::new(&schema, types::ARGUMENT);
	let dims = FieldPath::parse("arrayDimensions").expect("path");
	argument.append_path(&dims, &[Literal::Int(3)]).expect("append");
	argument.append_path(&dims, &[Literal::Int(4)]).expect("append");

	argument.assign_path(&FieldPath::parse("arrayDimensions[1]").expect("path"), &[Literal::Int(9)]).expect("set element");
	let array = argument.lookup(&dims).expect("lookup").and_then(Member::into_array).expect("array");
	let values: Vec<_> = array.iter().map(|(_, value)| value.read_literal()).collect();
	assert_eq!(values, vec![Some(Literal::Int(3)), Some(Literal::Int(9))]);

	argument.remove_path(&dims, 0).expect("remove");
	argument.remove_path(&dims, 0).expect("remove");
	assert_eq!(array.state(), ArrayState::Empty);
}

#[test]
fn nested_element_members_are_written_back() {
	let schema = TypeSchema::standard();
	let request = ValueView::new(&schema, types::CALL_METHOD_REQUEST);
	let inputs = FieldPath::parse("inputArguments").expect("path");
	request.append_path(&inputs, &[Literal::Int(1)]).expect("append");

	request.assign_path(&FieldPath::parse("inputArguments[0].value").expect("path"), &[text("changed")]).expect("assign");
	let value = request
		.lookup(&FieldPath::parse("inputArguments[0].value").expect("path"))
		.expect("lookup")
		.and_then(Member::into_value)
		.expect("scalar");
	assert_eq!(value.text().as_deref(), Some("changed"));
}

#[test]
fn variant_array_content_is_written_back() {
	let schema = TypeSchema::standard();
	let variant = ValueView::new(&schema, types::VARIANT);
	variant.set_array(&ArrayView::new(&schema, types::INT32, 0).expect("array")).expect("array content");

	let path = FieldPath::parse("value").expect("path");
	variant.append_path(&path, &[Literal::Int(5)]).expect("append");
	assert_eq!(variant.render(), "Variant: Array(Int32,1):\n[0] = 5");
}

#[test]
fn shape_mismatches_are_reported() {
	let schema = TypeSchema::standard();
	let request = ValueView::new(&schema, types::READ_VALUE_ID);
	request
		.set_member_literal("nodeId", &[Literal::Int(0), Literal::Int(2253)])
		.expect("node id");
	assert_eq!(
		request.lookup(&FieldPath::parse("nodeId").expect("path")).expect("lookup").and_then(Member::into_value).and_then(|v| v.node_id()),
		Some(NodeId::numeric(0, 2253))
	);

	let err = request.lookup(&FieldPath::parse("attributeId[0]").expect("path")).expect_err("scalar index");
	assert!(matches!(err, UaError::InvalidFieldPath { .. }));
	let err = request.append_path(&FieldPath::parse("attributeId").expect("path"), &[Literal::Int(1)]).expect_err("not an array");
	assert!(matches!(err, UaError::NotAnArray { .. }));
	let err = request.assign_path(&FieldPath::parse("missing").expect("path"), &[Literal::Int(1)]).expect_err("missing");
	assert!(matches!(err, UaError::MemberNotFound { .. }));
}

#[test]
fn out_of_range_index_steps_fail() {
	let schema = TypeSchema::standard();
	let request = ValueView::new(&schema, types::CALL_METHOD_REQUEST);
	let err = request
		.assign_path(&FieldPath::parse("inputArguments[0]").expect("path"), &[Literal::Int(1)])
		.expect_err("empty array");
	assert!(matches!(err, UaError::IndexOutOfRange { index: 0, len: 0 }));
}
