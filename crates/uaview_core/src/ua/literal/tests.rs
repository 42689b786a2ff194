use super::*;
use crate::ua::{Member, NodeIdentifier, TypeSchema, memory};

fn text(value: &str) -> Literal {
	Literal::Text(value.to_owned())
}

#[test]
fn shell_text_classifies_into_literals() {
	assert_eq!("nil".parse::<Literal>(), Ok(Literal::Nil));
	assert_eq!("true".parse::<Literal>(), Ok(Literal::Bool(true)));
	assert_eq!("-42".parse::<Literal>(), Ok(Literal::Int(-42)));
	assert_eq!("2.5".parse::<Literal>(), Ok(Literal::Float(2.5)));
	assert_eq!("inf".parse::<Literal>(), Ok(text("inf")));
	assert_eq!("ns=1;i=5".parse::<Literal>(), Ok(text("ns=1;i=5")));
}

#[test]
fn integers_are_range_checked() {
	let schema = TypeSchema::standard();
	let byte = ValueView::with_literals(&schema, types::BYTE, &[Literal::Int(255)]).expect("byte");
	assert_eq!(byte.read_literal(), Some(Literal::Int(255)));

	let err = ValueView::with_literals(&schema, types::BYTE, &[Literal::Int(256)]).expect_err("out of range");
	assert!(matches!(err, UaError::MalformedLiteral { .. }));
	assert!(!accepts_literals(&schema, types::UINT32, &[Literal::Int(-1)]));
	assert!(accepts_literals(&schema, types::INT16, &[Literal::Int(-32768)]));
}

#[test]
fn floats_accept_integers() {
	let schema = TypeSchema::standard();
	let value = ValueView::with_literals(&schema, types::DOUBLE, &[Literal::Int(3)]).expect("double");
	assert_eq!(value.read_literal(), Some(Literal::Float(3.0)));
	let value = ValueView::with_literals(&schema, types::FLOAT, &[Literal::Float(0.5)]).expect("float");
	assert_eq!(value.read_literal(), Some(Literal::Float(0.5)));
}

#[test]
fn status_codes_accept_hex_text() {
	let schema = TypeSchema::standard();
	let value = ValueView::with_literals(&schema, types::STATUS_CODE, &[text("0x80340000")]).expect("status");
	assert_eq!(value.read_literal(), Some(Literal::Int(0x8034_0000)));
	assert!(!accepts_literals(&schema, types::STATUS_CODE, &[text("80340000")]));
}

#[test]
fn empty_arguments_make_a_zero_value() {
	let schema = TypeSchema::standard();
	let value = ValueView::with_literals(&schema, types::INT32, &[]).expect("zero");
	assert_eq!(value.read_literal(), Some(Literal::Int(0)));
	let value = ValueView::with_literals(&schema, types::STRING, &[Literal::Nil]).expect("null string");
	assert_eq!(value.read_literal(), Some(Literal::Nil));
}

#[test]
fn node_id_forms() {
	let schema = TypeSchema::standard();
	let pair = ValueView::with_literals(&schema, types::NODE_ID, &[Literal::Int(1), Literal::Int(42)]).expect("numeric");
	assert_eq!(pair.node_id(), Some(NodeId::numeric(1, 42)));

	let named = ValueView::with_literals(&schema, types::NODE_ID, &[Literal::Int(2), text("Demo")]).expect("string");
	assert_eq!(named.node_id(), Some(NodeId::string(2, "Demo")));

	let parsed = ValueView::with_literals(&schema, types::NODE_ID, &[text("ns=3;s=Pump")]).expect("text form");
	assert_eq!(parsed.node_id(), Some(NodeId::string(3, "Pump")));

	assert!(!accepts_literals(&schema, types::NODE_ID, &[Literal::Int(1)]));
	assert!(!accepts_literals(&schema, types::NODE_ID, &[Literal::Int(70000), Literal::Int(1)]));
}

#[test]
fn guid_literal_is_strict() {
	let schema = TypeSchema::standard();
	let guid = "01234567-89ab-cdef-0123-456789abcdef";
	let value = ValueView::with_literals(&schema, types::GUID, &[text(guid)]).expect("guid");
	assert_eq!(value.read_literal(), Some(text(guid)));
	assert!(!accepts_literals(&schema, types::GUID, &[text("0123456789abcdef0123456789abcdef")]));
}

#[test]
fn composite_text_types() {
	let schema = TypeSchema::standard();
	let name = ValueView::with_literals(&schema, types::QUALIFIED_NAME, &[Literal::Int(1), text("Temperature")]).expect("qualified name");
	let ns = name.member("namespaceIndex").expect("lookup").and_then(Member::into_value).expect("scalar");
	assert_eq!(ns.read_literal(), Some(Literal::Int(1)));

	let localized = ValueView::with_literals(&schema, types::LOCALIZED_TEXT, &[text("en"), text("Hello")]).expect("localized text");
	let locale = localized.member("locale").expect("lookup").and_then(Member::into_value).expect("scalar");
	assert_eq!(locale.text().as_deref(), Some("en"));

	let expanded = ValueView::with_literals(&schema, types::EXPANDED_NODE_ID, &[text("i=85")]).expect("expanded");
	let node = expanded.member("nodeId").expect("lookup").and_then(Member::into_value).expect("scalar");
	assert_eq!(node.node_id().map(|id| id.identifier), Some(NodeIdentifier::Numeric(85)));
}

#[test]
fn variant_picks_the_content_type() {
	let schema = TypeSchema::standard();
	let small = ValueView::with_literals(&schema, types::VARIANT, &[Literal::Int(7)]).expect("int32 variant");
	assert_eq!(small.variant_type(), Some(types::INT32));
	assert!(small.variant_is_scalar());

	let large = ValueView::with_literals(&schema, types::VARIANT, &[Literal::Int(1 << 40)]).expect("int64 variant");
	assert_eq!(large.variant_type(), Some(types::INT64));

	let words = ValueView::with_literals(&schema, types::VARIANT, &[text("hi")]).expect("string variant");
	assert_eq!(words.variant_type(), Some(types::STRING));
}

#[test]
fn unsupported_types_reject_arguments() {
	let schema = TypeSchema::standard();
	let err = ValueView::with_literals(&schema, types::DATA_VALUE, &[Literal::Int(1)]).expect_err("data value");
	assert!(matches!(err, UaError::LiteralNotAccepted { .. }));
	let err = ValueView::with_literals(&schema, types::ARGUMENT, &[text("x")]).expect_err("structure");
	assert!(matches!(err, UaError::LiteralNotAccepted { .. }));
	assert!(accepts_literals(&schema, types::ARGUMENT, &[]));
}

#[test]
fn failed_assignment_leaves_the_value_untouched() {
	let schema = TypeSchema::standard();
	let value = ValueView::with_literals(&schema, types::UINT16, &[Literal::Int(9)]).expect("uint16");
	let before = value.raw_bytes();
	let live = memory::live_allocations();

	assert!(value.assign_literals(&[Literal::Int(-1)]).is_err());
	assert_eq!(value.raw_bytes(), before);
	assert_eq!(memory::live_allocations(), live);
}

#[test]
fn large_unsigned_values_read_back_as_text() {
	let schema = TypeSchema::standard();
	let value = ValueView::new(&schema, types::UINT64);
	unsafe { value.addr().cast::<u64>().write(u64::MAX) };
	assert_eq!(value.read_literal(), Some(text("18446744073709551615")));
}
