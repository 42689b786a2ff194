use super::*;

#[test]
fn guid_text_round_trips() {
	let text = "01234567-89ab-cdef-0123-456789abcdef";
	let guid: Guid = text.parse().expect("guid parses");
	assert_eq!(guid.data1, 0x0123_4567);
	assert_eq!(guid.data2, 0x89ab);
	assert_eq!(guid.data3, 0xcdef);
	assert_eq!(guid.data4, [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
	assert_eq!(guid.to_string(), text);
}

#[test]
fn guid_accepts_upper_case_and_prints_lower_case() {
	let guid: Guid = "ABCDEF01-2345-6789-ABCD-EF0123456789".parse().expect("guid parses");
	assert_eq!(guid.to_string(), "abcdef01-2345-6789-abcd-ef0123456789");
}

#[test]
fn guid_parsing_is_strict() {
	for text in [
		"",
		"0123456789abcdef0123456789abcdef",
		"01234567-89ab-cdef-0123-456789abcde",
		"01234567-89ab-cdef-0123_456789abcdef",
		"0123456g-89ab-cdef-0123-456789abcdef",
		"{1234567-89ab-cdef-0123-456789abcdef}",
	] {
		let err = text.parse::<Guid>().expect_err("invalid guid");
		assert!(matches!(err, UaError::MalformedLiteral { .. }), "{text:?}");
	}
}

#[test]
fn node_id_text_forms() {
	assert_eq!("i=85".parse::<NodeId>().expect("numeric"), NodeId::numeric(0, 85));
	assert_eq!("ns=2;s=Line 1".parse::<NodeId>().expect("string"), NodeId::string(2, "Line 1"));

	let guid = "ns=1;g=01234567-89ab-cdef-0123-456789abcdef".parse::<NodeId>().expect("guid");
	assert!(matches!(guid.identifier, NodeIdentifier::Guid(_)));
	assert_eq!(guid.to_string(), "nodeid(ns=1,g=01234567-89ab-cdef-0123-456789abcdef)");

	let bytes = "ns=4;b=00ff10".parse::<NodeId>().expect("byte string");
	assert_eq!(bytes.identifier, NodeIdentifier::ByteString(vec![0x00, 0xff, 0x10]));
	assert_eq!(bytes.to_string(), "nodeid(ns=4,b=00ff10)");
}

#[test]
fn node_id_display_matches_namespace_and_kind() {
	assert_eq!(NodeId::numeric(2, 42).to_string(), "nodeid(ns=2,i=42)");
	assert_eq!(NodeId::string(0, "Pump").to_string(), "nodeid(ns=0,s=Pump)");
}

#[test]
fn node_id_rejects_bad_forms() {
	for text in ["85", "x=1", "ns=1i=2", "ns=70000;i=1", "i=-1", "b=0f0", "g=not-a-guid"] {
		let err = text.parse::<NodeId>().expect_err("invalid node id");
		assert!(matches!(err, UaError::MalformedLiteral { .. }), "{text:?}");
	}
}
