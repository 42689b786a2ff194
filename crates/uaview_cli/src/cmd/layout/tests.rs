use crate::cmd::test_support::{fixture_path, run_uaview, run_uaview_json};

#[test]
fn layout_json_reports_array_fields() {
	let json = run_uaview_json(&["layout", "argument", "--json"]);
	assert_eq!(json["type"], "Argument");
	let members = json["members"].as_array().expect("members array");
	assert_eq!(members.len(), 5);
	assert_eq!(members[0]["offset"], 0);

	let dims = &members[3];
	assert_eq!(dims["name"], "arrayDimensions");
	assert_eq!(dims["type"], "UInt32");
	assert_eq!(dims["array"], true);
	let length = dims["length_offset"].as_u64().expect("length offset");
	assert!(dims["offset"].as_u64().expect("data offset") > length);
}

#[test]
fn layout_of_custom_type() {
	let fixture = fixture_path("custom_types.json");
	let fixture = fixture.to_string_lossy().into_owned();
	let json = run_uaview_json(&["layout", "Range", "--schema", &fixture, "--json"]);
	assert_eq!(json["size"], 16);
	assert_eq!(json["fixed_size"], true);
	assert_eq!(json["members"][1]["offset"], 8);
	assert!(json["members"][1]["length_offset"].is_null());
}

#[test]
fn unknown_type_fails_with_message() {
	let output = run_uaview(&["layout", "NoSuchType"]);
	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("error: type not found: NoSuchType"), "{stderr}");
}
