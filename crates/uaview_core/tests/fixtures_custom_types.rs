#![allow(missing_docs)]

use std::sync::Arc;

use uaview::ua::{FieldPath, Literal, Member, ValueView, load_custom_types};
use uaview_testkit::{fixture_path, json_fixture};

#[test]
fn custom_fixture_types_follow_the_file() {
	let schema = Arc::new(load_custom_types(fixture_path("custom_types.json")).expect("schema"));
	let raw = json_fixture("custom_types.json");
	let declared = raw["types"].as_array().expect("types array");

	for ty in declared {
		let name = ty["name"].as_str().expect("name");
		let desc = schema.require(name).expect("declared type present");
		let members: Vec<&str> = ty["members"].as_array().expect("members").iter().map(|m| m["name"].as_str().expect("member name")).collect();
		let built: Vec<&str> = desc.members.iter().map(|m| &*m.name).collect();
		assert_eq!(built, members, "{name}");
	}
}

#[test]
fn custom_values_support_path_access() {
	let schema = Arc::new(load_custom_types(fixture_path("custom_types.json")).expect("schema"));
	let sensor = ValueView::by_name(&schema, "Sensor").expect("sensor");
	sensor.assign_path(&FieldPath::parse("range.high").expect("path"), &[Literal::Float(90.0)]).expect("assign");
	sensor.append_path(&FieldPath::parse("tags").expect("path"), &[Literal::Text("inlet".to_owned())]).expect("append");

	let high = sensor.lookup(&FieldPath::parse("range.high").expect("path")).expect("lookup").and_then(Member::into_value).expect("scalar");
	assert_eq!(high.read_literal(), Some(Literal::Float(90.0)));
	let tag = sensor.lookup(&FieldPath::parse("tags[0]").expect("path")).expect("lookup").and_then(Member::into_value).expect("scalar");
	assert_eq!(tag.text().as_deref(), Some("inlet"));
}
