use serde_json::{Map, Value, json};
use uaview::ua::{ArrayState, ArrayView, BuiltinKind, Literal, Member, ValueView};

const DATA_VALUE_FIELDS: [&str; 4] = ["value", "status", "sourceTimestamp", "serverTimestamp"];

/// Convert a value into a JSON tree.
///
/// Structures become `{"type", "fields"}` objects, arrays become lists
/// (`null` when unallocated), node ids and guids their text form.
pub(crate) fn value_json(view: &ValueView) -> Value {
	match view.builtin() {
		None => {
			let fields: Map<String, Value> = view.members().map(|(name, member)| (name.to_owned(), member_json(&member))).collect();
			json!({ "type": view.type_name(), "fields": fields })
		}
		Some(BuiltinKind::NodeId | BuiltinKind::StatusCode | BuiltinKind::ExtensionObject) => Value::String(view.render()),
		Some(BuiltinKind::Variant) => match view.member("value") {
			Ok(Some(member)) => json!({ "type": variant_type_name(view), "value": member_json(&member) }),
			_ => Value::Null,
		},
		Some(BuiltinKind::DataValue) => {
			let fields: Map<String, Value> = DATA_VALUE_FIELDS
				.iter()
				.filter_map(|name| match view.member(name) {
					Ok(Some(member)) => Some(((*name).to_owned(), member_json(&member))),
					_ => None,
				})
				.collect();
			Value::Object(fields)
		}
		Some(_) => view.read_literal().map_or(Value::Null, literal_json),
	}
}

/// Convert an array into a JSON list, or `null` when unallocated.
pub(crate) fn array_json(array: &ArrayView) -> Value {
	if array.state() == ArrayState::Unallocated {
		return Value::Null;
	}
	Value::Array(array.iter().map(|(_, item)| value_json(&item)).collect())
}

fn member_json(member: &Member) -> Value {
	match member {
		Member::Value(view) => value_json(view),
		Member::Array(array) => array_json(array),
	}
}

fn variant_type_name(view: &ValueView) -> Option<String> {
	let ty = view.variant_type()?;
	view.schema().get(ty).map(|desc| desc.name.to_string())
}

fn literal_json(literal: Literal) -> Value {
	match literal {
		Literal::Nil => Value::Null,
		Literal::Bool(value) => Value::Bool(value),
		Literal::Int(value) => Value::from(value),
		Literal::Float(value) => serde_json::Number::from_f64(value).map_or_else(|| Value::String(value.to_string()), Value::Number),
		Literal::Text(value) => Value::String(value),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use uaview::ua::{TypeSchema, types};

	#[test]
	fn structures_nest_type_and_fields() {
		let schema = TypeSchema::standard();
		let name = ValueView::with_literals(&schema, types::QUALIFIED_NAME, &[Literal::Int(1), Literal::Text("Speed".to_owned())]).expect("name");
		let json = value_json(&name);
		assert_eq!(json["type"], "QualifiedName");
		assert_eq!(json["fields"]["namespaceIndex"], 1);
		assert_eq!(json["fields"]["name"], "Speed");
	}

	#[test]
	fn array_states_map_to_null_and_lists() {
		let schema = TypeSchema::standard();
		assert_eq!(array_json(&ArrayView::new(&schema, types::INT32, -1).expect("array")), Value::Null);
		assert_eq!(array_json(&ArrayView::new(&schema, types::INT32, 0).expect("array")), json!([]));
		assert_eq!(array_json(&ArrayView::new(&schema, types::BOOLEAN, 2).expect("array")), json!([false, false]));
	}

	#[test]
	fn variants_carry_their_content_type() {
		let schema = TypeSchema::standard();
		let variant = ValueView::with_literals(&schema, types::VARIANT, &[Literal::Float(0.5)]).expect("variant");
		assert_eq!(value_json(&variant), json!({ "type": "Double", "value": 0.5 }));
		assert_eq!(value_json(&ValueView::new(&schema, types::VARIANT)), Value::Null);
	}

	#[test]
	fn non_finite_floats_become_text() {
		assert_eq!(literal_json(Literal::Float(f64::INFINITY)), Value::String("inf".to_owned()));
	}
}
