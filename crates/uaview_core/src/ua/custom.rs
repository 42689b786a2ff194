use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ua::{Result, SchemaBuilder, TypeSchema};

/// JSON description of structured types added on top of the standard schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTypeFile {
	/// Type definitions in dependency order.
	pub types: Vec<CustomType>,
}

/// One structured type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomType {
	/// Type name, unique across the schema.
	pub name: String,
	/// Members in memory order.
	pub members: Vec<CustomMember>,
}

/// One member of a custom structured type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMember {
	/// Member name.
	pub name: String,
	/// Name of an already defined type.
	#[serde(rename = "type")]
	pub type_name: String,
	/// Whether the member is an array of `type_name`.
	#[serde(default)]
	pub array: bool,
}

impl CustomTypeFile {
	/// Parse a type file from JSON text.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	/// Read and parse a type file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let text = std::fs::read_to_string(path.as_ref())?;
		Self::from_json(&text)
	}

	/// Add every definition to `builder`, in file order.
	pub fn define_into(&self, builder: &mut SchemaBuilder) -> Result<()> {
		for ty in &self.types {
			let index = builder.define(
				&ty.name,
				ty.members.iter().map(|member| (member.name.as_str(), member.type_name.as_str(), member.array)),
			)?;
			debug!(name = %ty.name, %index, members = ty.members.len(), "defined custom type");
		}
		Ok(())
	}

	/// Standard schema extended with these definitions.
	pub fn build_schema(&self) -> Result<TypeSchema> {
		let mut builder = SchemaBuilder::standard();
		self.define_into(&mut builder)?;
		Ok(builder.build())
	}
}

/// Load a type file and build the standard schema extended with it.
pub fn load_custom_types(path: impl AsRef<Path>) -> Result<TypeSchema> {
	let path = path.as_ref();
	let file = CustomTypeFile::load(path)?;
	debug!(path = %path.display(), types = file.types.len(), "loaded custom type file");
	file.build_schema()
}
