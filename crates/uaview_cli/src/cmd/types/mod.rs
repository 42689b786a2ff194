use std::path::PathBuf;

use uaview::ua::{Result, TypeDescriptor, TypeKind};

use crate::cmd::util::{emit_json, load_schema};

#[derive(clap::Args)]
pub struct Args {
	/// Custom type file extending the standard schema.
	#[arg(long)]
	pub schema: Option<PathBuf>,
	#[arg(long)]
	pub json: bool,
}

/// List every type of the schema with its size and member count.
pub fn run(args: Args) -> Result<()> {
	let schema = load_schema(args.schema.as_deref())?;

	if args.json {
		let payload = TypesJson {
			count: schema.len(),
			types: schema.iter().map(type_row).collect(),
		};
		return emit_json(&payload);
	}

	println!("types: {}", schema.len());
	for desc in schema.iter() {
		println!(
			"{:>4} {:<24} {:<10} size={:<4} align={:<2} members={}",
			desc.index.0,
			desc.name,
			kind_label(desc),
			desc.size(),
			desc.align(),
			desc.members.len()
		);
	}
	Ok(())
}

pub(crate) fn kind_label(desc: &TypeDescriptor) -> &'static str {
	match desc.kind {
		TypeKind::Builtin(_) => "builtin",
		TypeKind::Structured => "structured",
	}
}

fn type_row(desc: &TypeDescriptor) -> TypeRowJson {
	TypeRowJson {
		index: desc.index.0,
		name: desc.name.to_string(),
		kind: kind_label(desc),
		size: desc.size(),
		align: desc.align(),
		fixed_size: desc.fixed_size,
		members: desc.members.len(),
	}
}

#[derive(serde::Serialize)]
struct TypeRowJson {
	index: u16,
	name: String,
	kind: &'static str,
	size: usize,
	align: usize,
	fixed_size: bool,
	members: usize,
}

#[derive(serde::Serialize)]
struct TypesJson {
	count: usize,
	types: Vec<TypeRowJson>,
}
