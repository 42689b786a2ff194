use std::path::PathBuf;

use uaview::ua::{Result, TypeDescriptor, TypeSchema, member_offsets};

use crate::cmd::types::kind_label;
use crate::cmd::util::{emit_json, load_schema};

#[derive(clap::Args)]
pub struct Args {
	/// Type name (case-insensitive).
	pub type_name: String,
	/// Custom type file extending the standard schema.
	#[arg(long)]
	pub schema: Option<PathBuf>,
	#[arg(long)]
	pub json: bool,
}

/// Show the computed offsets of every member of one type.
pub fn run(args: Args) -> Result<()> {
	let schema = load_schema(args.schema.as_deref())?;
	let desc = schema.require(&args.type_name)?;
	let members = member_rows(&schema, desc);

	if args.json {
		let payload = LayoutJson {
			type_name: desc.name.to_string(),
			kind: kind_label(desc),
			size: desc.size(),
			align: desc.align(),
			fixed_size: desc.fixed_size,
			members,
		};
		return emit_json(&payload);
	}

	println!("{} ({}, size={}, align={})", desc.name, kind_label(desc), desc.size(), desc.align());
	for row in &members {
		let suffix = if row.array { "[]" } else { "" };
		match row.length_offset {
			Some(length) => println!(
				"  +{:<4} {}: {}{suffix} (length at +{length}, pre={} mid={})",
				row.offset, row.name, row.type_name, row.pre_padding, row.mid_padding
			),
			None => println!("  +{:<4} {}: {} (pre={})", row.offset, row.name, row.type_name, row.pre_padding),
		}
	}
	Ok(())
}

fn member_rows(schema: &TypeSchema, desc: &TypeDescriptor) -> Vec<MemberRowJson> {
	desc.members
		.iter()
		.enumerate()
		.map(|(index, member)| {
			let location = member_offsets(schema, desc, index);
			MemberRowJson {
				name: member.name.to_string(),
				type_name: schema.descriptor(member.type_index).name.to_string(),
				array: member.is_array,
				offset: location.offset,
				length_offset: location.length_offset,
				pre_padding: member.pre_padding(),
				mid_padding: member.mid_padding(),
			}
		})
		.collect()
}

#[derive(serde::Serialize)]
struct MemberRowJson {
	name: String,
	#[serde(rename = "type")]
	type_name: String,
	array: bool,
	offset: usize,
	length_offset: Option<usize>,
	pre_padding: usize,
	mid_padding: usize,
}

#[derive(serde::Serialize)]
struct LayoutJson {
	#[serde(rename = "type")]
	type_name: String,
	kind: &'static str,
	size: usize,
	align: usize,
	fixed_size: bool,
	members: Vec<MemberRowJson>,
}

#[cfg(test)]
mod tests;
