use std::path::PathBuf;

use tracing::debug;
use uaview::ua::{RenderOptions, Result, ValueView};

use crate::cmd::json::value_json;
use crate::cmd::util::{emit_json, load_schema, parse_assignment, parse_literals, parse_removal};

#[derive(clap::Args)]
pub struct Args {
	/// Type name (case-insensitive).
	pub type_name: String,
	/// Literal constructor arguments.
	#[arg(allow_negative_numbers = true)]
	pub args: Vec<String>,
	/// `PATH=V1,V2`: append an element built from literals to an array member.
	#[arg(long = "append", value_name = "PATH=LITERALS")]
	pub appends: Vec<String>,
	/// `PATH=V1,V2`: assign literals to a member or array element.
	#[arg(long = "set", value_name = "PATH=LITERALS")]
	pub sets: Vec<String>,
	/// `PATH=INDEX`: remove one element of an array member.
	#[arg(long = "remove", value_name = "PATH=INDEX")]
	pub removes: Vec<String>,
	/// Custom type file extending the standard schema.
	#[arg(long)]
	pub schema: Option<PathBuf>,
	/// Use the compact inspection preset.
	#[arg(long)]
	pub inspect: bool,
	#[arg(long = "max-depth")]
	pub max_depth: Option<usize>,
	#[arg(long = "max-items")]
	pub max_items: Option<usize>,
	#[arg(long)]
	pub json: bool,
}

/// Build a value from literals, apply edits, then render it.
///
/// Edits run in a fixed order: appends, then sets, then removals, each in
/// command-line order.
pub fn run(args: Args) -> Result<()> {
	let schema = load_schema(args.schema.as_deref())?;
	let ty = schema.require(&args.type_name)?.index;
	let value = ValueView::with_literals(&schema, ty, &parse_literals(&args.args))?;

	for edit in &args.appends {
		let (path, literals) = parse_assignment(edit)?;
		debug!(%path, "append");
		value.append_path(&path, &literals)?;
	}
	for edit in &args.sets {
		let (path, literals) = parse_assignment(edit)?;
		debug!(%path, "set");
		value.assign_path(&path, &literals)?;
	}
	for edit in &args.removes {
		let (path, index) = parse_removal(edit)?;
		debug!(%path, index, "remove");
		value.remove_path(&path, index)?;
	}

	let mut options = if args.inspect { RenderOptions::inspect() } else { RenderOptions::default() };
	if let Some(depth) = args.max_depth {
		options.max_depth = depth;
	}
	if args.max_items.is_some() {
		options.max_array_items = args.max_items;
	}
	let rendered = value.render_with(&options);

	if args.json {
		let payload = ValueJson {
			type_name: value.type_name().to_owned(),
			rendered,
			value: value_json(&value),
		};
		return emit_json(&payload);
	}

	println!("{rendered}");
	Ok(())
}

#[derive(serde::Serialize)]
struct ValueJson {
	#[serde(rename = "type")]
	type_name: String,
	rendered: String,
	value: serde_json::Value,
}
