use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use uaview::ua::{FieldPath, Literal, Result, TypeSchema, UaError, load_custom_types};

/// Print a serializable payload as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(payload)?);
	Ok(())
}

/// Standard schema, optionally extended from a custom type file.
pub(crate) fn load_schema(path: Option<&Path>) -> Result<Arc<TypeSchema>> {
	match path {
		Some(path) => {
			let schema = load_custom_types(path)?;
			debug!(path = %path.display(), types = schema.len(), "using extended schema");
			Ok(Arc::new(schema))
		}
		None => Ok(TypeSchema::standard()),
	}
}

/// Classify each shell argument as a literal.
pub(crate) fn parse_literals(args: &[String]) -> Vec<Literal> {
	args.iter().map(|arg| Literal::from_text(arg)).collect()
}

/// Split `PATH=V1,V2` into a field path and its literal arguments.
///
/// An empty right-hand side yields no arguments (the zero value).
pub(crate) fn parse_assignment(arg: &str) -> Result<(FieldPath, Vec<Literal>)> {
	let (path, values) = arg.split_once('=').ok_or_else(|| UaError::InvalidAssignment { arg: arg.to_owned() })?;
	let path = FieldPath::parse(path)?;
	let literals = if values.is_empty() { Vec::new() } else { values.split(',').map(Literal::from_text).collect() };
	Ok((path, literals))
}

/// Split `PATH=INDEX` into a field path and an element index.
pub(crate) fn parse_removal(arg: &str) -> Result<(FieldPath, i64)> {
	let invalid = || UaError::InvalidAssignment { arg: arg.to_owned() };
	let (path, index) = arg.split_once('=').ok_or_else(invalid)?;
	let index = index.trim().parse::<i64>().map_err(|_| invalid())?;
	Ok((FieldPath::parse(path)?, index))
}
