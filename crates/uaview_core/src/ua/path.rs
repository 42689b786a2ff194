use std::fmt;
use std::str::FromStr;

use crate::ua::schema::BuiltinKind;
use crate::ua::{ArrayView, Literal, Member, Result, UaError, ValueView};

/// One parsed operation in a field path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
	/// Select a named member.
	Field(String),
	/// Select an array element by zero-based index.
	Index(usize),
}

/// Parsed field path expression such as `inputArguments[2].value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
	/// Ordered sequence of path steps.
	pub steps: Vec<PathStep>,
}

impl FieldPath {
	/// Parse dotted member syntax with optional `[index]` selectors.
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = || UaError::InvalidFieldPath { path: input.to_owned() };
		if input.is_empty() {
			return Err(invalid());
		}

		let bytes = input.as_bytes();
		let mut idx = 0_usize;
		let mut steps = Vec::new();

		while idx < bytes.len() {
			let start = idx;
			while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
				idx += 1;
			}
			if idx == start {
				return Err(invalid());
			}
			steps.push(PathStep::Field(input[start..idx].to_owned()));

			while idx < bytes.len() && bytes[idx] == b'[' {
				idx += 1;
				let n_start = idx;
				while idx < bytes.len() && bytes[idx].is_ascii_digit() {
					idx += 1;
				}
				if idx == n_start || idx >= bytes.len() || bytes[idx] != b']' {
					return Err(invalid());
				}
				let number = input[n_start..idx].parse::<usize>().map_err(|_| invalid())?;
				steps.push(PathStep::Index(number));
				idx += 1;
			}

			if idx < bytes.len() {
				if bytes[idx] != b'.' {
					return Err(invalid());
				}
				idx += 1;
				if idx >= bytes.len() {
					return Err(invalid());
				}
			}
		}

		Ok(Self { steps })
	}
}

impl FromStr for FieldPath {
	type Err = UaError;

	fn from_str(input: &str) -> Result<Self> {
		Self::parse(input)
	}
}

impl fmt::Display for FieldPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (pos, step) in self.steps.iter().enumerate() {
			match step {
				PathStep::Field(name) if pos == 0 => f.write_str(name)?,
				PathStep::Field(name) => write!(f, ".{name}")?,
				PathStep::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}

/// Final location a path write lands on.
enum Slot<'a> {
	Member(&'a ValueView, &'a str),
	Element(&'a ArrayView, usize),
}

fn element_index(index: usize) -> i64 {
	i64::try_from(index).unwrap_or(i64::MAX)
}

/// Run `apply` on a member, storing it back when the parent hands out copies.
fn mutate_member(view: &ValueView, name: &str, apply: impl FnOnce(&Member) -> Result<()>) -> Result<()> {
	let member = view.member(name)?.ok_or_else(|| view.member_not_found(name))?;
	apply(&member)?;
	if view.builtin() != Some(BuiltinKind::Variant) {
		return Ok(());
	}
	match &member {
		Member::Value(value) => view.set_member(name, value),
		Member::Array(array) => view.set_member_array(name, array),
	}
}

/// Walk `steps` below `current` and run `apply` on the final slot.
///
/// Array elements are copies, so every index step writes its element back
/// after the nested write succeeded.
fn visit(current: &Member, steps: &[PathStep], path: &FieldPath, apply: &mut dyn FnMut(Slot<'_>) -> Result<()>) -> Result<()> {
	let Some((step, rest)) = steps.split_first() else {
		return Err(UaError::InvalidFieldPath { path: path.to_string() });
	};
	match (current, step) {
		(Member::Value(view), PathStep::Field(name)) if rest.is_empty() => apply(Slot::Member(view, name)),
		(Member::Array(array), PathStep::Index(index)) if rest.is_empty() => apply(Slot::Element(array, *index)),
		(Member::Value(view), PathStep::Field(name)) => mutate_member(view, name, |child| visit(child, rest, path, apply)),
		(Member::Array(array), PathStep::Index(index)) => {
			let index = element_index(*index);
			let element = array.get(index)?;
			visit(&Member::Value(element.clone()), rest, path, apply)?;
			array.set_at(index, &element)
		}
		_ => Err(UaError::InvalidFieldPath { path: path.to_string() }),
	}
}

impl ValueView {
	/// Resolve a field path; array index steps yield element copies.
	///
	/// `Ok(None)` means a named member does not exist.
	pub fn lookup(&self, path: &FieldPath) -> Result<Option<Member>> {
		let mut current = Member::Value(self.clone());
		for step in &path.steps {
			current = match (current, step) {
				(Member::Value(view), PathStep::Field(name)) => match view.member(name)? {
					Some(member) => member,
					None => return Ok(None),
				},
				(Member::Array(array), PathStep::Index(index)) => Member::Value(array.get(element_index(*index))?),
				_ => return Err(UaError::InvalidFieldPath { path: path.to_string() }),
			};
		}
		Ok(Some(current))
	}

	/// Write literal arguments into the scalar addressed by `path`.
	pub fn assign_path(&self, path: &FieldPath, args: &[Literal]) -> Result<()> {
		visit(&Member::Value(self.clone()), &path.steps, path, &mut |slot| match slot {
			Slot::Member(parent, name) => parent.set_member_literal(name, args),
			Slot::Element(array, index) => {
				let value = ValueView::with_literals(array.schema(), array.element_type(), args)?;
				array.set_at(element_index(index), &value)
			}
		})
	}

	/// Append a literal-constructed element to the array addressed by `path`.
	pub fn append_path(&self, path: &FieldPath, args: &[Literal]) -> Result<()> {
		self.with_path_array(path, |array| {
			let value = ValueView::with_literals(array.schema(), array.element_type(), args)?;
			array.append(&value)
		})
	}

	/// Remove element `index` of the array addressed by `path`.
	pub fn remove_path(&self, path: &FieldPath, index: i64) -> Result<()> {
		self.with_path_array(path, |array| array.remove_at(index))
	}

	fn with_path_array(&self, path: &FieldPath, apply: impl Fn(&ArrayView) -> Result<()>) -> Result<()> {
		visit(&Member::Value(self.clone()), &path.steps, path, &mut |slot| match slot {
			Slot::Member(parent, name) => mutate_member(parent, name, |member| match member {
				Member::Array(array) => apply(array),
				Member::Value(_) => Err(UaError::NotAnArray {
					type_name: parent.type_name().to_owned(),
					member: name.to_owned(),
				}),
			}),
			Slot::Element(array, _) => Err(UaError::NotAnArray {
				type_name: array.element_name().to_owned(),
				member: path.to_string(),
			}),
		})
	}
}

#[cfg(test)]
mod tests;
