use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::ua::memory;
use crate::ua::raw::{RawExpandedNodeId, RawLocalizedText, RawNodeId, RawQualifiedName, RawString};
use crate::ua::schema::BuiltinKind;
use crate::ua::{Guid, NodeId, Result, TypeIndex, TypeSchema, UaError, ValueView, types};

/// Host-native value used to construct builtin values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	/// Absent value.
	Nil,
	/// Boolean.
	Bool(bool),
	/// Integer.
	Int(i64),
	/// Floating point number.
	Float(f64),
	/// Text.
	Text(String),
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Nil => f.write_str("nil"),
			Self::Bool(value) => write!(f, "{value}"),
			Self::Int(value) => write!(f, "{value}"),
			Self::Float(value) => write!(f, "{value}"),
			Self::Text(value) => f.write_str(value),
		}
	}
}

impl Literal {
	/// Classify shell text: `nil`, `true`/`false`, integers, floats, otherwise text.
	pub fn from_text(text: &str) -> Self {
		match text {
			"nil" => Self::Nil,
			"true" => Self::Bool(true),
			"false" => Self::Bool(false),
			_ => {
				if let Ok(value) = text.parse::<i64>() {
					Self::Int(value)
				} else if let Some(value) = text.parse::<f64>().ok().filter(|_| text.bytes().any(|byte| byte.is_ascii_digit())) {
					Self::Float(value)
				} else {
					Self::Text(text.to_owned())
				}
			}
		}
	}
}

impl FromStr for Literal {
	type Err = std::convert::Infallible;

	fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self::from_text(text))
	}
}

/// Parsed literal arguments, checked before any memory is written.
enum Parsed {
	Zero,
	Fixed(Vec<u8>),
	Text(Vec<u8>),
	NodeId(NodeId),
	ExpandedNodeId(NodeId),
	QualifiedName(u16, String),
	LocalizedText(Option<String>, String),
	Variant(TypeIndex, Box<Parsed>),
}

/// True when `args` describe a valid literal value of `ty`.
pub fn accepts_literals(schema: &TypeSchema, ty: TypeIndex, args: &[Literal]) -> bool {
	parse(schema, ty, args).is_ok()
}

fn parse(schema: &TypeSchema, ty: TypeIndex, args: &[Literal]) -> Result<Parsed> {
	let desc = schema.descriptor(ty);
	if args.is_empty() || matches!(args, [Literal::Nil]) {
		return Ok(Parsed::Zero);
	}

	let name = &*desc.name;
	let Some(kind) = desc.builtin() else {
		return match ty {
			types::QUALIFIED_NAME if name == "QualifiedName" => parse_qualified_name(args),
			types::LOCALIZED_TEXT if name == "LocalizedText" => parse_localized_text(args),
			types::EXPANDED_NODE_ID if name == "ExpandedNodeId" => parse_node_id(name, args).map(Parsed::ExpandedNodeId),
			_ => Err(UaError::LiteralNotAccepted { type_name: name.to_owned() }),
		};
	};

	match kind {
		BuiltinKind::NodeId => return parse_node_id(name, args).map(Parsed::NodeId),
		BuiltinKind::Variant => return parse_variant(schema, args),
		BuiltinKind::DataValue | BuiltinKind::ExtensionObject => return Err(UaError::LiteralNotAccepted { type_name: name.to_owned() }),
		_ => {}
	}

	let [arg] = args else {
		return Err(UaError::malformed(name, format!("expected one argument, got {}", args.len())));
	};

	let fixed = |bytes: &[u8]| Ok(Parsed::Fixed(bytes.to_vec()));
	match (kind, arg) {
		(BuiltinKind::Boolean, Literal::Bool(value)) => fixed(&[u8::from(*value)]),
		(BuiltinKind::Boolean, Literal::Int(value)) => fixed(&[u8::from(*value != 0)]),
		(BuiltinKind::SByte, Literal::Int(value)) => fixed(&ranged::<i8>(name, *value)?.to_ne_bytes()),
		(BuiltinKind::Byte, Literal::Int(value)) => fixed(&ranged::<u8>(name, *value)?.to_ne_bytes()),
		(BuiltinKind::Int16, Literal::Int(value)) => fixed(&ranged::<i16>(name, *value)?.to_ne_bytes()),
		(BuiltinKind::UInt16, Literal::Int(value)) => fixed(&ranged::<u16>(name, *value)?.to_ne_bytes()),
		(BuiltinKind::Int32, Literal::Int(value)) => fixed(&ranged::<i32>(name, *value)?.to_ne_bytes()),
		(BuiltinKind::UInt32, Literal::Int(value)) => fixed(&ranged::<u32>(name, *value)?.to_ne_bytes()),
		(BuiltinKind::Int64 | BuiltinKind::DateTime, Literal::Int(value)) => fixed(&value.to_ne_bytes()),
		(BuiltinKind::UInt64, Literal::Int(value)) => fixed(&ranged::<u64>(name, *value)?.to_ne_bytes()),
		(BuiltinKind::Float, Literal::Float(value)) => fixed(&(*value as f32).to_ne_bytes()),
		(BuiltinKind::Float, Literal::Int(value)) => fixed(&(*value as f32).to_ne_bytes()),
		(BuiltinKind::Double, Literal::Float(value)) => fixed(&value.to_ne_bytes()),
		(BuiltinKind::Double, Literal::Int(value)) => fixed(&(*value as f64).to_ne_bytes()),
		(BuiltinKind::StatusCode, Literal::Int(value)) => fixed(&ranged::<u32>(name, *value)?.to_ne_bytes()),
		(BuiltinKind::StatusCode, Literal::Text(text)) => {
			let digits = text
				.strip_prefix("0x")
				.or_else(|| text.strip_prefix("0X"))
				.ok_or_else(|| UaError::malformed(name, "expected an integer or 0x-prefixed hex"))?;
			let code = u32::from_str_radix(digits, 16).map_err(|_| UaError::malformed(name, format!("invalid hex status {text:?}")))?;
			fixed(&code.to_ne_bytes())
		}
		(BuiltinKind::String | BuiltinKind::XmlElement | BuiltinKind::ByteString, Literal::Text(text)) => Ok(Parsed::Text(text.as_bytes().to_vec())),
		(BuiltinKind::Guid, Literal::Text(text)) => {
			let guid: Guid = text.parse()?;
			// SAFETY: `Guid` is a plain `repr(C)` struct without padding.
			let bytes = unsafe { std::slice::from_raw_parts((&raw const guid).cast::<u8>(), size_of::<Guid>()) };
			fixed(bytes)
		}
		(_, other) => Err(UaError::malformed(name, format!("unsupported argument {other:?}"))),
	}
}

fn ranged<T: TryFrom<i64>>(name: &str, value: i64) -> Result<T> {
	T::try_from(value).map_err(|_| UaError::malformed(name, format!("{value} out of range")))
}

fn parse_node_id(name: &str, args: &[Literal]) -> Result<NodeId> {
	match args {
		[Literal::Text(text)] => text.parse(),
		[Literal::Int(ns), id] => {
			let ns = ranged::<u16>(name, *ns)?;
			match id {
				Literal::Int(id) => Ok(NodeId::numeric(ns, ranged::<u32>(name, *id)?)),
				Literal::Text(id) => Ok(NodeId::string(ns, id.clone())),
				other => Err(UaError::malformed(name, format!("unsupported identifier {other:?}"))),
			}
		}
		_ => Err(UaError::malformed(name, "expected (namespace, identifier) or a node id string")),
	}
}

fn parse_qualified_name(args: &[Literal]) -> Result<Parsed> {
	match args {
		[Literal::Int(ns), Literal::Text(text)] => Ok(Parsed::QualifiedName(ranged::<u16>("QualifiedName", *ns)?, text.clone())),
		[Literal::Text(text)] => Ok(Parsed::QualifiedName(0, text.clone())),
		_ => Err(UaError::malformed("QualifiedName", "expected (namespace, name)")),
	}
}

fn parse_localized_text(args: &[Literal]) -> Result<Parsed> {
	match args {
		[Literal::Text(locale), Literal::Text(text)] => Ok(Parsed::LocalizedText(Some(locale.clone()), text.clone())),
		[Literal::Text(text)] => Ok(Parsed::LocalizedText(None, text.clone())),
		_ => Err(UaError::malformed("LocalizedText", "expected (locale, text)")),
	}
}

fn parse_variant(schema: &TypeSchema, args: &[Literal]) -> Result<Parsed> {
	let [arg] = args else {
		return Err(UaError::malformed("Variant", format!("expected one scalar argument, got {}", args.len())));
	};
	let elem = match arg {
		Literal::Bool(_) => types::BOOLEAN,
		Literal::Int(value) if i32::try_from(*value).is_ok() => types::INT32,
		Literal::Int(_) => types::INT64,
		Literal::Float(_) => types::DOUBLE,
		Literal::Text(_) => types::STRING,
		Literal::Nil => return Ok(Parsed::Zero),
	};
	Ok(Parsed::Variant(elem, Box::new(parse(schema, elem, args)?)))
}

/// Write a parsed literal into a zeroed value.
fn write(view: &ValueView, parsed: Parsed) -> Result<()> {
	let addr = view.addr();
	// SAFETY: `view` is a fresh zeroed value of the type the literal was parsed for.
	unsafe {
		match parsed {
			Parsed::Zero => {}
			Parsed::Fixed(bytes) => std::ptr::copy_nonoverlapping(bytes.as_ptr(), addr, bytes.len()),
			Parsed::Text(bytes) => addr.cast::<RawString>().write(memory::string_new(&bytes)?),
			Parsed::NodeId(node) => addr.cast::<RawNodeId>().write(memory::write_node_id(&node)?),
			Parsed::ExpandedNodeId(node) => (*addr.cast::<RawExpandedNodeId>()).node_id = memory::write_node_id(&node)?,
			Parsed::QualifiedName(ns, name) => {
				let target = addr.cast::<RawQualifiedName>();
				(*target).namespace_index = ns;
				(*target).name = memory::string_new(name.as_bytes())?;
			}
			Parsed::LocalizedText(locale, text) => {
				let target = addr.cast::<RawLocalizedText>();
				if let Some(locale) = locale {
					(*target).locale = memory::string_new(locale.as_bytes())?;
				}
				(*target).text = memory::string_new(text.as_bytes())?;
			}
			Parsed::Variant(elem, inner) => {
				let content = ValueView::new(view.schema(), elem);
				write(&content, *inner)?;
				view.set_scalar(&content)?;
			}
		}
	}
	Ok(())
}

impl ValueView {
	/// Construct a value of `ty` from literal arguments.
	pub fn with_literals(schema: &Arc<TypeSchema>, ty: TypeIndex, args: &[Literal]) -> Result<Self> {
		let parsed = parse(schema, ty, args)?;
		let view = ValueView::new(schema, ty);
		write(&view, parsed)?;
		Ok(view)
	}

	/// Replace this value by one constructed from literal arguments.
	///
	/// Arguments are validated first; on error the value is left untouched.
	pub fn assign_literals(&self, args: &[Literal]) -> Result<()> {
		let staged = ValueView::with_literals(self.schema(), self.type_index(), args)?;
		self.set(&staged)
	}

	/// Read a builtin scalar back as a literal.
	///
	/// Guids read back as their text form; identifiers and composite types
	/// yield `None`.
	pub fn read_literal(&self) -> Option<Literal> {
		let addr = self.addr();
		// SAFETY: each arm reads the layout of the checked builtin kind.
		unsafe {
			Some(match self.builtin()? {
				BuiltinKind::Boolean => Literal::Bool(addr.read() != 0),
				BuiltinKind::SByte => Literal::Int(i64::from(addr.cast::<i8>().read())),
				BuiltinKind::Byte => Literal::Int(i64::from(addr.read())),
				BuiltinKind::Int16 => Literal::Int(i64::from(addr.cast::<i16>().read())),
				BuiltinKind::UInt16 => Literal::Int(i64::from(addr.cast::<u16>().read())),
				BuiltinKind::Int32 => Literal::Int(i64::from(addr.cast::<i32>().read())),
				BuiltinKind::UInt32 | BuiltinKind::StatusCode => Literal::Int(i64::from(addr.cast::<u32>().read())),
				BuiltinKind::Int64 | BuiltinKind::DateTime => Literal::Int(addr.cast::<i64>().read()),
				BuiltinKind::UInt64 => {
					let value = addr.cast::<u64>().read();
					i64::try_from(value).map_or_else(|_| Literal::Text(value.to_string()), Literal::Int)
				}
				BuiltinKind::Float => Literal::Float(f64::from(addr.cast::<f32>().read())),
				BuiltinKind::Double => Literal::Float(addr.cast::<f64>().read()),
				BuiltinKind::String | BuiltinKind::XmlElement | BuiltinKind::ByteString => self.text().map_or(Literal::Nil, Literal::Text),
				BuiltinKind::Guid => Literal::Text(addr.cast::<Guid>().read().to_string()),
				_ => return None,
			})
		}
	}
}

#[cfg(test)]
mod tests;
