use std::fmt;
use std::str::FromStr;

use crate::ua::{Result, UaError};

/// 16-byte globally unique identifier with the OPC UA field split.
///
/// The struct is `#[repr(C)]` and doubles as the in-memory layout of the
/// `Guid` builtin type.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Guid {
	/// First 4 bytes, rendered as 8 hex digits.
	pub data1: u32,
	/// Next 2 bytes.
	pub data2: u16,
	/// Next 2 bytes.
	pub data3: u16,
	/// Trailing 8 bytes, rendered as groups of 2 and 6.
	pub data4: [u8; 8],
}

const GUID_TEXT_LEN: usize = 36;
const GUID_HYPHENS: [usize; 4] = [8, 13, 18, 23];

impl FromStr for Guid {
	type Err = UaError;

	/// Parse `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` (either case).
	fn from_str(text: &str) -> Result<Self> {
		let bytes = text.as_bytes();
		if bytes.len() != GUID_TEXT_LEN {
			return Err(UaError::malformed(
				"Guid",
				format!("expected {GUID_TEXT_LEN} characters of the form 00000000-0000-0000-0000-000000000000, got {}", bytes.len()),
			));
		}
		for (idx, byte) in bytes.iter().enumerate() {
			let ok = if GUID_HYPHENS.contains(&idx) { *byte == b'-' } else { byte.is_ascii_hexdigit() };
			if !ok {
				return Err(UaError::malformed("Guid", format!("unexpected character at position {idx}")));
			}
		}

		let hex = |range: std::ops::Range<usize>| u64::from_str_radix(&text[range], 16).map_err(|_| UaError::malformed("Guid", "invalid hex group"));
		let data4_hi = hex(19..23)?;
		let data4_lo = hex(24..36)?;

		let mut data4 = [0_u8; 8];
		data4[0] = (data4_hi >> 8) as u8;
		data4[1] = data4_hi as u8;
		for (slot, byte) in data4[2..].iter_mut().zip((0..6).rev()) {
			*slot = (data4_lo >> (byte * 8)) as u8;
		}

		Ok(Self {
			data1: hex(0..8)? as u32,
			data2: hex(9..13)? as u16,
			data3: hex(14..18)? as u16,
			data4,
		})
	}
}

impl fmt::Display for Guid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let d = &self.data4;
		write!(
			f,
			"{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
			self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
		)
	}
}

/// Identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeIdentifier {
	/// Numeric identifier (`i=`).
	Numeric(u32),
	/// Text identifier (`s=`).
	String(String),
	/// Guid identifier (`g=`).
	Guid(Guid),
	/// Opaque identifier (`b=`).
	ByteString(Vec<u8>),
}

/// Namespace-scoped node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
	/// Namespace table index.
	pub namespace_index: u16,
	/// Identifier within the namespace.
	pub identifier: NodeIdentifier,
}

impl NodeId {
	/// Build a numeric node id.
	pub fn numeric(namespace_index: u16, id: u32) -> Self {
		Self {
			namespace_index,
			identifier: NodeIdentifier::Numeric(id),
		}
	}

	/// Build a text node id.
	pub fn string(namespace_index: u16, id: impl Into<String>) -> Self {
		Self {
			namespace_index,
			identifier: NodeIdentifier::String(id.into()),
		}
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let ns = self.namespace_index;
		match &self.identifier {
			NodeIdentifier::Numeric(id) => write!(f, "nodeid(ns={ns},i={id})"),
			NodeIdentifier::String(id) => write!(f, "nodeid(ns={ns},s={id})"),
			NodeIdentifier::Guid(id) => write!(f, "nodeid(ns={ns},g={id})"),
			NodeIdentifier::ByteString(id) => write!(f, "nodeid(ns={ns},b={})", hex_string(id)),
		}
	}
}

impl FromStr for NodeId {
	type Err = UaError;

	/// Parse the `ns=<n>;i=<n>` family of node id strings; `ns=` is optional.
	fn from_str(text: &str) -> Result<Self> {
		let (namespace_index, rest) = match text.strip_prefix("ns=") {
			Some(tail) => {
				let (ns, rest) = tail.split_once(';').ok_or_else(|| UaError::malformed("NodeId", "missing ';' after namespace"))?;
				let ns = ns.parse::<u16>().map_err(|_| UaError::malformed("NodeId", format!("invalid namespace index {ns:?}")))?;
				(ns, rest)
			}
			None => (0, text),
		};

		let (kind, value) = rest.split_once('=').ok_or_else(|| UaError::malformed("NodeId", "missing identifier kind"))?;
		let identifier = match kind {
			"i" => NodeIdentifier::Numeric(
				value
					.parse::<u32>()
					.map_err(|_| UaError::malformed("NodeId", format!("invalid numeric identifier {value:?}")))?,
			),
			"s" => NodeIdentifier::String(value.to_owned()),
			"g" => NodeIdentifier::Guid(value.parse()?),
			"b" => NodeIdentifier::ByteString(parse_hex(value).ok_or_else(|| UaError::malformed("NodeId", "invalid hex byte string"))?),
			other => return Err(UaError::malformed("NodeId", format!("unknown identifier kind {other:?}"))),
		};

		Ok(Self { namespace_index, identifier })
	}
}

pub(crate) fn hex_string(bytes: &[u8]) -> String {
	bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
	if text.len() % 2 != 0 || !text.is_ascii() {
		return None;
	}
	(0..text.len())
		.step_by(2)
		.map(|idx| u8::from_str_radix(&text[idx..idx + 2], 16).ok())
		.collect()
}

#[cfg(test)]
mod tests;
