use std::fmt::Write;

use crate::ua::memory;
use crate::ua::raw::{RawExtensionObject, RawLocalizedText, RawString, RawVariant, is_allocated};
use crate::ua::schema::{BuiltinKind, TypeKind};
use crate::ua::variant::DATA_VALUE_FIELDS;
use crate::ua::{ArrayView, DataValueFlags, Guid, TypeIndex, TypeSchema, ValueView, locate_member};

/// Layout and truncation limits for rendered values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
	/// Spaces per nesting level.
	pub indent: usize,
	/// Nesting depth at which composites are elided.
	pub max_depth: usize,
	/// Maximum array entries printed; `None` prints all.
	pub max_array_items: Option<usize>,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			indent: 2,
			max_depth: 16,
			max_array_items: None,
		}
	}
}

impl RenderOptions {
	/// Preset for interactive inspection of large values.
	pub fn inspect() -> Self {
		Self {
			indent: 2,
			max_depth: 6,
			max_array_items: Some(16),
		}
	}
}

/// Render a value as text.
pub fn render_value(view: &ValueView, options: &RenderOptions) -> String {
	let mut out = Renderer::new(view.schema(), options);
	// SAFETY: the view points at a live value of its type.
	unsafe { out.value(view.type_index(), view.addr(), 0) };
	out.finish()
}

/// Render an array as text.
pub fn render_array(view: &ArrayView, options: &RenderOptions) -> String {
	let mut out = Renderer::new(view.schema(), options);
	// SAFETY: the array fields describe live elements.
	unsafe { out.array(view.element_type(), view.data_ptr(), view.stored_length(), 0) };
	out.finish()
}

struct Renderer<'a> {
	schema: &'a TypeSchema,
	options: &'a RenderOptions,
	out: String,
}

impl<'a> Renderer<'a> {
	fn new(schema: &'a TypeSchema, options: &'a RenderOptions) -> Self {
		Self {
			schema,
			options,
			out: String::new(),
		}
	}

	fn finish(self) -> String {
		self.out
	}

	fn line(&mut self, depth: usize) {
		self.out.push('\n');
		self.out.extend(std::iter::repeat_n(' ', self.options.indent * depth));
	}

	/// # Safety
	/// `ptr` must point at a live value of `ty`.
	unsafe fn value(&mut self, ty: TypeIndex, ptr: *const u8, depth: usize) {
		let desc = self.schema.descriptor(ty);
		match desc.kind {
			// SAFETY: caller contract.
			TypeKind::Builtin(kind) => unsafe { self.builtin(ty, kind, ptr, depth) },
			TypeKind::Structured if &*desc.name == "LocalizedText" => {
				// SAFETY: the standard LocalizedText layout is two strings.
				let text = unsafe { ptr.cast::<RawLocalizedText>().read() };
				let _ = write!(
					self.out,
					"localizedtext(locale={},text={})",
					// SAFETY: both strings belong to the live value.
					unsafe { lossy(&text.locale) },
					unsafe { lossy(&text.text) }
				);
			}
			// SAFETY: caller contract.
			TypeKind::Structured => unsafe { self.structure(ty, ptr, depth) },
		}
	}

	unsafe fn structure(&mut self, ty: TypeIndex, ptr: *const u8, depth: usize) {
		let desc = self.schema.descriptor(ty);
		self.out.push_str(&desc.name);
		self.out.push(':');
		if depth >= self.options.max_depth {
			self.out.push_str(" ...");
			return;
		}

		for (index, member) in desc.members.iter().enumerate() {
			self.line(depth);
			let _ = write!(self.out, "{} = ", member.name);
			// SAFETY: member locations stay inside the live value.
			unsafe {
				match locate_member(ptr.cast_mut(), self.schema, desc, index) {
					(data, Some(length)) => self.array(member.type_index, data.cast::<*mut u8>().read(), length.cast::<i32>().read(), depth + 1),
					(addr, None) => self.value(member.type_index, addr, depth + 1),
				}
			}
		}
	}

	/// # Safety
	/// When allocated, `data` must hold `length` live elements of `elem`.
	unsafe fn array(&mut self, elem: TypeIndex, data: *const u8, length: i32, depth: usize) {
		let desc = self.schema.descriptor(elem);
		let count = if data.is_null() {
			-1
		} else if is_allocated(data) {
			i64::from(length.max(0))
		} else {
			0
		};
		let _ = write!(self.out, "Array({},{count}):", desc.name);
		if count <= 0 {
			return;
		}
		if depth >= self.options.max_depth {
			self.out.push_str(" ...");
			return;
		}

		let len = count as usize;
		let shown = self.options.max_array_items.map_or(len, |limit| limit.min(len));
		for index in 0..shown {
			self.line(depth);
			let _ = write!(self.out, "[{index}] = ");
			// SAFETY: `index < len`.
			unsafe { self.value(elem, data.add(index * desc.size()), depth + 1) };
		}
		if shown < len {
			self.line(depth);
			let _ = write!(self.out, "... {} more", len - shown);
		}
	}

	unsafe fn builtin(&mut self, ty: TypeIndex, kind: BuiltinKind, ptr: *const u8, depth: usize) {
		// SAFETY: each arm reads the layout of `kind`.
		unsafe {
			match kind {
				BuiltinKind::Boolean => self.out.push_str(if ptr.read() != 0 { "true" } else { "false" }),
				BuiltinKind::SByte => self.display(ptr.cast::<i8>().read()),
				BuiltinKind::Byte => self.display(ptr.read()),
				BuiltinKind::Int16 => self.display(ptr.cast::<i16>().read()),
				BuiltinKind::UInt16 => self.display(ptr.cast::<u16>().read()),
				BuiltinKind::Int32 => self.display(ptr.cast::<i32>().read()),
				BuiltinKind::UInt32 => self.display(ptr.cast::<u32>().read()),
				BuiltinKind::Int64 | BuiltinKind::DateTime => self.display(ptr.cast::<i64>().read()),
				BuiltinKind::UInt64 => self.display(ptr.cast::<u64>().read()),
				BuiltinKind::Float => self.out.push_str(&float(f64::from(ptr.cast::<f32>().read()))),
				BuiltinKind::Double => self.out.push_str(&float(ptr.cast::<f64>().read())),
				BuiltinKind::StatusCode => {
					let _ = write!(self.out, "0x{:08x}", ptr.cast::<u32>().read());
				}
				BuiltinKind::Guid => self.display(ptr.cast::<Guid>().read()),
				BuiltinKind::String | BuiltinKind::XmlElement | BuiltinKind::ByteString => match memory::string_bytes(ptr.cast::<RawString>()) {
					None => {
						let _ = write!(self.out, "{}()", kind.name());
					}
					Some(bytes) if depth == 0 => self.out.push_str(&String::from_utf8_lossy(bytes)),
					Some(bytes) => {
						let _ = write!(self.out, "\"{}\"", String::from_utf8_lossy(bytes));
					}
				},
				BuiltinKind::NodeId => self.display(memory::read_node_id(ptr.cast())),
				BuiltinKind::Variant => self.variant(ptr.cast::<RawVariant>().read(), depth),
				BuiltinKind::DataValue => self.data_value(ty, ptr, depth),
				BuiltinKind::ExtensionObject => {
					let object = ptr.cast::<RawExtensionObject>().read();
					let body = memory::string_bytes(&object.body).map_or(0, <[u8]>::len);
					let _ = write!(self.out, "ExtensionObject(typeId={},body={body} bytes)", memory::read_node_id(&object.type_id));
				}
			}
		}
	}

	fn display(&mut self, value: impl std::fmt::Display) {
		let _ = write!(self.out, "{value}");
	}

	unsafe fn variant(&mut self, variant: RawVariant, depth: usize) {
		let Some(elem) = memory::variant_type(&variant) else {
			self.out.push_str("Variant()");
			return;
		};
		if memory::variant_is_scalar(&variant) {
			let _ = write!(self.out, "Variant({}): ", self.schema.descriptor(elem).name);
			// SAFETY: scalar content is one live element.
			unsafe { self.value(elem, variant.data, depth + 1) };
		} else {
			self.out.push_str("Variant: ");
			// SAFETY: array content holds `array_length` live elements.
			unsafe { self.array(elem, variant.data, variant.array_length, depth) };
		}
	}

	unsafe fn data_value(&mut self, ty: TypeIndex, ptr: *const u8, depth: usize) {
		self.out.push_str(&self.schema.descriptor(ty).name);
		self.out.push(':');
		if depth >= self.options.max_depth {
			self.out.push_str(" ...");
			return;
		}

		// SAFETY: the flags byte is the first field of a data value.
		let flags = DataValueFlags::from_bits_truncate(unsafe { ptr.read() });
		for field in DATA_VALUE_FIELDS.iter().filter(|field| flags.contains(field.flag)) {
			self.line(depth);
			let _ = write!(self.out, "{} = ", field.name);
			// SAFETY: field offsets come from the data value layout.
			unsafe { self.value(field.ty, ptr.add(field.offset), depth + 1) };
		}
	}
}

/// C `%f` formatting.
fn float(value: f64) -> String {
	if value.is_nan() {
		"nan".to_owned()
	} else if value.is_infinite() {
		if value > 0.0 { "inf" } else { "-inf" }.to_owned()
	} else {
		format!("{value:.6}")
	}
}

unsafe fn lossy(raw: &RawString) -> String {
	// SAFETY: caller contract.
	unsafe { memory::string_bytes(raw) }.map(|bytes| String::from_utf8_lossy(bytes).into_owned()).unwrap_or_default()
}
