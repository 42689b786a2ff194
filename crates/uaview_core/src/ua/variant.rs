use std::alloc::Layout;
use std::mem::{offset_of, size_of};
use std::ptr::{self, NonNull};
use std::sync::Arc;

use bitflags::bitflags;

use crate::ua::memory;
use crate::ua::raw::{RawDataValue, RawVariant, empty_sentinel, is_allocated};
use crate::ua::schema::BuiltinKind;
use crate::ua::{ArrayState, ArrayView, Literal, Member, Result, TypeIndex, UaError, ValueView, types};

bitflags! {
	/// Presence bits of the optional `DataValue` fields.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct DataValueFlags: u8 {
		/// `value` is set.
		const HAS_VALUE = 0x01;
		/// `status` is set.
		const HAS_STATUS = 0x02;
		/// `sourceTimestamp` is set.
		const HAS_SOURCE_TIMESTAMP = 0x04;
		/// `serverTimestamp` is set.
		const HAS_SERVER_TIMESTAMP = 0x08;
	}
}

pub(crate) struct DataValueField {
	pub(crate) name: &'static str,
	pub(crate) flag: DataValueFlags,
	pub(crate) ty: TypeIndex,
	pub(crate) offset: usize,
}

pub(crate) static DATA_VALUE_FIELDS: [DataValueField; 4] = [
	DataValueField {
		name: "value",
		flag: DataValueFlags::HAS_VALUE,
		ty: types::VARIANT,
		offset: offset_of!(RawDataValue, value),
	},
	DataValueField {
		name: "status",
		flag: DataValueFlags::HAS_STATUS,
		ty: types::STATUS_CODE,
		offset: offset_of!(RawDataValue, status),
	},
	DataValueField {
		name: "sourceTimestamp",
		flag: DataValueFlags::HAS_SOURCE_TIMESTAMP,
		ty: types::DATE_TIME,
		offset: offset_of!(RawDataValue, source_timestamp),
	},
	DataValueField {
		name: "serverTimestamp",
		flag: DataValueFlags::HAS_SERVER_TIMESTAMP,
		ty: types::DATE_TIME,
		offset: offset_of!(RawDataValue, server_timestamp),
	},
];

fn data_value_field(name: &str) -> Option<&'static DataValueField> {
	DATA_VALUE_FIELDS.iter().find(|field| field.name.eq_ignore_ascii_case(name))
}

const VARIANT_VALUE: &str = "value";
const VARIANT_DIMENSIONS: &str = "arrayDimensions";

fn raw_variant(view: &ValueView) -> Result<*mut RawVariant> {
	expect_kind(view, BuiltinKind::Variant)?;
	Ok(view.addr().cast())
}

fn raw_data_value(view: &ValueView) -> Result<*mut RawDataValue> {
	expect_kind(view, BuiltinKind::DataValue)?;
	Ok(view.addr().cast())
}

fn expect_kind(view: &ValueView, kind: BuiltinKind) -> Result<()> {
	if view.builtin() == Some(kind) {
		return Ok(());
	}
	Err(UaError::TypeMismatch {
		expected: kind.name().to_owned(),
		got: view.type_name().to_owned(),
	})
}

/// Flagged members of `Variant` and `DataValue`.
///
/// The outer `None` means the view is of another type.
pub(crate) fn special_member(view: &ValueView, name: &str) -> Result<Option<Option<Member>>> {
	match view.builtin() {
		Some(BuiltinKind::Variant) => Ok(Some(variant_member(view, name)?)),
		Some(BuiltinKind::DataValue) => Ok(Some(data_value_member(view, name))),
		_ => Ok(None),
	}
}

fn variant_member(view: &ValueView, name: &str) -> Result<Option<Member>> {
	if name.eq_ignore_ascii_case(VARIANT_VALUE) {
		return Ok(view.variant_content());
	}
	if name.eq_ignore_ascii_case(VARIANT_DIMENSIONS) {
		return Ok(Some(Member::Array(view.variant_dimensions()?)));
	}
	Ok(None)
}

fn data_value_member(view: &ValueView, name: &str) -> Option<Member> {
	let field = data_value_field(name)?;
	if !view.data_value_flags()?.contains(field.flag) {
		return None;
	}
	Some(Member::Value(view.derive(field.ty, view.addr().wrapping_add(field.offset))))
}

pub(crate) fn set_special_member(view: &ValueView, name: &str, value: &ValueView) -> Option<Result<()>> {
	match view.builtin()? {
		BuiltinKind::Variant if name.eq_ignore_ascii_case(VARIANT_VALUE) => Some(view.set_scalar(value)),
		BuiltinKind::Variant if name.eq_ignore_ascii_case(VARIANT_DIMENSIONS) => Some(Err(UaError::NotAScalar {
			type_name: view.type_name().to_owned(),
			member: name.to_owned(),
		})),
		BuiltinKind::DataValue => {
			let field = data_value_field(name)?;
			Some(with_data_value_field(view, field, |target| target.set(value)))
		}
		_ => None,
	}
}

pub(crate) fn set_special_member_array(view: &ValueView, name: &str, array: &ArrayView) -> Option<Result<()>> {
	match view.builtin()? {
		BuiltinKind::Variant if name.eq_ignore_ascii_case(VARIANT_VALUE) => Some(view.set_array(array)),
		BuiltinKind::Variant if name.eq_ignore_ascii_case(VARIANT_DIMENSIONS) => Some(view.set_dimensions(array)),
		BuiltinKind::DataValue => data_value_field(name).map(|_| {
			Err(UaError::NotAnArray {
				type_name: view.type_name().to_owned(),
				member: name.to_owned(),
			})
		}),
		_ => None,
	}
}

pub(crate) fn set_special_member_literal(view: &ValueView, name: &str, args: &[Literal]) -> Option<Result<()>> {
	match view.builtin()? {
		BuiltinKind::Variant if name.eq_ignore_ascii_case(VARIANT_VALUE) => Some(view.assign_literals(args)),
		BuiltinKind::DataValue => {
			let field = data_value_field(name)?;
			Some(with_data_value_field(view, field, |target| target.assign_literals(args)))
		}
		_ => None,
	}
}

fn with_data_value_field(view: &ValueView, field: &DataValueField, write: impl FnOnce(&ValueView) -> Result<()>) -> Result<()> {
	let raw = raw_data_value(view)?;
	let target = view.derive(field.ty, view.addr().wrapping_add(field.offset));
	write(&target)?;
	// SAFETY: `raw` points at a DataValue.
	unsafe { (*raw).flags |= field.flag.bits() };
	Ok(())
}

impl ValueView {
	/// Element type of a `Variant`'s content; `None` when empty or not a variant.
	pub fn variant_type(&self) -> Option<TypeIndex> {
		let raw = raw_variant(self).ok()?;
		// SAFETY: `raw` points at a Variant.
		memory::variant_type(unsafe { &*raw })
	}

	/// True when a `Variant` holds a single value rather than an array.
	pub fn variant_is_scalar(&self) -> bool {
		// SAFETY: `raw` points at a Variant.
		raw_variant(self).is_ok_and(|raw| memory::variant_is_scalar(unsafe { &*raw }))
	}

	fn variant_content(&self) -> Option<Member> {
		let raw = raw_variant(self).ok()?;
		// SAFETY: `raw` points at a Variant.
		let variant = unsafe { raw.read() };
		let elem = memory::variant_type(&variant)?;
		if memory::variant_is_scalar(&variant) {
			let copy = ValueView::new(self.schema(), elem);
			// SAFETY: scalar data holds one valid element; `copy` is fresh.
			unsafe { memory::copy(self.schema(), elem, variant.data, copy.addr()) };
			Some(Member::Value(copy))
		} else {
			// SAFETY: array data holds `array_length` valid elements.
			Some(Member::Array(unsafe { ArrayView::copy_of(self.schema(), elem, variant.data, variant.array_length) }))
		}
	}

	fn variant_dimensions(&self) -> Result<ArrayView> {
		let raw = raw_variant(self)?;
		// SAFETY: `raw` points at a Variant.
		let variant = unsafe { raw.read() };
		// SAFETY: dimensions are owned by the variant.
		let Some(dims) = (unsafe { memory::dimensions(&variant) }) else {
			return ArrayView::new(self.schema(), types::UINT32, -1);
		};
		let array = ArrayView::new(self.schema(), types::UINT32, dims.len() as i64)?;
		if !dims.is_empty() {
			// SAFETY: the fresh array holds `dims.len()` u32 slots.
			unsafe { ptr::copy_nonoverlapping(dims.as_ptr(), array.data_ptr().cast::<u32>(), dims.len()) };
		}
		Ok(array)
	}

	/// Store a deep copy of `value` as the `Variant`'s scalar content.
	pub fn set_scalar(&self, value: &ValueView) -> Result<()> {
		let raw = raw_variant(self)?;
		if !Arc::ptr_eq(self.schema(), value.schema()) {
			return Err(UaError::TypeMismatch {
				expected: "Variant content from the same schema".to_owned(),
				got: value.type_name().to_owned(),
			});
		}

		let elem = value.type_index();
		let staged = memory::new_value(self.schema(), elem);
		// SAFETY: `staged` is fresh; the old content is released before the overwrite.
		unsafe {
			memory::copy(self.schema(), elem, value.addr(), staged.as_ptr());
			memory::variant_release(self.schema(), raw);
			raw.write(RawVariant {
				type_ref: u32::from(elem.0) + 1,
				array_length: 0,
				data: staged.as_ptr(),
				array_dimensions_size: 0,
				array_dimensions: ptr::null_mut(),
			});
		}
		Ok(())
	}

	/// Store a deep copy of `array` as the `Variant`'s array content.
	pub fn set_array(&self, array: &ArrayView) -> Result<()> {
		let raw = raw_variant(self)?;
		if !Arc::ptr_eq(self.schema(), array.schema()) {
			return Err(UaError::TypeMismatch {
				expected: "Variant content from the same schema".to_owned(),
				got: format!("Array({})", array.element_name()),
			});
		}

		let elem = array.element_type();
		// SAFETY: the array fields describe valid elements; the old content is released after the copy.
		unsafe {
			let data = memory::array_copy(self.schema(), elem, array.data_ptr(), array.stored_length());
			memory::variant_release(self.schema(), raw);
			raw.write(RawVariant {
				type_ref: u32::from(elem.0) + 1,
				array_length: array.len() as i32,
				data,
				array_dimensions_size: 0,
				array_dimensions: ptr::null_mut(),
			});
		}
		Ok(())
	}

	fn set_dimensions(&self, array: &ArrayView) -> Result<()> {
		let variant = raw_variant(self)?;
		if !Arc::ptr_eq(self.schema(), array.schema()) || array.element_type() != types::UINT32 {
			return Err(UaError::TypeMismatch {
				expected: "Array(UInt32)".to_owned(),
				got: format!("Array({})", array.element_name()),
			});
		}

		let len = array.len();
		let block = match array.state() {
			ArrayState::Unallocated => ptr::null_mut(),
			ArrayState::Empty => empty_sentinel().cast::<u32>(),
			ArrayState::Populated => {
				let layout = Layout::array::<u32>(len).map_err(|_| UaError::ArrayTooLarge { count: len as u64 })?;
				let block = memory::allocate(layout);
				// SAFETY: both blocks hold `len` u32 values.
				unsafe { ptr::copy_nonoverlapping(array.data_ptr().cast::<u32>(), block.as_ptr().cast::<u32>(), len) };
				block.as_ptr().cast::<u32>()
			}
		};

		// SAFETY: `variant` points at a Variant; the old block is freed with its recorded length.
		unsafe {
			let old = variant.read();
			if let Some(old_block) = NonNull::new(old.array_dimensions.cast::<u8>()).filter(|block| is_allocated(block.as_ptr())) {
				let old_len = old.array_dimensions_size.max(0) as usize;
				memory::free(old_block, Layout::from_size_align_unchecked(old_len * size_of::<u32>(), size_of::<u32>()));
			}
			(*variant).array_dimensions = block;
			(*variant).array_dimensions_size = len as i32;
		}
		Ok(())
	}

	/// Presence flags of a `DataValue`.
	pub fn data_value_flags(&self) -> Option<DataValueFlags> {
		let raw = raw_data_value(self).ok()?;
		// SAFETY: `raw` points at a DataValue.
		Some(DataValueFlags::from_bits_truncate(unsafe { (*raw).flags }))
	}
}
