use std::fmt;
use std::ptr::{self, NonNull};
use std::rc::Rc;
use std::sync::Arc;

use tracing::trace;

use crate::ua::memory;
use crate::ua::raw::{RawArrayCell, empty_sentinel, is_allocated};
use crate::ua::value::Storage;
use crate::ua::{RenderOptions, Result, TypeDescriptor, TypeIndex, TypeSchema, UaError, ValueView, render_array};

/// Allocation state of an array's data pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayState {
	/// Data pointer is null.
	Unallocated,
	/// Data pointer is the empty sentinel.
	Empty,
	/// Data pointer owns at least one element.
	Populated,
}

/// Handle to an array: an `i32` length field plus a data-pointer field.
///
/// Reads hand out owning copies of elements; writes deep-copy their input.
#[derive(Clone)]
pub struct ArrayView {
	schema: Arc<TypeSchema>,
	elem: TypeIndex,
	length: NonNull<i32>,
	data: NonNull<*mut u8>,
	owner: Rc<Storage>,
}

impl ArrayView {
	/// Allocate a standalone array of `size` zero-initialized elements.
	///
	/// A negative size leaves the array unallocated (stored length `-1`),
	/// zero makes it empty.
	pub fn new(schema: &Arc<TypeSchema>, elem: TypeIndex, size: i64) -> Result<Self> {
		if size > i64::from(i32::MAX) {
			return Err(UaError::ArrayTooLarge { count: size as u64 });
		}
		let view = Self::standalone(schema, elem);
		if size < 0 {
			view.write_fields(-1, ptr::null_mut());
		} else {
			let data = memory::array_new(schema, elem, size as usize)?;
			view.write_fields(size as i32, data);
		}
		trace!(elem = &*schema.descriptor(elem).name, size, "created standalone array");
		Ok(view)
	}

	fn standalone(schema: &Arc<TypeSchema>, elem: TypeIndex) -> Self {
		let owner = Storage::array(schema, elem);
		let cell = owner.block().cast::<RawArrayCell>().as_ptr();
		// SAFETY: the cell block is live for as long as `owner`.
		let (length, data) = unsafe { (NonNull::new_unchecked(&raw mut (*cell).length), NonNull::new_unchecked(&raw mut (*cell).data)) };
		Self {
			schema: schema.clone(),
			elem,
			length,
			data,
			owner,
		}
	}

	/// Standalone deep copy of raw array fields.
	///
	/// # Safety
	/// When allocated, `data` must hold `length` valid elements of `elem`.
	pub(crate) unsafe fn copy_of(schema: &Arc<TypeSchema>, elem: TypeIndex, data: *const u8, length: i32) -> Self {
		let view = Self::standalone(schema, elem);
		// SAFETY: caller contract.
		let copied = unsafe { memory::array_copy(schema, elem, data, length) };
		view.write_fields(if copied.is_null() { -1 } else { length.max(0) }, copied);
		view
	}

	pub(crate) fn from_fields(schema: &Arc<TypeSchema>, elem: TypeIndex, length: *mut i32, data: *mut *mut u8, owner: Rc<Storage>) -> Self {
		// SAFETY: field addresses are offsets into the owner's non-null block.
		let (length, data) = unsafe { (NonNull::new_unchecked(length), NonNull::new_unchecked(data)) };
		Self {
			schema: schema.clone(),
			elem,
			length,
			data,
			owner,
		}
	}

	/// Schema of the element type.
	pub fn schema(&self) -> &Arc<TypeSchema> {
		&self.schema
	}

	/// Element type.
	pub fn element_type(&self) -> TypeIndex {
		self.elem
	}

	/// Element type descriptor.
	pub fn element_descriptor(&self) -> &TypeDescriptor {
		self.schema.descriptor(self.elem)
	}

	/// Element type name.
	pub fn element_name(&self) -> &str {
		&self.element_descriptor().name
	}

	/// Raw length field, which may be negative for an unallocated array.
	pub fn stored_length(&self) -> i32 {
		// SAFETY: the field lives as long as `owner`.
		unsafe { self.length.as_ptr().read() }
	}

	pub(crate) fn data_ptr(&self) -> *mut u8 {
		// SAFETY: the field lives as long as `owner`.
		unsafe { self.data.as_ptr().read() }
	}

	fn write_fields(&self, length: i32, data: *mut u8) {
		// SAFETY: the fields live as long as `owner`.
		unsafe {
			self.length.as_ptr().write(length);
			self.data.as_ptr().write(data);
		}
	}

	/// Element count; unallocated and negative lengths report 0.
	pub fn len(&self) -> usize {
		if is_allocated(self.data_ptr()) { self.stored_length().max(0) as usize } else { 0 }
	}

	/// True when there are no elements.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Allocation state of the data pointer.
	pub fn state(&self) -> ArrayState {
		let data = self.data_ptr();
		if data.is_null() {
			ArrayState::Unallocated
		} else if is_allocated(data) && self.stored_length() > 0 {
			ArrayState::Populated
		} else {
			ArrayState::Empty
		}
	}

	fn slot(&self, index: usize) -> *mut u8 {
		self.data_ptr().wrapping_add(index * self.element_descriptor().size())
	}

	fn check_index(&self, index: i64) -> Result<usize> {
		let len = self.len();
		usize::try_from(index)
			.ok()
			.filter(|slot| *slot < len)
			.ok_or(UaError::IndexOutOfRange { index, len })
	}

	fn check_element(&self, value: &ValueView) -> Result<()> {
		if Arc::ptr_eq(&self.schema, value.schema()) && value.type_index() == self.elem {
			return Ok(());
		}
		Err(UaError::TypeMismatch {
			expected: self.element_name().to_owned(),
			got: value.type_name().to_owned(),
		})
	}

	/// Owning copy of element `index` (0-based).
	pub fn get(&self, index: i64) -> Result<ValueView> {
		let slot = self.check_index(index)?;
		let copy = ValueView::new(&self.schema, self.elem);
		// SAFETY: the slot holds a valid element; `copy` is fresh and zeroed.
		unsafe { memory::copy(&self.schema, self.elem, self.slot(slot), copy.addr()) };
		Ok(copy)
	}

	/// Append a deep copy of `value`, growing the allocation by one element.
	pub fn append(&self, value: &ValueView) -> Result<()> {
		self.check_element(value)?;
		let len = self.len();
		let desc = self.element_descriptor();
		memory::array_layout(desc, len + 1)?;

		let staged = memory::new_value(&self.schema, self.elem);
		// SAFETY: `staged` is fresh; `value` is a valid element.
		unsafe { memory::copy(&self.schema, self.elem, value.addr(), staged.as_ptr()) };

		let data = self.data_ptr();
		let grown = if is_allocated(data) && len > 0 {
			// SAFETY: `data` holds `len` elements.
			unsafe { memory::array_resize(&self.schema, self.elem, data, len, len + 1) }
		} else {
			memory::array_new(&self.schema, self.elem, 1)
		};
		let grown = match grown {
			Ok(grown) => grown,
			Err(err) => {
				// SAFETY: `staged` was never moved anywhere.
				unsafe { memory::delete_value(&self.schema, self.elem, staged) };
				return Err(err);
			}
		};

		// SAFETY: the new last slot is inside `grown`; `staged` is shallowly freed after its bytes move.
		unsafe {
			ptr::copy_nonoverlapping(staged.as_ptr(), grown.add(len * desc.size()), desc.size());
			memory::free(staged, desc.layout);
		}
		self.write_fields((len + 1) as i32, grown);
		trace!(elem = &*desc.name, len = len + 1, "appended element");
		Ok(())
	}

	/// Remove element `index`, shifting the tail down.
	///
	/// Removing the last remaining element frees the allocation and leaves
	/// the array empty (sentinel data pointer).
	pub fn remove_at(&self, index: i64) -> Result<()> {
		let slot = self.check_index(index)?;
		let len = self.len();
		let desc = self.element_descriptor();
		let data = self.data_ptr();

		// SAFETY: `slot < len`; the tail move stays inside the block.
		unsafe {
			memory::release_nested(&self.schema, self.elem, self.slot(slot));
			ptr::copy(self.slot(slot + 1), self.slot(slot), (len - slot - 1) * desc.size());
		}

		if len == 1 {
			// SAFETY: the only element was released above.
			unsafe { memory::array_free(&self.schema, self.elem, data, 1) };
			self.write_fields(0, empty_sentinel());
		} else {
			// SAFETY: elements beyond `len - 1` were moved out.
			let shrunk = unsafe { memory::array_resize(&self.schema, self.elem, data, len, len - 1) }?;
			self.write_fields((len - 1) as i32, shrunk);
		}
		trace!(elem = &*desc.name, len = len - 1, "removed element");
		Ok(())
	}

	/// Replace element `index` by a deep copy of `value`.
	pub fn set_at(&self, index: i64, value: &ValueView) -> Result<()> {
		let slot = self.check_index(index)?;
		self.check_element(value)?;
		let desc = self.element_descriptor();

		let staged = memory::new_value(&self.schema, self.elem);
		// SAFETY: `staged` is fresh; the slot holds a valid element.
		unsafe {
			memory::copy(&self.schema, self.elem, value.addr(), staged.as_ptr());
			memory::release_nested(&self.schema, self.elem, self.slot(slot));
			ptr::copy_nonoverlapping(staged.as_ptr(), self.slot(slot), desc.size());
			memory::free(staged, desc.layout);
		}
		Ok(())
	}

	/// Replace the whole array by a deep copy of `other`, including its state.
	pub fn assign(&self, other: &ArrayView) -> Result<()> {
		if !Arc::ptr_eq(&self.schema, &other.schema) || self.elem != other.elem {
			return Err(UaError::TypeMismatch {
				expected: format!("Array({})", self.element_name()),
				got: format!("Array({})", other.element_name()),
			});
		}
		if self.data == other.data {
			return Ok(());
		}

		let (old_data, old_length) = (self.data_ptr(), self.stored_length());
		// SAFETY: `other` holds valid elements; the old block is released after the swap.
		unsafe {
			let copied = memory::array_copy(&self.schema, self.elem, other.data_ptr(), other.stored_length());
			self.write_fields(other.stored_length(), copied);
			memory::array_delete(&self.schema, self.elem, old_data, old_length);
		}
		Ok(())
	}

	/// Restartable iterator of `(index, copy)` pairs.
	pub fn iter(&self) -> ArrayIter {
		ArrayIter {
			array: self.clone(),
			next: 0,
		}
	}

	/// Independent standalone copy.
	pub fn deep_copy(&self) -> ArrayView {
		// SAFETY: the fields describe valid elements.
		unsafe { Self::copy_of(&self.schema, self.elem, self.data_ptr(), self.stored_length()) }
	}

	/// Deep equality of state, length and elements.
	pub fn content_eq(&self, other: &ArrayView) -> bool {
		Arc::ptr_eq(&self.schema, &other.schema)
			&& self.elem == other.elem
			&& self.state() == other.state()
			// SAFETY: the fields describe valid elements.
			&& unsafe {
				memory::array_equal(
					&self.schema,
					self.elem,
					(self.data_ptr(), self.stored_length()),
					(other.data_ptr(), other.stored_length()),
				)
			}
	}

	/// Render with default options.
	pub fn render(&self) -> String {
		render_array(self, &RenderOptions::default())
	}

	/// Render with explicit options.
	pub fn render_with(&self, options: &RenderOptions) -> String {
		render_array(self, options)
	}
}

impl fmt::Display for ArrayView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.render())
	}
}

impl fmt::Debug for ArrayView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ArrayView")
			.field("element", &self.element_name())
			.field("len", &self.len())
			.field("state", &self.state())
			.field("handles", &Rc::strong_count(&self.owner))
			.finish()
	}
}

impl<'a> IntoIterator for &'a ArrayView {
	type Item = (usize, ValueView);
	type IntoIter = ArrayIter;

	fn into_iter(self) -> ArrayIter {
		self.iter()
	}
}

/// Iterator over owning element copies.
pub struct ArrayIter {
	array: ArrayView,
	next: usize,
}

impl Iterator for ArrayIter {
	type Item = (usize, ValueView);

	fn next(&mut self) -> Option<Self::Item> {
		let index = self.next;
		let value = self.array.get(i64::try_from(index).ok()?).ok()?;
		self.next += 1;
		Some((index, value))
	}
}
