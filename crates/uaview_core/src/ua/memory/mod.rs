//! Schema-driven allocation, release, copy and comparison of raw values.
//!
//! Every heap block handed out here is recorded in a per-thread registry so
//! that tests can count live allocations and a double free turns into a
//! panic instead of heap corruption.

use std::alloc::{self, Layout};
use std::cell::RefCell;
use std::collections::HashMap;
use std::mem::size_of;
use std::ptr::{self, NonNull};
use std::slice;

use tracing::trace;

use crate::ua::raw::{
	NODEID_BYTESTRING, NODEID_GUID, NODEID_NUMERIC, NODEID_STRING, RawDataValue, RawExtensionObject, RawNodeId, RawNodeIdentifier, RawString,
	RawVariant, empty_sentinel, is_allocated,
};
use crate::ua::schema::{BuiltinKind, TypeKind};
use crate::ua::{NodeId, NodeIdentifier, Result, TypeDescriptor, TypeIndex, TypeSchema, UaError, member_offsets};

thread_local! {
	static LIVE: RefCell<HashMap<usize, Layout>> = RefCell::new(HashMap::new());
}

/// Number of heap blocks currently allocated on this thread.
pub fn live_allocations() -> usize {
	LIVE.try_with(|live| live.borrow().len()).unwrap_or(0)
}

fn non_zero(layout: Layout) -> Layout {
	if layout.size() > 0 {
		return layout;
	}
	// SAFETY: alignment comes from a valid layout and a size of one cannot overflow it.
	unsafe { Layout::from_size_align_unchecked(1, layout.align()) }
}

/// Allocate a zeroed block.
pub(crate) fn allocate(layout: Layout) -> NonNull<u8> {
	let layout = non_zero(layout);
	// SAFETY: `layout` has a non-zero size.
	let raw = unsafe { alloc::alloc_zeroed(layout) };
	let Some(block) = NonNull::new(raw) else {
		alloc::handle_alloc_error(layout)
	};
	let _ = LIVE.try_with(|live| live.borrow_mut().insert(block.as_ptr().addr(), layout));
	block
}

/// Free a block returned by [`allocate`] or [`reallocate`].
///
/// Panics when `block` is not live on this thread or `layout` differs from
/// the one it was allocated with.
///
/// # Safety
/// `block` must come from this module and must not be used afterwards.
pub(crate) unsafe fn free(block: NonNull<u8>, layout: Layout) {
	let layout = non_zero(layout);
	let addr = block.as_ptr().addr();
	let _ = LIVE.try_with(|live| match live.borrow_mut().remove(&addr) {
		Some(recorded) => assert_eq!(recorded, layout, "free of {addr:#x} with a different layout"),
		None => panic!("free of untracked address {addr:#x}"),
	});
	// SAFETY: caller contract; layout matches the allocation.
	unsafe { alloc::dealloc(block.as_ptr(), layout) };
}

/// Resize a block, zeroing any bytes added at the end.
///
/// # Safety
/// `block` must be live with layout `old`; it is invalid after the call.
pub(crate) unsafe fn reallocate(block: NonNull<u8>, old: Layout, new_size: usize) -> NonNull<u8> {
	let old = non_zero(old);
	let new_size = new_size.max(1);
	let addr = block.as_ptr().addr();
	let _ = LIVE.try_with(|live| {
		if live.borrow_mut().remove(&addr).is_none() {
			panic!("reallocate of untracked address {addr:#x}");
		}
	});

	// SAFETY: caller contract; `new_size` is non-zero and was validated by the caller's layout computation.
	let raw = unsafe { alloc::realloc(block.as_ptr(), old, new_size) };
	// SAFETY: alignment is unchanged from a valid layout.
	let new_layout = unsafe { Layout::from_size_align_unchecked(new_size, old.align()) };
	let Some(moved) = NonNull::new(raw) else {
		alloc::handle_alloc_error(new_layout)
	};
	if new_size > old.size() {
		// SAFETY: the tail lies inside the new block.
		unsafe { moved.as_ptr().add(old.size()).write_bytes(0, new_size - old.size()) };
	}
	let _ = LIVE.try_with(|live| live.borrow_mut().insert(moved.as_ptr().addr(), new_layout));
	moved
}

/// Layout of `len` contiguous elements, or [`UaError::ArrayTooLarge`].
pub(crate) fn array_layout(elem: &TypeDescriptor, len: usize) -> Result<Layout> {
	elem.size()
		.checked_mul(len)
		.filter(|_| i32::try_from(len).is_ok())
		.and_then(|size| Layout::from_size_align(size, elem.align()).ok())
		.ok_or(UaError::ArrayTooLarge { count: len as u64 })
}

fn existing_array_layout(elem: &TypeDescriptor, len: usize) -> Layout {
	// SAFETY: the same size and alignment passed `array_layout` when the block was allocated.
	unsafe { Layout::from_size_align_unchecked(elem.size() * len, elem.align()) }
}

fn byte_layout(len: usize) -> Layout {
	// SAFETY: byte lengths are bounded by `i32::MAX`.
	unsafe { Layout::from_size_align_unchecked(len, 1) }
}

/// Allocate a zeroed owning value of `ty`.
pub(crate) fn new_value(schema: &TypeSchema, ty: TypeIndex) -> NonNull<u8> {
	let desc = schema.descriptor(ty);
	let block = allocate(desc.layout);
	trace!(type_name = &*desc.name, addr = block.as_ptr().addr(), "allocated value");
	block
}

/// Release nested memory, then the value block itself.
///
/// # Safety
/// `block` must be a live value of `ty` allocated by [`new_value`].
pub(crate) unsafe fn delete_value(schema: &TypeSchema, ty: TypeIndex, block: NonNull<u8>) {
	let desc = schema.descriptor(ty);
	trace!(type_name = &*desc.name, addr = block.as_ptr().addr(), "deleting value");
	// SAFETY: caller contract.
	unsafe {
		release_nested(schema, ty, block.as_ptr());
		free(block, desc.layout);
	}
}

/// Deep-copy the value at `src` into the uninitialized region at `dst`.
///
/// # Safety
/// `src` must be a valid value of `ty`; `dst` must be writable for its size
/// and must not overlap `src`. Nothing at `dst` is released.
pub(crate) unsafe fn copy(schema: &TypeSchema, ty: TypeIndex, src: *const u8, dst: *mut u8) {
	let desc = schema.descriptor(ty);
	// SAFETY: caller contract.
	unsafe {
		ptr::copy_nonoverlapping(src, dst, desc.size());
		duplicate_nested(schema, ty, dst);
	}
}

/// Free every heap block owned by the value at `ptr`, leaving dangling fields behind.
///
/// # Safety
/// `ptr` must point at a valid value of `ty`.
pub(crate) unsafe fn release_nested(schema: &TypeSchema, ty: TypeIndex, ptr: *mut u8) {
	let desc = schema.descriptor(ty);
	if desc.fixed_size {
		return;
	}

	// SAFETY: caller contract; member offsets come from the same schema.
	unsafe {
		match desc.kind {
			TypeKind::Builtin(kind) => release_builtin(schema, kind, ptr),
			TypeKind::Structured => {
				for (index, member) in desc.members.iter().enumerate() {
					let location = member_offsets(schema, desc, index);
					match location.length_offset {
						Some(length_offset) => {
							let length = ptr.add(length_offset).cast::<i32>().read();
							let data = ptr.add(location.offset).cast::<*mut u8>().read();
							array_delete(schema, member.type_index, data, length);
						}
						None => release_nested(schema, member.type_index, ptr.add(location.offset)),
					}
				}
			}
		}
	}
}

unsafe fn release_builtin(schema: &TypeSchema, kind: BuiltinKind, ptr: *mut u8) {
	// SAFETY: caller guarantees `ptr` holds a value of `kind`.
	unsafe {
		match kind {
			BuiltinKind::String | BuiltinKind::ByteString | BuiltinKind::XmlElement => string_release(ptr.cast()),
			BuiltinKind::NodeId => node_id_release(ptr.cast()),
			BuiltinKind::Variant => variant_release(schema, ptr.cast()),
			BuiltinKind::DataValue => variant_release(schema, &raw mut (*ptr.cast::<RawDataValue>()).value),
			BuiltinKind::ExtensionObject => {
				let object = ptr.cast::<RawExtensionObject>();
				node_id_release(&raw mut (*object).type_id);
				string_release(&raw mut (*object).body);
			}
			_ => {}
		}
	}
}

/// Replace every owned pointer of the value at `ptr` by a fresh copy.
///
/// # Safety
/// `ptr` must hold a byte copy of a valid value of `ty`.
unsafe fn duplicate_nested(schema: &TypeSchema, ty: TypeIndex, ptr: *mut u8) {
	let desc = schema.descriptor(ty);
	if desc.fixed_size {
		return;
	}

	// SAFETY: caller contract; member offsets come from the same schema.
	unsafe {
		match desc.kind {
			TypeKind::Builtin(kind) => duplicate_builtin(schema, kind, ptr),
			TypeKind::Structured => {
				for (index, member) in desc.members.iter().enumerate() {
					let location = member_offsets(schema, desc, index);
					match location.length_offset {
						Some(length_offset) => {
							let length = ptr.add(length_offset).cast::<i32>().read();
							let data = ptr.add(location.offset).cast::<*mut u8>();
							data.write(array_copy(schema, member.type_index, data.read(), length));
						}
						None => duplicate_nested(schema, member.type_index, ptr.add(location.offset)),
					}
				}
			}
		}
	}
}

unsafe fn duplicate_builtin(schema: &TypeSchema, kind: BuiltinKind, ptr: *mut u8) {
	// SAFETY: caller guarantees `ptr` holds a byte copy of a value of `kind`.
	unsafe {
		match kind {
			BuiltinKind::String | BuiltinKind::ByteString | BuiltinKind::XmlElement => string_duplicate(ptr.cast()),
			BuiltinKind::NodeId => node_id_duplicate(ptr.cast()),
			BuiltinKind::Variant => variant_duplicate(schema, ptr.cast()),
			BuiltinKind::DataValue => variant_duplicate(schema, &raw mut (*ptr.cast::<RawDataValue>()).value),
			BuiltinKind::ExtensionObject => {
				let object = ptr.cast::<RawExtensionObject>();
				node_id_duplicate(&raw mut (*object).type_id);
				string_duplicate(&raw mut (*object).body);
			}
			_ => {}
		}
	}
}

/// Allocate `len` zeroed elements; 0 yields the empty sentinel.
pub(crate) fn array_new(schema: &TypeSchema, elem: TypeIndex, len: usize) -> Result<*mut u8> {
	if len == 0 {
		return Ok(empty_sentinel());
	}
	let layout = array_layout(schema.descriptor(elem), len)?;
	Ok(allocate(layout).as_ptr())
}

/// Deep-copy an element block, preserving the null and empty states.
///
/// # Safety
/// When allocated, `data` must hold `len` valid elements of `elem`.
pub(crate) unsafe fn array_copy(schema: &TypeSchema, elem: TypeIndex, data: *const u8, len: i32) -> *mut u8 {
	if data.is_null() {
		return ptr::null_mut();
	}
	if !is_allocated(data) || len <= 0 {
		return empty_sentinel();
	}

	let desc = schema.descriptor(elem);
	let len = len as usize;
	let block = allocate(existing_array_layout(desc, len));
	// SAFETY: caller contract; both blocks hold `len` elements.
	unsafe {
		ptr::copy_nonoverlapping(data, block.as_ptr(), desc.size() * len);
		for slot in 0..len {
			duplicate_nested(schema, elem, block.as_ptr().add(slot * desc.size()));
		}
	}
	block.as_ptr()
}

/// Release `len` elements and their block. Null and sentinel pointers are ignored.
///
/// # Safety
/// When allocated, `data` must be a live block of `len` valid elements of `elem`.
pub(crate) unsafe fn array_delete(schema: &TypeSchema, elem: TypeIndex, data: *mut u8, len: i32) {
	let Some(block) = NonNull::new(data).filter(|block| is_allocated(block.as_ptr())) else {
		return;
	};
	let desc = schema.descriptor(elem);
	let len = len.max(0) as usize;
	// SAFETY: caller contract.
	unsafe {
		for slot in 0..len {
			release_nested(schema, elem, data.add(slot * desc.size()));
		}
		free(block, existing_array_layout(desc, len));
	}
}

/// Free an element block whose elements were already released or moved out.
///
/// # Safety
/// `data` must be a live block allocated for `len` elements of `elem`.
pub(crate) unsafe fn array_free(schema: &TypeSchema, elem: TypeIndex, data: *mut u8, len: usize) {
	if let Some(block) = NonNull::new(data).filter(|block| is_allocated(block.as_ptr())) {
		// SAFETY: caller contract.
		unsafe { free(block, existing_array_layout(schema.descriptor(elem), len)) };
	}
}

/// Grow or shrink an allocated element block from `old_len` to `new_len` (both non-zero).
///
/// # Safety
/// `data` must be a live block of `old_len` elements of `elem`. Elements
/// beyond `new_len` must already be released.
pub(crate) unsafe fn array_resize(schema: &TypeSchema, elem: TypeIndex, data: *mut u8, old_len: usize, new_len: usize) -> Result<*mut u8> {
	let desc = schema.descriptor(elem);
	let new_layout = array_layout(desc, new_len)?;
	let Some(block) = NonNull::new(data) else {
		return Ok(allocate(new_layout).as_ptr());
	};
	trace!(type_name = &*desc.name, old_len, new_len, "resizing array");
	// SAFETY: caller contract.
	Ok(unsafe { reallocate(block, existing_array_layout(desc, old_len), new_layout.size()) }.as_ptr())
}

/// Deep structural equality of two values of `ty`. Padding bytes are ignored.
///
/// # Safety
/// Both pointers must point at valid values of `ty`.
pub(crate) unsafe fn equal(schema: &TypeSchema, ty: TypeIndex, a: *const u8, b: *const u8) -> bool {
	let desc = schema.descriptor(ty);
	// SAFETY: caller contract.
	unsafe {
		match desc.kind {
			TypeKind::Builtin(kind) if kind.is_fixed_size() => bytes_of(a, desc.size()) == bytes_of(b, desc.size()),
			TypeKind::Builtin(BuiltinKind::String | BuiltinKind::ByteString | BuiltinKind::XmlElement) => {
				string_bytes(a.cast()) == string_bytes(b.cast())
			}
			TypeKind::Builtin(BuiltinKind::NodeId) => read_node_id(a.cast()) == read_node_id(b.cast()),
			TypeKind::Builtin(BuiltinKind::Variant) => variant_equal(schema, a.cast(), b.cast()),
			TypeKind::Builtin(BuiltinKind::DataValue) => {
				let (left, right) = (&*a.cast::<RawDataValue>(), &*b.cast::<RawDataValue>());
				left.flags == right.flags
					&& left.status == right.status
					&& left.source_timestamp == right.source_timestamp
					&& left.server_timestamp == right.server_timestamp
					&& variant_equal(schema, &left.value, &right.value)
			}
			TypeKind::Builtin(BuiltinKind::ExtensionObject) => {
				let (left, right) = (a.cast::<RawExtensionObject>(), b.cast::<RawExtensionObject>());
				(*left).encoding == (*right).encoding
					&& read_node_id(&raw const (*left).type_id) == read_node_id(&raw const (*right).type_id)
					&& string_bytes(&raw const (*left).body) == string_bytes(&raw const (*right).body)
			}
			TypeKind::Builtin(_) => bytes_of(a, desc.size()) == bytes_of(b, desc.size()),
			TypeKind::Structured => desc.members.iter().enumerate().all(|(index, member)| {
				let location = member_offsets(schema, desc, index);
				match location.length_offset {
					Some(length_offset) => array_equal(
						schema,
						member.type_index,
						(a.add(location.offset).cast::<*const u8>().read(), a.add(length_offset).cast::<i32>().read()),
						(b.add(location.offset).cast::<*const u8>().read(), b.add(length_offset).cast::<i32>().read()),
					),
					None => equal(schema, member.type_index, a.add(location.offset), b.add(location.offset)),
				}
			}),
		}
	}
}

/// Compare two element blocks, including their null / empty / populated state.
///
/// # Safety
/// Allocated blocks must hold the given number of valid elements.
pub(crate) unsafe fn array_equal(schema: &TypeSchema, elem: TypeIndex, a: (*const u8, i32), b: (*const u8, i32)) -> bool {
	if a.0.is_null() != b.0.is_null() || a.1.max(0) != b.1.max(0) {
		return false;
	}
	if !is_allocated(a.0) || !is_allocated(b.0) {
		return is_allocated(a.0) == is_allocated(b.0);
	}
	let size = schema.descriptor(elem).size();
	// SAFETY: caller contract.
	(0..a.1.max(0) as usize).all(|slot| unsafe { equal(schema, elem, a.0.add(slot * size), b.0.add(slot * size)) })
}

unsafe fn bytes_of<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
	// SAFETY: caller guarantees `len` readable bytes.
	unsafe { slice::from_raw_parts(ptr, len) }
}

/// Allocate a string holding `bytes`; empty input yields the empty (sentinel) string.
pub(crate) fn string_new(bytes: &[u8]) -> Result<RawString> {
	if bytes.is_empty() {
		return Ok(RawString {
			length: 0,
			data: empty_sentinel(),
		});
	}
	let length = i32::try_from(bytes.len()).map_err(|_| UaError::ArrayTooLarge { count: bytes.len() as u64 })?;
	let block = allocate(byte_layout(bytes.len()));
	// SAFETY: fresh block of `bytes.len()` bytes.
	unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), block.as_ptr(), bytes.len()) };
	Ok(RawString {
		length,
		data: block.as_ptr(),
	})
}

/// Borrow string bytes; `None` for the null string.
///
/// # Safety
/// `raw` must point at a valid string whose storage outlives `'a`.
pub(crate) unsafe fn string_bytes<'a>(raw: *const RawString) -> Option<&'a [u8]> {
	// SAFETY: caller contract.
	let value = unsafe { raw.read() };
	if value.data.is_null() {
		return None;
	}
	if !is_allocated(value.data) || value.length <= 0 {
		return Some(&[]);
	}
	// SAFETY: allocated strings hold `length` bytes.
	Some(unsafe { bytes_of(value.data, value.length as usize) })
}

unsafe fn string_release(raw: *mut RawString) {
	// SAFETY: caller guarantees a valid string.
	unsafe {
		let value = raw.read();
		if let Some(block) = NonNull::new(value.data).filter(|block| is_allocated(block.as_ptr())) {
			free(block, byte_layout(value.length.max(0) as usize));
		}
	}
}

unsafe fn string_duplicate(raw: *mut RawString) {
	// SAFETY: caller guarantees a byte copy of a valid string.
	unsafe {
		let value = raw.read();
		if is_allocated(value.data) {
			let len = value.length.max(0) as usize;
			let block = allocate(byte_layout(len));
			ptr::copy_nonoverlapping(value.data, block.as_ptr(), len);
			(*raw).data = block.as_ptr();
		}
	}
}

unsafe fn node_id_release(raw: *mut RawNodeId) {
	// SAFETY: caller guarantees a valid node id; the union member is selected by the discriminant.
	unsafe {
		if matches!((*raw).identifier_type, NODEID_STRING | NODEID_BYTESTRING) {
			string_release(&raw mut (*raw).identifier.string);
		}
	}
}

unsafe fn node_id_duplicate(raw: *mut RawNodeId) {
	// SAFETY: caller guarantees a byte copy of a valid node id.
	unsafe {
		if matches!((*raw).identifier_type, NODEID_STRING | NODEID_BYTESTRING) {
			string_duplicate(&raw mut (*raw).identifier.string);
		}
	}
}

/// Read a node id into its owned form.
///
/// # Safety
/// `raw` must point at a valid node id.
pub(crate) unsafe fn read_node_id(raw: *const RawNodeId) -> NodeId {
	// SAFETY: caller contract; the union member is selected by the discriminant.
	unsafe {
		let namespace_index = (*raw).namespace_index;
		let identifier = match (*raw).identifier_type {
			NODEID_STRING => {
				NodeIdentifier::String(String::from_utf8_lossy(string_bytes(&raw const (*raw).identifier.string).unwrap_or_default()).into_owned())
			}
			NODEID_GUID => NodeIdentifier::Guid((*raw).identifier.guid),
			NODEID_BYTESTRING => NodeIdentifier::ByteString(string_bytes(&raw const (*raw).identifier.byte_string).unwrap_or_default().to_vec()),
			_ => NodeIdentifier::Numeric((*raw).identifier.numeric),
		};
		NodeId { namespace_index, identifier }
	}
}

/// Build the in-memory form of a node id, allocating identifier text.
pub(crate) fn write_node_id(node: &NodeId) -> Result<RawNodeId> {
	let (identifier_type, identifier) = match &node.identifier {
		NodeIdentifier::Numeric(id) => (NODEID_NUMERIC, RawNodeIdentifier { numeric: *id }),
		NodeIdentifier::String(id) => (
			NODEID_STRING,
			RawNodeIdentifier {
				string: string_new(id.as_bytes())?,
			},
		),
		NodeIdentifier::Guid(id) => (NODEID_GUID, RawNodeIdentifier { guid: *id }),
		NodeIdentifier::ByteString(id) => (NODEID_BYTESTRING, RawNodeIdentifier { byte_string: string_new(id)? }),
	};
	Ok(RawNodeId {
		namespace_index: node.namespace_index,
		identifier_type,
		identifier,
	})
}

/// Element type stored in a variant, `None` when empty.
pub(crate) fn variant_type(variant: &RawVariant) -> Option<TypeIndex> {
	variant.type_ref.checked_sub(1).map(|index| TypeIndex(index as u16))
}

/// True when the variant holds exactly one element by pointer.
pub(crate) fn variant_is_scalar(variant: &RawVariant) -> bool {
	variant.array_length == 0 && is_allocated(variant.data)
}

/// Release a variant's content and dimensions.
///
/// # Safety
/// `raw` must point at a valid variant described by `schema`.
pub(crate) unsafe fn variant_release(schema: &TypeSchema, raw: *mut RawVariant) {
	// SAFETY: caller contract.
	unsafe {
		let variant = raw.read();
		if let Some(elem) = variant_type(&variant) {
			if variant_is_scalar(&variant) {
				release_nested(schema, elem, variant.data);
				if let Some(block) = NonNull::new(variant.data) {
					free(block, schema.descriptor(elem).layout);
				}
			} else {
				array_delete(schema, elem, variant.data, variant.array_length);
			}
		}
		dimensions_release(&variant);
	}
}

/// Borrow a variant's dimension lengths; `None` when never allocated.
///
/// # Safety
/// Allocated dimensions must hold `array_dimensions_size` values.
pub(crate) unsafe fn dimensions<'a>(variant: &RawVariant) -> Option<&'a [u32]> {
	if variant.array_dimensions.is_null() {
		return None;
	}
	if !is_allocated(variant.array_dimensions.cast()) || variant.array_dimensions_size <= 0 {
		return Some(&[]);
	}
	// SAFETY: caller contract.
	Some(unsafe { slice::from_raw_parts(variant.array_dimensions, variant.array_dimensions_size as usize) })
}

unsafe fn dimensions_release(variant: &RawVariant) {
	if let Some(block) = NonNull::new(variant.array_dimensions.cast::<u8>()).filter(|block| is_allocated(block.as_ptr())) {
		let len = variant.array_dimensions_size.max(0) as usize;
		// SAFETY: dimension blocks hold `len` u32 values.
		unsafe { free(block, Layout::from_size_align_unchecked(len * size_of::<u32>(), size_of::<u32>())) };
	}
}

unsafe fn variant_duplicate(schema: &TypeSchema, raw: *mut RawVariant) {
	// SAFETY: caller guarantees a byte copy of a valid variant.
	unsafe {
		let variant = raw.read();
		if let Some(elem) = variant_type(&variant) {
			if variant_is_scalar(&variant) {
				let block = new_value(schema, elem);
				copy(schema, elem, variant.data, block.as_ptr());
				(*raw).data = block.as_ptr();
			} else {
				(*raw).data = array_copy(schema, elem, variant.data, variant.array_length);
			}
		}
		if is_allocated(variant.array_dimensions.cast()) {
			let len = variant.array_dimensions_size.max(0) as usize;
			let layout = Layout::from_size_align_unchecked(len * size_of::<u32>(), size_of::<u32>());
			let block = allocate(layout);
			ptr::copy_nonoverlapping(variant.array_dimensions.cast::<u8>(), block.as_ptr(), layout.size());
			(*raw).array_dimensions = block.as_ptr().cast();
		}
	}
}

unsafe fn variant_equal(schema: &TypeSchema, a: *const RawVariant, b: *const RawVariant) -> bool {
	// SAFETY: caller guarantees valid variants.
	unsafe {
		let (left, right) = (a.read(), b.read());
		if left.type_ref != right.type_ref || variant_is_scalar(&left) != variant_is_scalar(&right) {
			return false;
		}
		let dims_equal = dimensions(&left) == dimensions(&right);
		let content_equal = match variant_type(&left) {
			None => true,
			Some(elem) if variant_is_scalar(&left) => equal(schema, elem, left.data, right.data),
			Some(elem) => array_equal(schema, elem, (left.data, left.array_length), (right.data, right.array_length)),
		};
		dims_equal && content_equal
	}
}
