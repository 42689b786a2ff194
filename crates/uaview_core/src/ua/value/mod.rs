use std::alloc::Layout;
use std::fmt;
use std::ptr::{self, NonNull};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::ua::memory;
use crate::ua::raw::{RawArrayCell, RawString};
use crate::ua::schema::{BuiltinKind, TypeKind};
use crate::ua::variant;
use crate::ua::{
	ArrayView, Guid, Literal, NodeId, RenderOptions, Result, TypeDescriptor, TypeIndex, TypeSchema, UaError, find_member_index, locate_member,
	render_value,
};

/// Heap block owned by a family of views, released when the last handle drops.
pub(crate) struct Storage {
	schema: Arc<TypeSchema>,
	block: NonNull<u8>,
	kind: StorageKind,
}

#[derive(Clone, Copy)]
enum StorageKind {
	/// One value of the type.
	Value(TypeIndex),
	/// A standalone [`RawArrayCell`] with elements of the type.
	Array(TypeIndex),
}

impl Storage {
	fn value(schema: &Arc<TypeSchema>, ty: TypeIndex) -> Rc<Self> {
		Rc::new(Self {
			schema: schema.clone(),
			block: memory::new_value(schema, ty),
			kind: StorageKind::Value(ty),
		})
	}

	pub(crate) fn array(schema: &Arc<TypeSchema>, elem: TypeIndex) -> Rc<Self> {
		Rc::new(Self {
			schema: schema.clone(),
			block: memory::allocate(Layout::new::<RawArrayCell>()),
			kind: StorageKind::Array(elem),
		})
	}

	pub(crate) fn block(&self) -> NonNull<u8> {
		self.block
	}
}

impl Drop for Storage {
	fn drop(&mut self) {
		// SAFETY: the block was allocated for `kind` and no handle refers to it any more.
		unsafe {
			match self.kind {
				StorageKind::Value(ty) => memory::delete_value(&self.schema, ty, self.block),
				StorageKind::Array(elem) => {
					let cell = self.block.cast::<RawArrayCell>().as_ptr().read();
					memory::array_delete(&self.schema, elem, cell.data, cell.length);
					memory::free(self.block, Layout::new::<RawArrayCell>());
				}
			}
		}
		trace!(addr = self.block.as_ptr().addr(), "released storage");
	}
}

/// Result of a member lookup.
#[derive(Debug, Clone)]
pub enum Member {
	/// Scalar member.
	Value(ValueView),
	/// Array member.
	Array(ArrayView),
}

impl Member {
	/// Scalar view, if this is one.
	pub fn into_value(self) -> Option<ValueView> {
		match self {
			Self::Value(view) => Some(view),
			Self::Array(_) => None,
		}
	}

	/// Array view, if this is one.
	pub fn into_array(self) -> Option<ArrayView> {
		match self {
			Self::Array(view) => Some(view),
			Self::Value(_) => None,
		}
	}

	/// Render with default options.
	pub fn render(&self) -> String {
		match self {
			Self::Value(view) => view.render(),
			Self::Array(view) => view.render(),
		}
	}
}

/// Typed handle to schema-described memory.
///
/// An owning view allocated the memory; a derived view aliases memory
/// inside an owning value and keeps it alive. Both share one [`Storage`],
/// which is released when the last handle is dropped. Derived views only
/// ever point into the owner's top-level block, never into separately
/// allocated array or string storage, so they cannot dangle.
///
/// Cloning a view yields another handle to the same memory; use
/// [`ValueView::deep_copy`] for an independent value.
#[derive(Clone)]
pub struct ValueView {
	schema: Arc<TypeSchema>,
	ty: TypeIndex,
	addr: NonNull<u8>,
	owner: Rc<Storage>,
	derived: bool,
}

impl ValueView {
	/// Allocate a zero-initialized value of `ty`.
	///
	/// Panics when `ty` is not part of `schema`.
	pub fn new(schema: &Arc<TypeSchema>, ty: TypeIndex) -> Self {
		let owner = Storage::value(schema, ty);
		debug!(type_name = &*schema.descriptor(ty).name, "created owning value");
		Self {
			schema: schema.clone(),
			ty,
			addr: owner.block(),
			owner,
			derived: false,
		}
	}

	/// Allocate a zero-initialized value of the named type.
	pub fn by_name(schema: &Arc<TypeSchema>, name: &str) -> Result<Self> {
		let index = schema.require(name)?.index;
		Ok(Self::new(schema, index))
	}

	pub(crate) fn derive(&self, ty: TypeIndex, addr: *mut u8) -> Self {
		Self {
			schema: self.schema.clone(),
			ty,
			// SAFETY: member addresses are offsets into the owner's non-null block.
			addr: unsafe { NonNull::new_unchecked(addr) },
			owner: self.owner.clone(),
			derived: true,
		}
	}

	/// Schema the value is described by.
	pub fn schema(&self) -> &Arc<TypeSchema> {
		&self.schema
	}

	/// Type of the value.
	pub fn type_index(&self) -> TypeIndex {
		self.ty
	}

	/// Descriptor of the value's type.
	pub fn descriptor(&self) -> &TypeDescriptor {
		self.schema.descriptor(self.ty)
	}

	/// Name of the value's type.
	pub fn type_name(&self) -> &str {
		&self.descriptor().name
	}

	/// True when this view aliases memory owned by another view.
	pub fn is_derived(&self) -> bool {
		self.derived
	}

	pub(crate) fn addr(&self) -> *mut u8 {
		self.addr.as_ptr()
	}

	/// Look up a member by name (ASCII case-insensitive).
	///
	/// Scalars come back as derived views and arrays as views over the
	/// member's length and data fields. `Ok(None)` means there is no such
	/// member.
	pub fn member(&self, name: &str) -> Result<Option<Member>> {
		if let Some(found) = variant::special_member(self, name)? {
			return Ok(found);
		}
		let desc = self.descriptor();
		if !desc.is_structured() {
			return Ok(None);
		}
		Ok(find_member_index(desc, name).map(|index| self.member_at(index)))
	}

	pub(crate) fn member_at(&self, index: usize) -> Member {
		let desc = self.descriptor();
		let member = &desc.members[index];
		match locate_member(self.addr(), &self.schema, desc, index) {
			(data, Some(length)) => Member::Array(ArrayView::from_fields(
				&self.schema,
				member.type_index,
				length.cast(),
				data.cast(),
				self.owner.clone(),
			)),
			(addr, None) => Member::Value(self.derive(member.type_index, addr)),
		}
	}

	/// Iterate `(name, member)` pairs in declaration order.
	///
	/// Builtin types yield nothing, including the flagged members of
	/// `Variant` and `DataValue`.
	pub fn members(&self) -> impl Iterator<Item = (&str, Member)> + '_ {
		let desc = self.descriptor();
		desc.members.iter().enumerate().map(move |(index, member)| (&*member.name, self.member_at(index)))
	}

	/// Number of declared members.
	pub fn member_count(&self) -> usize {
		self.descriptor().members.len()
	}

	pub(crate) fn check_same_type(&self, other: &ValueView) -> Result<()> {
		if Arc::ptr_eq(&self.schema, &other.schema) && self.ty == other.ty {
			return Ok(());
		}
		Err(UaError::TypeMismatch {
			expected: self.type_name().to_owned(),
			got: other.type_name().to_owned(),
		})
	}

	/// Replace this value by a deep copy of `other`.
	///
	/// Fails with [`UaError::TypeMismatch`] unless both views have the same
	/// type in the same schema; nothing is written in that case.
	pub fn set(&self, other: &ValueView) -> Result<()> {
		self.check_same_type(other)?;
		if self.addr == other.addr {
			return Ok(());
		}

		let desc = self.descriptor();
		let staged = memory::new_value(&self.schema, self.ty);
		// SAFETY: both views point at valid values of `ty`; the staged block is fresh.
		unsafe {
			memory::copy(&self.schema, self.ty, other.addr(), staged.as_ptr());
			memory::release_nested(&self.schema, self.ty, self.addr());
			ptr::copy_nonoverlapping(staged.as_ptr(), self.addr(), desc.size());
			memory::free(staged, desc.layout);
		}
		trace!(type_name = &*desc.name, "value set");
		Ok(())
	}

	/// Replace a scalar member by a deep copy of `value`.
	pub fn set_member(&self, name: &str, value: &ValueView) -> Result<()> {
		if let Some(result) = variant::set_special_member(self, name, value) {
			return result;
		}
		match self.member(name)? {
			Some(Member::Value(target)) => target.set(value),
			Some(Member::Array(_)) => Err(UaError::NotAScalar {
				type_name: self.type_name().to_owned(),
				member: name.to_owned(),
			}),
			None => Err(self.member_not_found(name)),
		}
	}

	/// Replace an array member by a deep copy of `array`.
	pub fn set_member_array(&self, name: &str, array: &ArrayView) -> Result<()> {
		if let Some(result) = variant::set_special_member_array(self, name, array) {
			return result;
		}
		match self.member(name)? {
			Some(Member::Array(target)) => target.assign(array),
			Some(Member::Value(_)) => Err(UaError::NotAnArray {
				type_name: self.type_name().to_owned(),
				member: name.to_owned(),
			}),
			None => Err(self.member_not_found(name)),
		}
	}

	/// Write literal arguments into a scalar member.
	pub fn set_member_literal(&self, name: &str, args: &[Literal]) -> Result<()> {
		if let Some(result) = variant::set_special_member_literal(self, name, args) {
			return result;
		}
		match self.member(name)? {
			Some(Member::Value(target)) => target.assign_literals(args),
			Some(Member::Array(_)) => Err(UaError::NotAScalar {
				type_name: self.type_name().to_owned(),
				member: name.to_owned(),
			}),
			None => Err(self.member_not_found(name)),
		}
	}

	pub(crate) fn member_not_found(&self, name: &str) -> UaError {
		UaError::MemberNotFound {
			type_name: self.type_name().to_owned(),
			member: name.to_owned(),
		}
	}

	/// Drop this handle. Memory is freed once the last handle sharing it is gone.
	pub fn release(self) {
		trace!(type_name = self.type_name(), derived = self.derived, "released view");
	}

	/// Independent owning copy.
	pub fn deep_copy(&self) -> ValueView {
		let copy = ValueView::new(&self.schema, self.ty);
		// SAFETY: `copy` is a fresh zeroed value of the same type with nothing to release.
		unsafe { memory::copy(&self.schema, self.ty, self.addr(), copy.addr()) };
		copy
	}

	/// Snapshot of the value's top-level bytes.
	pub fn raw_bytes(&self) -> Vec<u8> {
		// SAFETY: the view covers `size` readable bytes.
		unsafe { std::slice::from_raw_parts(self.addr(), self.descriptor().size()) }.to_vec()
	}

	/// Deep structural equality, ignoring padding.
	pub fn content_eq(&self, other: &ValueView) -> bool {
		// SAFETY: both views point at valid values of the same type.
		self.check_same_type(other).is_ok() && unsafe { memory::equal(&self.schema, self.ty, self.addr(), other.addr()) }
	}

	/// Render with default options.
	pub fn render(&self) -> String {
		render_value(self, &RenderOptions::default())
	}

	/// Render with explicit options.
	pub fn render_with(&self, options: &RenderOptions) -> String {
		render_value(self, options)
	}

	/// Builtin kind of the value's type.
	pub fn builtin(&self) -> Option<BuiltinKind> {
		match self.descriptor().kind {
			TypeKind::Builtin(kind) => Some(kind),
			TypeKind::Structured => None,
		}
	}

	/// Node id held by a `NodeId` value.
	pub fn node_id(&self) -> Option<NodeId> {
		// SAFETY: the kind check guarantees a node id layout.
		(self.builtin() == Some(BuiltinKind::NodeId)).then(|| unsafe { memory::read_node_id(self.addr().cast()) })
	}

	/// Guid held by a `Guid` value.
	pub fn guid(&self) -> Option<Guid> {
		// SAFETY: the kind check guarantees a guid layout.
		(self.builtin() == Some(BuiltinKind::Guid)).then(|| unsafe { self.addr().cast::<Guid>().read() })
	}

	/// Text of a `String`, `XmlElement` or `ByteString` value; `None` when null.
	pub fn text(&self) -> Option<String> {
		match self.builtin()? {
			BuiltinKind::String | BuiltinKind::XmlElement | BuiltinKind::ByteString => {
				// SAFETY: the kind check guarantees a string layout.
				let bytes = unsafe { memory::string_bytes(self.addr().cast::<RawString>()) }?;
				Some(String::from_utf8_lossy(bytes).into_owned())
			}
			_ => None,
		}
	}
}

impl PartialEq for ValueView {
	fn eq(&self, other: &Self) -> bool {
		self.content_eq(other)
	}
}

impl fmt::Display for ValueView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.render())
	}
}

impl fmt::Debug for ValueView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValueView")
			.field("type_name", &self.type_name())
			.field("derived", &self.derived)
			.field("addr", &self.addr)
			.finish()
	}
}
