use crate::ua::TypeDescriptor;
use crate::ua::TypeSchema;
use crate::ua::schema::{ARRAY_LENGTH_SIZE, ARRAY_POINTER_SIZE};

/// Byte offsets of one member inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberLocation {
	/// Scalar: start of the member. Array: start of the data pointer field.
	pub offset: usize,
	/// Array only: start of the `i32` length field.
	pub length_offset: Option<usize>,
}

/// Find a member by name: ASCII case-insensitive, exact length, first match.
pub fn find_member_index(ty: &TypeDescriptor, name: &str) -> Option<usize> {
	ty.members.iter().position(|member| member.name.eq_ignore_ascii_case(name))
}

/// Compute the offsets of member `index` by walking members `0..index`.
///
/// Panics when `index` is outside the member list.
pub fn member_offsets(schema: &TypeSchema, ty: &TypeDescriptor, index: usize) -> MemberLocation {
	assert!(
		index < ty.members.len(),
		"member index {index} outside {} with {} members",
		ty.name,
		ty.members.len()
	);

	let mut offset = 0_usize;
	for member in &ty.members[..index] {
		offset += member.pre_padding();
		if member.is_array {
			offset += ARRAY_LENGTH_SIZE + member.mid_padding() + ARRAY_POINTER_SIZE;
		} else {
			offset += schema.descriptor(member.type_index).size();
		}
	}

	let member = &ty.members[index];
	offset += member.pre_padding();
	if member.is_array {
		MemberLocation {
			offset: offset + ARRAY_LENGTH_SIZE + member.mid_padding(),
			length_offset: Some(offset),
		}
	} else {
		MemberLocation { offset, length_offset: None }
	}
}

/// Resolve member `index` of the value at `base` to `(member address, length field address)`.
///
/// Only pointer arithmetic is performed; `base` must point at a value of `ty`
/// for the results to be dereferenceable.
pub fn locate_member(base: *mut u8, schema: &TypeSchema, ty: &TypeDescriptor, index: usize) -> (*mut u8, Option<*mut u8>) {
	let location = member_offsets(schema, ty, index);
	(
		base.wrapping_add(location.offset),
		location.length_offset.map(|offset| base.wrapping_add(offset)),
	)
}

#[cfg(test)]
mod tests;
