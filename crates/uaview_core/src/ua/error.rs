use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, UaError>;

/// Errors produced while building schemas and accessing typed values.
#[derive(Debug, Error)]
pub enum UaError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Custom type description could not be parsed.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// Requested type name is not part of the schema.
	#[error("type not found: {name}")]
	TypeNotFound {
		/// Requested type name.
		name: String,
	},
	/// Requested member does not exist on the type.
	#[error("member {member} not found on {type_name}")]
	MemberNotFound {
		/// Type that was searched.
		type_name: String,
		/// Requested member name.
		member: String,
	},
	/// Source and destination types differ.
	#[error("type mismatch: expected {expected}, got {got}")]
	TypeMismatch {
		/// Type required by the destination.
		expected: String,
		/// Type of the offered value.
		got: String,
	},
	/// Array index outside `[0, len)`.
	#[error("index {index} out of range for array of length {len}")]
	IndexOutOfRange {
		/// Requested index.
		index: i64,
		/// Current array length.
		len: usize,
	},
	/// Literal arguments do not describe a valid value of the type.
	#[error("malformed {type_name} literal: {reason}")]
	MalformedLiteral {
		/// Type being constructed.
		type_name: String,
		/// Why the arguments were rejected.
		reason: String,
	},
	/// Type has no literal form.
	#[error("{type_name} cannot be constructed from literal arguments")]
	LiteralNotAccepted {
		/// Type being constructed.
		type_name: String,
	},
	/// Member holds a scalar but an array operation was requested.
	#[error("member {member} on {type_name} is not an array")]
	NotAnArray {
		/// Owning type name.
		type_name: String,
		/// Member name.
		member: String,
	},
	/// Member holds an array but a scalar operation was requested.
	#[error("member {member} on {type_name} is an array")]
	NotAScalar {
		/// Owning type name.
		type_name: String,
		/// Member name.
		member: String,
	},
	/// Requested array length cannot be represented or allocated.
	#[error("array too large: count={count}")]
	ArrayTooLarge {
		/// Requested element count.
		count: u64,
	},
	/// Two types in one schema share a name.
	#[error("schema duplicate type name: {name}")]
	SchemaDuplicateType {
		/// Duplicated name.
		name: String,
	},
	/// Two members of one type share a name.
	#[error("schema duplicate member {member} on {type_name}")]
	SchemaDuplicateMember {
		/// Type being declared.
		type_name: String,
		/// Duplicated member name.
		member: String,
	},
	/// Structured type declared without members.
	#[error("schema struct {name} has no members")]
	SchemaEmptyStruct {
		/// Type being declared.
		name: String,
	},
	/// Member refers to a type that is not declared before it.
	#[error("schema member {member} on {type_name} refers to unknown type {member_type}")]
	SchemaUnknownMemberType {
		/// Type being declared.
		type_name: String,
		/// Member name.
		member: String,
		/// Referenced type name.
		member_type: String,
	},
	/// Computed padding does not fit the member padding encoding.
	#[error("schema padding overflow for {type_name}.{member}: pre={pre}, mid={mid}")]
	SchemaPaddingOverflow {
		/// Type being declared.
		type_name: String,
		/// Member name.
		member: String,
		/// Bytes before the member or its length field.
		pre: usize,
		/// Bytes between an array length field and its data pointer.
		mid: usize,
	},
	/// Schema would exceed the `u16` index space.
	#[error("schema too large: {count} types")]
	SchemaTooLarge {
		/// Type count that was requested.
		count: usize,
	},
	/// Path expression syntax is invalid.
	#[error("invalid field path: {path}")]
	InvalidFieldPath {
		/// Original user-provided path string.
		path: String,
	},
	/// CLI assignment argument is not of the form `path=value`.
	#[error("invalid assignment: {arg}")]
	InvalidAssignment {
		/// Original user-provided argument.
		arg: String,
	},
}

impl UaError {
	pub(crate) fn malformed(type_name: &str, reason: impl Into<String>) -> Self {
		Self::MalformedLiteral {
			type_name: type_name.to_owned(),
			reason: reason.into(),
		}
	}
}
