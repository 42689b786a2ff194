mod array;
mod custom;
mod error;
mod ids;
mod literal;
pub mod memory;
mod path;
mod print;
pub mod raw;
mod resolve;
mod schema;
mod value;
mod variant;

/// Array views and their allocation states.
pub use array::{ArrayIter, ArrayState, ArrayView};
/// Custom structured type descriptions loaded from JSON.
pub use custom::{CustomMember, CustomType, CustomTypeFile, load_custom_types};
/// Error and result aliases.
pub use error::{Result, UaError};
/// Guid and node identifier value types.
pub use ids::{Guid, NodeId, NodeIdentifier};
/// Literal construction hook.
pub use literal::{Literal, accepts_literals};
/// Field path parser types.
pub use path::{FieldPath, PathStep};
/// Text rendering entry points and options.
pub use print::{RenderOptions, render_array, render_value};
/// Member lookup and offset computation.
pub use resolve::{MemberLocation, find_member_index, locate_member, member_offsets};
/// Runtime type table.
pub use schema::{BuiltinKind, MemberDescriptor, SchemaBuilder, TypeDescriptor, TypeIndex, TypeKind, TypeSchema, types};
/// Value handles over schema-described memory.
pub use value::{Member, ValueView};
/// DataValue presence flags.
pub use variant::DataValueFlags;
