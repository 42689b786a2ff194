//! Reflective access to OPC UA data types stored in C ABI memory.

/// Type schema, member resolution, owning and derived views, arrays, and rendering.
pub mod ua;
