/// Value construction and mutation command.
pub mod build;
/// Value to JSON conversion.
pub mod json;
/// Member layout command.
pub mod layout;
/// Schema listing command.
pub mod types;
/// Shared argument parsing and output helpers.
pub mod util;

#[cfg(test)]
mod test_support;
