//! CLI commands module.

mod list;
mod repack;

pub use list::ListCommand;
pub use repack::RepackCommand;
