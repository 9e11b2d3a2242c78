//! Players, their status bags and the name table.

mod status;
mod store;
mod table;

pub use status::*;
pub use store::*;
pub use table::*;
