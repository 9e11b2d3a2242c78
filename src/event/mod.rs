//! Console events and the line parser.

mod parser;
mod stream;
mod types;

pub use parser::*;
pub use stream::*;
pub use types::*;
