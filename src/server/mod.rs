//! Server process management and the output read loop.

mod listener;
mod process;

pub use listener::*;
pub use process::*;
